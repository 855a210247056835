use std::{net::SocketAddr, sync::Arc};

use axum::routing::{any, get};
use eyre::Context as _;

use crate::{
    dispatch::BroadcastDispatcher,
    email_client::EmailClient,
    rates::{HttpRateSource, RateAggregator},
    registry::SubscriberRegistry,
    routes, telemetry, Config,
};

fn routes() -> axum::Router {
    axum::Router::new()
        .route("/health", get(routes::health))
        .route("/rate", any(routes::rate))
        .route("/subscribe", any(routes::subscribe))
        .route("/sendEmails", any(routes::send_emails))
}

pub struct App {
    addr: SocketAddr,
    registry: Arc<SubscriberRegistry>,
    service: axum::routing::IntoMakeService<axum::Router>,
}

pub type Server =
    axum::Server<hyper::server::conn::AddrIncoming, axum::routing::IntoMakeService<axum::Router>>;

impl App {
    /// Loads the subscriber store and wires the rate sources and email client from `config`.
    pub async fn new(config: Config) -> eyre::Result<Self> {
        let registry = SubscriberRegistry::load(config.subscribers_file)
            .await
            .context("failed to load subscribers")?;
        let registry = Arc::new(registry);

        let http_client = reqwest::Client::new();

        let aggregator = RateAggregator::new(
            Arc::new(HttpRateSource::abstract_api(
                http_client.clone(),
                &config.abstract_api_url,
                &config.abstract_api_key,
                config.upstream_timeout,
            )),
            Arc::new(HttpRateSource::exchange_rates_api(
                http_client.clone(),
                &config.exchange_rates_api_url,
                &config.exchange_rates_api_key,
                config.upstream_timeout,
            )),
        );

        let email_client = EmailClient::new(
            http_client,
            &config.email_api_url,
            config.email_access_token,
            config.email_send_timeout,
        );
        let dispatcher = BroadcastDispatcher::new(Arc::new(email_client));

        let service = routes()
            .layer(
                tower::ServiceBuilder::new()
                    .layer(telemetry::id_layer())
                    .layer(telemetry::trace_layer())
                    .layer(axum::Extension(Arc::new(aggregator)))
                    .layer(axum::Extension(Arc::clone(&registry)))
                    .layer(axum::Extension(Arc::new(dispatcher))),
            )
            .into_make_service();

        Ok(Self {
            addr: config.address,
            registry,
            service,
        })
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    pub fn serve(self) -> hyper::Result<Server> {
        Ok(axum::Server::try_bind(&self.addr)?.serve(self.service))
    }
}
