use std::net::Ipv4Addr;

use rate_notifier::App;
use tracing::info;

#[tokio::main]
async fn main() {
    rate_notifier::telemetry::init(env!("CARGO_PKG_NAME"), std::io::stdout);

    let config = rate_notifier::Config::builder()
        .address((Ipv4Addr::LOCALHOST, 8000).into())
        .merge_env()
        .expect("invalid configuration in environment")
        .build()
        .expect("failed to read configuration");

    let app = App::new(config).await.expect("failed to set up app");
    let server = app.serve().expect("failed to serve app");

    info!("Listening on {}", server.local_addr());
    server.await.expect("error while running server")
}
