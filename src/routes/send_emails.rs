use std::sync::Arc;

use axum::{http::Method, Extension, Json};

use super::require_method;
use crate::{
    dispatch::BroadcastDispatcher, rates::RateAggregator, registry::SubscriberRegistry, Error,
};

#[tracing::instrument(skip_all, fields(rate = tracing::field::Empty))]
pub(crate) async fn send_emails(
    method: Method,
    Extension(aggregator): Extension<Arc<RateAggregator>>,
    Extension(registry): Extension<Arc<SubscriberRegistry>>,
    Extension(dispatcher): Extension<Arc<BroadcastDispatcher>>,
) -> Result<Json<&'static str>, Error> {
    require_method(method, Method::POST)?;

    let rate = aggregator.aggregated_rate().await?;
    tracing::Span::current().record("rate", &rate.value());

    let recipients = registry.all().await;
    let batch = dispatcher.broadcast(&rate.to_string(), &recipients).await;

    if batch.is_success() {
        Ok(Json("Emails sent successfully"))
    } else {
        Err(Error::Dispatch(batch))
    }
}
