use std::sync::Arc;

use axum::{http::Method, Extension, Json};

use super::require_method;
use crate::{rates::RateAggregator, Error};

#[tracing::instrument(skip_all)]
pub(crate) async fn rate(
    method: Method,
    Extension(aggregator): Extension<Arc<RateAggregator>>,
) -> Result<Json<f64>, Error> {
    require_method(method, Method::GET)?;

    let rate = aggregator.aggregated_rate().await?;

    Ok(Json(rate.value()))
}
