use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, Form},
    http::Method,
    Extension, Json,
};

use super::require_method;
use crate::{registry::SubscriberRegistry, Error};

#[derive(serde::Deserialize)]
pub(crate) struct Subscription {
    email: String,
}

#[tracing::instrument(skip_all)]
pub(crate) async fn subscribe(
    method: Method,
    Extension(registry): Extension<Arc<SubscriberRegistry>>,
    form: Result<Form<Subscription>, FormRejection>,
) -> Result<Json<&'static str>, Error> {
    require_method(method, Method::POST)?;

    let Form(form) = form.map_err(|rejection| Error::Validation(rejection.to_string()))?;
    registry.subscribe(&form.email).await?;

    Ok(Json("Subscribed successfully"))
}
