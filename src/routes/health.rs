use axum::http::StatusCode;

/// Liveness probe; does not touch upstreams or the subscriber store.
#[tracing::instrument]
pub(crate) async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
