use std::{fmt, sync::Arc};

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{dispatch::BatchResult, rates, registry};

#[derive(Debug)]
pub(crate) enum Error {
    MethodNotAllowed(Method),
    Validation(String),
    Dispatch(BatchResult),
    Internal(eyre::Report),
}

#[derive(serde::Serialize)]
struct ErrorBody<'a> {
    #[serde(rename = "Error")]
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    batch: Option<&'a BatchResult>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MethodNotAllowed(method) => {
                write!(f, "This HTTP method is not allowed: {}", method)
            }
            Self::Validation(error) => write!(f, "{}", error),
            Self::Dispatch(batch) => write!(f, "{}", batch),
            // include the cause chain, e.g. "failed to fetch rate from ...: timed out"
            Self::Internal(error) => write!(f, "{:#}", error),
        }
    }
}

impl From<rates::Error> for Error {
    fn from(error: rates::Error) -> Self {
        Self::Internal(error.into())
    }
}

impl From<registry::Error> for Error {
    fn from(error: registry::Error) -> Self {
        match error {
            registry::Error::InvalidEmail(_) | registry::Error::DuplicateSubscriber(_) => {
                Self::Validation(error.to_string())
            }
            registry::Error::Storage { .. } => Self::Internal(error.into()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MethodNotAllowed(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Dispatch(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: self.to_string(),
            batch: match &self {
                Self::Dispatch(batch) => Some(batch),
                _ => None,
            },
        };
        let mut response = (status, Json(body)).into_response();

        // picked up by the trace layer's classifier
        match self {
            Self::Internal(error) => {
                response.extensions_mut().insert(Arc::new(error));
            }
            Self::Dispatch(batch) => {
                response
                    .extensions_mut()
                    .insert(Arc::new(eyre::Report::msg(batch.to_string())));
            }
            Self::MethodNotAllowed(_) | Self::Validation(_) => {}
        }
        response
    }
}
