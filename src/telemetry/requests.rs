use std::{convert::Infallible, fmt, marker::PhantomData, sync::Arc, task, time::Duration};

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    response::Response,
};
use eyre::Report;
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tower_http::{
    classify::{ClassifiedResponse, ClassifyResponse, NeverClassifyEos, SharedClassifier},
    trace::{DefaultOnBodyChunk, DefaultOnEos, TraceLayer},
};
use tracing::Span;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "request-id";

/// Identifies a request in logs and in the `request-id` response header.
#[derive(Clone)]
pub(crate) struct Id(HeaderValue);

impl Id {
    fn generate() -> Self {
        // a hyphenated UUID is always a valid header value
        Self(HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap())
    }

    fn from_request<B>(req: &Request<B>) -> Option<Self> {
        req.headers()
            .get(REQUEST_ID_HEADER)
            .filter(|value| value.to_str().map_or(false, |value| !value.is_empty()))
            .cloned()
            .map(Self)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_str().unwrap_or("<invalid>"))
    }
}

pub(crate) struct IdLayer<S>(PhantomData<S>);

impl<S> Layer<S> for IdLayer<S> {
    type Service = IdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IdMiddleware { inner }
    }
}

#[derive(Clone)]
pub(crate) struct IdMiddleware<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for IdMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>, Error = Infallible>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut task::Context<'_>) -> task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let id = Id::from_request(&req).unwrap_or_else(Id::generate);

        req.extensions_mut().insert(id.clone());

        let res = self.inner.call(req);

        Box::pin(async move {
            let mut res = res.await?;
            res.headers_mut().insert(REQUEST_ID_HEADER, id.0);
            Ok(res)
        })
    }
}

/// Tags each request with an [`Id`], reusing one supplied by the caller.
pub(crate) fn id_layer<S>() -> IdLayer<S> {
    IdLayer(PhantomData)
}

pub(crate) fn trace_layer() -> TraceLayer<
    SharedClassifier<Classifier>,
    impl (FnMut(&Request<Body>) -> Span) + Clone,
    impl FnMut(&Request<Body>, &Span) + Clone,
    impl FnOnce(&Response, Duration, &Span) + Clone,
    DefaultOnBodyChunk,
    DefaultOnEos,
    impl FnMut(Arc<Report>, Duration, &Span) + Clone,
> {
    TraceLayer::new(SharedClassifier::new(Classifier::default()))
        .make_span_with(|request: &Request<Body>| {
            let id = request
                .extensions()
                .get::<Id>()
                .map(ToString::to_string)
                .unwrap_or_default();
            tracing::info_span!(
                "request",
                %id,
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|_request: &Request<Body>, _span: &Span| {
            tracing::debug!("started processing request")
        })
        .on_response(|response: &Response, latency: Duration, _span: &Span| {
            tracing::info!(
                status = %response.status().as_u16(),
                latency = %format_args!("{}ms", latency.as_millis()),
                "finished processing request",
            )
        })
        .on_failure(|error: Arc<Report>, latency: Duration, _span: &Span| {
            tracing::error!(
                error = ?error.as_ref(),
                latency = %format_args!("{}ms", latency.as_millis()),
                "error processing request",
            );
        })
}

/// Treats responses carrying an error report, and any other server error, as failures.
#[derive(Clone, Default)]
pub(crate) struct Classifier;

impl ClassifyResponse for Classifier {
    type FailureClass = Arc<Report>;
    type ClassifyEos = NeverClassifyEos<Self::FailureClass>;

    fn classify_response<B>(
        self,
        response: &Response<B>,
    ) -> ClassifiedResponse<Self::FailureClass, Self::ClassifyEos> {
        let error: Option<&Arc<Report>> = response.extensions().get();
        if let Some(error) = error {
            ClassifiedResponse::Ready(Err(error.clone()))
        } else if response.status().is_server_error() {
            ClassifiedResponse::Ready(Err(Arc::new(Report::msg(format!(
                "server error {} without a recorded cause",
                response.status()
            )))))
        } else {
            ClassifiedResponse::Ready(Ok(()))
        }
    }

    fn classify_error<E>(self, error: &E) -> Self::FailureClass
    where
        E: std::fmt::Display + 'static,
    {
        Arc::new(Report::msg(error.to_string()))
    }
}
