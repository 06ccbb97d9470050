//! Per-request tracing spans.
//!
//! Every request runs inside an `api_request` span carrying the method, the
//! path and a request id. The id is taken from `x-request-id` when the
//! upstream proxy set one, generated otherwise, and echoed on the response.

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    response::Response,
};
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{info, info_span, warn, Instrument, Span};

pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Longest accepted upstream request id.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Tracing layer that creates spans for each request
#[derive(Clone, Default)]
pub struct TracingLayer;

impl TracingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService { inner }
    }
}

#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for TracingService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        let request_id = request_id_of(&req);
        let span = info_span!(
            "api_request",
            http.method = %req.method(),
            http.target = %req.uri().path(),
            request.id = %request_id,
            actor.role = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let started = std::time::Instant::now();
                let result = inner.call(req).await;

                if let Ok(response) = &result {
                    let status = response.status();
                    Span::current().record("http.status_code", status.as_u16());
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    if status.is_server_error() {
                        warn!(status = status.as_u16(), elapsed_ms, "Request failed");
                    } else {
                        info!(status = status.as_u16(), elapsed_ms, "Request served");
                    }
                }

                result.map(|mut response| {
                    if let Ok(value) = HeaderValue::from_str(&request_id) {
                        response.headers_mut().insert(HEADER_REQUEST_ID, value);
                    }
                    response
                })
            }
            .instrument(span),
        )
    }
}

/// Upstream request id if it is short printable ASCII, else a fresh UUID.
fn request_id_of<B>(req: &Request<B>) -> String {
    req.headers()
        .get(HEADER_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
