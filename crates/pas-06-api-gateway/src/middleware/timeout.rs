//! Whole-request timeout.
//!
//! A request that overruns its budget is answered with 504. The handler's
//! future is dropped; service work already handed to the blocking pool runs
//! to its own commit or rollback.

use crate::domain::config::TimeoutConfig;
use crate::domain::error::ApiError;
use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use tokio::time::timeout;
use tower::{Layer, Service};
use tracing::warn;

#[derive(Clone)]
pub struct TimeoutLayer {
    budget: Duration,
}

impl TimeoutLayer {
    pub fn new(config: &TimeoutConfig) -> Self {
        Self {
            budget: config.request(),
        }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            budget: self.budget,
        }
    }
}

#[derive(Clone)]
pub struct TimeoutService<S> {
    inner: S,
    budget: Duration,
}

impl<S> Service<Request<Body>> for TimeoutService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let budget = self.budget;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match timeout(budget, inner.call(req)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout_ms = budget.as_millis() as u64, "Request timed out");
                    Ok(ApiError::timeout(format!(
                        "Request exceeded {}ms timeout",
                        budget.as_millis()
                    ))
                    .into_response())
                }
            }
        })
    }
}
