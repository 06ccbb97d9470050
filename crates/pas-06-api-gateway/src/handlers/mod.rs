//! Route handlers.
//!
//! Domain services are synchronous; every call crosses into the blocking
//! pool through [`run_blocking`]. Handlers receive the admitted [`Actor`]
//! from the route group's role guard.
//!
//! [`Actor`]: shared_types::Actor

pub mod admin;
pub mod extract;
pub mod manufacturer;
pub mod retailer;
pub mod verify;

use crate::domain::error::ApiError;
use axum::Json;
use serde_json::{json, Value};

/// Run a service call on the blocking pool.
pub(crate) async fn run_blocking<T, E, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result.map_err(Into::into),
        Err(join) => Err(ApiError::internal(format!("Service task failed: {}", join))),
    }
}

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
