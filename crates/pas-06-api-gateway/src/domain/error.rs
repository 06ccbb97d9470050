//! Gateway error types.
//!
//! Every failed route answers with a JSON body `{"code", "message"}` and a
//! status derived from the domain error:
//!
//! | Domain error | Status | Code |
//! |--------------|--------|------|
//! | missing or malformed actor headers | 401 | `UNAUTHENTICATED` |
//! | role lacks the capability, not the owner | 403 | `FORBIDDEN` |
//! | bad input | 400 | `VALIDATION_ERROR` |
//! | unknown product, batch, unit, shipment, alert | 404 | `NOT_FOUND` |
//! | illegal transition, already recalled, already resolved | 409 | `CONFLICT` |
//! | duplicate serial, corrupt record | 500 | `INTEGRITY_VIOLATION` |
//! | lock timeout, backend I/O | 503 | `TRANSIENT` |

use crate::domain::config::ConfigError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pas_01_serial_generator::SerialError;
use pas_02_qr_codec::QrError;
use pas_03_ledger_chain::LedgerError;
use pas_04_batch_lifecycle::LifecycleError;
use serde::Serialize;
use shared_types::ActorError;
use thiserror::Error;
use tracing::{error, warn};

/// Machine-readable error codes.
pub mod codes {
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const INVALID_TRANSITION: &str = "INVALID_TRANSITION";
    pub const ALREADY_RECALLED: &str = "ALREADY_RECALLED";
    pub const INTEGRITY_VIOLATION: &str = "INTEGRITY_VIOLATION";
    pub const TRANSIENT: &str = "TRANSIENT";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// A failed request, rendered as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthenticated(details: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, codes::UNAUTHENTICATED, details)
    }

    pub fn forbidden(details: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, codes::FORBIDDEN, details)
    }

    pub fn validation(details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::VALIDATION_ERROR, details)
    }

    pub fn not_found(details: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, details)
    }

    pub fn conflict(code: &'static str, details: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, details)
    }

    /// Logged at error level: stored data contradicts an invariant.
    pub fn integrity(details: impl Into<String>) -> Self {
        let details = details.into();
        error!(error = %details, "Integrity violation");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTEGRITY_VIOLATION,
            details,
        )
    }

    /// The client may retry.
    pub fn transient(details: impl Into<String>) -> Self {
        let details = details.into();
        warn!(error = %details, "Transient failure");
        Self::new(StatusCode::SERVICE_UNAVAILABLE, codes::TRANSIENT, details)
    }

    pub fn timeout(details: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, codes::TIMEOUT, details)
    }

    pub fn internal(details: impl Into<String>) -> Self {
        let details = details.into();
        error!(error = %details, "Internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL_ERROR,
            details,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ActorError> for ApiError {
    fn from(err: ActorError) -> Self {
        match err {
            ActorError::Unauthenticated => ApiError::unauthenticated(err.to_string()),
            ActorError::Forbidden { .. } | ActorError::NotOwner { .. } => {
                ApiError::forbidden(err.to_string())
            }
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::UnitNotFound(_) | LedgerError::BatchNotFound(_) => {
                ApiError::not_found(err.to_string())
            }
            _ if err.is_transient() => ApiError::transient(err.to_string()),
            LedgerError::AppendFailed { .. } | LedgerError::Storage(_) => {
                ApiError::integrity(err.to_string())
            }
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        if err.is_integrity_violation() {
            return ApiError::integrity(err.to_string());
        }
        if err.is_transient() {
            return ApiError::transient(err.to_string());
        }

        match err {
            LifecycleError::Actor(e) => e.into(),
            LifecycleError::Ledger(e) => e.into(),
            LifecycleError::Validation(_)
            | LifecycleError::Serial(
                SerialError::InvalidBatchNumber(_)
                | SerialError::ZeroBatchCounter
                | SerialError::SequenceOutOfRange { .. },
            )
            | LifecycleError::Qr(QrError::MalformedPayload(_)) => {
                ApiError::validation(err.to_string())
            }
            LifecycleError::ProductNotFound(_)
            | LifecycleError::BatchNotFound(_)
            | LifecycleError::UnitNotFound(_)
            | LifecycleError::ShipmentNotFound(_)
            | LifecycleError::AlertNotFound(_) => ApiError::not_found(err.to_string()),
            LifecycleError::InvalidTransition { .. } => {
                ApiError::conflict(codes::INVALID_TRANSITION, err.to_string())
            }
            LifecycleError::AlreadyRecalled(_) => {
                ApiError::conflict(codes::ALREADY_RECALLED, err.to_string())
            }
            LifecycleError::ShipmentAlreadyDelivered(_)
            | LifecycleError::AlertAlreadyResolved(_) => {
                ApiError::conflict(codes::CONFLICT, err.to_string())
            }
            other => ApiError::internal(other.to_string()),
        }
    }
}

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
