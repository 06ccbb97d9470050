//! Middleware stack for the gateway.
//!
//! Layer order: Request → CORS → Tracing → Timeout → BodyLimit → RoleGuard → Handler.
//! The role guard is applied per route group.

pub mod actor;
pub mod cors;
pub mod timeout;
pub mod tracing;

pub use actor::{
    actor_from_headers, RoleGuardLayer, HEADER_ACTOR_ID, HEADER_ACTOR_NAME, HEADER_ACTOR_ROLE,
};
pub use cors::create_cors_layer;
pub use timeout::TimeoutLayer;
pub use tracing::TracingLayer;
