//! # API Gateway (PAS-06)
//!
//! REST surface of the traceability core. The gateway owns transport
//! concerns only: actor headers, role groups, JSON bodies, status codes and
//! request spans. Every decision about batches, units, chains and scans is
//! made by the domain services behind [`AppState`].
//!
//! ## Middleware
//!
//! | Layer | Purpose |
//! |-------|---------|
//! | CORS | browser dashboards on other origins |
//! | Tracing | `api_request` span per request, `x-request-id` echo |
//! | Timeout | 504 after the configured budget |
//! | Body limit | 413 for oversized JSON bodies |
//! | Role guard | 401 without actor headers, 403 for roles outside the route group |

pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;

pub use domain::config::{
    ConfigError, CorsConfig, GatewayConfig, HttpConfig, LimitsConfig, TimeoutConfig,
};
pub use domain::error::{codes, ApiError, GatewayError};
pub use middleware::{HEADER_ACTOR_ID, HEADER_ACTOR_NAME, HEADER_ACTOR_ROLE};
pub use router::{build_router, AppState};
pub use service::ApiGatewayService;
