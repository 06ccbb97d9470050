//! Route table.
//!
//! Routes are grouped by the roles they serve. Each group carries one
//! [`RoleGuardLayer`], so the caller's role is checked once per request
//! before any handler runs; the services re-check the finer capability and
//! ownership rules.
//!
//! | Group | Roles | Routes |
//! |-------|-------|--------|
//! | production | Manufacturer | `POST /manufacturer/products`, `POST /manufacturer/production` |
//! | oversight | Manufacturer, Admin | batches, labels, recall, ledger audit |
//! | shipping | Manufacturer, Retailer | `POST /manufacturer/shipments` |
//! | retail | Retailer | confirm, store, sell, `GET /retailer/verify/:code` |
//! | customer | Customer | `GET /customer/verify/:code` |
//! | admin | Admin | risk alerts |
//! | public | none | `GET /verify/:code`, `GET /health` |

use crate::domain::config::GatewayConfig;
use crate::handlers::{self, admin, manufacturer, retailer, verify};
use crate::middleware::{create_cors_layer, RoleGuardLayer, TimeoutLayer, TracingLayer};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use pas_03_ledger_chain::LedgerChainApi;
use pas_04_batch_lifecycle::BatchLifecycleApi;
use pas_05_verification::VerificationApi;
use shared_types::Role;
use std::sync::Arc;
use tower::ServiceBuilder;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<dyn BatchLifecycleApi>,
    pub ledger: Arc<dyn LedgerChainApi>,
    pub verification: Arc<dyn VerificationApi>,
}

const PRODUCTION: &[Role] = &[Role::Manufacturer];
const OVERSIGHT: &[Role] = &[Role::Manufacturer, Role::Admin];
const SHIPPING: &[Role] = &[Role::Manufacturer, Role::Retailer];
const RETAIL: &[Role] = &[Role::Retailer];
const CUSTOMER: &[Role] = &[Role::Customer];
const ADMIN: &[Role] = &[Role::Admin];

/// Build the full HTTP router with its middleware stack.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let production = Router::new()
        .route("/manufacturer/products", post(manufacturer::register_product))
        .route("/manufacturer/production", post(manufacturer::create_batch))
        .route_layer(RoleGuardLayer::new(PRODUCTION));

    let oversight = Router::new()
        .route("/manufacturer/batches", get(manufacturer::list_batches))
        .route("/manufacturer/batch/:batch_id", get(manufacturer::batch_summary))
        .route(
            "/manufacturer/batch/:batch_id/units",
            get(manufacturer::units_in_batch),
        )
        .route(
            "/manufacturer/batch/:batch_id/qr-codes",
            get(manufacturer::qr_codes),
        )
        .route(
            "/manufacturer/batch/:batch_id/qr-codes/archive",
            get(manufacturer::qr_archive),
        )
        .route(
            "/manufacturer/batch/:batch_id/recall",
            post(manufacturer::recall),
        )
        .route("/manufacturer/ledger", get(manufacturer::ledger))
        .route(
            "/manufacturer/ledger/unit/:item_id/verify",
            get(manufacturer::verify_unit_chain),
        )
        .route(
            "/manufacturer/ledger/batch/:batch_id/verify",
            get(manufacturer::verify_batch_chain),
        )
        .route_layer(RoleGuardLayer::new(OVERSIGHT));

    let shipping = Router::new()
        .route("/manufacturer/shipments", post(manufacturer::create_shipment))
        .route_layer(RoleGuardLayer::new(SHIPPING));

    let retail = Router::new()
        .route(
            "/retailer/shipments/:shipment_id/confirm",
            post(retailer::confirm_shipment),
        )
        .route("/retailer/inventory/store", post(retailer::store_units))
        .route("/retailer/sales", post(retailer::record_sale))
        .route("/retailer/verify/:code", get(verify::verify_as_actor))
        .route_layer(RoleGuardLayer::new(RETAIL));

    let customer = Router::new()
        .route("/customer/verify/:code", get(verify::verify_as_actor))
        .route_layer(RoleGuardLayer::new(CUSTOMER));

    let admin = Router::new()
        .route("/admin/risk-alerts", get(admin::risk_alerts))
        .route(
            "/admin/risk-alerts/:alert_id/resolve",
            post(admin::resolve_alert),
        )
        .route_layer(RoleGuardLayer::new(ADMIN));

    let public = Router::new()
        .route("/verify/:code", get(verify::verify_public))
        .route("/health", get(handlers::health));

    let middleware = ServiceBuilder::new()
        .layer(create_cors_layer(&config.cors))
        .layer(TracingLayer::new())
        .layer(TimeoutLayer::new(&config.timeouts));

    Router::new()
        .merge(production)
        .merge(oversight)
        .merge(shipping)
        .merge(retail)
        .merge(customer)
        .merge(admin)
        .merge(public)
        .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
        .layer(middleware)
        .with_state(state)
}
