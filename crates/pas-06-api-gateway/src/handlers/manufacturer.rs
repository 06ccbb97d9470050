//! Manufacturer routes: products, production, batch views, labels, recall,
//! shipments out, and ledger audit.

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::run_blocking;
use crate::domain::error::ApiError;
use crate::router::AppState;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use pas_03_ledger_chain::{BatchAudit, ChainVerification, LedgerFilter};
use pas_04_batch_lifecycle::{
    BatchSummary, NewProduct, ProductionRequest, QrCodeEntry, RecallOutcome, ShipmentRequest,
    UnitView,
};
use serde::Deserialize;
use shared_types::{Actor, BatchId, Capability, ItemId, ProductDefinition, Role, Shipment};
use tracing::info;

pub async fn register_product(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(product): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<ProductDefinition>), ApiError> {
    let lifecycle = state.lifecycle.clone();
    let product = run_blocking(move || lifecycle.register_product(&actor, product)).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn create_batch(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(request): ApiJson<ProductionRequest>,
) -> Result<(StatusCode, Json<BatchSummary>), ApiError> {
    let lifecycle = state.lifecycle.clone();
    let summary = run_blocking(move || lifecycle.create_batch(&actor, request)).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn list_batches(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<BatchSummary>>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    Ok(Json(run_blocking(move || lifecycle.list_batches(&actor)).await?))
}

pub async fn batch_summary(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(batch_id): ApiPath<BatchId>,
) -> Result<Json<BatchSummary>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    Ok(Json(
        run_blocking(move || lifecycle.batch_summary(&actor, batch_id)).await?,
    ))
}

pub async fn units_in_batch(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(batch_id): ApiPath<BatchId>,
) -> Result<Json<Vec<UnitView>>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    Ok(Json(
        run_blocking(move || lifecycle.units_in_batch(&actor, batch_id)).await?,
    ))
}

pub async fn qr_codes(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(batch_id): ApiPath<BatchId>,
) -> Result<Json<Vec<QrCodeEntry>>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    Ok(Json(
        run_blocking(move || lifecycle.qr_codes(&actor, batch_id)).await?,
    ))
}

/// ZIP of PNG labels, served as an attachment.
pub async fn qr_archive(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(batch_id): ApiPath<BatchId>,
) -> Result<Response, ApiError> {
    let lifecycle = state.lifecycle.clone();
    let archive = run_blocking(move || lifecycle.qr_archive(&actor, batch_id)).await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        archive.file_name
    ))
    .map_err(|e| ApiError::internal(format!("Bad archive file name: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive.bytes,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct RecallBody {
    pub reason: String,
}

pub async fn recall(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(batch_id): ApiPath<BatchId>,
    ApiJson(body): ApiJson<RecallBody>,
) -> Result<Json<RecallOutcome>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    let outcome = run_blocking(move || lifecycle.recall(&actor, batch_id, &body.reason)).await?;
    info!(
        batch_number = %outcome.batch_number,
        units_recalled = outcome.units_recalled,
        "Recall served"
    );
    Ok(Json(outcome))
}

pub async fn create_shipment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(request): ApiJson<ShipmentRequest>,
) -> Result<(StatusCode, Json<Shipment>), ApiError> {
    let lifecycle = state.lifecycle.clone();
    let shipment = run_blocking(move || lifecycle.create_shipment(&actor, request)).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    /// `batch` returns entries grouped per batch.
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub batch_id: Option<BatchId>,
}

/// Manufacturers see the entries of their own batches, admins everything.
pub async fn ledger(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiQuery(query): ApiQuery<LedgerQuery>,
) -> Result<Response, ApiError> {
    actor.require(Capability::AuditLedger)?;
    let filter = LedgerFilter {
        manufacturer_id: (actor.role != Role::Admin).then_some(actor.id),
        batch_id: query.batch_id,
    };

    let ledger = state.ledger.clone();
    match query.group_by.as_deref() {
        None => Ok(Json(run_blocking(move || ledger.list(&filter)).await?).into_response()),
        Some("batch") => {
            Ok(Json(run_blocking(move || ledger.list_grouped(&filter)).await?).into_response())
        }
        Some(other) => Err(ApiError::validation(format!(
            "Unsupported group_by '{}', expected 'batch'",
            other
        ))),
    }
}

pub async fn verify_unit_chain(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(item_id): ApiPath<ItemId>,
) -> Result<Json<ChainVerification>, ApiError> {
    actor.require(Capability::AuditLedger)?;
    let ledger = state.ledger.clone();
    let verification = run_blocking(move || -> Result<ChainVerification, ApiError> {
        if actor.role != Role::Admin {
            // The Manufactured entry names the unit's maker.
            let entries = ledger.entries(item_id)?;
            if let Some(genesis) = entries.first() {
                actor.require_owner(genesis.actor_id, format!("unit {}", item_id))?;
            }
        }
        Ok(ledger.verify_chain(item_id)?)
    })
    .await?;
    Ok(Json(verification))
}

pub async fn verify_batch_chain(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(batch_id): ApiPath<BatchId>,
) -> Result<Json<BatchAudit>, ApiError> {
    actor.require(Capability::AuditLedger)?;
    let lifecycle = state.lifecycle.clone();
    let ledger = state.ledger.clone();
    let audit = run_blocking(move || -> Result<BatchAudit, ApiError> {
        lifecycle.batch_summary(&actor, batch_id)?;
        Ok(ledger.verify_batch(batch_id)?)
    })
    .await?;
    Ok(Json(audit))
}
