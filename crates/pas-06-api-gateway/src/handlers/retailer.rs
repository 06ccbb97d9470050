//! Retailer routes: receive shipments, stock and sell units.

use super::extract::{ApiJson, ApiPath};
use super::run_blocking;
use crate::domain::error::ApiError;
use crate::router::AppState;
use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use shared_types::{Actor, ItemId, LedgerEntry, Shipment, ShipmentId};

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmBody {
    #[serde(default)]
    pub location: Option<String>,
}

/// The body is optional; without a location the retailer's name is recorded.
pub async fn confirm_shipment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(shipment_id): ApiPath<ShipmentId>,
    body: Option<ApiJson<ConfirmBody>>,
) -> Result<Json<Shipment>, ApiError> {
    let location = body.and_then(|ApiJson(body)| body.location);
    let lifecycle = state.lifecycle.clone();
    Ok(Json(
        run_blocking(move || lifecycle.confirm_shipment(&actor, shipment_id, location)).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct UnitsBody {
    pub item_ids: Vec<ItemId>,
    #[serde(default)]
    pub location: Option<String>,
}

pub async fn store_units(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(body): ApiJson<UnitsBody>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    let location = body.location.unwrap_or_else(|| actor.name.clone());
    Ok(Json(
        run_blocking(move || lifecycle.store_units(&actor, &body.item_ids, &location)).await?,
    ))
}

pub async fn record_sale(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(body): ApiJson<UnitsBody>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    let location = body.location.unwrap_or_else(|| actor.name.clone());
    Ok(Json(
        run_blocking(move || lifecycle.record_sale(&actor, &body.item_ids, &location)).await?,
    ))
}
