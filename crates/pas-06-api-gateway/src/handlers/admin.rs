//! Admin routes: risk alert triage.

use super::extract::{ApiPath, ApiQuery};
use super::run_blocking;
use crate::domain::error::ApiError;
use crate::router::AppState;
use axum::extract::State;
use axum::{Extension, Json};
use pas_04_batch_lifecycle::AlertFilter;
use shared_types::{Actor, AlertId, RiskAlert};

/// `?resolved=false&kind=DuplicateScan&batch_id=3`, newest first.
pub async fn risk_alerts(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiQuery(filter): ApiQuery<AlertFilter>,
) -> Result<Json<Vec<RiskAlert>>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    Ok(Json(
        run_blocking(move || lifecycle.risk_alerts(&actor, &filter)).await?,
    ))
}

pub async fn resolve_alert(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(alert_id): ApiPath<AlertId>,
) -> Result<Json<RiskAlert>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    Ok(Json(
        run_blocking(move || lifecycle.resolve_alert(&actor, alert_id)).await?,
    ))
}
