//! Code verification routes.
//!
//! The hash travels either inside the path segment (`%23` is decoded to the
//! `#` separator) or as `?hash=`. A browser never sends a raw `#` fragment.
//! Every outcome, including forged and unknown codes, is a 200 report, so
//! the query string is read leniently: the first value of a repeated key
//! wins, unknown keys are ignored and an undecodable query counts as empty.

use super::extract::ApiPath;
use crate::domain::error::ApiError;
use crate::router::AppState;
use axum::extract::{Query, State};
use axum::{Extension, Json};
use pas_05_verification::{ScanContext, VerificationReport};
use shared_types::Actor;

/// Raw `key=value` pairs of the query string.
type QueryPairs = Option<Query<Vec<(String, String)>>>;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct VerifyQuery {
    pub hash: Option<String>,
    /// Where the scan happened, as reported by the client.
    pub location: Option<String>,
}

impl VerifyQuery {
    fn from_pairs(pairs: QueryPairs) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs.map(|Query(pairs)| pairs).unwrap_or_default() {
            let slot = match key.as_str() {
                "hash" => &mut query.hash,
                "location" => &mut query.location,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

async fn resolve(
    state: AppState,
    code: String,
    query: VerifyQuery,
    context: ScanContext,
) -> Result<Json<VerificationReport>, ApiError> {
    let verification = state.verification.clone();
    let report = tokio::task::spawn_blocking(move || {
        verification.verify(&code, query.hash.as_deref(), &context)
    })
    .await
    .map_err(|join| ApiError::internal(format!("Verification task failed: {}", join)))?;
    Ok(Json(report))
}

/// Public scan, no signed-in user.
pub async fn verify_public(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<String>,
    pairs: QueryPairs,
) -> Result<Json<VerificationReport>, ApiError> {
    let query = VerifyQuery::from_pairs(pairs);
    let context = ScanContext::anonymous(query.location.clone());
    resolve(state, code, query, context).await
}

/// Scan by a signed-in customer or retailer.
pub async fn verify_as_actor(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(code): ApiPath<String>,
    pairs: QueryPairs,
) -> Result<Json<VerificationReport>, ApiError> {
    let query = VerifyQuery::from_pairs(pairs);
    let context = ScanContext::for_actor(&actor, query.location.clone());
    resolve(state, code, query, context).await
}
