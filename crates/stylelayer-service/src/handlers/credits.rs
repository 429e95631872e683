//! Credit balance and history handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use stylelayer_core::CreditLogEntry;

use crate::auth::AuthSession;
use crate::error::ApiError;
use crate::state::AppState;

/// Default number of ledger entries returned by the history endpoint.
const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Maximum number of ledger entries a single request may ask for.
const MAX_HISTORY_LIMIT: i64 = 200;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    /// Current credit balance.
    pub credits: i64,
}

/// History query parameters.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum entries to return (default 50, capped at 200).
    pub limit: Option<i64>,
}

/// History response.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Ledger entries, newest first.
    pub entries: Vec<CreditLogEntry>,
}

/// `GET /api/user/credits` - the caller's balance.
///
/// A storage failure degrades to 0 rather than erroring: the frontend
/// polls this endpoint and a transient read failure should not break the
/// page. Mutations never degrade this way.
pub async fn get_credits(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Json<CreditsResponse> {
    let credits = match state.store.get_balance(&session.user.identity_id).await {
        Ok(balance) => balance,
        Err(e) => {
            tracing::error!(
                identity_id = %session.user.identity_id,
                error = %e,
                "Balance read failed, reporting 0"
            );
            0
        }
    };

    Json(CreditsResponse { credits })
}

/// `GET /api/user/history` - the caller's recent ledger entries.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let entries = state
        .store
        .list_credit_log(&session.user.identity_id, limit)
        .await?;

    Ok(Json(HistoryResponse { entries }))
}
