//! History routes carry no authentication, matching the deployed API.

use axum::{extract::State, http::StatusCode};
use clinic_db::models::PatientHistory;

use super::{AppJson, AppPath};
use crate::error::ApiError;
use crate::history::{self, HistoryInput};
use crate::AppState;

/// GET /patients/:id/history
pub async fn get_history(
    State(state): State<AppState>,
    AppPath(p_id): AppPath<i64>,
) -> Result<AppJson<PatientHistory>, ApiError> {
    Ok(AppJson(history::get(&state.stores.documents, p_id).await?))
}

/// POST /patients/:id/history
pub async fn create_history(
    State(state): State<AppState>,
    AppPath(p_id): AppPath<i64>,
    AppJson(payload): AppJson<HistoryInput>,
) -> Result<(StatusCode, AppJson<PatientHistory>), ApiError> {
    let created = history::create(&state.stores.documents, p_id, payload).await?;
    Ok((StatusCode::CREATED, AppJson(created)))
}

/// PUT /patients/:id/history
/// Merge-patch: absent or null fields keep their stored values
pub async fn update_history(
    State(state): State<AppState>,
    AppPath(p_id): AppPath<i64>,
    AppJson(payload): AppJson<HistoryInput>,
) -> Result<AppJson<PatientHistory>, ApiError> {
    Ok(AppJson(history::update(&state.stores.documents, p_id, payload).await?))
}
