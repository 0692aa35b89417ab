use axum::{extract::State, http::StatusCode};
use clinic_db::models::{EventLog, StaffRecord};

use super::{AppJson, AppPath};
use crate::access::require_staff;
use crate::auth::CurrentIdentity;
use crate::error::ApiError;
use crate::AppState;

fn staff_not_found(staff_id: i64) -> ApiError {
    ApiError::not_found(format!("Staff {staff_id} not found"))
}

/// GET /staff
pub async fn list_staff(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<AppJson<Vec<StaffRecord>>, ApiError> {
    require_staff(&identity)?;
    Ok(AppJson(state.stores.relational.list_staff().await?))
}

/// GET /staff/:id
pub async fn get_staff(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    AppPath(staff_id): AppPath<i64>,
) -> Result<AppJson<StaffRecord>, ApiError> {
    require_staff(&identity)?;
    state
        .stores
        .relational
        .staff_by_id(staff_id)
        .await?
        .map(AppJson)
        .ok_or_else(|| staff_not_found(staff_id))
}

/// DELETE /staff/:id
/// Staff may only close their own account. Patients assigned to it keep
/// their `doctor_id`
pub async fn delete_staff(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    AppPath(staff_id): AppPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_staff(&identity)?;
    if staff_id != identity.subject_id {
        return Err(ApiError::Forbidden);
    }
    if !state.stores.relational.delete_staff(staff_id).await? {
        return Err(staff_not_found(staff_id));
    }
    tracing::info!("✓ Deleted staff {} (by {})", staff_id, identity.subject_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /staff/me/events
/// The caller's own audit entries, oldest first
pub async fn my_events(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<AppJson<Vec<EventLog>>, ApiError> {
    require_staff(&identity)?;
    Ok(AppJson(
        state.stores.documents.events_for(identity.subject_id).await?,
    ))
}
