use axum::{extract::State, http::StatusCode};
use clinic_db::models::{
    InventoryLot, MedInfo, Medication, MedicationChanges, NewInventoryLot, NewMedication,
};

use super::{AppJson, AppPath};
use crate::compose::{compose_medication_view, create_inventory_lot, MedicationView};
use crate::error::ApiError;
use crate::models::{validate_medication_changes, validate_new_medication};
use crate::AppState;

fn medication_not_found(med_id: i64) -> ApiError {
    ApiError::not_found(format!("Medication {med_id} not found"))
}

/// GET /inventory/view
/// Medications with their stock lots and guideline documents
pub async fn view(State(state): State<AppState>) -> Result<AppJson<Vec<MedicationView>>, ApiError> {
    Ok(AppJson(compose_medication_view(&state.stores).await?))
}

/// GET /inventory/medication
pub async fn list_medications(
    State(state): State<AppState>,
) -> Result<AppJson<Vec<Medication>>, ApiError> {
    Ok(AppJson(state.stores.relational.medications().await?))
}

/// POST /inventory/medication
pub async fn create_medication(
    State(state): State<AppState>,
    AppJson(payload): AppJson<NewMedication>,
) -> Result<AppJson<Medication>, ApiError> {
    validate_new_medication(&payload)?;
    let medication = state.stores.relational.insert_medication(payload).await?;
    tracing::info!("✓ Created medication {} ({})", medication.med_id, medication.name);
    Ok(AppJson(medication))
}

/// GET /inventory/medication/:id
pub async fn get_medication(
    State(state): State<AppState>,
    AppPath(med_id): AppPath<i64>,
) -> Result<AppJson<Medication>, ApiError> {
    state
        .stores
        .relational
        .medication(med_id)
        .await?
        .map(AppJson)
        .ok_or_else(|| medication_not_found(med_id))
}

/// PUT /inventory/medication/:id
pub async fn update_medication(
    State(state): State<AppState>,
    AppPath(med_id): AppPath<i64>,
    AppJson(payload): AppJson<MedicationChanges>,
) -> Result<AppJson<Medication>, ApiError> {
    validate_medication_changes(&payload)?;
    let medication = state
        .stores
        .relational
        .update_medication(med_id, payload)
        .await?
        .ok_or_else(|| medication_not_found(med_id))?;
    tracing::info!("✓ Updated medication {}", med_id);
    Ok(AppJson(medication))
}

/// DELETE /inventory/medication/:id
/// Stock lots, treatments and MedInfo referring to it are kept
pub async fn delete_medication(
    State(state): State<AppState>,
    AppPath(med_id): AppPath<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.stores.relational.delete_medication(med_id).await? {
        return Err(medication_not_found(med_id));
    }
    tracing::info!("✓ Deleted medication {}", med_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /inventory/stock
pub async fn list_stock(
    State(state): State<AppState>,
) -> Result<AppJson<Vec<InventoryLot>>, ApiError> {
    Ok(AppJson(state.stores.relational.inventory_lots().await?))
}

/// POST /inventory/stock
pub async fn create_stock(
    State(state): State<AppState>,
    AppJson(payload): AppJson<NewInventoryLot>,
) -> Result<AppJson<InventoryLot>, ApiError> {
    Ok(AppJson(create_inventory_lot(&state.stores, payload).await?))
}

/// DELETE /inventory/stock/:id
pub async fn delete_stock(
    State(state): State<AppState>,
    AppPath(inv_id): AppPath<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.stores.relational.delete_inventory_lot(inv_id).await? {
        return Err(ApiError::not_found(format!("Stock lot {inv_id} not found")));
    }
    tracing::info!("✓ Deleted stock lot {}", inv_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /inventory/medinfo
pub async fn list_med_info(State(state): State<AppState>) -> Result<AppJson<Vec<MedInfo>>, ApiError> {
    Ok(AppJson(state.stores.documents.all_med_info().await?))
}

/// POST /inventory/medinfo
/// One document per medication; a second one is rejected
pub async fn create_med_info(
    State(state): State<AppState>,
    AppJson(payload): AppJson<MedInfo>,
) -> Result<AppJson<MedInfo>, ApiError> {
    let duplicate = || {
        ApiError::Duplicate(format!(
            "MedInfo for medication {} already exists",
            payload.med_id
        ))
    };
    let documents = &state.stores.documents;
    if documents.med_info(payload.med_id).await?.is_some() {
        return Err(duplicate());
    }
    // A concurrent insert passes the check; the unique index catches it.
    match documents.insert_med_info(&payload).await {
        Ok(_) => {}
        Err(e) if e.is_unique_violation() => return Err(duplicate()),
        Err(e) => return Err(e.into()),
    }
    tracing::info!("✓ Created MedInfo for medication {}", payload.med_id);
    Ok(AppJson(payload))
}
