use axum::{extract::State, http::StatusCode};
use clinic_db::models::{NewPatient, NewTreatment, PatientRecord, Treatment};

use super::{record_event, AppJson, AppPath};
use crate::access::{require_doctor, scope_patient_list};
use crate::auth::{hash_password, CurrentIdentity, Identity};
use crate::error::ApiError;
use crate::models::{CreatePatientRequest, CreateTreatmentRequest, UpdatePatientRequest};
use crate::AppState;

fn patient_not_found(p_id: i64) -> ApiError {
    ApiError::not_found(format!("Patient {p_id} not found"))
}

/// GET /patients
/// Patients visible to the caller's role
pub async fn list_patients(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<AppJson<Vec<PatientRecord>>, ApiError> {
    let scope = scope_patient_list(&identity)?;
    let patients = state.stores.relational.patients(scope).await?;
    Ok(AppJson(patients))
}

/// POST /patients
/// Provision a patient account assigned to the calling doctor. The initial
/// password is the citizen id.
pub async fn create_patient(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    AppJson(payload): AppJson<CreatePatientRequest>,
) -> Result<(StatusCode, AppJson<PatientRecord>), ApiError> {
    require_doctor(&identity)?;
    payload.validate()?;

    let relational = &state.stores.relational;
    if relational
        .patient_by_citizen_id(&payload.citizen_id)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(
            "CITIZEN_ID_TAKEN",
            format!("Citizen id {} is already registered", payload.citizen_id),
        ));
    }

    let password_hash = hash_password(payload.citizen_id.clone(), state.bcrypt_cost).await?;
    let patient = relational
        .insert_patient(NewPatient {
            name: payload.name,
            citizen_id: payload.citizen_id,
            password_hash,
            age: payload.age,
            gender: payload.gender,
            doctor_id: Some(identity.subject_id),
        })
        .await?;

    tracing::info!("✓ Created patient {} for doctor {}", patient.p_id, identity.subject_id);
    record_event(
        &state.stores.documents,
        &identity,
        "create_patient",
        format!("p_id={}", patient.p_id),
    )
    .await;

    Ok((StatusCode::CREATED, AppJson(patient)))
}

async fn ensure_in_scope(state: &AppState, identity: &Identity, p_id: i64) -> Result<(), ApiError> {
    let scope = scope_patient_list(identity)?;
    match state.stores.relational.patient(p_id, scope).await? {
        Some(_) => Ok(()),
        None => Err(patient_not_found(p_id)),
    }
}

/// GET /patients/:id
/// Out-of-scope patients are reported as missing
pub async fn get_patient(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    AppPath(p_id): AppPath<i64>,
) -> Result<AppJson<PatientRecord>, ApiError> {
    let scope = scope_patient_list(&identity)?;
    let patient = state
        .stores
        .relational
        .patient(p_id, scope)
        .await?
        .ok_or_else(|| patient_not_found(p_id))?;
    Ok(AppJson(patient))
}

/// PUT /patients/:id
/// Doctors may only update their own patients; others are reported as missing
pub async fn update_patient(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    AppPath(p_id): AppPath<i64>,
    AppJson(payload): AppJson<UpdatePatientRequest>,
) -> Result<AppJson<PatientRecord>, ApiError> {
    require_doctor(&identity)?;
    let changes = payload.into_changes()?;

    ensure_in_scope(&state, &identity, p_id).await?;
    let patient = state
        .stores
        .relational
        .update_patient(p_id, changes)
        .await?
        .ok_or_else(|| patient_not_found(p_id))?;

    tracing::info!("✓ Updated patient {}", p_id);
    record_event(
        &state.stores.documents,
        &identity,
        "update_patient",
        format!("p_id={p_id}"),
    )
    .await;

    Ok(AppJson(patient))
}

/// DELETE /patients/:id
/// Hard delete, scoped like updates; treatments and history documents are
/// left in place
pub async fn delete_patient(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    AppPath(p_id): AppPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_doctor(&identity)?;
    ensure_in_scope(&state, &identity, p_id).await?;

    if !state.stores.relational.delete_patient(p_id).await? {
        return Err(patient_not_found(p_id));
    }

    tracing::info!("✓ Deleted patient {}", p_id);
    record_event(
        &state.stores.documents,
        &identity,
        "delete_patient",
        format!("p_id={p_id}"),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /patients/:id/treatments
pub async fn list_treatments(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    AppPath(p_id): AppPath<i64>,
) -> Result<AppJson<Vec<Treatment>>, ApiError> {
    let scope = scope_patient_list(&identity)?;
    let relational = &state.stores.relational;
    if relational.patient(p_id, scope).await?.is_none() {
        return Err(patient_not_found(p_id));
    }
    Ok(AppJson(relational.treatments_for(p_id).await?))
}

/// POST /patients/:id/treatments
/// Both the patient and the medication must exist
pub async fn create_treatment(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    AppPath(p_id): AppPath<i64>,
    AppJson(payload): AppJson<CreateTreatmentRequest>,
) -> Result<(StatusCode, AppJson<Treatment>), ApiError> {
    require_doctor(&identity)?;
    payload.validate()?;

    let relational = &state.stores.relational;
    let scope = scope_patient_list(&identity)?;
    if relational.patient(p_id, scope).await?.is_none() {
        return Err(patient_not_found(p_id));
    }
    if relational.medication(payload.med_id).await?.is_none() {
        return Err(ApiError::not_found(format!(
            "Medication {} not found",
            payload.med_id
        )));
    }

    let treatment = relational
        .insert_treatment(NewTreatment {
            p_id,
            med_id: payload.med_id,
            amount: payload.amount,
            date: payload.date,
        })
        .await?;

    tracing::info!("✓ Added treatment {} for patient {}", treatment.t_id, p_id);
    record_event(
        &state.stores.documents,
        &identity,
        "create_treatment",
        format!("t_id={} p_id={} med_id={}", treatment.t_id, p_id, treatment.med_id),
    )
    .await;

    Ok((StatusCode::CREATED, AppJson(treatment)))
}
