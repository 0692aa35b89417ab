//! Patient history documents: one per patient, created once and then
//! merge-patched.

use clinic_db::models::{PatientHistory, PatientHistoryPatch};
use clinic_db::Documents;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A list field as sent by clients: either `"a, b"` or `["a", "b"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldInput {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for FieldInput {
    fn from(value: &str) -> Self {
        FieldInput::Text(value.to_string())
    }
}

impl From<Vec<String>> for FieldInput {
    fn from(value: Vec<String>) -> Self {
        FieldInput::List(value)
    }
}

/// Trimmed, non-empty entries. Text is split on commas; list items are kept
/// whole, so normalizing an already normalized list returns it unchanged.
pub fn normalize(input: &FieldInput) -> Vec<String> {
    let clean = |item: &str| {
        let item = item.trim();
        (!item.is_empty()).then(|| item.to_string())
    };
    match input {
        FieldInput::Text(text) => text.split(',').filter_map(clean).collect(),
        FieldInput::List(items) => items.iter().map(String::as_str).filter_map(clean).collect(),
    }
}

/// Body of both create and update. On update, absent or null fields keep
/// their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryInput {
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<FieldInput>,
    #[serde(default)]
    pub medication: Option<FieldInput>,
    #[serde(default)]
    pub allergies: Option<FieldInput>,
}

impl HistoryInput {
    fn into_patch(self) -> PatientHistoryPatch {
        PatientHistoryPatch {
            history: self.history,
            diagnosis: self.diagnosis.as_ref().map(normalize),
            medication: self.medication.as_ref().map(normalize),
            allergies: self.allergies.as_ref().map(normalize),
        }
    }
}

pub async fn get(documents: &Documents, p_id: i64) -> Result<PatientHistory, ApiError> {
    documents
        .patient_history(p_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No history for patient {p_id}")))
}

/// Fails with `Conflict` when the patient already has a history; the stored
/// document is left untouched.
pub async fn create(
    documents: &Documents,
    p_id: i64,
    input: HistoryInput,
) -> Result<PatientHistory, ApiError> {
    let exists = || {
        ApiError::conflict(
            "HISTORY_EXISTS",
            format!("Patient {p_id} already has a history"),
        )
    };
    if documents.patient_history(p_id).await?.is_some() {
        return Err(exists());
    }

    let patch = input.into_patch();
    let history = PatientHistory {
        p_id,
        history: patch.history,
        diagnosis: patch.diagnosis.unwrap_or_default(),
        medication: patch.medication.unwrap_or_default(),
        allergies: patch.allergies.unwrap_or_default(),
    };
    match documents.insert_patient_history(&history).await {
        Ok(_) => {}
        Err(e) if e.is_unique_violation() => return Err(exists()),
        Err(e) => return Err(e.into()),
    }

    tracing::info!("✓ Created history for patient {}", p_id);
    Ok(history)
}

pub async fn update(
    documents: &Documents,
    p_id: i64,
    input: HistoryInput,
) -> Result<PatientHistory, ApiError> {
    let patch = input.into_patch();
    let updated = documents
        .patch_patient_history(p_id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No history for patient {p_id}")))?;

    tracing::info!("✓ Updated history for patient {}", p_id);
    Ok(updated)
}
