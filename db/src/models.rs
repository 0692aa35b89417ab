use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Relational records

/// Staff account row. The password hash never leaves the process.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct StaffRecord {
    pub staff_id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct NewStaff {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
}

/// Patient row. `doctor_id` is a soft reference to the assigned doctor.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct PatientRecord {
    pub p_id: i64,
    pub name: String,
    pub citizen_id: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub age: i64,
    pub gender: String,
    pub doctor_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewPatient {
    pub name: String,
    pub citizen_id: String,
    pub password_hash: String,
    pub age: i64,
    pub gender: String,
    pub doctor_id: Option<i64>,
}

/// Partial patient update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientChanges {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Medication {
    pub med_id: i64,
    pub name: String,
    pub common_name: Option<String>,
    pub price: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMedication {
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    pub price: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MedicationChanges {
    pub name: Option<String>,
    pub common_name: Option<String>,
    pub price: Option<i64>,
}

/// One stock lot of a medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InventoryLot {
    pub inv_id: i64,
    pub med_id: i64,
    pub in_day: NaiveDate,
    pub exp_day: NaiveDate,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInventoryLot {
    pub med_id: i64,
    pub in_day: NaiveDate,
    pub exp_day: NaiveDate,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Treatment {
    pub t_id: i64,
    pub p_id: i64,
    pub med_id: i64,
    pub amount: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewTreatment {
    pub p_id: i64,
    pub med_id: i64,
    pub amount: i64,
    pub date: NaiveDate,
}

// Documents

/// Guideline and warning text for a medication, keyed by `med_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedInfo {
    pub med_id: i64,
    #[serde(default)]
    pub guideline: Option<String>,
    #[serde(default)]
    pub warning: Option<String>,
}

/// Clinical notes for a patient, keyed by `p_id`. List fields are always
/// stored in normalized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientHistory {
    pub p_id: i64,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub diagnosis: Vec<String>,
    #[serde(default)]
    pub medication: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
}

/// Fields to overwrite on an existing history document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatientHistoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medication: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,
}

impl PatientHistoryPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Audit entry written when a staff member mutates clinical data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    pub staff_id: i64,
    pub date: DateTime<Utc>,
    pub action: String,
    #[serde(default)]
    pub description: Option<String>,
}
