//! Request and response bodies of the HTTP API.

use chrono::NaiveDate;
use clinic_db::models::{MedicationChanges, NewMedication, PatientChanges};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// bcrypt only looks at the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: i64) -> Result<(), ApiError> {
    if value < 0 {
        return Err(ApiError::validation(field, "must not be negative"));
    }
    Ok(())
}

// Auth

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text("username", &self.username)?;
        require_text("name", &self.name)?;
        if self.password.is_empty() || self.password.len() > MAX_PASSWORD_BYTES {
            return Err(ApiError::validation(
                "password",
                format!("must be 1 to {MAX_PASSWORD_BYTES} bytes"),
            ));
        }
        require_text("role", &self.role)?;
        if self.role.trim().eq_ignore_ascii_case("patient") {
            return Err(ApiError::validation(
                "role",
                "patient accounts are created by a doctor",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub staff_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientLoginRequest {
    pub citizen_id: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub p_id: Option<i64>,
}

impl TokenResponse {
    pub fn bearer(access_token: String, role: impl Into<String>, p_id: Option<i64>) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            role: role.into(),
            p_id,
        }
    }
}

// Patients

/// New patient. Any `doctor_id` in the body is ignored; the creating doctor
/// is always assigned.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
    pub citizen_id: String,
    pub age: i64,
    pub gender: String,
}

impl CreatePatientRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text("name", &self.name)?;
        let citizen_id = self.citizen_id.as_str();
        if citizen_id.is_empty()
            || citizen_id.len() > 13
            || !citizen_id.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ApiError::validation("citizen_id", "must be 1 to 13 digits"));
        }
        require_non_negative("age", self.age)?;
        require_text("gender", &self.gender)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePatientRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl UpdatePatientRequest {
    pub fn into_changes(self) -> Result<PatientChanges, ApiError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(age) = self.age {
            require_non_negative("age", age)?;
        }
        if let Some(gender) = &self.gender {
            require_text("gender", gender)?;
        }
        Ok(PatientChanges {
            name: self.name,
            age: self.age,
            gender: self.gender,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTreatmentRequest {
    pub med_id: i64,
    pub amount: i64,
    pub date: NaiveDate,
}

impl CreateTreatmentRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.amount <= 0 {
            return Err(ApiError::validation("amount", "must be positive"));
        }
        Ok(())
    }
}

// Inventory

pub fn validate_new_medication(medication: &NewMedication) -> Result<(), ApiError> {
    require_text("name", &medication.name)?;
    require_non_negative("price", medication.price)
}

pub fn validate_medication_changes(changes: &MedicationChanges) -> Result<(), ApiError> {
    if let Some(name) = &changes.name {
        require_text("name", name)?;
    }
    if let Some(price) = changes.price {
        require_non_negative("price", price)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
