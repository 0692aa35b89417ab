pub mod auth;
pub mod history;
pub mod inventory;
pub mod patients;
pub mod staff;

use axum::extract::{FromRequest, FromRequestParts};
use chrono::Utc;
use clinic_db::models::EventLog;
use clinic_db::Documents;
use serde::Serialize;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::models::HealthResponse;

/// `Json` whose rejections come back as `VALIDATION_ERROR` bodies.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

impl<T: Serialize> axum::response::IntoResponse for AppJson<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self.0).into_response()
    }
}

/// `Path` whose rejections come back as `VALIDATION_ERROR` bodies.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

/// Appends an audit entry for the acting staff member. Failures are logged
/// and never reach the caller.
pub(crate) async fn record_event(
    documents: &Documents,
    actor: &Identity,
    action: &str,
    description: String,
) {
    let event = EventLog {
        staff_id: actor.subject_id,
        date: Utc::now(),
        action: action.to_string(),
        description: Some(description),
    };
    if let Err(e) = documents.append_event(&event).await {
        tracing::warn!(
            "Failed to record {} event for staff {}: {}",
            action,
            actor.subject_id,
            e
        );
    }
}

/// GET /health
pub async fn health() -> AppJson<HealthResponse> {
    AppJson(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
