//! HTTP API of the clinic backend.

pub mod access;
pub mod auth;
pub mod compose;
pub mod config;
pub mod error;
pub mod handlers;
pub mod history;
pub mod models;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use clinic_db::Stores;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::TokenService;
use crate::config::{AppConfig, ConfigError};
use crate::error::ApiError;

/// Shared by every request: the two store clients and the token service.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub tokens: Arc<TokenService>,
    pub bcrypt_cost: u32,
    /// Hash verified against when a login names no account, so both failure
    /// paths pay for one bcrypt verification.
    decoy_hash: Arc<str>,
}

impl AppState {
    pub fn new(stores: Stores, config: &AppConfig) -> Result<Self, ApiError> {
        let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl);
        Self::with_tokens(stores, tokens, config.bcrypt_cost)
    }

    pub fn with_tokens(
        stores: Stores,
        tokens: TokenService,
        bcrypt_cost: u32,
    ) -> Result<Self, ApiError> {
        let decoy_hash = bcrypt::hash("clinic-login-decoy", bcrypt_cost)
            .map_err(|e| ApiError::Internal(format!("Failed to prepare decoy hash: {e}")))?;
        Ok(Self {
            stores,
            tokens: Arc::new(tokens),
            bcrypt_cost,
            decoy_hash: decoy_hash.into(),
        })
    }

    pub(crate) fn decoy_hash(&self) -> String {
        self.decoy_hash.to_string()
    }
}

/// All routes, without middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/patient/login", post(handlers::auth::patient_login))
        .route("/auth/me", get(handlers::auth::me))
        .route(
            "/patients",
            get(handlers::patients::list_patients).post(handlers::patients::create_patient),
        )
        .route(
            "/patients/:id",
            get(handlers::patients::get_patient)
                .put(handlers::patients::update_patient)
                .delete(handlers::patients::delete_patient),
        )
        .route(
            "/patients/:id/treatments",
            get(handlers::patients::list_treatments).post(handlers::patients::create_treatment),
        )
        .route(
            "/patients/:id/history",
            get(handlers::history::get_history)
                .post(handlers::history::create_history)
                .put(handlers::history::update_history),
        )
        .route("/inventory/view", get(handlers::inventory::view))
        .route(
            "/inventory/medication",
            get(handlers::inventory::list_medications).post(handlers::inventory::create_medication),
        )
        .route(
            "/inventory/medication/:id",
            get(handlers::inventory::get_medication)
                .put(handlers::inventory::update_medication)
                .delete(handlers::inventory::delete_medication),
        )
        .route(
            "/inventory/stock",
            get(handlers::inventory::list_stock).post(handlers::inventory::create_stock),
        )
        .route(
            "/inventory/stock/:id",
            axum::routing::delete(handlers::inventory::delete_stock),
        )
        .route(
            "/inventory/medinfo",
            get(handlers::inventory::list_med_info).post(handlers::inventory::create_med_info),
        )
        .route("/staff", get(handlers::staff::list_staff))
        .route(
            "/staff/:id",
            get(handlers::staff::get_staff).delete(handlers::staff::delete_staff),
        )
        .route("/staff/me/events", get(handlers::staff::my_events))
        .with_state(state)
}

/// Permissive when no origins are configured.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, ConfigError> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| ConfigError(format!("invalid CORS origin: {origin}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Routes wrapped in request tracing and CORS.
pub fn app(state: AppState, cors: CorsLayer) -> Router {
    router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn test_app() -> (AppState, Router) {
        let state = handlers::test_support::state();
        (state.clone(), app(state, CorsLayer::permissive()))
    }

    #[tokio::test]
    async fn test_health_route() {
        let (_, app) = test_app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_route_without_token_is_unauthorized() {
        let (_, app) = test_app();
        let response = app
            .oneshot(Request::get("/patients").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_json_is_validation_error() {
        let (state, app) = test_app();
        let token = state.tokens.issue(&handlers::test_support::doctor(5)).unwrap();
        let response = app
            .oneshot(
                Request::post("/patients")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name": "Malee"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_validation_error() {
        let (_, app) = test_app();
        let response = app
            .oneshot(Request::get("/patients/abc/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "VALIDATION_ERROR");
        assert_eq!(body["field"], "id");
    }

    #[test]
    fn test_cors_layer_rejects_bad_origin() {
        assert!(cors_layer(&[]).is_ok());
        assert!(cors_layer(&["http://localhost:3000".to_string()]).is_ok());
        assert!(cors_layer(&["bad\norigin".to_string()]).is_err());
    }
}
