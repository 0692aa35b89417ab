use axum::extract::State;
use clinic_db::models::NewStaff;

use super::AppJson;
use crate::auth::{hash_password, verify_password, CurrentIdentity, Identity, Role};
use crate::error::ApiError;
use crate::models::{
    LoginRequest, PatientLoginRequest, RegisterRequest, RegisterResponse, TokenResponse,
};
use crate::AppState;

/// POST /auth/register
/// Create a staff account
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<AppJson<RegisterResponse>, ApiError> {
    payload.validate()?;

    let relational = &state.stores.relational;
    if relational.staff_by_username(&payload.username).await?.is_some() {
        return Err(ApiError::conflict(
            "USERNAME_TAKEN",
            format!("Username {} is already registered", payload.username),
        ));
    }

    let password_hash = hash_password(payload.password, state.bcrypt_cost).await?;
    let role = Role::from(payload.role);
    // A concurrent registration can still win the race; the unique
    // constraint turns that into the same conflict.
    let staff = relational
        .insert_staff(NewStaff {
            username: payload.username,
            password_hash,
            name: payload.name,
            role: role.as_str().to_string(),
        })
        .await?;

    tracing::info!("✓ Registered {} {} (staff_id={})", staff.role, staff.username, staff.staff_id);
    Ok(AppJson(RegisterResponse {
        message: "User Created successfully.".to_string(),
        staff_id: staff.staff_id,
    }))
}

/// POST /auth/login
/// Staff login by username and password
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<AppJson<TokenResponse>, ApiError> {
    let staff = state
        .stores
        .relational
        .staff_by_username(&payload.username)
        .await?;

    // Unknown usernames still pay for one verification.
    let hash = staff
        .as_ref()
        .map_or_else(|| state.decoy_hash(), |s| s.password_hash.clone());
    let verified = verify_password(payload.password, hash).await?;
    let staff = match staff {
        Some(staff) if verified => staff,
        _ => return Err(ApiError::InvalidCredentials),
    };

    let identity = Identity::new(staff.staff_id, staff.role, staff.name);
    let token = state.tokens.issue(&identity)?;
    Ok(AppJson(TokenResponse::bearer(
        token,
        identity.role.as_str(),
        None,
    )))
}

/// POST /auth/patient/login
/// Patient login by citizen id and password
pub async fn patient_login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<PatientLoginRequest>,
) -> Result<AppJson<TokenResponse>, ApiError> {
    let patient = state
        .stores
        .relational
        .patient_by_citizen_id(&payload.citizen_id)
        .await?;

    let hash = patient
        .as_ref()
        .map_or_else(|| state.decoy_hash(), |p| p.password_hash.clone());
    let verified = verify_password(payload.password, hash).await?;
    let patient = match patient {
        Some(patient) if verified => patient,
        _ => return Err(ApiError::InvalidCredentials),
    };

    let identity = Identity::new(patient.p_id, Role::Patient, patient.name);
    let token = state.tokens.issue(&identity)?;
    Ok(AppJson(TokenResponse::bearer(
        token,
        Role::Patient.as_str(),
        Some(patient.p_id),
    )))
}

/// GET /auth/me
pub async fn me(CurrentIdentity(identity): CurrentIdentity) -> AppJson<Identity> {
    AppJson(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use clinic_db::Stores;

    use crate::handlers::test_support::{state, state_with};

    fn register_request(username: &str, password: &str, role: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            name: format!("{username} name"),
            role: role.to_string(),
        }
    }

    async fn login_as(state: &AppState, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        login(
            State(state.clone()),
            AppJson(LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            }),
        )
        .await
        .map(|AppJson(body)| body)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let state = state();
        let AppJson(created) = register(
            State(state.clone()),
            AppJson(register_request("house", "vicodin", "Doctor")),
        )
        .await
        .unwrap();
        assert!(created.staff_id > 0);

        let token = login_as(&state, "house", "vicodin").await.unwrap();
        assert_eq!(token.role, "doctor");
        assert_eq!(token.token_type, "bearer");

        let identity = state.tokens.validate(&token.access_token).unwrap();
        assert_eq!(identity.subject_id, created.staff_id);
        assert_eq!(identity.role, Role::Doctor);
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let state = state();
        register(State(state.clone()), AppJson(register_request("nok", "pw", "pharmacist")))
            .await
            .unwrap();

        let err = register(State(state), AppJson(register_request("nok", "other", "doctor")))
            .await
            .unwrap_err();
        match err {
            ApiError::Conflict { code, .. } => assert_eq!(code, "USERNAME_TAKEN"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_are_identical() {
        let state = state();
        register(State(state.clone()), AppJson(register_request("house", "vicodin", "doctor")))
            .await
            .unwrap();

        let wrong_password = login_as(&state, "house", "aspirin").await.unwrap_err();
        let unknown_user = login_as(&state, "wilson", "vicodin").await.unwrap_err();

        assert!(matches!(wrong_password, ApiError::InvalidCredentials));
        assert!(matches!(unknown_user, ApiError::InvalidCredentials));
        assert_eq!(wrong_password.status(), unknown_user.status());
        assert_eq!(wrong_password.body(), unknown_user.body());
    }

    async fn fastest_failure(state: &AppState, username: &str) -> Duration {
        let mut fastest = Duration::MAX;
        for _ in 0..3 {
            let started = Instant::now();
            let err = login_as(state, username, "aspirin").await.unwrap_err();
            assert!(matches!(err, ApiError::InvalidCredentials));
            fastest = fastest.min(started.elapsed());
        }
        fastest
    }

    #[tokio::test]
    async fn test_unknown_user_costs_a_verification() {
        let state = state_with(Stores::in_memory(), 10);
        register(State(state.clone()), AppJson(register_request("house", "vicodin", "doctor")))
            .await
            .unwrap();

        let wrong_password = fastest_failure(&state, "house").await;
        let unknown_user = fastest_failure(&state, "wilson").await;

        // Without a verification the unknown user path returns in microseconds.
        assert!(
            unknown_user * 3 >= wrong_password,
            "unknown user {unknown_user:?} vs wrong password {wrong_password:?}"
        );
    }

    #[test]
    fn test_decoy_hash_uses_configured_cost() {
        assert!(state().decoy_hash().starts_with("$2b$04$"));
        assert!(state_with(Stores::in_memory(), 10).decoy_hash().starts_with("$2b$10$"));
    }

    #[tokio::test]
    async fn test_patient_role_cannot_register() {
        let err = register(State(state()), AppJson(register_request("p", "pw", "patient")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_patient_login_unknown_citizen_id() {
        let err = patient_login(
            State(state()),
            AppJson(PatientLoginRequest {
                citizen_id: "1103700000001".to_string(),
                password: "1103700000001".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }
}
