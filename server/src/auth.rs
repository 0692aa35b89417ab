//! Identity and token service: bearer tokens, password hashing and the
//! extractor that turns an `Authorization` header into an [`Identity`].

use std::fmt;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

/// Role carried by every identity. Unknown staff roles are kept verbatim so
/// they can be rejected by the access rules rather than at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Doctor,
    Pharmacist,
    Patient,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Doctor => "doctor",
            Role::Pharmacist => "pharmacist",
            Role::Patient => "patient",
            Role::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "doctor" => Role::Doctor,
            "pharmacist" => Role::Pharmacist,
            "patient" => Role::Patient,
            _ => Role::Other(normalized),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is calling: a staff member (`subject_id` = staff_id) or a patient
/// (`subject_id` = p_id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject_id: i64,
    pub role: Role,
    pub name: String,
}

impl Identity {
    pub fn new(subject_id: i64, role: impl Into<Role>, name: impl Into<String>) -> Self {
        Self {
            subject_id,
            role: role.into(),
            name: name.into(),
        }
    }
}

/// JWT payload.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    role: String,
    name: String,
    iat: i64,
    exp: i64,
}

/// Issues and validates HS256 tokens with a fixed lifetime.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, identity: &Identity) -> Result<String, ApiError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issues a token as if the current time were `issued_at`.
    pub fn issue_at(&self, identity: &Identity, issued_at: DateTime<Utc>) -> Result<String, ApiError> {
        let claims = Claims {
            sub: identity.subject_id,
            role: identity.role.as_str().to_string(),
            name: identity.name.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to encode token: {e}")))
    }

    /// Checks signature and expiry. Every failure collapses into
    /// [`ApiError::Unauthorized`].
    pub fn validate(&self, token: &str) -> Result<Identity, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            ApiError::Unauthorized
        })?;
        let claims = data.claims;
        Ok(Identity::new(claims.sub, claims.role, claims.name))
    }
}

/// Hashes on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("Hashing task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("Verification task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("Failed to verify password: {e}")))
}

/// Token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Extractor for routes that require a valid bearer token.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let identity = state.tokens.validate(token)?;
        Ok(CurrentIdentity(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use tokio_test::{assert_err, assert_ok};

    fn service() -> TokenService {
        TokenService::new(b"test-secret-with-enough-entropy-1234", Duration::minutes(600))
    }

    #[test]
    fn test_issue_then_validate_returns_same_identity() {
        let tokens = service();
        for identity in [
            Identity::new(5, Role::Doctor, "Dr. Somsak"),
            Identity::new(12, Role::Pharmacist, "Nok"),
            Identity::new(7, Role::Patient, "Malee"),
            Identity::new(3, "nurse", "Ploy"),
        ] {
            let token = tokens.issue(&identity).unwrap();
            assert_eq!(tokens.validate(&token).unwrap(), identity);
        }
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let tokens = service();
        let identity = Identity::new(5, Role::Doctor, "Dr. Somsak");
        let issued_at = Utc::now() - Duration::minutes(601);
        let token = tokens.issue_at(&identity, issued_at).unwrap();

        assert!(matches!(tokens.validate(&token), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_unauthorized() {
        let identity = Identity::new(1, Role::Pharmacist, "Nok");
        let foreign = TokenService::new(b"another-secret", Duration::minutes(600))
            .issue(&identity)
            .unwrap();

        assert!(matches!(service().validate(&foreign), Err(ApiError::Unauthorized)));
        assert!(matches!(service().validate("not.a.jwt"), Err(ApiError::Unauthorized)));
        assert!(matches!(service().validate(""), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from("Doctor"), Role::Doctor);
        assert_eq!(Role::from(" pharmacist "), Role::Pharmacist);
        assert_eq!(Role::from("patient"), Role::Patient);
        assert_eq!(Role::from("admin"), Role::Other("admin".to_string()));
        assert_eq!(Role::from(" Nurse "), Role::Other("nurse".to_string()));
        assert_eq!(Role::from(" Nurse ").as_str(), "nurse");
        assert_eq!(String::from(Role::Pharmacist), "pharmacist");

        let json = serde_json::to_value(Identity::new(1, Role::Doctor, "A")).unwrap();
        assert_eq!(json["role"], "doctor");
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(bearer_token(&headers), Some("xyz"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());
    }

    #[tokio::test]
    async fn test_password_hash_and_verify() {
        let hash = assert_ok!(hash_password("1103700000001".to_string(), 4).await);
        assert_ne!(hash, "1103700000001");
        assert!(assert_ok!(verify_password("1103700000001".to_string(), hash.clone()).await));
        assert!(!assert_ok!(verify_password("wrong".to_string(), hash).await));
        assert_err!(verify_password("x".to_string(), "not-a-bcrypt-hash".to_string()).await);
    }
}
