//! Authentication Module
//!
//! Issues and validates HS256 JWTs for logged-in users and resolves the
//! caller's user id from the `Authorization` header.

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::config::SecurityConfig;
use crate::error::{AppError, Result};
use crate::models::User;

/// Message returned when no credentials are supplied
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required";

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User role
    pub role: String,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token not before timestamp
    pub nbf: usize,
    /// Issued at timestamp
    pub iat: usize,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Unique token ID
    pub jti: String,
}

impl Claims {
    /// Create new claims
    pub fn new(sub: &str, role: &str, expiry_seconds: u64, issuer: &str, audience: &str) -> Self {
        let iat = Utc::now().timestamp().max(0) as usize;

        Self {
            sub: sub.to_string(),
            role: role.to_string(),
            exp: iat + expiry_seconds as usize,
            nbf: iat,
            iat,
            iss: issuer.to_string(),
            aud: audience.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// A signed token together with its expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT issuing and validation
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    expiry_seconds: u64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiry_seconds", &self.expiry_seconds)
            .finish()
    }
}

impl TokenService {
    /// Create new token service
    pub fn new(secret: &str, issuer: &str, audience: &str, expiry_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            expiry_seconds,
        }
    }

    /// Create from security settings
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_issuer,
            &config.jwt_audience,
            config.jwt_expiry_seconds,
        )
    }

    /// Issue a token for the user
    pub fn issue(&self, user: &User) -> Result<IssuedToken> {
        let claims = Claims::new(
            &user.id,
            user.role.as_str(),
            self.expiry_seconds,
            &self.issuer,
            &self.audience,
        );

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
            .unwrap_or_else(|| Utc::now() + Duration::seconds(self.expiry_seconds as i64));

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a token and return its claims
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.validate_nbf = true;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

/// Extract the bearer credential from the `Authorization` header
///
/// A missing `Bearer ` prefix leaves the value as-is.
pub fn bearer_credential(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Authentication(AUTH_REQUIRED_MESSAGE.to_string()))?;

    let credential = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if credential.is_empty() {
        return Err(AppError::Authentication(AUTH_REQUIRED_MESSAGE.to_string()));
    }
    Ok(credential)
}

/// Resolve the caller's user id
///
/// A valid token yields its subject. Otherwise the credential itself is the
/// user id when `allow_raw_user_id` is set.
pub fn resolve_user_id(
    headers: &HeaderMap,
    tokens: &TokenService,
    allow_raw_user_id: bool,
) -> Result<String> {
    let credential = bearer_credential(headers)?;

    match tokens.validate(credential) {
        Ok(claims) => Ok(claims.sub),
        Err(_) if allow_raw_user_id => Ok(credential.to_string()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use axum::http::HeaderValue;

    fn service() -> TokenService {
        TokenService::new(
            "test-secret-that-is-at-least-32-characters",
            "ai-tutor",
            "ai-tutor-api",
            3600,
        )
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_issue_and_validate() {
        let user = User::new("a@b.com", "hash".into(), "Asha", UserRole::Student);
        let issued = service().issue(&user).unwrap();

        let claims = service().validate(&issued.token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, "STUDENT");
        assert!(claims.exp as i64 > Utc::now().timestamp());
        assert!(issued.expires_at > Utc::now());
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let user = User::new("a@b.com", "hash".into(), "Asha", UserRole::Student);
        let other = TokenService::new(
            "another-secret-that-is-at-least-32-chars",
            "ai-tutor",
            "ai-tutor-api",
            3600,
        );
        let issued = other.issue(&user).unwrap();
        assert!(matches!(
            service().validate(&issued.token),
            Err(AppError::Authentication(_))
        ));
    }

    #[test]
    fn test_missing_header_requires_authentication() {
        let err = resolve_user_id(&HeaderMap::new(), &service(), true).unwrap_err();
        assert!(matches!(err, AppError::Authentication(ref m) if m == AUTH_REQUIRED_MESSAGE));

        let err = resolve_user_id(&headers("Bearer "), &service(), true).unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[test]
    fn test_resolve_prefers_token_subject() {
        let user = User::new("a@b.com", "hash".into(), "Asha", UserRole::Teacher);
        let issued = service().issue(&user).unwrap();
        let header = format!("Bearer {}", issued.token);

        assert_eq!(resolve_user_id(&headers(&header), &service(), false).unwrap(), user.id);
    }

    #[test]
    fn test_raw_user_id_fallback() {
        assert_eq!(
            resolve_user_id(&headers("Bearer user-123"), &service(), true).unwrap(),
            "user-123"
        );
        assert_eq!(
            resolve_user_id(&headers("user-123"), &service(), true).unwrap(),
            "user-123"
        );
        assert!(resolve_user_id(&headers("Bearer user-123"), &service(), false).is_err());
    }
}
