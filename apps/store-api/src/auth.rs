//! JWT authentication module.
//!
//! The identity provider is consumed as an opaque oracle: a bearer token
//! goes in, a [`Principal`] comes out (or a typed failure). Verification is
//! HMAC via jsonwebtoken; token *issuance* lives with the identity service
//! and is only mirrored here for tests and local tooling.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tribune_core::Role;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the anonymous-session id for cart endpoints.
pub const SESSION_HEADER: &str = "x-session-id";

// =============================================================================
// Principal
// =============================================================================

/// The decoded identity attached to a request.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    /// Unique subject id (the user's UUID).
    pub id: String,

    /// Email from the token, when present.
    pub email: Option<String>,

    /// Role claim; authorization decisions re-check the user row.
    pub role: Role,
}

impl Principal {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Who is driving a cart request: a logged-in user or an anonymous session.
#[derive(Debug, Clone)]
pub enum CartActor {
    User(Principal),
    Session(String),
}

// =============================================================================
// Errors
// =============================================================================

/// Authentication failures, all mapped to 401 at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing or malformed Authorization header")]
    MissingToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token invalid")]
    TokenInvalid,
}

// =============================================================================
// Claims & Verifier
// =============================================================================

/// JWT claims structure shared with the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Email address
    pub email: Option<String>,

    /// Role ("customer" or "admin")
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// Bearer-token verifier.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: String,
}

impl TokenVerifier {
    /// Creates a verifier over an HMAC secret.
    pub fn new(secret: impl Into<String>) -> Self {
        TokenVerifier {
            secret: secret.into(),
        }
    }

    /// Validates and decodes a token into a [`Principal`].
    ///
    /// Expiry is reported separately from every other defect so clients
    /// can refresh instead of re-authenticating.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;

        let claims = token_data.claims;
        Ok(Principal {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }

    /// Issues a token (tests and local tooling only; production tokens come
    /// from the identity provider).
    pub fn issue(
        &self,
        user_id: &str,
        email: Option<&str>,
        role: Role,
        lifetime_secs: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.map(|e| e.to_string()),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Extracts and verifies the bearer token from request parts.
    fn principal_from_parts(&self, parts: &Parts) -> Result<Principal, AuthError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MissingToken)?;

        self.verify(token)
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

// =============================================================================
// Axum Extractors
// =============================================================================

impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .verifier
            .principal_from_parts(parts)
            .map_err(ApiError::from)
    }
}

impl FromRequestParts<AppState> for CartActor {
    type Rejection = ApiError;

    /// A bearer token wins over a session header; one of the two is
    /// required (a cart is owned by exactly one of them).
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if parts.headers.contains_key(AUTHORIZATION) {
            let principal = state.verifier.principal_from_parts(parts)?;
            return Ok(CartActor::User(principal));
        }

        if let Some(session_id) = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.trim().is_empty())
        {
            return Ok(CartActor::Session(session_id.to_string()));
        }

        Err(AuthError::MissingToken.into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_then_verify_roundtrip() {
        let verifier = TokenVerifier::new("unit-test-secret");
        let token = verifier
            .issue("u1", Some("fan@tribune.sn"), Role::Customer, 3600)
            .unwrap();

        let principal = verifier.verify(&token).unwrap();
        assert_eq!(principal.id, "u1");
        assert_eq!(principal.email.as_deref(), Some("fan@tribune.sn"));
        assert!(!principal.is_admin());
    }

    #[test]
    fn test_expired_token_is_distinguished() {
        let verifier = TokenVerifier::new("unit-test-secret");
        // Issued already expired (negative lifetime beyond leeway)
        let token = verifier
            .issue("u1", None, Role::Customer, -3600)
            .unwrap();

        match verifier.verify(&token) {
            Err(AuthError::TokenExpired) => {}
            other => panic!("expected TokenExpired, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let issuer = TokenVerifier::new("secret-a");
        let verifier = TokenVerifier::new("secret-b");
        let token = issuer.issue("u1", None, Role::Admin, 3600).unwrap();

        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::TokenInvalid)
        ));
    }
}
