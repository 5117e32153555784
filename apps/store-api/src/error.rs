//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tribune                                │
//! │                                                                         │
//! │  Service code                        HTTP response                      │
//! │  ────────────                        ─────────────                      │
//! │                                                                         │
//! │  CoreError::EmptyCart ──────────────► 400 VALIDATION                   │
//! │  AuthError::TokenExpired ───────────► 401 AUTH                         │
//! │  CoreError::InactiveAccount ────────► 403 FORBIDDEN                    │
//! │  CoreError::OrderNotFound ──────────► 404 NOT_FOUND                    │
//! │  CoreError::DuplicatePayment ───────► 409 CONFLICT                     │
//! │  CoreError::OrderNotPending ────────► 409 STATE                        │
//! │  DbError::QueryFailed ──────────────► 500 INTERNAL (detail logged,     │
//! │                                            never leaked to the client) │
//! │                                                                         │
//! │  Currency-provider failures never reach this type at all: the          │
//! │  converter swallows them and falls back to the input amount.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use tribune_core::CoreError;
use tribune_db::DbError;

use crate::auth::AuthError;

/// API error returned from HTTP handlers.
///
/// ## Serialization
/// ```json
/// {
///   "error": "NOT_FOUND",
///   "message": "Order not found: 3f2a..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error kind for programmatic handling
    #[serde(rename = "error")]
    pub kind: ErrorKind,

    /// Human-readable error message for display
    pub message: String,
}

/// Error kinds, each mapped to exactly one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or missing input (400)
    Validation,

    /// Missing/invalid/expired credential (401)
    Auth,

    /// Authenticated but not authorized, or inactive account (403)
    Forbidden,

    /// Referenced entity absent (404)
    NotFound,

    /// Uniqueness violation: duplicate payment, already-redeemed referral,
    /// lost stock race (409)
    Conflict,

    /// Operation invalid for the entity's current status (409)
    State,

    /// Unexpected server failure (500)
    Internal,
}

impl ErrorKind {
    fn status(&self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict | ErrorKind::State => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ApiError {
            kind,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorKind::Validation, message)
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorKind::NotFound, format!("{resource} not found: {id}"))
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorKind::Forbidden, message)
    }

    /// Creates an internal error with a generic client-facing message.
    pub fn internal() -> Self {
        ApiError::new(ErrorKind::Internal, "Internal server error")
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        use CoreError::*;

        let kind = match &err {
            UnsupportedCurrency(_) | InvalidAmount { .. } | InvalidLineItem(_) | EmptyCart
            | CartTooLarge { .. } | IncompleteAddress { .. } | InvalidDeliveryDate(_)
            | SelfReferral | Validation(_) => ErrorKind::Validation,

            ProductNotFound(_) | CartNotFound | OrderNotFound(_) | PaymentNotFound(_)
            | HistoryEntryNotFound(_) | InvoiceNotFound(_) | ReferralCodeNotFound(_)
            | UserNotFound(_) => ErrorKind::NotFound,

            InsufficientStock { .. } | DuplicatePayment(_) | DuplicateInvoice(_)
            | AlreadyRedeemed | DuplicateReferral => ErrorKind::Conflict,

            OrderNotPending { .. } | InvalidStatusTransition { .. } => ErrorKind::State,

            InactiveAccount | AdminOnly => ErrorKind::Forbidden,
        };

        ApiError::new(kind, err.to_string())
    }
}

/// Converts database errors to API errors.
///
/// Unexpected failures are logged with their detail and reported to the
/// client as a generic message.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorKind::Conflict,
                format!("{field} '{value}' already exists"),
            ),
            DbError::StockExhausted { product_id, size } => ApiError::new(
                ErrorKind::Conflict,
                format!("Insufficient stock for product {product_id} ({size})"),
            ),
            DbError::PreconditionFailed(msg) => ApiError::new(ErrorKind::State, msg),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {message}");
                ApiError::validation("Invalid reference")
            }
            other => {
                tracing::error!("Database error: {other}");
                ApiError::internal()
            }
        }
    }
}

/// Converts authentication errors to API errors.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::new(ErrorKind::Auth, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status();
        (status, Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = CoreError::EmptyCart.into();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err: ApiError = CoreError::DuplicatePayment("o1".into()).into();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let err: ApiError = CoreError::InactiveAccount.into();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let err: ApiError = CoreError::OrderNotPending {
            order_id: "o1".into(),
            status: "paid".into(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::State);
    }

    #[test]
    fn test_db_error_detail_is_not_leaked() {
        let err: ApiError = DbError::QueryFailed("secret table detail".into()).into();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(!err.message.contains("secret"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorKind::Validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Auth.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::State.status(), StatusCode::CONFLICT);
    }
}
