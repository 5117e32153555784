//! # Error Types
//!
//! Domain-specific error types for tribune-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tribune-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tribune-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  store-api errors (in app)                                             │
//! │  └── ApiError         - What clients see (HTTP status + JSON body)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (order id, size, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each variant maps to exactly one HTTP status at the API boundary

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They are detected before any write and reported with no partial effects.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Currency code is outside the supported set (XOF, EUR, USD).
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// A monetary amount is negative where it must not be.
    #[error("Amount cannot be negative: {amount}")]
    InvalidAmount { amount: i64 },

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A cart line item references a malformed product id or size.
    #[error("Invalid line item: {0}")]
    InvalidLineItem(String),

    /// Requested quantity exceeds the size variant's available stock.
    ///
    /// ## When This Occurs
    /// - Checkout against a size that sold out since the item was added
    /// - Two concurrent checkouts racing for the last units (the losing
    ///   transaction sees the conditional stock decrement touch zero rows)
    #[error("Insufficient stock for {product} ({size}): available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        size: String,
        available: i64,
        requested: i64,
    },

    /// Checkout attempted with an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart cannot be found for the given owner.
    #[error("Cart not found")]
    CartNotFound,

    /// Cart has exceeded maximum allowed items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Delivery address is missing one of street/city/postal code/country.
    #[error("Incomplete delivery address: missing {field}")]
    IncompleteAddress { field: &'static str },

    /// Expected delivery date is unparseable or not strictly in the future.
    #[error("Invalid delivery date: {0}")]
    InvalidDeliveryDate(String),

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Paying an order that is already paid, shipped or cancelled
    /// - Cancelling an order that left the pending state
    #[error("Order {order_id} is {status}, cannot perform operation")]
    OrderNotPending { order_id: String, status: String },

    /// Requested order status change is not allowed by the lifecycle.
    #[error("Cannot change order status from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// A payment already exists for this order.
    #[error("A payment already exists for order {0}")]
    DuplicatePayment(String),

    /// Payment cannot be found.
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Payment history entry cannot be found.
    #[error("Payment history entry not found: {0}")]
    HistoryEntryNotFound(String),

    /// An invoice already exists for this payment.
    #[error("An invoice already exists for payment {0}")]
    DuplicateInvoice(String),

    /// Invoice cannot be found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// No user owns the submitted referral code.
    #[error("Referral code not found: {0}")]
    ReferralCodeNotFound(String),

    /// A user tried to redeem their own referral code.
    #[error("Cannot redeem your own referral code")]
    SelfReferral,

    /// The caller has already redeemed a referral code (set-once field).
    #[error("A referral code has already been redeemed on this account")]
    AlreadyRedeemed,

    /// The referrer has already recorded the caller as a referred user.
    #[error("User is already referred by the owner of this code")]
    DuplicateReferral,

    /// User cannot be found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The account exists but is deactivated.
    #[error("Account is inactive")]
    InactiveAccount,

    /// The caller is authenticated but not allowed to perform the operation.
    #[error("Reserved for administrators")]
    AdminOnly,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed {
        field: String,
        allowed: Vec<String>,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Maillot Domicile 24/25".to_string(),
            size: "M".to_string(),
            available: 2,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Maillot Domicile 24/25 (M): available 2, requested 5"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "street".to_string(),
        };
        assert_eq!(err.to_string(), "street is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
