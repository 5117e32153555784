//! # Validation Module
//!
//! Input validation utilities for Tribune.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (axum)                                          │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: field-level checks before any service call           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Service (business rules)                                     │
//! │  ├── Stock, status machine, referral invariants                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / CHECK constraints                             │
//! │  └── Conditional updates (stock CAS, set-once referral)                │
//! │                                                                         │
//! │  Defense in depth: validation and state errors are detected BEFORE     │
//! │  any write, so a rejected request has no partial effects.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::error::{CoreError, ValidationError};
use crate::types::Address;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an entity id (UUID v4 string).
///
/// ## Example
/// ```rust
/// use tribune_core::validation::validate_entity_id;
///
/// assert!(validate_entity_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_entity_id("not-an-id").is_err());
/// ```
pub fn validate_entity_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates a referral code as submitted by a client.
///
/// Codes are system-generated (`REF-` + 8 hex chars); inputs are only
/// checked for presence and plausible length, existence is a lookup.
pub fn validate_referral_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "referral_code".to_string(),
        });
    }

    if code.len() > 32 {
        return Err(ValidationError::InvalidFormat {
            field: "referral_code".to_string(),
            reason: "too long".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a discount percentage (0-100).
pub fn validate_discount_pct(pct: i64) -> ValidationResult<()> {
    if !(0..=100).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "discount_pct".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Checkout Validators
// =============================================================================

/// Validates a delivery address for completeness.
///
/// All of street/city/postal code/country are required; the first missing
/// field is reported.
pub fn validate_address(address: &Address) -> Result<(), CoreError> {
    let checks: [(&'static str, &str); 4] = [
        ("street", &address.street),
        ("city", &address.city),
        ("postal_code", &address.postal_code),
        ("country", &address.country),
    ];

    for (field, value) in checks {
        if value.trim().is_empty() {
            return Err(CoreError::IncompleteAddress { field });
        }
    }

    Ok(())
}

/// Validates an expected delivery date against the current instant.
///
/// `now` is passed in so the check stays pure and testable; the service
/// layer supplies the wall clock.
pub fn validate_delivery_date(date: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), CoreError> {
    if date <= now {
        return Err(CoreError::InvalidDeliveryDate(
            "expected delivery date must be in the future".to_string(),
        ));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn address() -> Address {
        Address {
            street: "12 Rue des Stades".to_string(),
            city: "Dakar".to_string(),
            postal_code: "10200".to_string(),
            country: "SN".to_string(),
        }
    }

    #[test]
    fn test_validate_entity_id() {
        assert!(validate_entity_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_entity_id("").is_err());
        assert!(validate_entity_id("123").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_address_reports_first_missing_field() {
        assert!(validate_address(&address()).is_ok());

        let mut incomplete = address();
        incomplete.city = "  ".to_string();
        match validate_address(&incomplete) {
            Err(CoreError::IncompleteAddress { field }) => assert_eq!(field, "city"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_validate_delivery_date() {
        let now = Utc::now();
        assert!(validate_delivery_date(now + Duration::days(3), now).is_ok());
        assert!(validate_delivery_date(now, now).is_err());
        assert!(validate_delivery_date(now - Duration::days(1), now).is_err());
    }

    #[test]
    fn test_validate_referral_code() {
        assert!(validate_referral_code("REF-4F2A9C1D").is_ok());
        assert!(validate_referral_code("").is_err());
        assert!(validate_referral_code(&"X".repeat(40)).is_err());
    }
}
