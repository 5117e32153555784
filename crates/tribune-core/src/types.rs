//! # Domain Types
//!
//! Core domain types used throughout Tribune.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     User        │   │     Order       │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  referral_code  │   │  total (XOF)    │   │  order_id (1:1) │       │
//! │  │  loyalty_points │   │  discount_pct   │   │  amount (XOF)   │       │
//! │  │  active         │   │  status (FSM)   │   │  transaction_id │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Currency      │   │  OrderStatus    │   │  JerseySize     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Xof (base)     │   │  Pending→Paid→  │   │  XS S M L       │       │
//! │  │  Eur, Usd       │   │  Shipped→Deliv. │   │  XL XXL         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (referral code, invoice number,
//!   transaction id) - human-readable, generated separately

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, ValidationError};
use crate::money::Money;

// =============================================================================
// Currency
// =============================================================================

/// Supported currencies.
///
/// XOF is the base (settlement) currency: every stored amount is XOF.
/// EUR and USD exist only as display conversions through the rate provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Xof,
    Eur,
    Usd,
}

impl Currency {
    /// ISO 4217 code, as used by the rate provider.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Xof => "XOF",
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
        }
    }

    /// Parses a currency code.
    ///
    /// `FCFA` is accepted as a legacy alias for XOF; anything outside the
    /// supported set fails with [`CoreError::UnsupportedCurrency`].
    pub fn parse(code: &str) -> Result<Self, CoreError> {
        match code.trim().to_ascii_uppercase().as_str() {
            "XOF" | "FCFA" => Ok(Currency::Xof),
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            other => Err(CoreError::UnsupportedCurrency(other.to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Jersey Size
// =============================================================================

/// Jersey size variants carried by every product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum JerseySize {
    Xs,
    S,
    M,
    L,
    Xl,
    Xxl,
}

impl JerseySize {
    pub const fn label(&self) -> &'static str {
        match self {
            JerseySize::Xs => "XS",
            JerseySize::S => "S",
            JerseySize::M => "M",
            JerseySize::L => "L",
            JerseySize::Xl => "XL",
            JerseySize::Xxl => "XXL",
        }
    }

    /// All valid size labels, for validation error messages.
    pub fn allowed() -> Vec<String> {
        ["XS", "S", "M", "L", "XL", "XXL"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

impl FromStr for JerseySize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "XS" => Ok(JerseySize::Xs),
            "S" => Ok(JerseySize::S),
            "M" => Ok(JerseySize::M),
            "L" => Ok(JerseySize::L),
            "XL" => Ok(JerseySize::Xl),
            "XXL" => Ok(JerseySize::Xxl),
            _ => Err(ValidationError::NotAllowed {
                field: "size".to_string(),
                allowed: JerseySize::allowed(),
            }),
        }
    }
}

impl fmt::Display for JerseySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Role
// =============================================================================

/// Account role. Admins see every order/payment and may administer
/// order statuses and the payment history ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Customer
    }
}

// =============================================================================
// User
// =============================================================================

/// A shop account.
///
/// ## Referral Invariants
/// - `referral_code` is unique and system-generated at account creation
/// - `referral_code_used` is set at most once, then immutable
/// - the referred-user set (separate table) holds each other user at most
///   once per referrer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Login email, unique.
    pub email: String,

    /// Account role.
    pub role: Role,

    /// Whether the account is active. Inactive accounts are locked out of
    /// every operation.
    pub active: bool,

    /// Accumulated loyalty points, never negative.
    pub loyalty_points: i64,

    /// This user's own referral code (unique, e.g. `REF-4F2A9C1D`).
    pub referral_code: String,

    /// The referral code this user redeemed, if any. Set once.
    pub referral_code_used: Option<String>,

    /// Points earned specifically through referrals.
    pub referral_points: i64,

    /// Lifetime points earned (never decremented by reversals).
    pub total_earned: i64,

    /// Optional contact phone.
    pub phone: Option<String>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A jersey in the catalog.
///
/// Size-level stock lives in [`SizeVariant`] rows (one per size, unique
/// per product).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display title shown in the catalog.
    pub title: String,

    /// Optional description.
    pub description: Option<String>,

    /// List price in XOF francs.
    pub price: Money,

    /// Product-level discount in whole percent (0-100), applied before
    /// any loyalty tier discount.
    pub discount_pct: u8,

    /// Whether the product is featured on the storefront.
    pub featured: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

/// Per-size available stock for a product.
///
/// A product holds at most one variant per size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SizeVariant {
    pub size: JerseySize,
    pub quantity: i64,
}

/// A product together with its size variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetail {
    pub product: Product,
    pub sizes: Vec<SizeVariant>,
}

impl ProductDetail {
    /// Available quantity for a size, zero when the variant doesn't exist.
    pub fn available(&self, size: JerseySize) -> i64 {
        self.sizes
            .iter()
            .find(|v| v.size == size)
            .map(|v| v.quantity)
            .unwrap_or(0)
    }

    /// Checks whether the requested quantity can be satisfied.
    #[inline]
    pub fn can_satisfy(&self, size: JerseySize, quantity: i64) -> bool {
        self.available(size) >= quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Who owns a cart: exactly one of an authenticated user or an anonymous
/// browsing session. Never both, never neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartOwner {
    User(String),
    Session(String),
}

/// A mutable shopping cart.
///
/// ## Lifecycle
/// - created on first add-to-cart
/// - destroyed on successful checkout (deleted, not emptied in place)
/// - a session cart is merged into the user cart at login
///
/// ## Invariants
/// - owner exclusivity: exactly one of `user_id` / `session_id` is set,
///   enforced by [`Cart::new`] and a CHECK constraint in the schema
/// - line items are unique per (product, size); adds merge quantities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for the given owner.
    ///
    /// The owner enum makes the exclusivity invariant unrepresentable at
    /// the call site; ad hoc construction with both ids set is rejected by
    /// the database CHECK constraint as a second line of defense.
    pub fn new(id: String, owner: CartOwner, now: DateTime<Utc>) -> Self {
        let (user_id, session_id) = match owner {
            CartOwner::User(uid) => (Some(uid), None),
            CartOwner::Session(sid) => (None, Some(sid)),
        };
        Cart {
            id,
            user_id,
            session_id,
            updated_at: now,
        }
    }

    /// Returns the owner of this cart.
    pub fn owner(&self) -> CartOwner {
        match (&self.user_id, &self.session_id) {
            (Some(uid), _) => CartOwner::User(uid.clone()),
            (None, Some(sid)) => CartOwner::Session(sid.clone()),
            // Unreachable for rows that passed the CHECK constraint.
            (None, None) => CartOwner::Session(String::new()),
        }
    }
}

/// A line item in a cart: (product, size, quantity).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: String,
    pub cart_id: String,
    pub product_id: String,
    pub size: JerseySize,
    pub quantity: i64,
}

// =============================================================================
// Order Status
// =============================================================================

/// Order lifecycle.
///
/// ```text
/// Pending ──► Paid ──► Shipped ──► Delivered
///    │
///    └──► Cancelled
/// ```
///
/// `Cancelled` is reachable only from `Pending`. Payment status is
/// administered separately and never advances the order automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    #[inline]
    pub const fn is_pending(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Cancelled) | (Paid, Shipped) | (Shipped, Delivered)
        )
    }

    pub const fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Address
// =============================================================================

/// A delivery address. All four fields are required at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

// =============================================================================
// Order
// =============================================================================

/// An immutable order created from a cart snapshot at checkout time.
///
/// ## Pricing Invariant
/// `total` is the PRE-discount base-currency sum of unit prices × quantities
/// computed at creation time, and `discount_pct` is the loyalty tier
/// discount captured at the same moment. Both are immutable once written.
/// Every display-time figure is derived as `total * (1 - discount_pct/100)`
/// and never stored as a second mutable total: the pre-discount amount
/// stays an audit-safe record even if tier rules change later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub user_id: String,

    /// Pre-discount total in XOF at creation time. Immutable.
    pub total: Money,

    /// Loyalty tier discount percent captured at creation time. Immutable.
    pub discount_pct: u8,

    /// Delivery address, frozen at checkout.
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub delivery_address: Address,

    pub status: OrderStatus,

    /// Optional expected delivery date, strictly in the future at the time
    /// it is set.
    pub expected_delivery: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The discount-adjusted total shown to clients and charged at payment.
    #[inline]
    pub fn display_total(&self) -> Money {
        self.total.apply_discount_pct(self.discount_pct)
    }
}

/// A line item frozen into an order. Prices are not stored per line; they
/// are re-derived from the product and the order's captured discount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub size: JerseySize,
    pub quantity: i64,
}

/// An order together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// =============================================================================
// Payment
// =============================================================================

/// Accepted payment methods. The gateway is a trusted simulation; the
/// method is recorded but never routed anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Paypal,
    Stripe,
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" | "carte" => Ok(PaymentMethod::Card),
            "paypal" => Ok(PaymentMethod::Paypal),
            "stripe" => Ok(PaymentMethod::Stripe),
            _ => Err(ValidationError::NotAllowed {
                field: "method".to_string(),
                allowed: vec![
                    "card".to_string(),
                    "paypal".to_string(),
                    "stripe".to_string(),
                ],
            }),
        }
    }
}

/// Payment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// A payment against an order. One-to-one with the order, enforced by a
/// UNIQUE constraint on `order_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub user_id: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,

    /// Discount-adjusted amount charged, in XOF.
    pub amount: Money,
    pub currency: Currency,

    /// Gateway transaction identifier (`TXN-<millis>-<6 alnum>`).
    pub transaction_id: Option<String>,

    /// Free-form gateway details, stored as raw JSON.
    pub details: Option<String>,

    pub paid_at: DateTime<Utc>,
}

// =============================================================================
// Payment History
// =============================================================================

/// An append-only ledger entry mirroring a payment event.
///
/// Entries are independently deletable by an administrator; deleting a
/// `paid` entry triggers a compensating point reversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentHistoryEntry {
    pub id: String,
    pub order_id: String,
    pub user_id: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: Money,
    pub currency: Currency,
    pub transaction_id: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Invoice
// =============================================================================

/// An invoice, generated only after a payment exists. One-to-one with the
/// payment, immutable once created except for timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: String,
    pub payment_id: String,
    pub order_id: String,
    pub user_id: String,

    /// Unique business number (`FACT-XXXXXXXX`).
    pub number: String,

    pub legal_notice: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parse() {
        assert_eq!(Currency::parse("XOF").unwrap(), Currency::Xof);
        assert_eq!(Currency::parse("FCFA").unwrap(), Currency::Xof);
        assert_eq!(Currency::parse("eur").unwrap(), Currency::Eur);
        assert!(matches!(
            Currency::parse("GBP"),
            Err(CoreError::UnsupportedCurrency(_))
        ));
    }

    #[test]
    fn test_size_parse() {
        assert_eq!("M".parse::<JerseySize>().unwrap(), JerseySize::M);
        assert_eq!("xxl".parse::<JerseySize>().unwrap(), JerseySize::Xxl);
        assert!("XXXL".parse::<JerseySize>().is_err());
    }

    #[test]
    fn test_order_status_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));

        // Cancellation is only reachable from pending
        assert!(!Paid.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Paid));
    }

    #[test]
    fn test_cart_owner_exclusivity() {
        let now = Utc::now();
        let user_cart = Cart::new("c1".into(), CartOwner::User("u1".into()), now);
        assert!(user_cart.user_id.is_some());
        assert!(user_cart.session_id.is_none());

        let session_cart = Cart::new("c2".into(), CartOwner::Session("s1".into()), now);
        assert!(session_cart.user_id.is_none());
        assert_eq!(session_cart.owner(), CartOwner::Session("s1".into()));
    }

    #[test]
    fn test_order_display_total() {
        let order = Order {
            id: "o1".into(),
            user_id: "u1".into(),
            total: Money::from_francs(1_000),
            discount_pct: 10,
            delivery_address: Address {
                street: "12 Rue des Stades".into(),
                city: "Dakar".into(),
                postal_code: "10200".into(),
                country: "SN".into(),
            },
            status: OrderStatus::Pending,
            expected_delivery: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(order.display_total().francs(), 900);
    }

    #[test]
    fn test_product_detail_availability() {
        let detail = ProductDetail {
            product: Product {
                id: "p1".into(),
                title: "Maillot Domicile".into(),
                description: None,
                price: Money::from_francs(15_000),
                discount_pct: 0,
                featured: false,
                created_at: Utc::now(),
            },
            sizes: vec![
                SizeVariant {
                    size: JerseySize::M,
                    quantity: 3,
                },
                SizeVariant {
                    size: JerseySize::L,
                    quantity: 0,
                },
            ],
        };

        assert!(detail.can_satisfy(JerseySize::M, 3));
        assert!(!detail.can_satisfy(JerseySize::M, 4));
        assert!(!detail.can_satisfy(JerseySize::L, 1));
        assert_eq!(detail.available(JerseySize::Xs), 0);
    }
}
