//! Shared fixtures for service-level integration tests.
//!
//! Tests run against an in-memory SQLite database and a currency converter
//! pointed at an unreachable endpoint, so every conversion exercises the
//! fallback path (display figures equal the XOF figures).

#![allow(dead_code)]

use chrono::Utc;
use uuid::Uuid;

use store_api::auth::Principal;
use store_api::currency::CurrencyConverter;
use store_api::{AppState, StoreConfig};
use tribune_core::{JerseySize, Money, Product, Role, SizeVariant, User};
use tribune_db::repository::user::generate_referral_code;
use tribune_db::{Database, DbConfig};

/// Builds an AppState over an in-memory database and an unreachable rate
/// provider.
pub async fn test_state() -> AppState {
    let config = StoreConfig {
        http_port: 0,
        database_path: ":memory:".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        // Nothing listens on the discard port; lookups fail fast
        exchange_api_url: "http://127.0.0.1:9".to_string(),
        exchange_api_key: "test-key".to_string(),
        exchange_timeout_secs: 1,
        rate_cache_ttl_secs: 60,
    };

    let db = Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database");
    let converter = CurrencyConverter::new(&config).expect("converter");

    AppState::new(db, converter, &config)
}

/// Inserts a user with the given point balance and returns it.
pub async fn seed_user(state: &AppState, name: &str, loyalty_points: i64, role: Role) -> User {
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: format!("{}@test.tribune.sn", name.to_lowercase().replace(' ', ".")),
        role,
        active: true,
        loyalty_points,
        referral_code: generate_referral_code(),
        referral_code_used: None,
        referral_points: 0,
        total_earned: 0,
        phone: None,
        created_at: Utc::now(),
    };

    state.db.users().insert(&user).await.expect("insert user");
    user
}

/// Inserts a deactivated user.
pub async fn seed_inactive_user(state: &AppState, name: &str) -> User {
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: format!("{}@test.tribune.sn", name.to_lowercase().replace(' ', ".")),
        role: Role::Customer,
        active: false,
        loyalty_points: 0,
        referral_code: generate_referral_code(),
        referral_code_used: None,
        referral_points: 0,
        total_earned: 0,
        phone: None,
        created_at: Utc::now(),
    };

    state.db.users().insert(&user).await.expect("insert user");
    user
}

/// Inserts a product with the given price, promo and per-size stock.
pub async fn seed_product(
    state: &AppState,
    title: &str,
    price_francs: i64,
    discount_pct: u8,
    sizes: &[(JerseySize, i64)],
) -> Product {
    let product = Product {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        description: None,
        price: Money::from_francs(price_francs),
        discount_pct,
        featured: false,
        created_at: Utc::now(),
    };

    let variants: Vec<SizeVariant> = sizes
        .iter()
        .map(|(size, quantity)| SizeVariant {
            size: *size,
            quantity: *quantity,
        })
        .collect();

    state
        .db
        .products()
        .insert(&product, &variants)
        .await
        .expect("insert product");

    product
}

/// Builds the request principal for a seeded user.
pub fn principal_for(user: &User) -> Principal {
    Principal {
        id: user.id.clone(),
        email: Some(user.email.clone()),
        role: user.role,
    }
}

/// Re-reads a user row.
pub async fn reload_user(state: &AppState, id: &str) -> User {
    state
        .db
        .users()
        .get_by_id(id)
        .await
        .expect("query user")
        .expect("user exists")
}

/// Current stock of a product size.
pub async fn stock_of(state: &AppState, product_id: &str, size: JerseySize) -> i64 {
    state
        .db
        .products()
        .get_detail(product_id)
        .await
        .expect("query product")
        .expect("product exists")
        .available(size)
}
