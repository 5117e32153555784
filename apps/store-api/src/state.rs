//! # Application State
//!
//! Shared state handed to every handler through axum's `State` extractor.
//!
//! ## Dependency Injection
//! Everything a component needs arrives through this struct: the database
//! handle, the rate converter and the token verifier are constructed once
//! at process start (`main.rs`) and cloned per request. No ambient
//! singletons anywhere.

use crate::auth::TokenVerifier;
use crate::config::StoreConfig;
use crate::currency::CurrencyConverter;
use tribune_db::Database;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub converter: CurrencyConverter,
    pub verifier: TokenVerifier,
}

impl AppState {
    /// Assembles the state from its already-initialized parts.
    pub fn new(db: Database, converter: CurrencyConverter, config: &StoreConfig) -> Self {
        AppState {
            db,
            converter,
            verifier: TokenVerifier::new(config.jwt_secret.clone()),
        }
    }
}
