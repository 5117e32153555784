//! # Currency Converter
//!
//! Best-effort conversion between XOF, EUR and USD via an external rate
//! provider.
//!
//! ## Fallback Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Conversion Outcomes                                   │
//! │                                                                         │
//! │  same currency ───────────────► identity (no network call)             │
//! │  provider success ────────────► amount × provider rate                 │
//! │  network error / timeout ─────► ORIGINAL AMOUNT, unchanged             │
//! │  non-success provider body ───► ORIGINAL AMOUNT, unchanged             │
//! │                                                                         │
//! │  Conversion failures must never block a purchase flow. Availability    │
//! │  wins over accuracy here; the stored XOF figures are authoritative     │
//! │  and the converted ones are display-only.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rate Cache
//! The provider's `pair/{from}/{to}` endpoint returns the pair rate; the
//! multiplication happens locally. Rates are cached per (from, to) with a
//! short TTL, which collapses the three-conversions-per-line-item pattern
//! of priced carts into at most two lookups per TTL window.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tribune_core::{Currency, Money};

use crate::config::StoreConfig;

// =============================================================================
// Price Set
// =============================================================================

/// An amount rendered in all three supported currencies.
///
/// XOF is the stored figure; EUR and USD are best-effort conversions and
/// silently equal the XOF figure when the provider is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct PriceSet {
    pub xof: f64,
    pub eur: f64,
    pub usd: f64,
}

// =============================================================================
// Provider Wire Format
// =============================================================================

/// Response body of the provider's `pair/{from}/{to}` endpoint.
#[derive(Debug, Deserialize)]
struct PairResponse {
    result: String,
    conversion_rate: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
enum RateError {
    #[error("rate lookup failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned non-success result: {0}")]
    Provider(String),
}

// =============================================================================
// Converter
// =============================================================================

#[derive(Debug)]
struct CachedRate {
    rate: f64,
    fetched_at: Instant,
}

#[derive(Debug)]
struct Inner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    ttl: Duration,
    cache: Mutex<HashMap<(Currency, Currency), CachedRate>>,
}

/// Best-effort currency converter with a TTL rate cache.
///
/// Cheap to clone (shared inner state); handed to services through
/// [`crate::state::AppState`].
#[derive(Debug, Clone)]
pub struct CurrencyConverter {
    inner: Arc<Inner>,
}

impl CurrencyConverter {
    /// Creates a converter from configuration.
    ///
    /// The only fallible part is the HTTP client construction (TLS setup).
    pub fn new(config: &StoreConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.exchange_timeout_secs))
            .build()?;

        Ok(CurrencyConverter {
            inner: Arc::new(Inner {
                client,
                base_url: config.exchange_api_url.trim_end_matches('/').to_string(),
                api_key: config.exchange_api_key.clone(),
                ttl: Duration::from_secs(config.rate_cache_ttl_secs),
                cache: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Converts an amount between currencies.
    ///
    /// NEVER fails: every lookup problem (network, timeout, non-success
    /// provider payload) falls back to returning `amount` unchanged.
    pub async fn convert(&self, amount: f64, from: Currency, to: Currency) -> f64 {
        if from == to {
            return amount;
        }

        match self.rate(from, to).await {
            Ok(rate) => amount * rate,
            Err(e) => {
                warn!(%from, %to, error = %e, "Rate lookup failed, returning original amount");
                amount
            }
        }
    }

    /// Renders an XOF amount in all three supported currencies.
    pub async fn price_set(&self, amount: Money) -> PriceSet {
        let xof = amount.as_f64();
        PriceSet {
            xof,
            eur: self.convert(xof, Currency::Xof, Currency::Eur).await,
            usd: self.convert(xof, Currency::Xof, Currency::Usd).await,
        }
    }

    /// Fetches a pair rate, serving from the cache inside the TTL window.
    async fn rate(&self, from: Currency, to: Currency) -> Result<f64, RateError> {
        if let Some(rate) = self.cached(from, to) {
            return Ok(rate);
        }

        let url = format!(
            "{}/{}/pair/{}/{}",
            self.inner.base_url,
            self.inner.api_key,
            from.code(),
            to.code()
        );

        let response: PairResponse = self
            .inner
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await?;

        if response.result != "success" {
            return Err(RateError::Provider(response.result));
        }

        let rate = response
            .conversion_rate
            .ok_or_else(|| RateError::Provider("missing conversion_rate".to_string()))?;

        debug!(%from, %to, rate, "Fetched pair rate");
        self.store(from, to, rate);
        Ok(rate)
    }

    fn cached(&self, from: Currency, to: Currency) -> Option<f64> {
        let cache = self.inner.cache.lock().ok()?;
        cache
            .get(&(from, to))
            .filter(|entry| entry.fetched_at.elapsed() < self.inner.ttl)
            .map(|entry| entry.rate)
    }

    fn store(&self, from: Currency, to: Currency, rate: f64) {
        if let Ok(mut cache) = self.inner.cache.lock() {
            cache.insert(
                (from, to),
                CachedRate {
                    rate,
                    fetched_at: Instant::now(),
                },
            );
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_converter() -> CurrencyConverter {
        let config = StoreConfig {
            http_port: 0,
            database_path: ":memory:".to_string(),
            jwt_secret: "test".to_string(),
            // Nothing listens here; every lookup fails fast
            exchange_api_url: "http://127.0.0.1:9".to_string(),
            exchange_api_key: "test-key".to_string(),
            exchange_timeout_secs: 1,
            rate_cache_ttl_secs: 60,
        };
        CurrencyConverter::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_same_currency_is_identity() {
        let converter = unreachable_converter();
        let out = converter.convert(1500.0, Currency::Xof, Currency::Xof).await;
        assert_eq!(out, 1500.0);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_to_original_amount() {
        let converter = unreachable_converter();
        let out = converter.convert(1500.0, Currency::Xof, Currency::Eur).await;
        assert_eq!(out, 1500.0);
    }

    #[tokio::test]
    async fn test_price_set_survives_provider_outage() {
        let converter = unreachable_converter();
        let set = converter.price_set(Money::from_francs(900)).await;
        assert_eq!(set.xof, 900.0);
        assert_eq!(set.eur, 900.0);
        assert_eq!(set.usd, 900.0);
    }
}
