//! Persisted electricity rate.

use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::ValidationError;

/// Storage key for the rate record.
pub const RATE_KEY: &str = "rate";
/// Rate used when nothing valid has been stored ($/kWh).
pub const DEFAULT_RATE_PER_KWH: f64 = 0.15;
/// Upper bound accepted from the settings input ($/kWh).
pub const MAX_RATE_INPUT: f64 = 10.0;

/// Single non-negative $/kWh value, cached in memory and written through.
#[derive(Debug)]
pub struct RateStore<S> {
    store: S,
    rate: f64,
}

impl<S: KeyValueStore> RateStore<S> {
    /// Loads the stored rate, falling back to [`DEFAULT_RATE_PER_KWH`].
    pub fn load(store: S) -> Self {
        Self::load_or(store, DEFAULT_RATE_PER_KWH)
    }

    /// Loads the stored rate, falling back to `default` if it is missing, malformed,
    /// negative, or unreadable.
    pub fn load_or(store: S, default: f64) -> Self {
        let rate = match store.get(RATE_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<f64>() {
                Ok(rate) if rate.is_finite() && rate >= 0.0 => rate,
                _ => {
                    warn!(raw = %raw, "Ignoring malformed stored rate");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                warn!(error = %e, "Failed to read stored rate, using default");
                default
            }
        };
        Self { store, rate }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Clamps `rate` to be non-negative, caches it, and writes it through.
    /// NaN and infinite values are stored as 0.
    ///
    /// A failed write is logged; the in-memory value is still updated.
    /// Returns the value actually stored.
    pub fn set_rate(&mut self, rate: f64) -> f64 {
        let clamped = if rate.is_finite() { rate.max(0.0) } else { 0.0 };
        self.rate = clamped;
        match self.store.set(RATE_KEY, &clamped.to_string()) {
            Ok(()) => debug!(rate = clamped, "Stored rate"),
            Err(e) => warn!(error = %e, "Failed to persist rate"),
        }
        clamped
    }
}

/// Validates text typed into the rate setting.
///
/// # Errors
///
/// Returns a [`ValidationError`] if the input is blank, not a number, negative, or
/// greater than [`MAX_RATE_INPUT`].
pub fn parse_rate_input(input: &str) -> Result<f64, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::new("rate", "Rate is required"));
    }
    match input.parse::<f64>() {
        Ok(rate) if rate.is_finite() && (0.0..=MAX_RATE_INPUT).contains(&rate) => Ok(rate),
        _ => Err(ValidationError::new("rate", "Enter a valid number (0-10)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStore;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disk on fire".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk on fire".into()))
        }
    }

    #[test]
    fn defaults_when_missing() {
        let rates = RateStore::load(MemoryStore::new());
        assert_eq!(rates.rate(), DEFAULT_RATE_PER_KWH);
    }

    #[test]
    fn defaults_when_malformed_or_negative() {
        let store = MemoryStore::new();
        assert!(store.set(RATE_KEY, "cheap").is_ok());
        assert_eq!(RateStore::load(store).rate(), DEFAULT_RATE_PER_KWH);

        let store = MemoryStore::new();
        assert!(store.set(RATE_KEY, "-1").is_ok());
        assert_eq!(RateStore::load(store).rate(), DEFAULT_RATE_PER_KWH);
    }

    #[test]
    fn set_clamps_and_persists() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let mut rates = RateStore::load(std::sync::Arc::clone(&store));
        assert_eq!(rates.set_rate(-3.0), 0.0);
        assert_eq!(rates.set_rate(0.32), 0.32);
        assert_eq!(RateStore::load(store).rate(), 0.32);
    }

    #[test]
    fn non_finite_rates_store_zero() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let mut rates = RateStore::load(std::sync::Arc::clone(&store));
        assert_eq!(rates.set_rate(f64::INFINITY), 0.0);
        assert_eq!(RateStore::load(std::sync::Arc::clone(&store)).rate(), 0.0);
        assert_eq!(rates.set_rate(f64::NEG_INFINITY), 0.0);
        assert_eq!(rates.set_rate(f64::NAN), 0.0);
        assert_eq!(RateStore::load(store).rate(), 0.0);
    }

    #[test]
    fn storage_failures_are_not_fatal() {
        let mut rates = RateStore::load(BrokenStore);
        assert_eq!(rates.rate(), DEFAULT_RATE_PER_KWH);
        assert_eq!(rates.set_rate(0.5), 0.5);
        assert_eq!(rates.rate(), 0.5);
    }

    #[test]
    fn rate_input_validation() {
        assert_eq!(parse_rate_input(" 0.25 "), Ok(0.25));
        assert_eq!(parse_rate_input("10"), Ok(10.0));
        assert_eq!(parse_rate_input("0"), Ok(0.0));
        assert_eq!(
            parse_rate_input("").map_err(|e| e.message),
            Err("Rate is required".to_string())
        );
        assert!(parse_rate_input("10.01").is_err());
        assert!(parse_rate_input("-0.1").is_err());
        assert!(parse_rate_input("abc").is_err());
    }
}
