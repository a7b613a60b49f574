// Allow dead code: point-read accessors are part of the store surface
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{ConversionRate, Currency};

/// Collection file holding the currency map, keyed by code.
const CURRENCIES_COLLECTION: &str = "currencies";

/// Collection file holding the conversion rate map, keyed by pair id.
const CONVERSIONS_COLLECTION: &str = "conversions";

/// A collection together with the time it was written.
/// The timestamp is display metadata only; it never triggers a refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCollection<T> {
    pub data: T,
    pub stored_at: DateTime<Utc>,
}

impl<T> StoredCollection<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            stored_at: Utc::now(),
        }
    }

    pub fn age_display(&self) -> String {
        let minutes = (Utc::now() - self.stored_at).num_minutes();
        if minutes < 1 {
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// Durable key-value store with two independent collections: currencies
/// (keyed by code) and conversion rates (keyed by pair id).
///
/// When the backing directory cannot be created the store degrades: every
/// read returns absent and every write is a no-op. Callers treat that
/// identically to a miss.
#[derive(Clone)]
pub struct StoreManager {
    root: Option<PathBuf>,
}

impl StoreManager {
    /// Open the store at the given directory, creating it if needed.
    pub fn open(root: PathBuf) -> Self {
        match fs::create_dir_all(&root) {
            Ok(()) => Self { root: Some(root) },
            Err(e) => {
                warn!(
                    error = %e,
                    path = %root.display(),
                    "Store unavailable, operating without local persistence"
                );
                Self { root: None }
            }
        }
    }

    /// A store that persists nothing, for runtimes without a usable
    /// cache directory.
    pub fn unavailable() -> Self {
        Self { root: None }
    }

    pub fn is_available(&self) -> bool {
        self.root.is_some()
    }

    fn collection_path(&self, name: &str) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(format!("{}.json", name)))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Option<StoredCollection<T>> {
        let path = self.collection_path(name)?;
        if !path.exists() {
            return None;
        }

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(collection = name, error = %e, "Failed to read collection, treating as absent");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(stored) => Some(stored),
            Err(e) => {
                debug!(collection = name, error = %e, "Failed to parse collection, treating as absent");
                None
            }
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let Some(path) = self.collection_path(name) else {
            return Ok(());
        };

        let stored = StoredCollection::new(data);
        let contents = serde_json::to_string_pretty(&stored)?;

        // Write through a temp file so a reader never observes a
        // half-replaced collection.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents).with_context(|| format!("Failed to write collection: {}", name))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace collection: {}", name))?;
        Ok(())
    }

    // ===== Currencies =====

    /// Empty the currency collection, then insert every given entry.
    /// Later entries with a duplicate code overwrite earlier ones.
    pub fn replace_all_currencies(&self, currencies: &[Currency]) -> Result<()> {
        let by_code: BTreeMap<&str, &Currency> = currencies
            .iter()
            .map(|currency| (currency.code.as_str(), currency))
            .collect();
        self.save(CURRENCIES_COLLECTION, &by_code)
    }

    pub fn all_currencies(&self) -> Vec<Currency> {
        self.load::<BTreeMap<String, Currency>>(CURRENCIES_COLLECTION)
            .map(|stored| stored.data.into_values().collect())
            .unwrap_or_default()
    }

    pub fn currency(&self, code: &str) -> Option<Currency> {
        self.load::<BTreeMap<String, Currency>>(CURRENCIES_COLLECTION)
            .and_then(|mut stored| stored.data.remove(code))
    }

    // ===== Conversion rates =====

    /// Insert or overwrite the entry for one pair id; other pairs are
    /// untouched. There is no wholesale clear for this collection.
    pub fn upsert_rate(&self, rate: &ConversionRate) -> Result<()> {
        let mut rates = self
            .load::<BTreeMap<String, ConversionRate>>(CONVERSIONS_COLLECTION)
            .map(|stored| stored.data)
            .unwrap_or_default();
        rates.insert(rate.pair_id.clone(), rate.clone());
        self.save(CONVERSIONS_COLLECTION, &rates)
    }

    pub fn rate(&self, pair_id: &str) -> Option<ConversionRate> {
        self.load::<BTreeMap<String, ConversionRate>>(CONVERSIONS_COLLECTION)
            .and_then(|mut stored| stored.data.remove(pair_id))
    }

    pub fn all_rates(&self) -> Vec<ConversionRate> {
        self.load::<BTreeMap<String, ConversionRate>>(CONVERSIONS_COLLECTION)
            .map(|stored| stored.data.into_values().collect())
            .unwrap_or_default()
    }

    /// Age of the conversion collection for status display.
    pub fn rates_age(&self) -> Option<String> {
        self.load::<BTreeMap<String, ConversionRate>>(CONVERSIONS_COLLECTION)
            .map(|stored| stored.age_display())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn currency(code: &str, name: &str) -> Currency {
        Currency {
            code: code.to_string(),
            display_name: name.to_string(),
            details: serde_json::Map::new(),
        }
    }

    fn rate(pair_id: &str, value: f64) -> ConversionRate {
        ConversionRate {
            pair_id: pair_id.to_string(),
            value,
        }
    }

    #[test]
    fn test_replace_all_currencies_leaves_no_residue() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreManager::open(dir.path().join("store"));

        store
            .replace_all_currencies(&[currency("USD", "United States Dollar"), currency("EUR", "Euro")])
            .unwrap();
        store
            .replace_all_currencies(&[currency("NGN", "Nigerian Naira")])
            .unwrap();

        let codes: Vec<String> = store.all_currencies().into_iter().map(|c| c.code).collect();
        assert_eq!(codes, vec!["NGN"]);
    }

    #[test]
    fn test_currency_point_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreManager::open(dir.path().join("store"));

        store
            .replace_all_currencies(&[currency("USD", "United States Dollar"), currency("EUR", "Euro")])
            .unwrap();

        assert_eq!(store.currency("EUR").unwrap().display_name, "Euro");
        assert!(store.currency("GBP").is_none());
    }

    #[test]
    fn test_upsert_rate_does_not_touch_other_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreManager::open(dir.path().join("store"));

        store.upsert_rate(&rate("USD_EUR", 0.85)).unwrap();
        store.upsert_rate(&rate("EUR_USD", 1.17)).unwrap();
        store.upsert_rate(&rate("USD_EUR", 0.86)).unwrap();

        assert_eq!(store.rate("USD_EUR").unwrap().value, 0.86);
        assert_eq!(store.rate("EUR_USD").unwrap().value, 1.17);
        assert_eq!(store.all_rates().len(), 2);
    }

    #[test]
    fn test_pair_ids_are_directional() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreManager::open(dir.path().join("store"));

        store.upsert_rate(&rate("USD_EUR", 0.85)).unwrap();

        // The reverse pair is a distinct entry; no inversion is derived.
        assert!(store.rate("EUR_USD").is_none());
    }

    #[test]
    fn test_unusable_root_degrades_to_absent() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let store = StoreManager::open(blocker.join("store"));

        assert!(!store.is_available());
        assert!(store.all_currencies().is_empty());
        assert!(store.rate("USD_EUR").is_none());
        // Writes are no-ops, not errors.
        assert!(store.upsert_rate(&rate("USD_EUR", 0.85)).is_ok());
        assert!(store.rate("USD_EUR").is_none());
    }

    #[test]
    fn test_corrupt_collection_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreManager::open(dir.path().to_path_buf());

        fs::write(dir.path().join("conversions.json"), b"{ not json").unwrap();

        assert!(store.rate("USD_EUR").is_none());
        // A subsequent write replaces the corrupt file.
        store.upsert_rate(&rate("USD_EUR", 0.85)).unwrap();
        assert_eq!(store.rate("USD_EUR").unwrap().value, 0.85);
    }

    #[test]
    fn test_stored_collection_age_display() {
        let fresh = StoredCollection::new(vec![1]);
        assert_eq!(fresh.age_display(), "just now");

        let mut old = StoredCollection::new(vec![1]);
        old.stored_at = Utc::now() - Duration::minutes(90);
        assert_eq!(old.age_display(), "1h ago");
    }
}
