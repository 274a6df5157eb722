use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stock balance for one item at one location (optionally one batch)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockBalance {
    pub available: f64,
    pub reserved: f64,
    pub blocked: f64,
}

impl StockBalance {
    /// Conservative fallback used when a lookup fails or has not resolved
    pub fn zero() -> Self {
        Self {
            available: 0.0,
            reserved: 0.0,
            blocked: 0.0,
        }
    }
}

/// Lookup key for a stock balance: item + location, optionally batch-scoped
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub item_key: String,
    pub location: String,
    pub batch_no: Option<String>,
}

impl StockKey {
    pub fn new(item_key: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            item_key: item_key.into(),
            location: location.into(),
            batch_no: None,
        }
    }

    pub fn with_batch(mut self, batch_no: impl Into<String>) -> Self {
        self.batch_no = Some(batch_no.into());
        self
    }

    /// Cache key form: `item|location` or `item|location|batch`
    pub fn cache_key(&self) -> String {
        match &self.batch_no {
            Some(batch) => format!("{}|{}|{}", self.item_key, self.location, batch),
            None => format!("{}|{}", self.item_key, self.location),
        }
    }
}

/// One on-hand row returned by the ledger for a location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockByLocationRow {
    pub item_key: String,
    pub on_hand_quantity: f64,
}

/// Capacity limits reported by the ledger for a location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationCapacity {
    pub location: String,
    pub name: String,
    pub max_items: Option<f64>,
    pub max_weight: Option<f64>,
    pub max_volume: Option<f64>,
}

/// Resolved on-hand total and capacity ceiling for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationStock {
    pub name: String,
    pub before: f64,
    pub max_items: Option<f64>,
}

impl LocationStock {
    /// Fallback when the capacity/on-hand lookups fail
    pub fn unresolved(location: &str) -> Self {
        Self {
            name: location.to_string(),
            before: 0.0,
            max_items: None,
        }
    }
}

/// Point-in-time view of every balance and location the document touches.
///
/// A snapshot is replaced wholesale by the resolver; entries from different
/// fetch generations are never merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub generation: u64,
    pub balances: HashMap<String, StockBalance>,
    pub locations: HashMap<String, LocationStock>,
}

impl StockSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn balance_for(&self, key: &StockKey) -> Option<&StockBalance> {
        self.balances.get(&key.cache_key())
    }

    pub fn location(&self, location: &str) -> Option<&LocationStock> {
        self.locations.get(location)
    }

    pub fn location_name<'a>(&'a self, location: &'a str) -> &'a str {
        self.locations
            .get(location)
            .map(|l| l.name.as_str())
            .unwrap_or(location)
    }
}

/// Predicted before/after on-hand at one location if the document commits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockImpactEntry {
    pub location: String,
    pub location_name: String,
    pub change: f64,
    pub before: f64,
    pub after: f64,
}
