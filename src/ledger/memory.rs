use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::models::{
    LocationCapacity, MovementDocument, MovementType, ReasonCodePolicy, StockBalance,
    StockByLocationRow, StockKey,
};

use super::{LedgerError, StockLedger};

/// In-process stock ledger backed by hash maps.
///
/// Used by tests and demo wiring. Supports per-key failure injection and
/// submission rejection so fail-soft and retry behavior can be exercised.
#[derive(Default)]
pub struct InMemoryLedger {
    inner: Mutex<LedgerState>,
    balance_calls: AtomicU64,
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<String, StockBalance>,
    on_hand: HashMap<String, Vec<StockByLocationRow>>,
    capacities: HashMap<String, LocationCapacity>,
    reason_codes: HashMap<MovementType, ReasonCodePolicy>,
    failing_keys: HashSet<String>,
    reject_submissions: Option<String>,
    submitted: Vec<MovementDocument>,
    drafts: Vec<MovementDocument>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stock balance for `item|location[|batch]`
    pub fn set_balance(&self, key: &StockKey, balance: StockBalance) {
        let mut state = self.inner.lock().unwrap();
        state.balances.insert(key.cache_key(), balance);
    }

    /// Seed the on-hand rows for a location
    pub fn set_on_hand(&self, location: &str, rows: Vec<StockByLocationRow>) {
        let mut state = self.inner.lock().unwrap();
        state.on_hand.insert(location.to_string(), rows);
    }

    /// Seed the capacity record for a location
    pub fn set_capacity(&self, capacity: LocationCapacity) {
        let mut state = self.inner.lock().unwrap();
        state
            .capacities
            .insert(capacity.location.clone(), capacity);
    }

    /// Seed the reason code policy for a movement type
    pub fn set_reason_codes(&self, movement_type: MovementType, policy: ReasonCodePolicy) {
        let mut state = self.inner.lock().unwrap();
        state.reason_codes.insert(movement_type, policy);
    }

    /// Make lookups for the given cache key (or location id) fail
    pub fn fail_key(&self, key: &str) {
        let mut state = self.inner.lock().unwrap();
        state.failing_keys.insert(key.to_string());
    }

    /// Make every subsequent submission fail with the given message
    pub fn reject_submissions(&self, message: &str) {
        let mut state = self.inner.lock().unwrap();
        state.reject_submissions = Some(message.to_string());
    }

    /// Clear submission rejection
    pub fn accept_submissions(&self) {
        let mut state = self.inner.lock().unwrap();
        state.reject_submissions = None;
    }

    /// Documents accepted via `create_movement_batch`
    pub fn submitted(&self) -> Vec<MovementDocument> {
        self.inner.lock().unwrap().submitted.clone()
    }

    /// Documents accepted via `save_draft`
    pub fn drafts(&self) -> Vec<MovementDocument> {
        self.inner.lock().unwrap().drafts.clone()
    }

    /// Number of `stock_balance` calls served so far
    pub fn balance_call_count(&self) -> u64 {
        self.balance_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StockLedger for InMemoryLedger {
    async fn stock_balance(
        &self,
        item_key: &str,
        location: &str,
        batch_no: Option<&str>,
    ) -> Result<StockBalance, LedgerError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let key = match batch_no {
            Some(batch) => StockKey::new(item_key, location).with_batch(batch),
            None => StockKey::new(item_key, location),
        };
        let cache_key = key.cache_key();

        let state = self.inner.lock().unwrap();
        if state.failing_keys.contains(&cache_key) {
            return Err(LedgerError::Lookup(format!(
                "balance lookup failed for {cache_key}"
            )));
        }
        let balance = state
            .balances
            .get(&cache_key)
            .copied()
            .unwrap_or_else(StockBalance::zero);
        debug!("Balance lookup {cache_key}: available {}", balance.available);
        Ok(balance)
    }

    async fn stock_by_location(
        &self,
        location: &str,
    ) -> Result<Vec<StockByLocationRow>, LedgerError> {
        let state = self.inner.lock().unwrap();
        if state.failing_keys.contains(location) {
            return Err(LedgerError::Lookup(format!(
                "on-hand lookup failed for {location}"
            )));
        }
        Ok(state.on_hand.get(location).cloned().unwrap_or_default())
    }

    async fn location_capacity(&self, location: &str) -> Result<LocationCapacity, LedgerError> {
        let state = self.inner.lock().unwrap();
        if state.failing_keys.contains(location) {
            return Err(LedgerError::Lookup(format!(
                "capacity lookup failed for {location}"
            )));
        }
        Ok(state
            .capacities
            .get(location)
            .cloned()
            .unwrap_or(LocationCapacity {
                location: location.to_string(),
                name: location.to_string(),
                max_items: None,
                max_weight: None,
                max_volume: None,
            }))
    }

    async fn reason_codes_for(
        &self,
        movement_type: MovementType,
    ) -> Result<ReasonCodePolicy, LedgerError> {
        let state = self.inner.lock().unwrap();
        Ok(state
            .reason_codes
            .get(&movement_type)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_movement_batch(
        &self,
        document: &MovementDocument,
    ) -> Result<MovementDocument, LedgerError> {
        let mut state = self.inner.lock().unwrap();
        if let Some(message) = &state.reject_submissions {
            return Err(LedgerError::Rejected(message.clone()));
        }
        state.submitted.push(document.clone());
        Ok(document.clone())
    }

    async fn save_draft(
        &self,
        document: &MovementDocument,
    ) -> Result<MovementDocument, LedgerError> {
        let mut state = self.inner.lock().unwrap();
        if let Some(message) = &state.reject_submissions {
            return Err(LedgerError::Rejected(message.clone()));
        }
        state.drafts.push(document.clone());
        Ok(document.clone())
    }
}
