use std::collections::BTreeSet;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::ledger::StockLedger;
use crate::models::{
    LocationStock, MovementHeader, MovementLine, StockBalance, StockKey, StockSnapshot,
};

use super::direction::{effective_from, effective_to, needs_from};

/// Distinct `(item, effective-from)` pairs that need a balance lookup.
///
/// Balance checks only matter when the movement type consumes stock from a
/// source location, and only for lines where both the item and the source
/// resolve.
pub fn collect_balance_keys(lines: &[MovementLine], header: &MovementHeader) -> Vec<StockKey> {
    if !needs_from(header.movement_type) {
        return Vec::new();
    }

    let mut seen = BTreeSet::new();
    let mut keys = Vec::new();
    for line in lines {
        if line.item_key.trim().is_empty() {
            continue;
        }
        let Some(from) = effective_from(line, header) else {
            continue;
        };
        let key = StockKey::new(line.item_key.clone(), from);
        if seen.insert(key.cache_key()) {
            keys.push(key);
        }
    }
    keys
}

/// Distinct locations touched by any line in either direction, sorted
pub fn collect_touched_locations(lines: &[MovementLine], header: &MovementHeader) -> Vec<String> {
    let mut locations = BTreeSet::new();
    for line in lines {
        if let Some(from) = effective_from(line, header) {
            locations.insert(from.to_string());
        }
        if let Some(to) = effective_to(line, header) {
            locations.insert(to.to_string());
        }
    }
    locations.into_iter().collect()
}

/// Fetch every balance and location lookup for one generation, in parallel.
///
/// Each lookup is caught individually: a failed balance degrades to zero
/// availability and a failed location lookup to zero on-hand with unknown
/// capacity, so one bad key never aborts the batch. The caller decides
/// whether the returned snapshot is still current (generation guard).
pub async fn fetch_snapshot(
    ledger: &dyn StockLedger,
    generation: u64,
    keys: &[StockKey],
    locations: &[String],
) -> StockSnapshot {
    debug!(
        generation,
        balance_keys = keys.len(),
        locations = locations.len(),
        "Starting stock resolution cycle"
    );

    let balance_futures = keys.iter().map(|key| async move {
        let balance = match ledger
            .stock_balance(&key.item_key, &key.location, key.batch_no.as_deref())
            .await
        {
            Ok(balance) => balance,
            Err(e) => {
                warn!("Balance lookup failed for {}: {e}", key.cache_key());
                StockBalance::zero()
            }
        };
        (key.cache_key(), balance)
    });

    let location_futures = locations.iter().map(|location| async move {
        let before = match ledger.stock_by_location(location).await {
            Ok(rows) => rows.iter().map(|r| r.on_hand_quantity).sum(),
            Err(e) => {
                warn!("On-hand lookup failed for {location}: {e}");
                0.0
            }
        };
        let (name, max_items) = match ledger.location_capacity(location).await {
            Ok(capacity) => (capacity.name, capacity.max_items),
            Err(e) => {
                warn!("Capacity lookup failed for {location}: {e}");
                (location.clone(), None)
            }
        };
        (
            location.clone(),
            LocationStock {
                name,
                before,
                max_items,
            },
        )
    });

    let (balances, locations) = futures::join!(
        join_all(balance_futures),
        join_all(location_futures)
    );

    StockSnapshot {
        generation,
        balances: balances.into_iter().collect(),
        locations: locations.into_iter().collect(),
    }
}
