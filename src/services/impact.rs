use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{MovementHeader, MovementLine, StockImpactEntry, StockSnapshot};

use super::direction::{effective_from, effective_to};

/// Projected per-location outcome of committing the current document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockImpact {
    pub entries: Vec<StockImpactEntry>,
    pub errors: Vec<String>,
}

/// Fold every line into a per-location net change and project before/after
/// totals from the snapshot.
///
/// Locations with zero net change are omitted. Unresolved locations project
/// from a zero "before". Output is ordered by location id so recomputing
/// from unchanged inputs yields identical results.
pub fn compute_impact(
    lines: &[MovementLine],
    header: &MovementHeader,
    snapshot: &StockSnapshot,
) -> StockImpact {
    let mut change_by_location: BTreeMap<String, f64> = BTreeMap::new();

    for line in lines {
        if !(line.quantity > 0.0) {
            continue;
        }
        if let Some(from) = effective_from(line, header) {
            *change_by_location.entry(from.to_string()).or_insert(0.0) -= line.quantity;
        }
        if let Some(to) = effective_to(line, header) {
            *change_by_location.entry(to.to_string()).or_insert(0.0) += line.quantity;
        }
    }

    let mut impact = StockImpact::default();
    for (location, change) in change_by_location {
        if change == 0.0 {
            continue;
        }

        let resolved = snapshot.location(&location);
        let before = resolved.map(|l| l.before).unwrap_or(0.0);
        let max_items = resolved.and_then(|l| l.max_items);
        let after = before + change;
        let name = snapshot.location_name(&location).to_string();

        if after < 0.0 {
            impact
                .errors
                .push(format!("{name} would go negative (after: {after})"));
        }
        if let Some(max) = max_items {
            if after > max {
                impact
                    .errors
                    .push(format!("{name} would exceed capacity ({after} > {max})"));
            }
        }

        impact.entries.push(StockImpactEntry {
            location,
            location_name: name,
            change,
            before,
            after,
        });
    }

    impact
}
