use tracing::debug;

use crate::models::{MovementHeader, MovementLine, MovementType};

/// Whether documents of this type must name a source location
pub fn needs_from(movement_type: MovementType) -> bool {
    matches!(
        movement_type,
        MovementType::Transfer
            | MovementType::Issue
            | MovementType::Damage
            | MovementType::Waste
            | MovementType::Loss
            | MovementType::Block
    )
}

/// Whether documents of this type must name a destination location
pub fn needs_to(movement_type: MovementType) -> bool {
    matches!(
        movement_type,
        MovementType::Receipt | MovementType::Transfer | MovementType::Adjustment
    )
}

/// A line's source location after falling back to the document default
pub fn effective_from<'a>(line: &'a MovementLine, header: &'a MovementHeader) -> Option<&'a str> {
    pick_location(
        line.from_location.as_deref(),
        header.default_from_location.as_deref(),
    )
}

/// A line's destination location after falling back to the document default
pub fn effective_to<'a>(line: &'a MovementLine, header: &'a MovementHeader) -> Option<&'a str> {
    pick_location(
        line.to_location.as_deref(),
        header.default_to_location.as_deref(),
    )
}

fn pick_location<'a>(line: Option<&'a str>, default: Option<&'a str>) -> Option<&'a str> {
    line.filter(|l| !l.trim().is_empty())
        .or_else(|| default.filter(|d| !d.trim().is_empty()))
}

/// Switch the header's movement type, clearing defaults that are meaningless
/// for the new type so stale locations never survive a switch.
pub fn apply_type_switch(header: &mut MovementHeader, new_type: MovementType) {
    header.movement_type = new_type;
    if new_type == MovementType::Receipt && header.default_from_location.is_some() {
        debug!("Clearing default from-location on switch to RECEIPT");
        header.default_from_location = None;
    }
    if new_type == MovementType::Issue && header.default_to_location.is_some() {
        debug!("Clearing default to-location on switch to ISSUE");
        header.default_to_location = None;
    }
}
