use std::collections::HashSet;

use chrono::NaiveDate;

use crate::models::{
    ItemMaster, LineValidation, MovementHeader, MovementLine, StockKey, StockSnapshot,
    ValidationStatus,
};

use super::direction::{effective_from, needs_from};

/// Everything a single line is validated against
pub struct LineContext<'a> {
    pub header: &'a MovementHeader,
    pub item: Option<&'a ItemMaster>,
    pub snapshot: &'a StockSnapshot,
    pub today: NaiveDate,
}

/// Validate one movement line.
///
/// Every rule group is evaluated and its findings accumulated; nothing
/// short-circuits, so the user sees all problems at once.
pub fn validate_line(line: &MovementLine, ctx: &LineContext) -> LineValidation {
    let mut findings: Vec<(String, bool)> = Vec::new();

    if line.item_key.trim().is_empty() {
        findings.push(("Item is required".to_string(), true));
    }

    if !(line.quantity > 0.0) {
        findings.push(("Invalid quantity".to_string(), true));
    }

    check_stock_sufficiency(line, ctx, &mut findings);

    if let Some(item) = ctx.item {
        check_batch_rules(line, item, &mut findings);
        check_serial_rules(line, item, &mut findings);
    }
    check_date_sanity(line, ctx.today, &mut findings);

    let blocking = findings.iter().any(|(_, blocking)| *blocking);
    let status = if blocking {
        ValidationStatus::Error
    } else if findings.is_empty() {
        ValidationStatus::Valid
    } else {
        ValidationStatus::Warning
    };

    LineValidation {
        status,
        messages: findings.into_iter().map(|(message, _)| message).collect(),
    }
}

/// Compare quantity against the cached available balance at the effective
/// source. Skipped while the balance is unresolved; the resolver will
/// trigger a recompute once it lands.
fn check_stock_sufficiency(
    line: &MovementLine,
    ctx: &LineContext,
    findings: &mut Vec<(String, bool)>,
) {
    if !needs_from(ctx.header.movement_type) || line.item_key.trim().is_empty() {
        return;
    }
    let Some(from) = effective_from(line, ctx.header) else {
        return;
    };
    let key = StockKey::new(line.item_key.clone(), from);
    let Some(balance) = ctx.snapshot.balance_for(&key) else {
        return;
    };

    if line.quantity > balance.available {
        findings.push((
            format!("Insufficient stock (available: {})", balance.available),
            true,
        ));
    } else if line.quantity == balance.available {
        // Consuming 100% of stock is allowed but worth flagging
        findings.push(("Using all available stock".to_string(), false));
    }
}

fn check_batch_rules(line: &MovementLine, item: &ItemMaster, findings: &mut Vec<(String, bool)>) {
    if !item.requires_batch_tracking {
        return;
    }

    let batch_present = line
        .batch_no
        .as_deref()
        .map(|b| !b.trim().is_empty())
        .unwrap_or(false);

    if !batch_present {
        findings.push(("Batch number is required".to_string(), true));
        return;
    }

    if line.manufacturing_date.is_none() {
        findings.push(("Manufacturing date is required".to_string(), true));
    }
    if item.has_expiry_date && line.expiry_date.is_none() {
        findings.push(("Expiry date is required".to_string(), true));
    }
}

fn check_date_sanity(line: &MovementLine, today: NaiveDate, findings: &mut Vec<(String, bool)>) {
    if let Some(expiry) = line.expiry_date {
        if expiry < today {
            findings.push(("Expiry date in the past".to_string(), true));
        }
    }
    if let Some(manufactured) = line.manufacturing_date {
        if manufactured > today {
            findings.push(("MFG date in the future".to_string(), true));
        }
    }
}

fn check_serial_rules(line: &MovementLine, item: &ItemMaster, findings: &mut Vec<(String, bool)>) {
    if !item.requires_serial_tracking {
        return;
    }

    if line.serial_numbers.len() as f64 != line.quantity {
        findings.push((
            format!("Serial count must equal quantity ({})", line.quantity),
            true,
        ));
    }

    let mut seen = HashSet::new();
    if line.serial_numbers.iter().any(|serial| !seen.insert(serial)) {
        findings.push(("Duplicate serials".to_string(), true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MovementType, StockBalance};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 25).unwrap()
    }

    fn issue_header(from: &str) -> MovementHeader {
        let mut header = MovementHeader::new(MovementType::Issue);
        header.default_from_location = Some(from.to_string());
        header
    }

    fn snapshot_with_balance(key: &StockKey, available: f64) -> StockSnapshot {
        let mut snapshot = StockSnapshot::empty();
        snapshot.balances.insert(
            key.cache_key(),
            StockBalance {
                available,
                reserved: 0.0,
                blocked: 0.0,
            },
        );
        snapshot
    }

    fn ctx<'a>(
        header: &'a MovementHeader,
        item: Option<&'a ItemMaster>,
        snapshot: &'a StockSnapshot,
    ) -> LineContext<'a> {
        LineContext {
            header,
            item,
            snapshot,
            today: today(),
        }
    }

    #[test]
    fn empty_item_and_zero_quantity_both_reported() {
        let header = issue_header("WH-A");
        let snapshot = StockSnapshot::empty();
        let line = MovementLine::new("", 0.0);

        let validation = validate_line(&line, &ctx(&header, None, &snapshot));
        assert_eq!(validation.status, ValidationStatus::Error);
        assert!(validation.messages.contains(&"Item is required".to_string()));
        assert!(validation.messages.contains(&"Invalid quantity".to_string()));
    }

    #[test]
    fn quantity_above_available_is_blocking() {
        let header = issue_header("WH-A");
        let key = StockKey::new("ITEM1", "WH-A");
        let snapshot = snapshot_with_balance(&key, 4.0);
        let line = MovementLine::new("ITEM1", 5.0);

        let validation = validate_line(&line, &ctx(&header, None, &snapshot));
        assert_eq!(validation.status, ValidationStatus::Error);
        assert!(validation
            .messages
            .contains(&"Insufficient stock (available: 4)".to_string()));
    }

    #[test]
    fn exact_available_is_a_warning_only() {
        let header = issue_header("WH-A");
        let key = StockKey::new("ITEM1", "WH-A");
        let snapshot = snapshot_with_balance(&key, 5.0);
        let line = MovementLine::new("ITEM1", 5.0);

        let validation = validate_line(&line, &ctx(&header, None, &snapshot));
        assert_eq!(validation.status, ValidationStatus::Warning);
        assert_eq!(
            validation.messages,
            vec!["Using all available stock".to_string()]
        );
    }

    #[test]
    fn unresolved_balance_skips_stock_check() {
        let header = issue_header("WH-A");
        let snapshot = StockSnapshot::empty();
        let line = MovementLine::new("ITEM1", 5.0);

        let validation = validate_line(&line, &ctx(&header, None, &snapshot));
        assert_eq!(validation.status, ValidationStatus::Valid);
    }

    #[test]
    fn batch_tracking_requires_batch_and_dates() {
        let header = MovementHeader::new(MovementType::Receipt);
        let snapshot = StockSnapshot::empty();
        let item = ItemMaster::new("ITEM1", "Flour")
            .with_batch_tracking()
            .with_expiry_date();

        let mut line = MovementLine::new("ITEM1", 5.0);
        let validation = validate_line(&line, &ctx(&header, Some(&item), &snapshot));
        assert!(validation
            .messages
            .contains(&"Batch number is required".to_string()));

        line.batch_no = Some("LOT-1".to_string());
        let validation = validate_line(&line, &ctx(&header, Some(&item), &snapshot));
        assert!(validation
            .messages
            .contains(&"Manufacturing date is required".to_string()));
        assert!(validation
            .messages
            .contains(&"Expiry date is required".to_string()));
    }

    #[test]
    fn expired_and_future_dates_are_blocking() {
        let header = MovementHeader::new(MovementType::Receipt);
        let snapshot = StockSnapshot::empty();
        let item = ItemMaster::new("ITEM1", "Flour")
            .with_batch_tracking()
            .with_expiry_date();

        let mut line = MovementLine::new("ITEM1", 5.0);
        line.batch_no = Some("LOT-1".to_string());
        line.manufacturing_date = NaiveDate::from_ymd_opt(2026, 9, 1);
        line.expiry_date = NaiveDate::from_ymd_opt(2026, 8, 1);

        let validation = validate_line(&line, &ctx(&header, Some(&item), &snapshot));
        assert!(validation
            .messages
            .contains(&"Expiry date in the past".to_string()));
        assert!(validation
            .messages
            .contains(&"MFG date in the future".to_string()));
        assert_eq!(validation.status, ValidationStatus::Error);
    }

    #[test]
    fn duplicate_serials_with_matching_count_are_still_an_error() {
        let header = MovementHeader::new(MovementType::Receipt);
        let snapshot = StockSnapshot::empty();
        let item = ItemMaster::new("ITEM1", "Pump").with_serial_tracking();

        let mut line = MovementLine::new("ITEM1", 3.0);
        line.serial_numbers = vec!["A".to_string(), "B".to_string(), "A".to_string()];

        let validation = validate_line(&line, &ctx(&header, Some(&item), &snapshot));
        // Count matches, so only the duplicate rule fires
        assert!(!validation
            .messages
            .iter()
            .any(|m| m.starts_with("Serial count")));
        assert!(validation
            .messages
            .contains(&"Duplicate serials".to_string()));
        assert_eq!(validation.status, ValidationStatus::Error);
    }

    #[test]
    fn serial_count_mismatch_is_an_error() {
        let header = MovementHeader::new(MovementType::Receipt);
        let snapshot = StockSnapshot::empty();
        let item = ItemMaster::new("ITEM1", "Pump").with_serial_tracking();

        let mut line = MovementLine::new("ITEM1", 3.0);
        line.serial_numbers = vec!["A".to_string(), "B".to_string()];

        let validation = validate_line(&line, &ctx(&header, Some(&item), &snapshot));
        assert!(validation
            .messages
            .contains(&"Serial count must equal quantity (3)".to_string()));
    }

    #[test]
    fn validation_is_a_pure_function_of_its_inputs() {
        let header = issue_header("WH-A");
        let key = StockKey::new("ITEM1", "WH-A");
        let snapshot = snapshot_with_balance(&key, 5.0);
        let item = ItemMaster::new("ITEM1", "Flour").with_batch_tracking();
        let mut line = MovementLine::new("ITEM1", 5.0);
        line.batch_no = Some("LOT-1".to_string());

        let first = validate_line(&line, &ctx(&header, Some(&item), &snapshot));
        let second = validate_line(&line, &ctx(&header, Some(&item), &snapshot));
        assert_eq!(first, second);
    }
}
