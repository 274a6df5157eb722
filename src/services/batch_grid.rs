use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::BATCH_LOOKUP_DEBOUNCE_MS;
use crate::ledger::StockLedger;
use crate::models::{BatchRow, ItemMaster, NumberGridResult, ValidationError};

/// Over/partial-receive policy for one line's batch editor.
///
/// Supplied per document by upstream configuration; defaults are the
/// conservative pair (neither over- nor partial-receive allowed).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReceivePolicy {
    pub allow_over_receive: bool,
    pub allow_partial: bool,
}

impl Default for ReceivePolicy {
    fn default() -> Self {
        Self {
            allow_over_receive: false,
            allow_partial: false,
        }
    }
}

/// Sequence value marking a row that no longer exists
const SEQ_DEAD: u64 = u64::MAX;

struct RowState {
    row: BatchRow,
    /// Edit sequence; bumped on every batch-code keystroke so pending
    /// lookups for stale text are discarded
    seq: Arc<AtomicU64>,
    /// Availability returned by the last applied lookup for the current code
    last_available: Option<f64>,
}

impl RowState {
    fn new() -> Self {
        Self {
            row: BatchRow::empty(),
            seq: Arc::new(AtomicU64::new(0)),
            last_available: None,
        }
    }

    fn is_untouched(&self) -> bool {
        self.row.batch_code.trim().is_empty()
            && self.row.quantity == 0.0
            && self.row.manufacturing_date.is_none()
            && self.row.expiry_date.is_none()
    }
}

/// Pending availability lookup for one row's batch code.
///
/// Carries everything the debounced task needs so it can run without
/// borrowing the grid; the grid validates the sequence again on apply.
pub struct AvailabilityTicket {
    seq_cell: Arc<AtomicU64>,
    seq: u64,
    alive: Arc<AtomicBool>,
    pub item_key: String,
    pub location: String,
    pub batch_code: String,
}

/// Completed lookup, ready to be applied back onto the grid
pub struct AvailabilityUpdate {
    seq_cell: Arc<AtomicU64>,
    seq: u64,
    pub available: f64,
}

/// Row editor for one movement line split into multiple batch receipts.
///
/// Owns the row list, reconciles the summed quantity against the line's
/// expected quantity under the receive policy, and tracks per-row
/// availability checks.
pub struct BatchGrid {
    item: ItemMaster,
    location: String,
    expected_quantity: f64,
    policy: ReceivePolicy,
    today: NaiveDate,
    rows: Vec<RowState>,
    alive: Arc<AtomicBool>,
}

impl BatchGrid {
    pub fn new(
        item: ItemMaster,
        location: impl Into<String>,
        expected_quantity: f64,
        policy: ReceivePolicy,
        today: NaiveDate,
    ) -> Self {
        Self {
            item,
            location: location.into(),
            expected_quantity,
            policy,
            today,
            rows: vec![RowState::new()],
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&BatchRow> {
        self.rows.get(index).map(|state| &state.row)
    }

    /// Append an empty row, returning its index
    pub fn add_row(&mut self) -> usize {
        self.rows.push(RowState::new());
        self.rows.len() - 1
    }

    /// Remove a row; any pending lookup for it is cancelled
    pub fn remove_row(&mut self, index: usize) {
        if index >= self.rows.len() {
            return;
        }
        self.rows[index].seq.store(SEQ_DEAD, Ordering::SeqCst);
        self.rows.remove(index);
    }

    /// Record a batch-code keystroke. Resets the row's debounce window and
    /// invalidates any availability fetched for the previous text.
    pub fn edit_batch_code(&mut self, index: usize, code: &str) {
        if let Some(state) = self.rows.get_mut(index) {
            state.row.batch_code = code.to_string();
            state.last_available = None;
            state.seq.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn set_quantity(&mut self, index: usize, quantity: f64) {
        if let Some(state) = self.rows.get_mut(index) {
            state.row.quantity = quantity;
        }
    }

    pub fn set_dates(
        &mut self,
        index: usize,
        manufacturing_date: Option<NaiveDate>,
        expiry_date: Option<NaiveDate>,
    ) {
        if let Some(state) = self.rows.get_mut(index) {
            state.row.manufacturing_date = manufacturing_date;
            state.row.expiry_date = expiry_date;
        }
    }

    /// Field blur on a batch code: schedule a debounced availability lookup.
    /// Returns `None` when the code is empty (nothing to look up).
    pub fn on_batch_code_blur(&self, index: usize) -> Option<AvailabilityTicket> {
        let state = self.rows.get(index)?;
        let code = state.row.batch_code.trim();
        if code.is_empty() {
            return None;
        }
        Some(AvailabilityTicket {
            seq_cell: Arc::clone(&state.seq),
            seq: state.seq.load(Ordering::SeqCst),
            alive: Arc::clone(&self.alive),
            item_key: self.item.item_key.clone(),
            location: self.location.clone(),
            batch_code: code.to_string(),
        })
    }

    /// Install a completed lookup if its row still exists and the batch code
    /// has not been edited since. Returns whether it was applied.
    pub fn apply_availability(&mut self, update: AvailabilityUpdate) -> bool {
        let Some(state) = self
            .rows
            .iter_mut()
            .find(|state| Arc::ptr_eq(&state.seq, &update.seq_cell))
        else {
            debug!("Dropping availability result for removed row");
            return false;
        };
        if state.seq.load(Ordering::SeqCst) != update.seq {
            debug!("Dropping availability result for superseded batch code edit");
            return false;
        }
        state.last_available = Some(update.available);
        true
    }

    /// Rows that contribute to the line total: non-empty code, quantity > 0
    pub fn final_batch_list(&self) -> Vec<BatchRow> {
        self.rows
            .iter()
            .filter(|state| state.row.contributes())
            .map(|state| state.row.clone())
            .collect()
    }

    pub fn derived_quantity(&self) -> f64 {
        self.final_batch_list().iter().map(|row| row.quantity).sum()
    }

    /// Validate all rows and the reconciled total
    pub fn result(&self) -> NumberGridResult {
        let mut errors = Vec::new();

        for (index, state) in self.rows.iter().enumerate() {
            if state.is_untouched() {
                continue;
            }
            self.validate_row(index, state, &mut errors);
        }

        let final_batch_list = self.final_batch_list();
        let derived_quantity: f64 = final_batch_list.iter().map(|row| row.quantity).sum();
        self.validate_total(derived_quantity, &mut errors);

        let blocking = errors.iter().any(|e| e.blocking);
        NumberGridResult {
            final_batch_list,
            derived_quantity,
            validation_errors: errors,
            is_valid: !blocking && derived_quantity > 0.0,
        }
    }

    fn validate_row(&self, index: usize, state: &RowState, errors: &mut Vec<ValidationError>) {
        let row = &state.row;
        let code_present = !row.batch_code.trim().is_empty();

        if !code_present {
            errors.push(ValidationError::row(
                index,
                "batch_code",
                "Batch code is required",
            ));
        }
        if !(row.quantity > 0.0) {
            errors.push(ValidationError::row(index, "quantity", "Invalid quantity"));
        }

        if self.item.requires_batch_tracking && row.manufacturing_date.is_none() {
            errors.push(ValidationError::row(
                index,
                "manufacturing_date",
                "Manufacturing date is required",
            ));
        }
        if self.item.has_expiry_date && row.expiry_date.is_none() {
            errors.push(ValidationError::row(
                index,
                "expiry_date",
                "Expiry date is required",
            ));
        }
        if let Some(expiry) = row.expiry_date {
            if expiry < self.today {
                errors.push(ValidationError::row(
                    index,
                    "expiry_date",
                    "Expiry date in the past",
                ));
            }
        }
        if let Some(manufactured) = row.manufacturing_date {
            if manufactured > self.today {
                errors.push(ValidationError::row(
                    index,
                    "manufacturing_date",
                    "MFG date in the future",
                ));
            }
        }

        if let Some(available) = state.last_available {
            if row.quantity > available {
                errors.push(ValidationError::row(
                    index,
                    "quantity",
                    format!(
                        "Quantity ({}) exceeds available ({available})",
                        row.quantity
                    ),
                ));
            }
        }
    }

    fn validate_total(&self, total: f64, errors: &mut Vec<ValidationError>) {
        if total == 0.0 {
            errors.push(ValidationError::total(
                "Total received quantity must be greater than zero",
            ));
            return;
        }
        if total > self.expected_quantity && !self.policy.allow_over_receive {
            errors.push(ValidationError::total(format!(
                "Received quantity ({total}) exceeds expected ({})",
                self.expected_quantity
            )));
        }
        if total < self.expected_quantity && !self.policy.allow_partial {
            errors.push(ValidationError::total(format!(
                "Received quantity ({total}) is less than expected ({})",
                self.expected_quantity
            )));
        }
    }
}

impl Drop for BatchGrid {
    fn drop(&mut self) {
        // Disposal cancels every outstanding debounced lookup
        self.alive.store(false, Ordering::SeqCst);
    }
}

/// Run one debounced availability lookup.
///
/// Sleeps through the debounce window, then fires the ledger query only if
/// the grid is still alive and the row's batch code has not been edited
/// since the ticket was issued. A failed lookup degrades to zero
/// availability rather than hanging validation.
pub async fn run_availability_lookup(
    ticket: AvailabilityTicket,
    ledger: &dyn StockLedger,
) -> Option<AvailabilityUpdate> {
    tokio::time::sleep(Duration::from_millis(BATCH_LOOKUP_DEBOUNCE_MS)).await;

    if !ticket.alive.load(Ordering::SeqCst) {
        debug!("Skipping availability lookup for disposed batch editor");
        return None;
    }
    if ticket.seq_cell.load(Ordering::SeqCst) != ticket.seq {
        debug!(
            "Skipping availability lookup for superseded edit of '{}'",
            ticket.batch_code
        );
        return None;
    }

    let available = match ledger
        .stock_balance(&ticket.item_key, &ticket.location, Some(&ticket.batch_code))
        .await
    {
        Ok(balance) => balance.available,
        Err(e) => {
            warn!(
                "Availability lookup failed for batch '{}': {e}",
                ticket.batch_code
            );
            0.0
        }
    };

    Some(AvailabilityUpdate {
        seq_cell: ticket.seq_cell,
        seq: ticket.seq,
        available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use crate::models::{StockBalance, StockKey};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 25).unwrap()
    }

    fn plain_item() -> ItemMaster {
        ItemMaster::new("ITEM1", "Flour")
    }

    fn grid_with(policy: ReceivePolicy) -> BatchGrid {
        BatchGrid::new(plain_item(), "WH-A", 10.0, policy, today())
    }

    fn fill_row(grid: &mut BatchGrid, index: usize, code: &str, quantity: f64) {
        grid.edit_batch_code(index, code);
        grid.set_quantity(index, quantity);
    }

    #[test]
    fn only_complete_rows_contribute() {
        let mut grid = grid_with(ReceivePolicy::default());
        fill_row(&mut grid, 0, "LOT-1", 4.0);
        let empty_code = grid.add_row();
        grid.set_quantity(empty_code, 3.0);
        let zero_qty = grid.add_row();
        grid.edit_batch_code(zero_qty, "LOT-2");

        assert_eq!(grid.final_batch_list().len(), 1);
        assert_eq!(grid.derived_quantity(), 4.0);
    }

    #[test]
    fn partial_receive_blocked_unless_allowed() {
        let mut grid = grid_with(ReceivePolicy {
            allow_over_receive: false,
            allow_partial: false,
        });
        fill_row(&mut grid, 0, "LOT-1", 5.0);
        let second = grid.add_row();
        fill_row(&mut grid, second, "LOT-2", 3.0);

        let result = grid.result();
        assert!(!result.is_valid);
        assert!(result
            .validation_errors
            .iter()
            .any(|e| e.message == "Received quantity (8) is less than expected (10)"));

        let mut grid = grid_with(ReceivePolicy {
            allow_over_receive: false,
            allow_partial: true,
        });
        fill_row(&mut grid, 0, "LOT-1", 5.0);
        let second = grid.add_row();
        fill_row(&mut grid, second, "LOT-2", 3.0);

        let result = grid.result();
        assert!(result.is_valid);
        assert_eq!(result.derived_quantity, 8.0);
    }

    #[test]
    fn over_receive_blocked_unless_allowed() {
        let mut grid = grid_with(ReceivePolicy {
            allow_over_receive: false,
            allow_partial: true,
        });
        fill_row(&mut grid, 0, "LOT-1", 12.0);

        let result = grid.result();
        assert!(result
            .validation_errors
            .iter()
            .any(|e| e.message == "Received quantity (12) exceeds expected (10)"));

        let mut grid = grid_with(ReceivePolicy {
            allow_over_receive: true,
            allow_partial: true,
        });
        fill_row(&mut grid, 0, "LOT-1", 12.0);
        assert!(grid.result().is_valid);
    }

    #[test]
    fn zero_total_is_always_invalid() {
        let grid = grid_with(ReceivePolicy {
            allow_over_receive: true,
            allow_partial: true,
        });
        let result = grid.result();
        assert!(!result.is_valid);
        assert!(result
            .validation_errors
            .iter()
            .any(|e| e.message == "Total received quantity must be greater than zero"));
    }

    #[test]
    fn row_date_rules_follow_item_flags() {
        let item = ItemMaster::new("ITEM1", "Flour")
            .with_batch_tracking()
            .with_expiry_date();
        let mut grid = BatchGrid::new(item, "WH-A", 5.0, ReceivePolicy::default(), today());
        fill_row(&mut grid, 0, "LOT-1", 5.0);

        let result = grid.result();
        let messages: Vec<&str> = result
            .validation_errors
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        assert!(messages.contains(&"Manufacturing date is required"));
        assert!(messages.contains(&"Expiry date is required"));

        grid.set_dates(
            0,
            NaiveDate::from_ymd_opt(2026, 9, 1),
            NaiveDate::from_ymd_opt(2026, 8, 1),
        );
        let result = grid.result();
        let messages: Vec<&str> = result
            .validation_errors
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        assert!(messages.contains(&"MFG date in the future"));
        assert!(messages.contains(&"Expiry date in the past"));
    }

    #[test]
    fn incomplete_rows_get_row_errors() {
        let mut grid = grid_with(ReceivePolicy::default());
        grid.set_quantity(0, 3.0);

        let result = grid.result();
        assert!(result
            .validation_errors
            .iter()
            .any(|e| e.row_index == Some(0) && e.message == "Batch code is required"));
    }

    #[tokio::test(start_paused = true)]
    async fn availability_excess_raises_row_error() {
        let ledger = InMemoryLedger::new();
        ledger.set_balance(
            &StockKey::new("ITEM1", "WH-A").with_batch("LOT-1"),
            StockBalance {
                available: 3.0,
                reserved: 0.0,
                blocked: 0.0,
            },
        );

        let mut grid = grid_with(ReceivePolicy {
            allow_over_receive: true,
            allow_partial: true,
        });
        fill_row(&mut grid, 0, "LOT-1", 5.0);

        let ticket = grid.on_batch_code_blur(0).unwrap();
        let update = run_availability_lookup(ticket, &ledger).await.unwrap();
        assert!(grid.apply_availability(update));

        let result = grid.result();
        assert!(!result.is_valid);
        assert!(result
            .validation_errors
            .iter()
            .any(|e| e.message == "Quantity (5) exceeds available (3)"));
    }

    #[tokio::test(start_paused = true)]
    async fn keystroke_within_window_cancels_pending_lookup() {
        let ledger = InMemoryLedger::new();
        let mut grid = grid_with(ReceivePolicy::default());
        fill_row(&mut grid, 0, "LOT-1", 5.0);

        let stale = grid.on_batch_code_blur(0).unwrap();
        // Another keystroke before the window settles
        grid.edit_batch_code(0, "LOT-12");
        let fresh = grid.on_batch_code_blur(0).unwrap();

        assert!(run_availability_lookup(stale, &ledger).await.is_none());
        assert!(run_availability_lookup(fresh, &ledger).await.is_some());
        // The superseded ticket never reached the ledger
        assert_eq!(ledger.balance_call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn removing_the_row_cancels_its_lookup() {
        let ledger = InMemoryLedger::new();
        let mut grid = grid_with(ReceivePolicy::default());
        fill_row(&mut grid, 0, "LOT-1", 5.0);

        let ticket = grid.on_batch_code_blur(0).unwrap();
        grid.remove_row(0);

        assert!(run_availability_lookup(ticket, &ledger).await.is_none());
        assert_eq!(ledger.balance_call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disposing_the_grid_cancels_all_lookups() {
        let ledger = InMemoryLedger::new();
        let mut grid = grid_with(ReceivePolicy::default());
        fill_row(&mut grid, 0, "LOT-1", 5.0);

        let ticket = grid.on_batch_code_blur(0).unwrap();
        drop(grid);

        assert!(run_availability_lookup(ticket, &ledger).await.is_none());
        assert_eq!(ledger.balance_call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_lookup_degrades_to_zero_availability() {
        let ledger = InMemoryLedger::new();
        ledger.fail_key("ITEM1|WH-A|LOT-1");

        let mut grid = grid_with(ReceivePolicy {
            allow_over_receive: true,
            allow_partial: true,
        });
        fill_row(&mut grid, 0, "LOT-1", 5.0);

        let ticket = grid.on_batch_code_blur(0).unwrap();
        let update = run_availability_lookup(ticket, &ledger).await.unwrap();
        grid.apply_availability(update);

        let result = grid.result();
        assert!(result
            .validation_errors
            .iter()
            .any(|e| e.message == "Quantity (5) exceeds available (0)"));
    }

    #[test]
    fn stale_application_after_edit_is_rejected() {
        let mut grid = grid_with(ReceivePolicy::default());
        fill_row(&mut grid, 0, "LOT-1", 5.0);

        let ticket = grid.on_batch_code_blur(0).unwrap();
        let update = AvailabilityUpdate {
            seq_cell: ticket.seq_cell,
            seq: ticket.seq,
            available: 99.0,
        };
        grid.edit_batch_code(0, "LOT-2");
        assert!(!grid.apply_availability(update));
    }
}
