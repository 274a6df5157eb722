use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    LocationCapacity, MovementDocument, MovementType, ReasonCodePolicy, StockBalance,
    StockByLocationRow,
};

pub mod memory;

pub use memory::InMemoryLedger;

/// Errors from the backing stock ledger
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Ledger lookup failed: {0}")]
    Lookup(String),

    #[error("Ledger rejected document: {0}")]
    Rejected(String),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Interface to the authoritative stock ledger.
///
/// The engine only reads point-in-time balances and capacities through this
/// trait and hands finished documents over for execution; it never mutates
/// stock itself. The transport layer injects a real client, tests inject
/// [`InMemoryLedger`].
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Balance for one item at one location, optionally batch-scoped
    async fn stock_balance(
        &self,
        item_key: &str,
        location: &str,
        batch_no: Option<&str>,
    ) -> Result<StockBalance, LedgerError>;

    /// All on-hand rows at a location; the engine sums these into the
    /// location's "before" total
    async fn stock_by_location(&self, location: &str)
        -> Result<Vec<StockByLocationRow>, LedgerError>;

    /// Capacity limits for a location
    async fn location_capacity(&self, location: &str) -> Result<LocationCapacity, LedgerError>;

    /// Allowed reason codes for a movement type, with the preselected default
    async fn reason_codes_for(
        &self,
        movement_type: MovementType,
    ) -> Result<ReasonCodePolicy, LedgerError>;

    /// Submit a finished document for execution/approval
    async fn create_movement_batch(
        &self,
        document: &MovementDocument,
    ) -> Result<MovementDocument, LedgerError>;

    /// Persist a draft document (never routed for approval)
    async fn save_draft(&self, document: &MovementDocument)
        -> Result<MovementDocument, LedgerError>;
}
