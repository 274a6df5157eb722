//! Movement document validation and stock-impact engine.
//!
//! Backs creation of multi-line stock-movement documents (receipts, issues,
//! transfers, adjustments, damage/waste/loss, block/unblock). Given a
//! document header and its lines, the engine validates each line, projects
//! the net effect on every touched location against a point-in-time stock
//! snapshot, and gates draft-save and submit. It never mutates stock
//! itself; the authoritative check and commit happen in the backing ledger.

pub mod config;
pub mod constants;
pub mod ledger;
pub mod models;
pub mod services;
pub mod utils;

pub use config::EngineConfig;
pub use ledger::{InMemoryLedger, LedgerError, StockLedger};
pub use models::{
    BatchRow, ItemMaster, LineValidation, MovementDocument, MovementError, MovementHeader,
    MovementLine, MovementType, NumberGridResult, ReasonCode, ReasonCodePolicy, StockBalance,
    StockImpactEntry, StockKey, StockSnapshot, ValidationError, ValidationStatus,
};
pub use services::{BatchGrid, MovementSession, ReceivePolicy};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
