pub mod batch_grid;
pub mod direction;
pub mod impact;
pub mod line_validation;
pub mod resolver;
pub mod session;

pub use batch_grid::{
    run_availability_lookup, AvailabilityTicket, AvailabilityUpdate, BatchGrid, ReceivePolicy,
};
pub use direction::{apply_type_switch, effective_from, effective_to, needs_from, needs_to};
pub use impact::{compute_impact, StockImpact};
pub use line_validation::{validate_line, LineContext};
pub use resolver::{collect_balance_keys, collect_touched_locations, fetch_snapshot};
pub use session::{document_errors, evaluate_gate, GateResult, MovementSession};
