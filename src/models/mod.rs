pub mod error;
pub mod item;
pub mod movement;
pub mod stock;
pub mod validation;

pub use error::MovementError;
pub use item::ItemMaster;
pub use movement::{
    BatchRow, MovementDocument, MovementHeader, MovementLine, MovementType, ReasonCode,
    ReasonCodePolicy,
};
pub use stock::{
    LocationCapacity, LocationStock, StockBalance, StockByLocationRow, StockImpactEntry, StockKey,
    StockSnapshot,
};
pub use validation::{
    ErrorScope, LineValidation, NumberGridResult, ValidationError, ValidationStatus,
};
