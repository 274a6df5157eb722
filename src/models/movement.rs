use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stock movement document types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Receipt,
    Issue,
    Transfer,
    Adjustment,
    Damage,
    Waste,
    Loss,
    Block,
    Unblock,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Receipt => "RECEIPT",
            MovementType::Issue => "ISSUE",
            MovementType::Transfer => "TRANSFER",
            MovementType::Adjustment => "ADJUSTMENT",
            MovementType::Damage => "DAMAGE",
            MovementType::Waste => "WASTE",
            MovementType::Loss => "LOSS",
            MovementType::Block => "BLOCK",
            MovementType::Unblock => "UNBLOCK",
        }
    }

    /// All movement types, for dropdowns and exhaustive checks
    pub const ALL: [MovementType; 9] = [
        MovementType::Receipt,
        MovementType::Issue,
        MovementType::Transfer,
        MovementType::Adjustment,
        MovementType::Damage,
        MovementType::Waste,
        MovementType::Loss,
        MovementType::Block,
        MovementType::Unblock,
    ];
}

/// Document header shared by all lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementHeader {
    pub movement_type: MovementType,
    pub default_from_location: Option<String>,
    pub default_to_location: Option<String>,
    pub reason_code: String,
    pub reason_description: Option<String>,
    pub document_notes: Option<String>,
    pub requires_approval: bool,
}

impl MovementHeader {
    pub fn new(movement_type: MovementType) -> Self {
        Self {
            movement_type,
            default_from_location: None,
            default_to_location: None,
            reason_code: String::new(),
            reason_description: None,
            document_notes: None,
            requires_approval: false,
        }
    }
}

/// One item/quantity/location tuple within a movement document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementLine {
    pub item_key: String,
    pub variant_key: Option<String>,
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub quantity: f64,
    pub unit_of_measure: String,
    pub batch_no: Option<String>,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub serial_numbers: Vec<String>,
    pub line_reason_code: Option<String>,
}

impl MovementLine {
    pub fn new(item_key: impl Into<String>, quantity: f64) -> Self {
        Self {
            item_key: item_key.into(),
            variant_key: None,
            from_location: None,
            to_location: None,
            quantity,
            unit_of_measure: String::new(),
            batch_no: None,
            manufacturing_date: None,
            expiry_date: None,
            serial_numbers: Vec::new(),
            line_reason_code: None,
        }
    }
}

/// Header plus ordered lines; the unit handed to the ledger on submit/draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementDocument {
    pub document_id: Uuid,
    pub header: MovementHeader,
    pub lines: Vec<MovementLine>,
}

impl MovementDocument {
    pub fn new(movement_type: MovementType) -> Self {
        Self {
            document_id: Uuid::new_v4(),
            header: MovementHeader::new(movement_type),
            lines: Vec::new(),
        }
    }
}

/// One sub-receipt (batch code + quantity + dates) inside a line's batch editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    pub batch_code: String,
    pub quantity: f64,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
}

impl BatchRow {
    pub fn empty() -> Self {
        Self {
            batch_code: String::new(),
            quantity: 0.0,
            manufacturing_date: None,
            expiry_date: None,
        }
    }

    /// A row contributes to the line total only when it has a code and a
    /// positive quantity
    pub fn contributes(&self) -> bool {
        !self.batch_code.trim().is_empty() && self.quantity > 0.0
    }
}

/// Reason code entry for the document header dropdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonCode {
    pub code: String,
    pub name: String,
}

/// Allowed reason codes for one movement type, with the preselected default
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReasonCodePolicy {
    pub allowed: Vec<ReasonCode>,
    pub default_code: Option<String>,
}

impl ReasonCodePolicy {
    pub fn permits(&self, code: &str) -> bool {
        self.allowed.iter().any(|r| r.code == code)
    }
}
