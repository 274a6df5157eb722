use serde::{Deserialize, Serialize};

use super::movement::BatchRow;

/// Aggregate status of one validated movement line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,
    Warning,
    Error,
}

/// Validation outcome for one movement line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineValidation {
    pub status: ValidationStatus,
    pub messages: Vec<String>,
}

impl LineValidation {
    pub fn valid() -> Self {
        Self {
            status: ValidationStatus::Valid,
            messages: Vec::new(),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.status == ValidationStatus::Error
    }
}

/// Where a validation error is attached within the batch editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorScope {
    Row,
    Total,
    Line,
}

/// Uniform error currency between the batch grid, the line validator and
/// the submission gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub scope: ErrorScope,
    pub row_index: Option<usize>,
    pub field: Option<String>,
    pub message: String,
    pub blocking: bool,
}

impl ValidationError {
    pub fn row(row_index: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            scope: ErrorScope::Row,
            row_index: Some(row_index),
            field: Some(field.to_string()),
            message: message.into(),
            blocking: true,
        }
    }

    pub fn total(message: impl Into<String>) -> Self {
        Self {
            scope: ErrorScope::Total,
            row_index: None,
            field: None,
            message: message.into(),
            blocking: true,
        }
    }

    pub fn line(message: impl Into<String>, blocking: bool) -> Self {
        Self {
            scope: ErrorScope::Line,
            row_index: None,
            field: None,
            message: message.into(),
            blocking,
        }
    }
}

/// Result surface of the batch editor, fed back into the owning line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberGridResult {
    pub final_batch_list: Vec<BatchRow>,
    pub derived_quantity: f64,
    pub validation_errors: Vec<ValidationError>,
    pub is_valid: bool,
}
