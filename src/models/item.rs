use serde::{Deserialize, Serialize};

/// Item master record with the industry flags that drive line validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemMaster {
    pub item_key: String,
    pub description: String,
    pub stock_uom: String,
    pub requires_batch_tracking: bool,
    pub requires_serial_tracking: bool,
    pub has_expiry_date: bool,
}

impl ItemMaster {
    pub fn new(item_key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            item_key: item_key.into(),
            description: description.into(),
            stock_uom: "EA".to_string(),
            requires_batch_tracking: false,
            requires_serial_tracking: false,
            has_expiry_date: false,
        }
    }

    pub fn with_batch_tracking(mut self) -> Self {
        self.requires_batch_tracking = true;
        self
    }

    pub fn with_serial_tracking(mut self) -> Self {
        self.requires_serial_tracking = true;
        self
    }

    pub fn with_expiry_date(mut self) -> Self {
        self.has_expiry_date = true;
        self
    }
}
