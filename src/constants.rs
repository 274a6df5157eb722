// Application Constants
// Centralized constants to avoid magic numbers

/// Debounce window for per-row batch-code availability lookups
pub const BATCH_LOOKUP_DEBOUNCE_MS: u64 = 400;

/// Timezone the business day is evaluated in by default
pub const DEFAULT_BUSINESS_TIMEZONE: &str = "Asia/Bangkok";

/// Receive policy defaults (conservative: reject over- and partial-receive)
pub const DEFAULT_ALLOW_OVER_RECEIVE: bool = false;
pub const DEFAULT_ALLOW_PARTIAL_RECEIVE: bool = false;

/// Document-level validation messages
pub const MSG_REASON_REQUIRED: &str = "Reason code is required";
pub const MSG_NO_LINES: &str = "At least one line is required";
