//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names stable between the logging macros, the
//! state machine transition log and the test capture layer.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Entity identifiers
pub const FIELD_NODE_ID: &str = "node_id";
pub const FIELD_RECORD_KEY: &str = "record_key";

// Collection sizes
pub const FIELD_NODE_COUNT: &str = "node_count";
pub const FIELD_WARNING_COUNT: &str = "warning_count";

// Operation state machine
pub const FIELD_STATE_FROM: &str = "from";
pub const FIELD_STATE_TO: &str = "to";
pub const FIELD_STATE_EVENT: &str = "transition";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_TRANSITION: &str = "transition";
