//! Structured logging for discore bots.
//!
//! Console and rolling NDJSON file output, per-dispatch event records, and
//! redaction of secrets found in user-supplied message text.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{DispatchEvent, DispatchEventLogger, EventLogEntry};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
