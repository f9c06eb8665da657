//! Dispatch Event Logger
//!
//! One structured record per dispatch decision (invoked, denied, failed,
//! completed), emitted under the `dispatch_events` target so the JSON file
//! layer captures them as NDJSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    Invoked {
        command: String,
    },
    Denied {
        command: String,
        permission: String,
    },
    InvalidArguments {
        command: String,
        reason: String,
    },
    Failed {
        command: String,
        reason: String,
    },
    Completed {
        command: String,
        autodeleted: bool,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub actor: String,
    pub channel: String,
    /// Triggering message text, redacted.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub event: DispatchEvent,
}

impl EventLogEntry {
    pub fn new(actor: &str, channel: &str, text: &str, event: DispatchEvent) -> Self {
        let event = match event {
            DispatchEvent::Failed { command, reason } => DispatchEvent::Failed {
                command,
                reason: redact_sensitive_data(&reason),
            },
            DispatchEvent::InvalidArguments { command, reason } => {
                DispatchEvent::InvalidArguments {
                    command,
                    reason: redact_sensitive_data(&reason),
                }
            }
            other => other,
        };
        Self {
            actor: actor.into(),
            channel: channel.into(),
            text: redact_sensitive_data(text),
            timestamp: Utc::now(),
            event,
        }
    }
}

pub struct DispatchEventLogger;

impl DispatchEventLogger {
    /// Redact and emit one dispatch event.
    pub fn log_event(actor: &str, channel: &str, text: &str, event: DispatchEvent) {
        let entry = EventLogEntry::new(actor, channel, text, event);
        match serde_json::to_string(&entry) {
            Ok(json) => info!(target: "dispatch_events", event = %json, "Dispatch event"),
            Err(e) => info!(target: "dispatch_events", error = %e, entry = ?entry, "Dispatch event"),
        }
    }
}
