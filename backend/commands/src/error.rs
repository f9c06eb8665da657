use thiserror::Error;

use crate::permission::Permission;

/// Errors raised while declaring, registering, resolving or running commands.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("command descriptor must declare at least one alias")]
    EmptyAliases,

    #[error("invalid alias '{0}': aliases must be non-empty and contain no whitespace")]
    InvalidAlias(String),

    #[error("invalid argument pattern '{pattern}': {reason}")]
    InvalidArgPattern { pattern: String, reason: String },

    /// Registration-time collision. Fatal to startup.
    #[error("alias '{alias}' is already registered to command '{existing}'")]
    DuplicateAlias { alias: String, existing: String },

    #[error("no command registered for '{0}'")]
    NotFound(String),

    #[error("'{actor}' may not run '{command}' (requires {permission})")]
    Unauthorized {
        actor: String,
        command: String,
        permission: Permission,
    },

    #[error("invalid arguments for '{command}': {reason}")]
    InvalidArguments { command: String, reason: String },

    #[error("command '{command}' failed: {reason}")]
    HandlerExecution { command: String, reason: String },

    /// A reply or deletion request was rejected by the transport.
    #[error("{action} failed: {reason}")]
    SideEffect { action: &'static str, reason: String },
}

impl CommandError {
    /// True for errors that must abort process startup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DuplicateAlias { .. }
                | Self::EmptyAliases
                | Self::InvalidAlias(_)
                | Self::InvalidArgPattern { .. }
        )
    }
}
