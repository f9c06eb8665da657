//! Config defaults: applies default values to a parsed config.

use crate::schema::{BotConfig, LoggingConfig};

pub const DEFAULT_PREFIX: &str = "!";

/// Seconds a handler may run before it is treated as failed.
pub const DEFAULT_HANDLER_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_IGNORE_DIRECT_MESSAGES: bool = true;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: BotConfig) -> BotConfig {
    let config = apply_dispatch_defaults(config);
    apply_logging_defaults(config)
}

fn apply_dispatch_defaults(mut config: BotConfig) -> BotConfig {
    if config.prefix.is_none() {
        config.prefix = Some(DEFAULT_PREFIX.to_string());
    }
    if config.handler_timeout_secs.is_none() {
        config.handler_timeout_secs = Some(DEFAULT_HANDLER_TIMEOUT_SECS);
    }
    if config.ignore_direct_messages.is_none() {
        config.ignore_direct_messages = Some(DEFAULT_IGNORE_DIRECT_MESSAGES);
    }
    config
}

fn apply_logging_defaults(mut config: BotConfig) -> BotConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    config
}
