//! Config validation with path-qualified error messages.

use crate::schema::BotConfig;
use thiserror::Error;

/// Prefixes longer than this are allowed but unusual.
const LONG_PREFIX_CHARS: usize = 8;

const KNOWN_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// Errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &BotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_prefix(config, &mut report);
    validate_timeouts(config, &mut report);
    validate_notices(config, &mut report);
    validate_logging(config, &mut report);
    report
}

/// Parse a `#rrggbb` colour.
pub fn parse_color(value: &str) -> Option<u32> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

fn validate_prefix(config: &BotConfig, report: &mut ValidationReport) {
    let prefix = config.prefix();
    if prefix.is_empty() {
        report.error("prefix", "Prefix cannot be empty; every message would be parsed as a command");
    } else if prefix.chars().any(char::is_whitespace) {
        report.error("prefix", "Prefix cannot contain whitespace");
    } else if prefix.chars().count() > LONG_PREFIX_CHARS {
        report.warn("prefix", format!("Prefix is longer than {LONG_PREFIX_CHARS} characters"));
    }
}

fn validate_timeouts(config: &BotConfig, report: &mut ValidationReport) {
    if config.handler_timeout_secs == Some(0) {
        report.warn("handlerTimeoutSecs", "Handler timeout disabled; a stuck command never fails");
    }
}

fn validate_notices(config: &BotConfig, report: &mut ValidationReport) {
    let Some(notices) = &config.notices else { return };
    if let Some(color) = &notices.color {
        if parse_color(color).is_none() {
            report.error("notices.color", format!("'{color}' is not a #rrggbb colour"));
        }
    }
    if let Some(description) = notices
        .invalid_arguments
        .as_ref()
        .and_then(|text| text.description.as_deref())
    {
        if !description.contains("{usage}") {
            report.warn(
                "notices.invalidArguments.description",
                "Description has no {usage} placeholder; users will not see correct usage",
            );
        }
    }
}

fn validate_logging(config: &BotConfig, report: &mut ValidationReport) {
    let level = config.log_level();
    // Full filter directives (`discore=debug,info`) are left to the subscriber.
    if !level.contains('=') && !level.contains(',') && !KNOWN_LEVELS.contains(&level.to_lowercase().as_str()) {
        report.warn("logging.level", format!("Unknown log level '{level}'"));
    }
}
