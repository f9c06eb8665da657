//! `discore-config`: bot runtime configuration.
//!
//! Provides:
//! - Typed config schema (prefix, handler timeout, notice wording, logging)
//! - YAML loading with `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with path-qualified messages

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config};
pub use schema::{BotConfig, LoggingConfig, NoticeTextConfig, NoticesConfig};
pub use validation::{parse_color, validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};
use std::path::Path;

/// Load, substitute env vars, apply defaults and validate a config file.
///
/// Warnings are logged; any validation error fails the load.
pub async fn load_and_prepare(path: &Path) -> Result<BotConfig> {
    let config = apply_all_defaults(load_config(path).await?);
    ensure_valid(&config, path)?;
    Ok(config)
}

/// Validate an already loaded config, logging every finding.
///
/// Split out so callers can install the logger from the loaded config first.
pub fn ensure_valid(config: &BotConfig, path: &Path) -> Result<()> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        let summary: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!("Invalid config at {}: {}", path.display(), summary.join("; "));
    }
    Ok(())
}
