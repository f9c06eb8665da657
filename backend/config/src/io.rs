//! Config file loading.

use crate::env::resolve_env_vars;
use crate::schema::BotConfig;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the config directory.
/// Priority: `DISCORE_CONFIG_DIR` env > `~/.discore/` > `./.discore`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DISCORE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".discore"),
        None => PathBuf::from(".discore"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse the config from disk, substituting `${VAR}` references.
///
/// Returns `Ok(Default::default())` if the file doesn't exist.
pub async fn load_config(path: &Path) -> Result<BotConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(BotConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw)
        .with_context(|| format!("Failed to load config at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

fn parse_config(raw: &str) -> Result<BotConfig> {
    if raw.trim().is_empty() {
        return Ok(BotConfig::default());
    }
    let value: Value = match serde_yaml::from_str(raw).context("Failed to parse config YAML")? {
        Value::Null => return Ok(BotConfig::default()),
        value => value,
    };
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    serde_json::from_value(value).context("Config does not match the expected schema")
}
