//! Bot configuration schema, typed for serde YAML/JSON deserialization.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::defaults::{
    DEFAULT_HANDLER_TIMEOUT_SECS, DEFAULT_IGNORE_DIRECT_MESSAGES, DEFAULT_LOG_LEVEL,
    DEFAULT_PREFIX,
};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    /// Command prefix, e.g. `!`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Handler time limit; `0` disables the limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler_timeout_secs: Option<u64>,

    /// Lifetime of error notices before they and their trigger are deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice_ttl_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_direct_messages: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notices: Option<NoticesConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl BotConfig {
    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(DEFAULT_PREFIX)
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        match self.handler_timeout_secs.unwrap_or(DEFAULT_HANDLER_TIMEOUT_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn notice_ttl(&self) -> Option<Duration> {
        self.notice_ttl_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn ignore_direct_messages(&self) -> bool {
        self.ignore_direct_messages
            .unwrap_or(DEFAULT_IGNORE_DIRECT_MESSAGES)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.logging.as_ref().and_then(|l| l.dir.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// Overrides for user-visible notice wording. Unset fields keep the
/// dispatcher's built-in text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticesConfig {
    /// `#rrggbb`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denied: Option<NoticeTextConfig>,
    /// `{usage}` in the description is replaced with the command usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_arguments: Option<NoticeTextConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<NoticeTextConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeTextConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for the rolling JSON log. Console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r##"
prefix: "?"
handlerTimeoutSecs: 5
noticeTtlSecs: 8
ignoreDirectMessages: false
notices:
  color: "#112233"
  invalidArguments:
    title: Nope
logging:
  level: debug
  dir: /var/log/discore
"##;
        let config: BotConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.prefix(), "?");
        assert_eq!(config.handler_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.notice_ttl(), Some(Duration::from_secs(8)));
        assert!(!config.ignore_direct_messages());
        let notices = config.notices.as_ref().unwrap();
        assert_eq!(notices.color.as_deref(), Some("#112233"));
        assert_eq!(
            notices.invalid_arguments.as_ref().unwrap().title.as_deref(),
            Some("Nope")
        );
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_dir(), Some(Path::new("/var/log/discore")));
    }

    #[test]
    fn zero_disables_timers() {
        let config = BotConfig {
            handler_timeout_secs: Some(0),
            notice_ttl_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(config.handler_timeout(), None);
        assert_eq!(config.notice_ttl(), None);
    }

    #[test]
    fn accessors_fall_back_to_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.prefix(), "!");
        assert_eq!(config.handler_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.notice_ttl(), None);
        assert!(config.ignore_direct_messages());
        assert_eq!(config.log_dir(), None);
    }
}
