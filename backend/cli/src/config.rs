use std::time::Duration;

use discore_commands::{DispatcherSettings, NoticeTemplates, NoticeText};
use discore_config::{parse_color, BotConfig, NoticeTextConfig};

/// Dispatcher settings for a loaded config, with an optional prefix override
/// from the command line.
pub fn dispatcher_settings(config: &BotConfig, prefix: Option<&str>) -> DispatcherSettings {
    DispatcherSettings {
        prefix: prefix.unwrap_or(config.prefix()).to_string(),
        handler_timeout: config.handler_timeout(),
        notice_ttl: config.notice_ttl(),
        ignore_direct_messages: config.ignore_direct_messages(),
        notices: notice_templates(config),
    }
}

fn notice_templates(config: &BotConfig) -> NoticeTemplates {
    let mut templates = NoticeTemplates::default();
    let Some(notices) = &config.notices else {
        return templates;
    };
    if let Some(color) = notices.color.as_deref().and_then(parse_color) {
        templates.color = color;
    }
    merge_text(&mut templates.denied, notices.denied.as_ref());
    merge_text(&mut templates.invalid_arguments, notices.invalid_arguments.as_ref());
    merge_text(&mut templates.failure, notices.failure.as_ref());
    templates
}

fn merge_text(text: &mut NoticeText, overrides: Option<&NoticeTextConfig>) {
    let Some(overrides) = overrides else { return };
    if let Some(title) = &overrides.title {
        text.title = title.clone();
    }
    if let Some(description) = &overrides.description {
        text.description = description.clone();
    }
}

/// Human form of an optional limit for the startup log.
pub fn describe_limit(limit: Option<Duration>) -> String {
    match limit {
        Some(d) => format!("{}s", d.as_secs()),
        None => "none".to_string(),
    }
}
