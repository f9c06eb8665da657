/// Command detection: split a prefixed command token off an inbound message.
use crate::types::CommandInvocation;

/// Returns `None` for ordinary chat (no prefix). A bare prefix yields an
/// invocation with an empty label, which then fails to resolve silently.
pub fn detect_command(text: &str, prefix: &str) -> Option<CommandInvocation> {
    let body = text.trim_start().strip_prefix(prefix)?;

    let (label, rest) = body
        .split_once(char::is_whitespace)
        .map(|(label, rest)| (label, rest.trim()))
        .unwrap_or((body.trim_end(), ""));

    Some(CommandInvocation {
        label: label.to_string(),
        args: rest.split_whitespace().map(str::to_string).collect(),
        raw_args: rest.to_string(),
    })
}
