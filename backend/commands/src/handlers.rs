/// Built-in command handlers.
use anyhow::Result;
use async_trait::async_trait;

use crate::dispatch::{CommandHandler, CommandResponse, InvocationContext};
use crate::error::CommandError;
use crate::transport::Notice;
use crate::types::CommandDescriptor;

const HELP_COLOR: u32 = 0x4b9bec;

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

/// Lists visible commands, or details one command given as an argument.
pub struct HelpCommand;

impl HelpCommand {
    pub fn descriptor() -> Result<CommandDescriptor, CommandError> {
        CommandDescriptor::builder()
            .aliases(["help", "commands"])
            .description("Show available commands.")
            .usage("help [command]")
            .build()
    }
}

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn handle(&self, ctx: &InvocationContext<'_>) -> Result<CommandResponse> {
        if let Some(name) = ctx.arg(0) {
            let name = name.strip_prefix(ctx.prefix).unwrap_or(name);
            // Hidden commands stay undiscoverable through help.
            let found = ctx
                .registry
                .resolve(name)
                .ok()
                .filter(|binding| !binding.descriptor().hidden());
            return Ok(CommandResponse::notice(match found {
                Some(binding) => describe(ctx.prefix, binding.descriptor()),
                None => Notice {
                    title: "Unknown command".into(),
                    description: format!("No command named `{name}`."),
                    color: HELP_COLOR,
                },
            }));
        }

        let lines: Vec<String> = ctx
            .registry
            .list_visible()
            .map(|d| {
                if d.description().is_empty() {
                    format!("`{}{}`", ctx.prefix, d.display_usage())
                } else {
                    format!("`{}{}` - {}", ctx.prefix, d.display_usage(), d.description())
                }
            })
            .collect();

        Ok(CommandResponse::notice(Notice {
            title: "Available commands".into(),
            description: lines.join("\n"),
            color: HELP_COLOR,
        }))
    }
}

fn describe(prefix: &str, descriptor: &CommandDescriptor) -> Notice {
    let mut lines = vec![format!("Usage: `{prefix}{}`", descriptor.display_usage())];
    if !descriptor.description().is_empty() {
        lines.insert(0, descriptor.description().to_string());
    }
    if descriptor.aliases().len() > 1 {
        let aliases: Vec<String> = descriptor
            .aliases()
            .iter()
            .map(|a| format!("`{prefix}{a}`"))
            .collect();
        lines.push(format!("Aliases: {}", aliases.join(", ")));
    }
    Notice {
        title: descriptor.name().to_string(),
        description: lines.join("\n"),
        color: HELP_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dispatch::{CommandDispatcher, DispatcherSettings};
    use crate::permission::Permission;
    use crate::registry::CommandRegistry;
    use crate::testing::{RecordingHandler, RecordingTransport, member, message};

    fn dispatcher() -> (CommandDispatcher, Arc<RecordingTransport>) {
        let mut registry = CommandRegistry::new();
        registry
            .register_command(
                CommandDescriptor::builder()
                    .aliases(["ping", "p"])
                    .description("Check the bot is alive.")
                    .build()
                    .unwrap(),
                Arc::new(RecordingHandler::replying("pong")),
            )
            .unwrap();
        registry
            .register_command(
                CommandDescriptor::builder()
                    .alias("debug")
                    .hidden(true)
                    .build()
                    .unwrap(),
                Arc::new(RecordingHandler::silent()),
            )
            .unwrap();
        registry
            .register_command(
                CommandDescriptor::builder()
                    .alias("purge")
                    .usage("purge <count>")
                    .build()
                    .unwrap(),
                Arc::new(RecordingHandler::silent()),
            )
            .unwrap();
        registry.register_help().unwrap();

        let transport = Arc::new(RecordingTransport::default());
        let dispatcher =
            CommandDispatcher::new(registry, transport.clone(), DispatcherSettings::default());
        (dispatcher, transport)
    }

    #[tokio::test]
    async fn lists_visible_commands_in_order() {
        let (dispatcher, transport) = dispatcher();
        let reader = member("alice", &[Permission::READ_MESSAGES]);
        assert!(dispatcher.dispatch(&message("!help", reader)).await.is_completed());

        let notices = transport.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Available commands");
        assert_eq!(
            notices[0].description,
            "`!ping` - Check the bot is alive.\n`!purge <count>`\n`!help [command]` - Show available commands."
        );
        assert!(!notices[0].description.contains("debug"));
    }

    #[tokio::test]
    async fn details_one_command() {
        let (dispatcher, transport) = dispatcher();
        let reader = member("alice", &[Permission::READ_MESSAGES]);
        dispatcher.dispatch(&message("!commands !P", reader.clone())).await;
        dispatcher.dispatch(&message("!help nope", reader)).await;

        let notices = transport.notices();
        assert_eq!(notices[0].title, "ping");
        assert_eq!(
            notices[0].description,
            "Check the bot is alive.\nUsage: `!ping`\nAliases: `!ping`, `!p`"
        );
        assert_eq!(notices[1].title, "Unknown command");
    }

    #[tokio::test]
    async fn hidden_command_details_are_not_shown() {
        let (dispatcher, transport) = dispatcher();
        let reader = member("alice", &[Permission::READ_MESSAGES]);
        assert!(dispatcher.dispatch(&message("!help debug", reader)).await.is_completed());

        let notices = transport.notices();
        assert_eq!(notices[0].title, "Unknown command");
        assert_eq!(notices[0].description, "No command named `debug`.");
    }
}
