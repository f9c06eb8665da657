//! Demo commands wired into the console bot.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use discore_commands::{
    ChatTransport, CommandDescriptor, CommandHandler, CommandRegistry, CommandResponse,
    InvocationContext, MessageRef, Permission,
};

const MAX_PURGE: u64 = 100;

pub struct PingCommand;

#[async_trait]
impl CommandHandler for PingCommand {
    async fn handle(&self, _ctx: &InvocationContext<'_>) -> Result<CommandResponse> {
        Ok(CommandResponse::text("Pong!"))
    }
}

pub struct EchoCommand;

#[async_trait]
impl CommandHandler for EchoCommand {
    async fn handle(&self, ctx: &InvocationContext<'_>) -> Result<CommandResponse> {
        Ok(CommandResponse::text(ctx.raw_args))
    }
}

/// Deletes the `count` messages preceding the invocation.
pub struct PurgeCommand {
    transport: Arc<dyn ChatTransport>,
}

#[async_trait]
impl CommandHandler for PurgeCommand {
    async fn handle(&self, ctx: &InvocationContext<'_>) -> Result<CommandResponse> {
        let count: u64 = ctx
            .arg(0)
            .unwrap_or_default()
            .parse()
            .context("purge count is not a number")?;
        if count == 0 || count > MAX_PURGE {
            return Ok(CommandResponse::text(format!(
                "Count must be between 1 and {MAX_PURGE}."
            )));
        }

        let trigger = &ctx.message.message;
        let newest: u64 = trigger
            .id
            .parse()
            .with_context(|| format!("message id {} is not sequential", trigger.id))?;
        let mut deleted = 0;
        for id in (newest.saturating_sub(count)..newest).rev().filter(|id| *id > 0) {
            let target = MessageRef {
                channel: trigger.channel.clone(),
                id: id.to_string(),
            };
            self.transport.delete(&target).await?;
            deleted += 1;
        }
        Ok(CommandResponse::text(format!("Deleted {deleted} message(s).")))
    }
}

/// Registry with `help` and the demo commands.
pub fn build_registry(transport: Arc<dyn ChatTransport>) -> Result<CommandRegistry> {
    let mut registry = CommandRegistry::new();
    registry.register_help()?;
    registry.register_command(
        CommandDescriptor::builder()
            .aliases(["ping", "p"])
            .description("Check that the bot is alive.")
            .build_for::<PingCommand>()?,
        Arc::new(PingCommand),
    )?;
    registry.register_command(
        CommandDescriptor::builder()
            .description("Repeat the given text.")
            .usage("echo <text>")
            .required_arg()
            .build_for::<EchoCommand>()?,
        Arc::new(EchoCommand),
    )?;
    registry.register_command(
        CommandDescriptor::builder()
            .aliases(["purge", "clear"])
            .description("Delete recent messages in this channel.")
            .usage("purge <count>")
            .permission(Permission::MANAGE_MESSAGES)
            .arg_pattern(r"\d+")
            .autodelete(true)
            .build()?,
        Arc::new(PurgeCommand { transport }),
    )?;
    Ok(registry)
}
