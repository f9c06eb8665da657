/// Command dispatch: route an incoming message to its handler.
///
/// Each dispatch runs `tokenize -> resolve -> authorize -> validate -> invoke
/// -> post-process` and always ends in a [`DispatchOutcome`]. Nothing raised
/// inside one dispatch escapes to the caller or to the message loop.
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, warn};

use discore_logging::{DispatchEvent, DispatchEventLogger};

use crate::detection::detect_command;
use crate::error::CommandError;
use crate::permission::Permission;
use crate::registry::{CommandBinding, CommandRegistry};
use crate::transport::{
    Actor, ChannelRef, ChatTransport, IncomingMessage, Notice, OutgoingMessage,
};
use crate::types::{CommandDescriptor, CommandInvocation};

// ---------------------------------------------------------------------------
// Handler trait
// ---------------------------------------------------------------------------

/// Everything a handler gets to see about one invocation.
#[derive(Debug, Clone, Copy)]
pub struct InvocationContext<'a> {
    pub message: &'a IncomingMessage,
    /// The alias as the user typed it.
    pub label: &'a str,
    pub args: &'a [String],
    pub raw_args: &'a str,
    pub prefix: &'a str,
    pub registry: &'a CommandRegistry,
}

impl<'a> InvocationContext<'a> {
    pub fn author(&self) -> &'a Actor {
        &self.message.author
    }

    pub fn channel(&self) -> &'a ChannelRef {
        self.message.channel()
    }

    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).map(String::as_str)
    }
}

/// What a handler wants posted back to the channel, if anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResponse {
    pub reply: Option<OutgoingMessage>,
}

impl CommandResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            reply: Some(OutgoingMessage::Text(text.into())),
        }
    }

    pub fn notice(notice: Notice) -> Self {
        Self {
            reply: Some(OutgoingMessage::Notice(notice)),
        }
    }

    pub fn silent() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: &InvocationContext<'_>) -> Result<CommandResponse>;
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

pub const DEFAULT_PREFIX: &str = "!";
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_NOTICE_COLOR: u32 = 0xec644b;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeText {
    pub title: String,
    pub description: String,
}

impl NoticeText {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// User-visible wording for denial, bad-argument and failure notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeTemplates {
    pub color: u32,
    pub denied: NoticeText,
    /// `{usage}` is replaced with the prefixed usage string.
    pub invalid_arguments: NoticeText,
    /// Never carries internal error detail.
    pub failure: NoticeText,
}

impl Default for NoticeTemplates {
    fn default() -> Self {
        Self {
            color: DEFAULT_NOTICE_COLOR,
            denied: NoticeText::new(
                "Invalid permissions",
                "Sorry, but you don't have permission to run that command.",
            ),
            invalid_arguments: NoticeText::new(
                "Invalid arguments",
                "You didn't provide the correct arguments, please try again. Correct usage: `{usage}`",
            ),
            failure: NoticeText::new(
                "Command failed",
                "Something went wrong while running that command.",
            ),
        }
    }
}

impl NoticeTemplates {
    fn render(&self, text: &NoticeText, usage: &str) -> Notice {
        Notice {
            title: text.title.clone(),
            description: text.description.replace("{usage}", usage),
            color: self.color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherSettings {
    pub prefix: String,
    /// Expiry counts as a handler failure. `None` waits indefinitely.
    pub handler_timeout: Option<Duration>,
    /// Delete error notices and their triggering message after this delay.
    pub notice_ttl: Option<Duration>,
    pub ignore_direct_messages: bool,
    pub notices: NoticeTemplates,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            handler_timeout: Some(DEFAULT_HANDLER_TIMEOUT),
            notice_ttl: None,
            ignore_direct_messages: true,
            notices: NoticeTemplates::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Terminal state of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No command token (ordinary chat, or a filtered direct message).
    Ignored,
    /// Token did not match any alias.
    Unresolved,
    Denied(CommandError),
    InvalidArguments(CommandError),
    Failed(CommandError),
    Completed {
        command: String,
        /// Reply or deletion failures; they do not fail the dispatch.
        side_effect_errors: Vec<CommandError>,
    },
}

impl DispatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
    transport: Arc<dyn ChatTransport>,
    settings: DispatcherSettings,
}

impl CommandDispatcher {
    /// Freezes `registry`; no registration is possible afterwards.
    pub fn new(
        registry: CommandRegistry,
        transport: Arc<dyn ChatTransport>,
        settings: DispatcherSettings,
    ) -> Self {
        info!(
            commands = registry.len(),
            prefix = %settings.prefix,
            "Command dispatcher ready"
        );
        Self {
            registry: Arc::new(registry),
            transport,
            settings,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// Tokenize `text` and look the command token up.
    ///
    /// `None` when the text carries no command token at all.
    pub fn resolve(
        &self,
        text: &str,
    ) -> Option<Result<(Arc<CommandBinding>, CommandInvocation), CommandError>> {
        let invocation = detect_command(text, &self.settings.prefix)?;
        Some(
            self.registry
                .resolve(&invocation.label)
                .map(|binding| (binding, invocation)),
        )
    }

    pub async fn dispatch(&self, message: &IncomingMessage) -> DispatchOutcome {
        if message.direct && self.settings.ignore_direct_messages {
            trace!(actor = %message.author.id, "Ignoring direct message");
            return DispatchOutcome::Ignored;
        }

        let (binding, invocation) = match self.resolve(&message.text) {
            None => return DispatchOutcome::Ignored,
            Some(Err(err)) => {
                trace!(error = %err, "Unresolved command token");
                return DispatchOutcome::Unresolved;
            }
            Some(Ok(found)) => found,
        };
        let descriptor = binding.descriptor();
        let command = descriptor.name();

        if let Err(err) = authorize(descriptor, &message.author) {
            warn!(
                command,
                actor = %message.author.id,
                permission = %descriptor.permission(),
                "Permission denied"
            );
            self.log_event(
                message,
                DispatchEvent::Denied {
                    command: command.to_string(),
                    permission: descriptor.permission().to_string(),
                },
            );
            let notices = &self.settings.notices;
            self.report(message, notices.render(&notices.denied, ""))
                .await;
            return DispatchOutcome::Denied(err);
        }

        if let Err(err) = validate_arguments(descriptor, &invocation, message) {
            debug!(command, error = %err, "Rejected command arguments");
            self.log_event(
                message,
                DispatchEvent::InvalidArguments {
                    command: command.to_string(),
                    reason: err.to_string(),
                },
            );
            let usage = format!("{}{}", self.settings.prefix, descriptor.display_usage());
            let notices = &self.settings.notices;
            self.report(message, notices.render(&notices.invalid_arguments, &usage))
                .await;
            return DispatchOutcome::InvalidArguments(err);
        }

        let ctx = InvocationContext {
            message,
            label: &invocation.label,
            args: &invocation.args,
            raw_args: &invocation.raw_args,
            prefix: &self.settings.prefix,
            registry: &self.registry,
        };
        debug!(command, channel = %message.channel(), "Executing command");
        self.log_event(
            message,
            DispatchEvent::Invoked {
                command: command.to_string(),
            },
        );

        let response = match self.invoke(&binding, &ctx).await {
            Ok(response) => response,
            Err(err) => {
                error!(command, error = %err, "Command failed");
                self.log_event(
                    message,
                    DispatchEvent::Failed {
                        command: command.to_string(),
                        reason: err.to_string(),
                    },
                );
                let notices = &self.settings.notices;
                self.report(message, notices.render(&notices.failure, ""))
                    .await;
                return DispatchOutcome::Failed(err);
            }
        };

        let mut side_effect_errors = Vec::new();
        if let Some(reply) = response.reply {
            if let Err(e) = self.transport.send(message.channel(), reply).await {
                let err = CommandError::SideEffect {
                    action: "reply",
                    reason: format!("{e:#}"),
                };
                warn!(command, error = %err, "Failed to send reply");
                side_effect_errors.push(err);
            }
        }
        if descriptor.autodelete() {
            if let Err(e) = self.transport.delete(&message.message).await {
                let err = CommandError::SideEffect {
                    action: "delete triggering message",
                    reason: format!("{e:#}"),
                };
                warn!(command, message = %message.message.id, error = %err, "Autodelete failed");
                side_effect_errors.push(err);
            }
        }

        self.log_event(
            message,
            DispatchEvent::Completed {
                command: command.to_string(),
                autodeleted: descriptor.autodelete(),
            },
        );
        DispatchOutcome::Completed {
            command: command.to_string(),
            side_effect_errors,
        }
    }

    /// Consume messages until every sender is dropped, one task per message.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<IncomingMessage>) {
        let mut tasks = JoinSet::new();
        while let Some(message) = rx.recv().await {
            let dispatcher = Arc::clone(&self);
            tasks.spawn(async move { dispatcher.dispatch(&message).await });
            while let Some(finished) = tasks.try_join_next() {
                log_join(finished);
            }
        }
        while let Some(finished) = tasks.join_next().await {
            log_join(finished);
        }
        info!("Command dispatcher stopped: message source closed");
    }

    /// The isolation boundary: errors, panics and timeouts all become
    /// [`CommandError::HandlerExecution`].
    async fn invoke(
        &self,
        binding: &CommandBinding,
        ctx: &InvocationContext<'_>,
    ) -> Result<CommandResponse, CommandError> {
        let command = binding.descriptor().name();
        let guarded = AssertUnwindSafe(binding.handler().handle(ctx)).catch_unwind();

        let finished = match self.settings.handler_timeout {
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(finished) => finished,
                Err(_) => {
                    return Err(CommandError::HandlerExecution {
                        command: command.to_string(),
                        reason: format!("timed out after {limit:?}"),
                    });
                }
            },
            None => guarded.await,
        };

        match finished {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(CommandError::HandlerExecution {
                command: command.to_string(),
                reason: format!("{e:#}"),
            }),
            Err(panic) => Err(CommandError::HandlerExecution {
                command: command.to_string(),
                reason: format!("panicked: {}", panic_message(panic.as_ref())),
            }),
        }
    }

    /// Post an error notice; schedule its cleanup when a TTL is configured.
    async fn report(&self, message: &IncomingMessage, notice: Notice) {
        let posted = match self
            .transport
            .send(message.channel(), OutgoingMessage::Notice(notice))
            .await
        {
            Ok(posted) => posted,
            Err(e) => {
                warn!(channel = %message.channel(), error = %format!("{e:#}"), "Failed to send notice");
                return;
            }
        };

        let Some(ttl) = self.settings.notice_ttl else {
            return;
        };
        let transport = Arc::clone(&self.transport);
        let trigger = message.message.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            for target in [posted, trigger] {
                if let Err(e) = transport.delete(&target).await {
                    warn!(message = %target.id, error = %format!("{e:#}"), "Failed to clean up notice");
                }
            }
        });
    }

    fn log_event(&self, message: &IncomingMessage, event: DispatchEvent) {
        DispatchEventLogger::log_event(
            &message.author.id,
            &message.channel().0,
            &message.text,
            event,
        );
    }
}

fn authorize(descriptor: &CommandDescriptor, actor: &Actor) -> Result<(), CommandError> {
    let has_permission = actor.has_permission(descriptor.permission());
    let has_role = descriptor.roles().is_empty()
        || actor.has_permission(&Permission::ADMINISTRATOR)
        || actor.has_any_role(descriptor.roles());

    if has_permission && has_role {
        Ok(())
    } else {
        Err(CommandError::Unauthorized {
            actor: actor.id.clone(),
            command: descriptor.name().to_string(),
            permission: descriptor.permission().clone(),
        })
    }
}

fn validate_arguments(
    descriptor: &CommandDescriptor,
    invocation: &CommandInvocation,
    message: &IncomingMessage,
) -> Result<(), CommandError> {
    let invalid = |reason: String| CommandError::InvalidArguments {
        command: descriptor.name().to_string(),
        reason,
    };

    descriptor.mentions().check(&message.mentions).map_err(invalid)?;

    for (position, pattern) in descriptor.args().iter().enumerate() {
        let arg = invocation.args.get(position).map(String::as_str);
        if !pattern.matches(arg) {
            return Err(invalid(match arg {
                Some(value) => format!("argument {} ('{value}') is not valid", position + 1),
                None => format!("argument {} is missing", position + 1),
            }));
        }
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}

fn log_join(finished: Result<DispatchOutcome, tokio::task::JoinError>) {
    match finished {
        Ok(outcome) => trace!(?outcome, "Dispatch finished"),
        Err(e) => error!(error = %e, "Dispatch task aborted"),
    }
}
