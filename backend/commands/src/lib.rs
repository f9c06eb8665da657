//! Declarative chat-bot commands.
//!
//! Commands are declared as [`CommandDescriptor`] values, bound to a
//! [`CommandHandler`] in a [`CommandRegistry`], and routed from incoming
//! messages by a [`CommandDispatcher`] that enforces permissions and isolates
//! handler failures.

pub mod detection;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod permission;
pub mod registry;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use detection::detect_command;
pub use dispatch::{
    CommandDispatcher, CommandHandler, CommandResponse, DispatchOutcome, DispatcherSettings,
    InvocationContext, NoticeTemplates, NoticeText,
};
pub use error::CommandError;
pub use handlers::HelpCommand;
pub use permission::{CapabilitySet, Permission};
pub use registry::{CommandBinding, CommandRegistry};
pub use transport::{
    Actor, ChannelRef, ChatTransport, IncomingMessage, MentionCounts, MessageRef, Notice,
    OutgoingMessage, RoleId,
};
pub use types::{
    ArgPattern, CommandDescriptor, CommandDescriptorBuilder, CommandInvocation,
    MentionRequirements,
};
