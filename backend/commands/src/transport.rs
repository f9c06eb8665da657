//! Chat transport port.
//!
//! The dispatcher never talks to a chat service directly. Incoming messages
//! arrive as [`IncomingMessage`] values and every outgoing side effect goes
//! through a [`ChatTransport`] implementation supplied by the embedding bot.

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

use crate::permission::{CapabilitySet, Permission};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelRef(pub String);

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a message the transport can later delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel: ChannelRef,
    pub id: String,
}

impl MessageRef {
    pub fn new(channel: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            channel: ChannelRef(channel.into()),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleId(pub u64);

/// The member who sent a message, as seen in the originating channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub capabilities: CapabilitySet,
    pub roles: Vec<RoleId>,
}

impl Actor {
    pub fn new(id: impl Into<String>, capabilities: CapabilitySet) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            capabilities,
            roles: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = RoleId>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.capabilities.grants(permission)
    }

    pub fn has_any_role(&self, roles: &[RoleId]) -> bool {
        self.roles.iter().any(|role| roles.contains(role))
    }
}

/// Number of mentions of each kind carried by a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MentionCounts {
    pub members: usize,
    pub roles: usize,
    pub channels: usize,
}

/// A message received from the chat service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub text: String,
    pub message: MessageRef,
    pub author: Actor,
    pub mentions: MentionCounts,
    /// Sent in a direct conversation rather than a guild channel.
    pub direct: bool,
}

impl IncomingMessage {
    pub fn new(text: impl Into<String>, message: MessageRef, author: Actor) -> Self {
        Self {
            text: text.into(),
            message,
            author,
            mentions: MentionCounts::default(),
            direct: false,
        }
    }

    pub fn channel(&self) -> &ChannelRef {
        &self.message.channel
    }
}

/// A titled, coloured message used for bot notices (errors, help output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    /// `0xRRGGBB`
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingMessage {
    Text(String),
    Notice(Notice),
}

/// Outgoing side effects against the chat service.
///
/// Implementations own their concurrency safety; the dispatcher calls them
/// from many tasks at once.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post a message to a channel, returning a reference to the posted message.
    async fn send(&self, channel: &ChannelRef, message: OutgoingMessage) -> Result<MessageRef>;

    /// Delete a previously received or sent message.
    async fn delete(&self, message: &MessageRef) -> Result<()>;
}
