//! Console chat transport: stdin lines in, rendered replies out.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use discore_commands::{
    Actor, ChannelRef, ChatTransport, IncomingMessage, MentionCounts, MessageRef,
    OutgoingMessage,
};

use crate::terminal_output::{render_notice, DIM, RESET};

pub const CONSOLE_CHANNEL: &str = "console";

/// Lines starting with this marker are treated as direct messages.
const DIRECT_MARKER: &str = "/dm ";

static MEMBER_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<@!?\d+>").unwrap());
static ROLE_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<@&\d+>").unwrap());
static CHANNEL_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<#\d+>").unwrap());

pub struct ConsoleTransport<W> {
    out: Mutex<W>,
    color: bool,
    next_id: AtomicU64,
}

impl<W: Write + Send> ConsoleTransport<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out: Mutex::new(out),
            color,
            next_id: AtomicU64::new(1),
        }
    }

    /// Wrap one input line as a message from `author`, assigning it an id.
    pub fn incoming(&self, line: &str, author: &Actor) -> IncomingMessage {
        let (text, direct) = match line.strip_prefix(DIRECT_MARKER) {
            Some(rest) => (rest, true),
            None => (line, false),
        };
        let mut message = IncomingMessage::new(text, self.next_ref(), author.clone());
        message.mentions = count_mentions(text);
        message.direct = direct;
        message
    }

    fn next_ref(&self) -> MessageRef {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        MessageRef::new(CONSOLE_CHANNEL, id.to_string())
    }

    fn write(&self, text: &str) -> Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow!("console writer poisoned"))?;
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
impl ConsoleTransport<Vec<u8>> {
    /// Everything written so far.
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.out.lock().unwrap()).into_owned()
    }
}

#[async_trait]
impl<W: Write + Send> ChatTransport for ConsoleTransport<W> {
    async fn send(&self, channel: &ChannelRef, message: OutgoingMessage) -> Result<MessageRef> {
        let posted = self.next_ref();
        let rendered = match &message {
            OutgoingMessage::Text(text) => format!("{text}\n"),
            OutgoingMessage::Notice(notice) => render_notice(notice, self.color),
        };
        self.write(&rendered)?;
        info!(channel = %channel, id = %posted.id, "Sent message");
        Ok(posted)
    }

    async fn delete(&self, message: &MessageRef) -> Result<()> {
        let line = if self.color {
            format!("{DIM}(message {} deleted){RESET}\n", message.id)
        } else {
            format!("(message {} deleted)\n", message.id)
        };
        self.write(&line)?;
        info!(channel = %message.channel, id = %message.id, "Deleted message");
        Ok(())
    }
}

/// Count Discord-style `<@id>`, `<@&id>` and `<#id>` mentions.
pub fn count_mentions(text: &str) -> MentionCounts {
    MentionCounts {
        members: MEMBER_MENTION.find_iter(text).count(),
        roles: ROLE_MENTION.find_iter(text).count(),
        channels: CHANNEL_MENTION.find_iter(text).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discore_commands::{CapabilitySet, Notice};

    #[test]
    fn counts_each_mention_kind() {
        let counts = count_mentions("hey <@12> <@!34> see <#9> and <@&77> <@&78>");
        assert_eq!(
            counts,
            MentionCounts {
                members: 2,
                roles: 2,
                channels: 1,
            }
        );
        assert_eq!(count_mentions("@everyone"), MentionCounts::default());
    }

    #[test]
    fn incoming_assigns_ids_and_detects_direct() {
        let transport = ConsoleTransport::new(Vec::new(), false);
        let author = Actor::new("console", CapabilitySet::new());
        let first = transport.incoming("!ping", &author);
        let second = transport.incoming("/dm !ping", &author);
        assert_eq!(first.message.id, "1");
        assert!(!first.direct);
        assert_eq!(second.message.id, "2");
        assert_eq!(second.text, "!ping");
        assert!(second.direct);
        assert_eq!(first.channel(), &ChannelRef(CONSOLE_CHANNEL.into()));
    }

    #[tokio::test]
    async fn renders_sends_and_deletes() {
        let transport = ConsoleTransport::new(Vec::new(), false);
        let channel = ChannelRef(CONSOLE_CHANNEL.into());
        let posted = transport
            .send(&channel, OutgoingMessage::Text("Pong!".into()))
            .await
            .unwrap();
        transport
            .send(
                &channel,
                OutgoingMessage::Notice(Notice {
                    title: "Command failed".into(),
                    description: "Something went wrong.".into(),
                    color: 0xec644b,
                }),
            )
            .await
            .unwrap();
        transport.delete(&posted).await.unwrap();

        assert_eq!(
            transport.output(),
            "Pong!\n| Command failed\n| Something went wrong.\n(message 1 deleted)\n"
        );
    }
}
