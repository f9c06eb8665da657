//! Test doubles shared by the unit tests of this crate.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::dispatch::{CommandHandler, CommandResponse, InvocationContext};
use crate::permission::{CapabilitySet, Permission};
use crate::transport::{
    Actor, ChannelRef, ChatTransport, IncomingMessage, MessageRef, Notice, OutgoingMessage,
};

static NEXT_MESSAGE: AtomicUsize = AtomicUsize::new(1);

pub fn member(id: &str, permissions: &[Permission]) -> Actor {
    Actor::new(id, permissions.iter().cloned().collect::<CapabilitySet>())
}

/// A guild message in `#general` with a fresh message id.
pub fn message(text: &str, author: Actor) -> IncomingMessage {
    let id = NEXT_MESSAGE.fetch_add(1, Ordering::Relaxed);
    IncomingMessage::new(text, MessageRef::new("general", format!("in-{id}")), author)
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingTransport {
    fail: bool,
    sent: Mutex<Vec<(OutgoingMessage, MessageRef)>>,
    deleted: Mutex<Vec<MessageRef>>,
    delete_attempts: AtomicUsize,
}

impl RecordingTransport {
    /// Rejects every send and delete.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(OutgoingMessage, MessageRef)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|(m, _)| match m {
                OutgoingMessage::Text(text) => Some(text),
                OutgoingMessage::Notice(_) => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.sent()
            .into_iter()
            .filter_map(|(m, _)| match m {
                OutgoingMessage::Notice(notice) => Some(notice),
                OutgoingMessage::Text(_) => None,
            })
            .collect()
    }

    pub fn notice_titles(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.title).collect()
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn delete_attempts(&self) -> usize {
        self.delete_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send(&self, channel: &ChannelRef, message: OutgoingMessage) -> Result<MessageRef> {
        if self.fail {
            bail!("transport offline");
        }
        let mut sent = self.sent.lock().unwrap();
        let posted = MessageRef {
            channel: channel.clone(),
            id: format!("sent-{}", sent.len() + 1),
        };
        sent.push((message, posted.clone()));
        Ok(posted)
    }

    async fn delete(&self, message: &MessageRef) -> Result<()> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("transport offline");
        }
        self.deleted.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingHandler {
    reply: Option<String>,
    calls: AtomicUsize,
    last: Mutex<Option<(String, Vec<String>)>>,
}

impl RecordingHandler {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_label(&self) -> String {
        self.last
            .lock()
            .unwrap()
            .as_ref()
            .map(|(label, _)| label.clone())
            .unwrap_or_default()
    }

    pub fn last_args(&self) -> Vec<String> {
        self.last
            .lock()
            .unwrap()
            .as_ref()
            .map(|(_, args)| args.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CommandHandler for RecordingHandler {
    async fn handle(&self, ctx: &InvocationContext<'_>) -> Result<CommandResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((ctx.label.to_string(), ctx.args.to_vec()));
        Ok(match &self.reply {
            Some(text) => CommandResponse::text(text.clone()),
            None => CommandResponse::silent(),
        })
    }
}

pub struct FailingHandler(pub &'static str);

#[async_trait]
impl CommandHandler for FailingHandler {
    async fn handle(&self, _ctx: &InvocationContext<'_>) -> Result<CommandResponse> {
        bail!("{}", self.0)
    }
}

pub struct PanickingHandler;

#[async_trait]
impl CommandHandler for PanickingHandler {
    async fn handle(&self, _ctx: &InvocationContext<'_>) -> Result<CommandResponse> {
        panic!("handler panicked on purpose");
    }
}

pub struct SlowHandler(pub Duration);

#[async_trait]
impl CommandHandler for SlowHandler {
    async fn handle(&self, _ctx: &InvocationContext<'_>) -> Result<CommandResponse> {
        tokio::time::sleep(self.0).await;
        Ok(CommandResponse::text("finally"))
    }
}
