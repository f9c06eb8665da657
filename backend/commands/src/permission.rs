//! Opaque capability tokens.
//!
//! The chat platform owns the permission model; these tokens are compared for
//! equality only and no hierarchy is inferred between them.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

/// A single capability token required to invoke a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Least-privileged capability; the default requirement.
    pub const READ_MESSAGES: Self = Self(Cow::Borrowed("read_messages"));
    pub const SEND_MESSAGES: Self = Self(Cow::Borrowed("send_messages"));
    pub const MANAGE_MESSAGES: Self = Self(Cow::Borrowed("manage_messages"));
    pub const KICK_MEMBERS: Self = Self(Cow::Borrowed("kick_members"));
    pub const BAN_MEMBERS: Self = Self(Cow::Borrowed("ban_members"));
    pub const MANAGE_GUILD: Self = Self(Cow::Borrowed("manage_guild"));
    /// Also bypasses per-command role restrictions.
    pub const ADMINISTRATOR: Self = Self(Cow::Borrowed("administrator"));

    /// Wrap a platform-specific token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Cow::Owned(token.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Permission {
    fn default() -> Self {
        Self::READ_MESSAGES
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capabilities granted to an actor in the channel a message came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    granted: HashSet<Permission>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, permission: Permission) -> Self {
        self.granted.insert(permission);
        self
    }

    pub fn insert(&mut self, permission: Permission) {
        self.granted.insert(permission);
    }

    /// Exact membership test.
    pub fn grants(&self, permission: &Permission) -> bool {
        self.granted.contains(permission)
    }

    pub fn len(&self) -> usize {
        self.granted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }
}

impl FromIterator<Permission> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self {
            granted: iter.into_iter().collect(),
        }
    }
}
