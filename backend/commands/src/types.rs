/// Command metadata types.
///
/// A [`CommandDescriptor`] is the routing and authorization record attached to
/// a handler at registration time. It is built once and never mutated.
use std::any::type_name;

use regex::Regex;

use crate::error::CommandError;
use crate::permission::Permission;
use crate::transport::{MentionCounts, RoleId};

// ---------------------------------------------------------------------------
// Argument requirements
// ---------------------------------------------------------------------------

/// Requirement on one positional argument.
#[derive(Debug, Clone)]
pub enum ArgPattern {
    /// The argument must be present.
    Required,
    /// The argument (or the empty string when absent) must fully match.
    Pattern { source: String, regex: Regex },
}

impl ArgPattern {
    fn compile(source: String) -> Result<Self, CommandError> {
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| {
            CommandError::InvalidArgPattern {
                pattern: source.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self::Pattern { source, regex })
    }

    pub fn matches(&self, arg: Option<&str>) -> bool {
        match self {
            Self::Required => arg.is_some(),
            Self::Pattern { regex, .. } => regex.is_match(arg.unwrap_or("")),
        }
    }
}

/// Exact mention counts a message must carry. Zero means "not checked".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MentionRequirements {
    pub members: usize,
    pub roles: usize,
    pub channels: usize,
}

impl MentionRequirements {
    /// Returns a human-readable reason on mismatch.
    pub fn check(&self, found: &MentionCounts) -> Result<(), String> {
        let checks = [
            ("member", self.members, found.members),
            ("role", self.roles, found.roles),
            ("channel", self.channels, found.channels),
        ];
        for (kind, wanted, got) in checks {
            if wanted > 0 && wanted != got {
                return Err(format!("expected {wanted} {kind} mention(s), found {got}"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Immutable routing and authorization metadata for one command.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    aliases: Vec<String>,
    description: String,
    usage: String,
    permission: Permission,
    autodelete: bool,
    hidden: bool,
    roles: Vec<RoleId>,
    args: Vec<ArgPattern>,
    mentions: MentionRequirements,
}

impl CommandDescriptor {
    pub fn builder() -> CommandDescriptorBuilder {
        CommandDescriptorBuilder::default()
    }

    /// All aliases in declaration order. Never empty.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Canonical name: the first alias.
    pub fn name(&self) -> &str {
        // Non-empty by construction.
        &self.aliases[0]
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Usage text for help and error notices, falling back to the name.
    pub fn display_usage(&self) -> &str {
        if self.usage.is_empty() {
            self.name()
        } else {
            &self.usage
        }
    }

    pub fn permission(&self) -> &Permission {
        &self.permission
    }

    /// Delete the triggering message after a successful run.
    pub fn autodelete(&self) -> bool {
        self.autodelete
    }

    /// Excluded from help listings but still invocable.
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn roles(&self) -> &[RoleId] {
        &self.roles
    }

    pub fn args(&self) -> &[ArgPattern] {
        &self.args
    }

    pub fn mentions(&self) -> &MentionRequirements {
        &self.mentions
    }

    /// Case-insensitive exact alias match.
    pub fn matches(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        self.aliases.iter().any(|a| a.to_lowercase() == token)
    }
}

/// Builder for [`CommandDescriptor`]. Unset fields take their defaults:
/// empty description and usage, [`Permission::READ_MESSAGES`], not hidden,
/// no autodelete, no role or argument restrictions.
#[derive(Debug, Default)]
pub struct CommandDescriptorBuilder {
    aliases: Vec<String>,
    description: String,
    usage: String,
    permission: Permission,
    autodelete: bool,
    hidden: bool,
    roles: Vec<RoleId>,
    args: Vec<Option<String>>,
    mentions: MentionRequirements,
}

impl CommandDescriptorBuilder {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    pub fn autodelete(mut self, autodelete: bool) -> Self {
        self.autodelete = autodelete;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Restrict to members holding at least one of `roles` (administrators bypass).
    pub fn roles(mut self, roles: impl IntoIterator<Item = RoleId>) -> Self {
        self.roles.extend(roles);
        self
    }

    /// Next positional argument must be present.
    pub fn required_arg(mut self) -> Self {
        self.args.push(None);
        self
    }

    /// Next positional argument must fully match `pattern`.
    pub fn arg_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.args.push(Some(pattern.into()));
        self
    }

    pub fn mentions(mut self, mentions: MentionRequirements) -> Self {
        self.mentions = mentions;
        self
    }

    pub fn build(self) -> Result<CommandDescriptor, CommandError> {
        if self.aliases.is_empty() {
            return Err(CommandError::EmptyAliases);
        }
        if let Some(bad) = self
            .aliases
            .iter()
            .find(|a| a.is_empty() || a.chars().any(char::is_whitespace))
        {
            return Err(CommandError::InvalidAlias(bad.clone()));
        }

        let args = self
            .args
            .into_iter()
            .map(|arg| match arg {
                None => Ok(ArgPattern::Required),
                Some(source) => ArgPattern::compile(source),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CommandDescriptor {
            aliases: self.aliases,
            description: self.description,
            usage: self.usage,
            permission: self.permission,
            autodelete: self.autodelete,
            hidden: self.hidden,
            roles: self.roles,
            args,
            mentions: self.mentions,
        })
    }

    /// Like [`build`](Self::build), but derives an alias from the handler's
    /// type name when none was given: `PurgeCommand` becomes `purge`.
    pub fn build_for<H: ?Sized>(mut self) -> Result<CommandDescriptor, CommandError> {
        if self.aliases.is_empty() {
            self.aliases.push(alias_from_type_name(type_name::<H>()));
        }
        self.build()
    }
}

fn alias_from_type_name(full: &str) -> String {
    let without_generics = full.split('<').next().unwrap_or(full);
    let name = without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics);
    let name = match name.strip_suffix("Command") {
        Some(stem) if !stem.is_empty() => stem,
        _ => name,
    };
    name.to_lowercase()
}

// ---------------------------------------------------------------------------
// Parsed invocation
// ---------------------------------------------------------------------------

/// A command token and its arguments, split from an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    /// The token as typed, without the prefix. May be empty.
    pub label: String,
    /// Whitespace-separated arguments following the token.
    pub args: Vec<String>,
    /// Full remaining text after the token, trimmed.
    pub raw_args: String,
}
