/// Command registry: alias index over handler bindings.
///
/// Populated during startup through `&mut self`, then frozen by handing it to
/// a [`CommandDispatcher`](crate::CommandDispatcher), which shares it
/// read-only across dispatch tasks.
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::dispatch::CommandHandler;
use crate::error::CommandError;
use crate::handlers::HelpCommand;
use crate::types::CommandDescriptor;

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// One descriptor paired with the handler that executes it.
pub struct CommandBinding {
    descriptor: CommandDescriptor,
    handler: Arc<dyn CommandHandler>,
}

impl CommandBinding {
    pub fn new(descriptor: CommandDescriptor, handler: Arc<dyn CommandHandler>) -> Self {
        Self { descriptor, handler }
    }

    pub fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    pub fn handler(&self) -> &Arc<dyn CommandHandler> {
        &self.handler
    }
}

impl fmt::Debug for CommandBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBinding")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CommandRegistry {
    /// Registration order.
    bindings: Vec<Arc<CommandBinding>>,
    /// Lowercased alias -> index into `bindings`.
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `binding` under every alias. All-or-nothing: on a collision the
    /// registry is left exactly as it was.
    pub fn register(&mut self, binding: CommandBinding) -> Result<(), CommandError> {
        let mut keys = Vec::with_capacity(binding.descriptor.aliases().len());
        let mut seen = HashSet::new();
        for alias in binding.descriptor.aliases() {
            let key = alias.to_lowercase();
            if let Some(&existing) = self.index.get(&key) {
                return Err(CommandError::DuplicateAlias {
                    alias: alias.clone(),
                    existing: self.bindings[existing].descriptor.name().to_string(),
                });
            }
            // The same alias twice within one descriptor maps to the same binding.
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }

        let position = self.bindings.len();
        for key in keys {
            self.index.insert(key, position);
        }
        debug!(
            command = binding.descriptor.name(),
            aliases = ?binding.descriptor.aliases(),
            "Registered command"
        );
        self.bindings.push(Arc::new(binding));
        Ok(())
    }

    pub fn register_command(
        &mut self,
        descriptor: CommandDescriptor,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), CommandError> {
        self.register(CommandBinding::new(descriptor, handler))
    }

    /// Register the built-in `help` command.
    pub fn register_help(&mut self) -> Result<(), CommandError> {
        self.register_command(HelpCommand::descriptor()?, Arc::new(HelpCommand))
    }

    /// Case-insensitive exact lookup of a single alias token.
    pub fn resolve(&self, token: &str) -> Result<Arc<CommandBinding>, CommandError> {
        self.index
            .get(&token.to_lowercase())
            .map(|&i| Arc::clone(&self.bindings[i]))
            .ok_or_else(|| CommandError::NotFound(token.to_string()))
    }

    /// Non-hidden descriptors in registration order. Call again to restart.
    pub fn list_visible(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.bindings
            .iter()
            .map(|b| &b.descriptor)
            .filter(|d| !d.hidden())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CommandBinding>> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{CommandResponse, InvocationContext};
    use anyhow::Result;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl CommandHandler for Noop {
        async fn handle(&self, _ctx: &InvocationContext<'_>) -> Result<CommandResponse> {
            Ok(CommandResponse::silent())
        }
    }

    fn binding(aliases: &[&str]) -> CommandBinding {
        let descriptor = CommandDescriptor::builder()
            .aliases(aliases.iter().copied())
            .build()
            .unwrap();
        CommandBinding::new(descriptor, Arc::new(Noop))
    }

    fn hidden_binding(alias: &str) -> CommandBinding {
        let descriptor = CommandDescriptor::builder()
            .alias(alias)
            .hidden(true)
            .build()
            .unwrap();
        CommandBinding::new(descriptor, Arc::new(Noop))
    }

    fn snapshot(registry: &CommandRegistry) -> (Vec<String>, Vec<(String, usize)>) {
        let names = registry
            .iter()
            .map(|b| b.descriptor().name().to_string())
            .collect();
        let mut index: Vec<_> = registry.index.iter().map(|(k, v)| (k.clone(), *v)).collect();
        index.sort();
        (names, index)
    }

    #[test]
    fn duplicate_alias_is_rejected_atomically() {
        let mut registry = CommandRegistry::new();
        registry.register(binding(&["ping", "p"])).unwrap();
        let before = snapshot(&registry);

        // "pong" would be new, "P" collides case-insensitively.
        let err = registry.register(binding(&["pong", "P"])).unwrap_err();
        assert_eq!(
            err,
            CommandError::DuplicateAlias {
                alias: "P".into(),
                existing: "ping".into(),
            }
        );
        assert_eq!(snapshot(&registry), before);
        assert!(registry.resolve("pong").is_err());
    }

    #[test]
    fn repeated_alias_within_one_descriptor_is_allowed() {
        let mut registry = CommandRegistry::new();
        registry.register(binding(&["ping", "PING"])).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.index.len(), 1);
    }

    #[test]
    fn resolve_ignores_case() {
        let mut registry = CommandRegistry::new();
        registry.register(binding(&["ping", "p"])).unwrap();
        registry.register(binding(&["Echo"])).unwrap();

        let lower = registry.resolve("ping").unwrap();
        for token in ["PING", "Ping", "p", "P"] {
            assert!(Arc::ptr_eq(&lower, &registry.resolve(token).unwrap()));
        }
        assert_eq!(registry.resolve("echo").unwrap().descriptor().name(), "Echo");
    }

    #[test]
    fn resolve_does_not_prefix_match() {
        let mut registry = CommandRegistry::new();
        registry.register(binding(&["purge"])).unwrap();
        for token in ["pur", "purges", "", " purge"] {
            assert_eq!(
                registry.resolve(token).unwrap_err(),
                CommandError::NotFound(token.into())
            );
        }
    }

    #[test]
    fn list_visible_skips_hidden_and_keeps_order() {
        let mut registry = CommandRegistry::new();
        registry.register(binding(&["b"])).unwrap();
        registry.register(hidden_binding("secret")).unwrap();
        registry.register(binding(&["a"])).unwrap();

        let names: Vec<_> = registry.list_visible().map(|d| d.name()).collect();
        assert_eq!(names, ["b", "a"]);
        // Restartable and reflects later registrations.
        assert_eq!(registry.list_visible().count(), 2);
        registry.register(binding(&["c"])).unwrap();
        assert_eq!(registry.list_visible().count(), 3);
        // Hidden commands still resolve.
        assert!(registry.resolve("secret").is_ok());
    }

    #[test]
    fn help_registers_once() {
        let mut registry = CommandRegistry::new();
        registry.register_help().unwrap();
        assert!(registry.resolve("commands").is_ok());
        assert!(matches!(
            registry.register_help(),
            Err(CommandError::DuplicateAlias { .. })
        ));
        assert_eq!(registry.len(), 1);
    }
}
