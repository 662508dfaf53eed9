//! Command registry for built-in and custom commands.

use super::custom::custom_handler;
use super::types::{CommandDefinition, CommandHandler, CommandOrigin};
use crate::error::{CoreError, CoreResult};

/// A registered definition with its handler and lowercased triggers.
#[derive(Clone)]
pub struct CommandEntry {
    pub definition: CommandDefinition,
    pub origin: CommandOrigin,
    pub handler: CommandHandler,
    triggers: Vec<String>,
}

impl CommandEntry {
    fn new(definition: CommandDefinition, origin: CommandOrigin, handler: CommandHandler) -> Self {
        let triggers = definition
            .trigger_phrases
            .iter()
            .map(|phrase| phrase.to_lowercase())
            .collect();
        Self {
            definition,
            origin,
            handler,
            triggers,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Returns the first trigger phrase found in already lowercased text.
    pub fn matching_trigger(&self, lowered: &str) -> Option<&str> {
        self.triggers
            .iter()
            .find(|trigger| lowered.contains(trigger.as_str()))
            .map(|trigger| trigger.as_str())
    }
}

impl std::fmt::Debug for CommandEntry {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CommandEntry")
            .field("definition", &self.definition)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Registry holding built-in commands (fixed at startup) and custom commands.
///
/// Both groups keep registration order. Built-ins always come first in
/// [`CommandRegistry::list`], which is the order the dispatcher walks.
#[derive(Default)]
pub struct CommandRegistry {
    builtins: Vec<CommandEntry>,
    custom: Vec<CommandEntry>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a built-in command. Fails if a built-in with the same name exists.
    pub fn register_builtin(
        &mut self,
        definition: CommandDefinition,
        handler: CommandHandler,
    ) -> CoreResult<()> {
        definition.validate()?;
        if self.builtins.iter().any(|entry| entry.name() == definition.name) {
            return Err(CoreError::DuplicateCommand(definition.name));
        }
        self.builtins
            .push(CommandEntry::new(definition, CommandOrigin::BuiltIn, handler));
        Ok(())
    }

    /// Insert or replace a custom command keyed by name.
    ///
    /// A replaced command keeps its original registration position.
    pub fn upsert_custom(&mut self, definition: CommandDefinition) -> CoreResult<()> {
        definition.validate()?;
        let handler = custom_handler(&definition);
        let entry = CommandEntry::new(definition, CommandOrigin::Custom, handler);
        match self
            .custom
            .iter_mut()
            .find(|existing| existing.name() == entry.name())
        {
            Some(existing) => *existing = entry,
            None => self.custom.push(entry),
        }
        Ok(())
    }

    /// Remove a custom command. Returns whether anything was removed.
    pub fn remove_custom(&mut self, name: &str) -> bool {
        let before = self.custom.len();
        self.custom.retain(|entry| entry.name() != name);
        before != self.custom.len()
    }

    /// Built-ins in registration order, then custom commands in registration order.
    pub fn list(&self) -> impl Iterator<Item = &CommandEntry> {
        self.builtins.iter().chain(self.custom.iter())
    }

    pub fn get_custom(&self, name: &str) -> Option<&CommandDefinition> {
        self.custom
            .iter()
            .find(|entry| entry.name() == name)
            .map(|entry| &entry.definition)
    }

    /// Custom definitions in registration order, as persisted.
    pub fn custom_definitions(&self) -> Vec<CommandDefinition> {
        self.custom
            .iter()
            .map(|entry| entry.definition.clone())
            .collect()
    }

    pub fn builtin_count(&self) -> usize {
        self.builtins.len()
    }

    pub fn custom_count(&self) -> usize {
        self.custom.len()
    }
}
