//! Built-in commands, registered ahead of any custom command.
//!
//! Registration order is dispatch order, so the groups below register in a
//! fixed sequence: component control, suit actions, then session commands.

pub mod components;
pub mod session;
pub mod suit;

use std::sync::Arc;

use crate::command::{
    boxed_handler_future, ActionKind, CommandDefinition, CommandHandler, CommandRegistry,
    HandlerContext,
};
use crate::config::AssistantConfig;
use crate::error::CoreResult;

/// Register every built-in command.
pub fn register_builtins(registry: &mut CommandRegistry, config: &AssistantConfig) -> CoreResult<()> {
    components::register(registry, &config.components)?;
    suit::register(registry, config)?;
    session::register(registry)?;
    Ok(())
}

fn definition(name: &str, triggers: &[&str], action: ActionKind, response: &str) -> CommandDefinition {
    CommandDefinition::new(
        name,
        triggers.iter().map(|trigger| trigger.to_string()).collect(),
        action,
        response,
    )
}

/// Handler that always answers with the same text.
fn respond(text: &'static str) -> CommandHandler {
    Arc::new(move |_ctx: HandlerContext| boxed_handler_future(async move { Ok(text.to_string()) }))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_register_in_dispatch_order() {
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry, &AssistantConfig::default()).unwrap();
        let names: Vec<&str> = registry.list().map(|entry| entry.name()).collect();
        assert_eq!(
            names,
            vec![
                "diagnostics",
                "component_status",
                "launch_component",
                "stop_component",
                "recall_shield",
                "activate_stealth",
                "play_music",
                "shutdown",
                "help",
                "greeting",
            ]
        );
    }

    #[test]
    fn registering_twice_is_rejected() {
        let mut registry = CommandRegistry::new();
        let config = AssistantConfig::default();
        register_builtins(&mut registry, &config).unwrap();
        assert!(register_builtins(&mut registry, &config).is_err());
    }
}
