//! Shutdown, help and greeting.

use std::sync::Arc;

use rand::seq::SliceRandom;

use super::definition;
use crate::command::{boxed_handler_future, ActionKind, CommandRegistry, HandlerContext};
use crate::error::CoreResult;

const FAREWELL: &str = "Powering down. Stay safe.";
const GREETINGS: [&str; 3] = ["Hello hero.", "At your service.", "System online and ready."];

pub fn register(registry: &mut CommandRegistry) -> CoreResult<()> {
    registry.register_builtin(
        definition(
            "shutdown",
            &["shutdown", "shut down", "power down"],
            ActionKind::Speak,
            FAREWELL,
        ),
        Arc::new(|ctx: HandlerContext| {
            boxed_handler_future(async move {
                ctx.shutdown.request();
                Ok(FAREWELL.to_string())
            })
        }),
    )?;
    registry.register_builtin(
        definition("help", &["help"], ActionKind::Speak, ""),
        Arc::new(|ctx: HandlerContext| {
            boxed_handler_future(async move { Ok(help_text(&ctx.command_phrases)) })
        }),
    )?;
    registry.register_builtin(
        definition("greeting", &["hello", "hi"], ActionKind::Speak, ""),
        Arc::new(|_ctx: HandlerContext| {
            boxed_handler_future(async move {
                let greeting = GREETINGS
                    .choose(&mut rand::thread_rng())
                    .copied()
                    .unwrap_or(GREETINGS[0]);
                Ok(greeting.to_string())
            })
        }),
    )?;
    Ok(())
}

fn help_text(phrases: &[String]) -> String {
    let phrases: Vec<&str> = phrases
        .iter()
        .map(String::as_str)
        .filter(|phrase| *phrase != "help")
        .collect();
    match phrases.split_last() {
        None => "I don't know any commands yet.".to_string(),
        Some((only, [])) => format!("You can say: {only}."),
        Some((last, rest)) => format!("You can say: {}, or {last}.", rest.join(", ")),
    }
}
