use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;

use crate::command::{normalize, CommandEntry, CommandRegistry, HandlerContext, WakeWordSet};

pub const DEFAULT_APOLOGY: &str = "Sorry, I ran into a problem running that command.";
pub const DEFAULT_SUGGESTION: &str = "Unknown command. Say \"help\" to hear what I can do.";

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    Handled { command: String, response: String },
    NoMatch { suggestion: String },
    HandlerError {
        command: String,
        detail: String,
        apology: String,
    },
}

impl DispatchResult {
    /// Text to speak back to the user.
    pub fn spoken(&self) -> &str {
        match self {
            DispatchResult::Handled { response, .. } => response,
            DispatchResult::NoMatch { suggestion } => suggestion,
            DispatchResult::HandlerError { apology, .. } => apology,
        }
    }

    pub fn command(&self) -> Option<&str> {
        match self {
            DispatchResult::Handled { command, .. }
            | DispatchResult::HandlerError { command, .. } => Some(command),
            DispatchResult::NoMatch { .. } => None,
        }
    }
}

/// First-match dispatcher over a [`CommandRegistry`].
///
/// Selection walks `registry.list()` and stops at the first entry with a
/// trigger occurring in the input. There is no scoring: registration order
/// is the only tie-break.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    wake_words: WakeWordSet,
    apology: String,
    suggestion: String,
}

impl Dispatcher {
    pub fn new(wake_words: WakeWordSet) -> Self {
        Self {
            wake_words,
            apology: DEFAULT_APOLOGY.to_string(),
            suggestion: DEFAULT_SUGGESTION.to_string(),
        }
    }

    pub fn wake_words(&self) -> &WakeWordSet {
        &self.wake_words
    }

    /// Lowercase, strip wake words, collapse whitespace.
    pub fn normalize(&self, raw: &str) -> String {
        normalize(raw, &self.wake_words)
    }

    pub fn select<'a>(&self, registry: &'a CommandRegistry, text: &str) -> Option<&'a CommandEntry> {
        let lowered = text.to_lowercase();
        registry
            .list()
            .find(|entry| entry.matching_trigger(&lowered).is_some())
    }

    /// Select and run a command. Handler failures and panics are contained.
    pub async fn dispatch(
        &self,
        registry: &CommandRegistry,
        text: &str,
        mut ctx: HandlerContext,
    ) -> DispatchResult {
        let lowered = text.to_lowercase();
        let Some(entry) = self.select(registry, &lowered) else {
            tracing::debug!("no command matched {lowered:?}");
            return DispatchResult::NoMatch {
                suggestion: self.suggestion.clone(),
            };
        };
        let command = entry.name().to_string();
        tracing::debug!("dispatching {lowered:?} to {command}");

        ctx.input = lowered;
        ctx.command_phrases = registry
            .list()
            .filter_map(|entry| entry.definition.trigger_phrases.first().cloned())
            .collect();

        let handler = entry.handler.clone();
        let outcome = match std::panic::catch_unwind(AssertUnwindSafe(|| handler(ctx))) {
            Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
            Err(payload) => Err(payload),
        };

        match outcome {
            Ok(Ok(response)) => DispatchResult::Handled { command, response },
            Ok(Err(error)) => {
                tracing::warn!("command {command} failed: {error}");
                DispatchResult::HandlerError {
                    command,
                    detail: error.to_string(),
                    apology: self.apology.clone(),
                }
            }
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                tracing::warn!("command {command} panicked: {detail}");
                DispatchResult::HandlerError {
                    command,
                    detail,
                    apology: self.apology.clone(),
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_string()
    }
}
