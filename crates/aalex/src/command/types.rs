use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::platform::SharedEffector;
use crate::supervisor::ProcessSupervisor;

/// What a matched command does when invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Respond with the rendered template only.
    Speak,
    /// Run one platform action through the effector.
    Effector,
    /// Run a sequence of steps (speech, effects, component lifecycle).
    Composite,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Speak => "speak",
            ActionKind::Effector => "effector",
            ActionKind::Composite => "composite",
        }
    }
}

/// Where a definition came from; names are unique per origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOrigin {
    BuiltIn,
    Custom,
}

/// A command the dispatcher can select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: String,
    /// Matched case-insensitively as substrings of normalized input.
    pub trigger_phrases: Vec<String>,
    pub action: ActionKind,
    /// `{input}` and `{name}` are substituted at dispatch time.
    pub response_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_payload: Option<serde_json::Value>,
}

impl CommandDefinition {
    pub fn new(
        name: impl Into<String>,
        trigger_phrases: Vec<String>,
        action: ActionKind,
        response_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            trigger_phrases,
            action,
            response_template: response_template.into(),
            custom_payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.custom_payload = Some(payload);
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidInput("command name is empty".to_string()));
        }
        if self.trigger_phrases.is_empty() {
            return Err(CoreError::InvalidInput(format!(
                "command {} has no trigger phrases",
                self.name
            )));
        }
        if self.trigger_phrases.iter().any(|phrase| phrase.trim().is_empty()) {
            return Err(CoreError::InvalidInput(format!(
                "command {} has a blank trigger phrase",
                self.name
            )));
        }
        if matches!(self.custom_payload, Some(serde_json::Value::Null)) {
            return Err(CoreError::InvalidInput(format!(
                "command {} has a null payload; omit it instead",
                self.name
            )));
        }
        Ok(())
    }

    /// Substitutes `{input}` and `{name}` into the response template.
    pub fn render_response(&self, input: &str) -> String {
        self.render(&self.response_template, input)
    }

    /// Substitutes `{input}` and `{name}` into any text spoken for this command.
    pub fn render(&self, template: &str, input: &str) -> String {
        template.replace("{input}", input).replace("{name}", &self.name)
    }
}

/// Cooperative stop flag shared between the listener loop and handlers.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a handler may touch while it runs.
#[derive(Clone)]
pub struct HandlerContext {
    /// Normalized input that selected the command.
    pub input: String,
    pub effector: SharedEffector,
    pub supervisor: Arc<ProcessSupervisor>,
    pub shutdown: ShutdownSignal,
    /// Grace period used by component stop commands.
    pub grace_period: Duration,
    /// First trigger phrase of every registered command, in dispatch order.
    pub command_phrases: Vec<String>,
}

impl HandlerContext {
    pub fn new(effector: SharedEffector, supervisor: Arc<ProcessSupervisor>) -> Self {
        Self {
            input: String::new(),
            effector,
            supervisor,
            shutdown: ShutdownSignal::new(),
            grace_period: Duration::from_secs(3),
            command_phrases: Vec::new(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HandlerContext")
            .field("input", &self.input)
            .field("grace_period", &self.grace_period)
            .field("shutdown", &self.shutdown.is_requested())
            .finish()
    }
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = CoreResult<String>> + Send>>;

pub type CommandHandler = Arc<dyn Fn(HandlerContext) -> HandlerFuture + Send + Sync>;

pub fn boxed_handler_future<F>(future: F) -> HandlerFuture
where
    F: Future<Output = CoreResult<String>> + Send + 'static,
{
    Box::pin(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_triggers() {
        let def = CommandDefinition::new("empty", vec![], ActionKind::Speak, "hi");
        assert!(matches!(def.validate(), Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn validate_rejects_blank_trigger() {
        let def = CommandDefinition::new(
            "blank",
            vec!["ok".to_string(), "   ".to_string()],
            ActionKind::Speak,
            "hi",
        );
        assert!(def.validate().is_err());
    }

    #[test]
    fn validate_rejects_null_payload() {
        let def = CommandDefinition::new(
            "lights",
            vec!["lights on".to_string()],
            ActionKind::Effector,
            "",
        )
        .with_payload(serde_json::Value::Null);
        assert!(matches!(def.validate(), Err(CoreError::InvalidInput(_))));

        let def = def.with_payload(serde_json::json!({ "run": "lights on" }));
        assert!(def.validate().is_ok());
    }

    #[test]
    fn render_substitutes_placeholders() {
        let def = CommandDefinition::new(
            "echo",
            vec!["echo".to_string()],
            ActionKind::Speak,
            "{name} heard: {input}",
        );
        assert_eq!(def.render_response("echo this"), "echo heard: echo this");
    }

    #[test]
    fn action_kind_serializes_lowercase() {
        let value = serde_json::to_value(ActionKind::Composite).unwrap();
        assert_eq!(value, serde_json::json!("composite"));
        assert_eq!(ActionKind::Effector.as_str(), "effector");
    }

    #[test]
    fn shutdown_signal_is_shared_between_clones() {
        let signal = ShutdownSignal::new();
        let clone = signal.clone();
        clone.request();
        assert!(signal.is_requested());
    }
}
