use std::path::Path;
use std::sync::Arc;

use crate::builtins::register_builtins;
use crate::command::{
    CommandDefinition, CommandRegistry, HandlerContext, ShutdownSignal, WakeWordSet,
};
use crate::config::AssistantConfig;
use crate::error::CoreResult;
use crate::platform::{SharedEffector, Speaker, Transcriber, Transcription};
use crate::routing::{DispatchResult, Dispatcher};
use crate::storage::{CustomCommandStore, LoadWarning};
use crate::supervisor::ProcessSupervisor;

pub const NOT_HEARD: &str = "I didn't catch that.";

/// Primary facade for the assistant.
///
/// Owns the command registry, the dispatcher and the custom command store,
/// and shares the process supervisor with handlers and the liveness poller.
pub struct Assistant {
    config: AssistantConfig,
    registry: CommandRegistry,
    dispatcher: Dispatcher,
    store: CustomCommandStore,
    supervisor: Arc<ProcessSupervisor>,
    effector: SharedEffector,
    shutdown: ShutdownSignal,
    load_warnings: Vec<LoadWarning>,
}

impl Assistant {
    /// Build the assistant: built-ins first, then custom commands from disk.
    ///
    /// A custom command file that cannot be read as a whole is logged and
    /// the assistant starts with built-ins only.
    pub fn new(config: AssistantConfig, home: &Path, effector: SharedEffector) -> CoreResult<Self> {
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry, &config)?;

        let store = CustomCommandStore::new(config.custom_commands_path(home));
        let load_warnings = match store.load() {
            Ok(report) => {
                for definition in report.commands {
                    registry.upsert_custom(definition)?;
                }
                report.warnings
            }
            Err(error) => {
                tracing::warn!("starting without custom commands: {error}");
                Vec::new()
            }
        };
        tracing::info!(
            "registered {} built-in and {} custom commands",
            registry.builtin_count(),
            registry.custom_count()
        );

        Ok(Self {
            dispatcher: Dispatcher::new(WakeWordSet::new(&config.wake_words)),
            supervisor: Arc::new(ProcessSupervisor::new(config.components.clone())),
            config,
            registry,
            store,
            effector,
            shutdown: ShutdownSignal::new(),
            load_warnings,
        })
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn supervisor(&self) -> &Arc<ProcessSupervisor> {
        &self.supervisor
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Entries skipped when custom commands were loaded.
    pub fn load_warnings(&self) -> &[LoadWarning] {
        &self.load_warnings
    }

    fn context(&self) -> HandlerContext {
        HandlerContext::new(self.effector.clone(), self.supervisor.clone())
            .with_shutdown(self.shutdown.clone())
            .with_grace_period(self.config.supervisor.grace_period())
    }

    /// Normalize raw input and dispatch it.
    pub async fn handle_input(&self, raw: &str) -> DispatchResult {
        let text = self.dispatcher.normalize(raw);
        let result = self
            .dispatcher
            .dispatch(&self.registry, &text, self.context())
            .await;
        if let Some(command) = result.command() {
            tracing::info!("{text:?} -> {command}");
        }
        result
    }

    /// Persist then register a custom command, replacing one with the same name.
    ///
    /// The registry changes only once the file is written.
    pub fn add_custom_command(&mut self, definition: CommandDefinition) -> CoreResult<()> {
        definition.validate()?;
        let mut definitions = self.registry.custom_definitions();
        match definitions
            .iter_mut()
            .find(|existing| existing.name == definition.name)
        {
            Some(existing) => *existing = definition.clone(),
            None => definitions.push(definition.clone()),
        }
        self.store.save(&definitions)?;
        self.registry.upsert_custom(definition)
    }

    /// Remove a custom command. Returns whether it existed.
    pub fn remove_custom_command(&mut self, name: &str) -> CoreResult<bool> {
        if self.registry.get_custom(name).is_none() {
            return Ok(false);
        }
        let definitions: Vec<CommandDefinition> = self
            .registry
            .custom_definitions()
            .into_iter()
            .filter(|definition| definition.name != name)
            .collect();
        self.store.save(&definitions)?;
        Ok(self.registry.remove_custom(name))
    }

    /// Listen, dispatch and speak until the input closes or shutdown is requested.
    ///
    /// Each input is fully handled before the next one is read.
    pub async fn run(&self, transcriber: &dyn Transcriber, speaker: &dyn Speaker) -> CoreResult<()> {
        self.say(speaker, &self.config.greeting).await;
        while !self.shutdown.is_requested() {
            match transcriber.transcribe().await {
                Transcription::Heard(text) => {
                    let result = self.handle_input(&text).await;
                    self.say(speaker, result.spoken()).await;
                }
                Transcription::Silence => continue,
                Transcription::Failed(reason) => {
                    tracing::warn!("recognition failed: {reason}");
                    self.say(speaker, NOT_HEARD).await;
                }
                Transcription::Closed => {
                    tracing::info!("input closed");
                    break;
                }
            }
        }
        Ok(())
    }

    async fn say(&self, speaker: &dyn Speaker, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Err(error) = speaker.speak(text).await {
            tracing::warn!("failed to speak: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tempfile::tempdir;

    use crate::command::ActionKind;
    use crate::error::CoreError;
    use crate::platform::NullEffector;
    use crate::storage::CustomCommandStore;

    struct ScriptedTranscriber {
        script: Mutex<VecDeque<Transcription>>,
    }

    impl ScriptedTranscriber {
        fn new(script: Vec<Transcription>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    #[async_trait]
    impl Transcriber for ScriptedTranscriber {
        async fn transcribe(&self) -> Transcription {
            self.script
                .lock()
                .pop_front()
                .unwrap_or(Transcription::Closed)
        }
    }

    #[derive(Default)]
    struct CollectingSpeaker {
        spoken: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Speaker for CollectingSpeaker {
        async fn speak(&self, text: &str) -> CoreResult<()> {
            self.spoken.lock().push(text.to_string());
            Ok(())
        }
    }

    fn config() -> AssistantConfig {
        AssistantConfig {
            components: Vec::new(),
            ..AssistantConfig::default()
        }
    }

    fn lights_on() -> CommandDefinition {
        CommandDefinition::new(
            "lights_on",
            vec!["lights on".to_string()],
            ActionKind::Speak,
            "turning on lights",
        )
    }

    #[tokio::test]
    async fn custom_command_persists_across_restarts() {
        let home = tempdir().expect("tempdir");
        let mut assistant =
            Assistant::new(config(), home.path(), Arc::new(NullEffector)).expect("assistant");
        assistant.add_custom_command(lights_on()).expect("add");

        let restarted =
            Assistant::new(config(), home.path(), Arc::new(NullEffector)).expect("restart");
        let result = restarted.handle_input("Hey Aalex, lights on").await;
        assert_eq!(
            result,
            DispatchResult::Handled {
                command: "lights_on".to_string(),
                response: "turning on lights".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn custom_trigger_matches_inside_longer_sentence() {
        let home = tempdir().expect("tempdir");
        let mut assistant =
            Assistant::new(config(), home.path(), Arc::new(NullEffector)).expect("assistant");
        assistant
            .add_custom_command(CommandDefinition::new(
                "lights_on",
                vec!["turn on lights".to_string()],
                ActionKind::Speak,
                "turning on lights",
            ))
            .expect("add");

        let result = assistant.handle_input("please turn on lights now").await;
        assert_eq!(result.command(), Some("lights_on"));
        assert_eq!(result.spoken(), "turning on lights");
    }

    #[test]
    fn null_payload_is_rejected_before_saving() {
        let home = tempdir().expect("tempdir");
        let mut assistant =
            Assistant::new(config(), home.path(), Arc::new(NullEffector)).expect("assistant");
        let definition = lights_on().with_payload(serde_json::Value::Null);

        let result = assistant.add_custom_command(definition);

        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
        assert!(assistant.registry().get_custom("lights_on").is_none());
        let restarted =
            Assistant::new(config(), home.path(), Arc::new(NullEffector)).expect("restart");
        assert!(restarted.registry().get_custom("lights_on").is_none());
    }

    #[derive(Default)]
    struct OpenRecorder {
        opened: Mutex<Vec<serde_json::Value>>,
    }

    #[async_trait]
    impl crate::platform::Effector for OpenRecorder {
        async fn invoke(&self, _kind: ActionKind, payload: &serde_json::Value) -> CoreResult<String> {
            self.opened.lock().push(payload.clone());
            Ok("Opened.".to_string())
        }
    }

    #[tokio::test]
    async fn custom_open_command_is_not_shadowed_by_component_control() {
        let home = tempdir().expect("tempdir");
        let recorder = Arc::new(OpenRecorder::default());
        let mut assistant = Assistant::new(AssistantConfig::default(), home.path(), recorder.clone())
            .expect("assistant");
        let payload = serde_json::json!({ "open": "https://docs.rs" });
        assistant
            .add_custom_command(
                CommandDefinition::new(
                    "open_docs",
                    vec!["open the docs".to_string()],
                    ActionKind::Effector,
                    "Opening the docs.",
                )
                .with_payload(payload.clone()),
            )
            .expect("add");

        let result = assistant.handle_input("Aalex, open the docs").await;
        assert_eq!(result.command(), Some("open_docs"));
        assert_eq!(result.spoken(), "Opening the docs.");
        assert_eq!(*recorder.opened.lock(), vec![payload]);
    }

    #[tokio::test]
    async fn replacing_custom_command_keeps_one_entry() {
        let home = tempdir().expect("tempdir");
        let mut assistant =
            Assistant::new(config(), home.path(), Arc::new(NullEffector)).expect("assistant");
        assistant.add_custom_command(lights_on()).expect("add");
        let mut updated = lights_on();
        updated.response_template = "lights are on".to_string();
        assistant.add_custom_command(updated.clone()).expect("replace");

        assert_eq!(assistant.registry().custom_count(), 1);
        let stored = CustomCommandStore::new(assistant.config().custom_commands_path(home.path()))
            .load()
            .expect("load");
        assert_eq!(stored.commands, vec![updated]);
    }

    #[tokio::test]
    async fn invalid_custom_command_is_not_saved() {
        let home = tempdir().expect("tempdir");
        let mut assistant =
            Assistant::new(config(), home.path(), Arc::new(NullEffector)).expect("assistant");
        let invalid = CommandDefinition::new("mute", vec![], ActionKind::Speak, "");
        assert!(assistant.add_custom_command(invalid).is_err());
        assert!(!assistant
            .config()
            .custom_commands_path(home.path())
            .exists());
    }

    #[tokio::test]
    async fn remove_custom_command_updates_file() {
        let home = tempdir().expect("tempdir");
        let mut assistant =
            Assistant::new(config(), home.path(), Arc::new(NullEffector)).expect("assistant");
        assistant.add_custom_command(lights_on()).expect("add");

        assert!(assistant.remove_custom_command("lights_on").expect("remove"));
        assert!(!assistant.remove_custom_command("lights_on").expect("noop"));

        let result = assistant.handle_input("lights on").await;
        assert!(matches!(result, DispatchResult::NoMatch { .. }));
        let stored = CustomCommandStore::new(assistant.config().custom_commands_path(home.path()))
            .load()
            .expect("load");
        assert!(stored.commands.is_empty());
    }

    #[tokio::test]
    async fn corrupt_custom_file_starts_with_builtins() {
        let home = tempdir().expect("tempdir");
        let config = config();
        std::fs::write(config.custom_commands_path(home.path()), "{ not json").unwrap();

        let assistant =
            Assistant::new(config, home.path(), Arc::new(NullEffector)).expect("assistant");
        assert_eq!(assistant.registry().custom_count(), 0);
        assert_eq!(assistant.registry().builtin_count(), 10);
    }

    #[tokio::test]
    async fn malformed_entries_surface_as_warnings() {
        let home = tempdir().expect("tempdir");
        let config = config();
        std::fs::write(
            config.custom_commands_path(home.path()),
            r#"{
                "lights_on": {"triggers": ["lights on"], "action": "speak", "response": "turning on lights"},
                "broken": {"action": "speak"}
            }"#,
        )
        .unwrap();

        let assistant =
            Assistant::new(config, home.path(), Arc::new(NullEffector)).expect("assistant");
        assert_eq!(assistant.registry().custom_count(), 1);
        assert_eq!(assistant.load_warnings().len(), 1);
        assert_eq!(assistant.load_warnings()[0].name, "broken");
    }

    #[tokio::test]
    async fn run_greets_answers_and_stops_on_shutdown() {
        let home = tempdir().expect("tempdir");
        let assistant =
            Assistant::new(config(), home.path(), Arc::new(NullEffector)).expect("assistant");
        let transcriber = ScriptedTranscriber::new(vec![
            Transcription::Silence,
            Transcription::Failed("mumbling".to_string()),
            Transcription::Heard("aalex activate stealth".to_string()),
            Transcription::Heard("sing a song".to_string()),
            Transcription::Heard("shut down".to_string()),
            Transcription::Heard("recall shield".to_string()),
        ]);
        let speaker = CollectingSpeaker::default();

        assistant.run(&transcriber, &speaker).await.expect("run");

        let spoken = speaker.spoken.lock().clone();
        assert_eq!(
            spoken,
            vec![
                "Aalex online. Welcome back.".to_string(),
                NOT_HEARD.to_string(),
                "Stealth mode engaged. Cloaking systems on standby.".to_string(),
                "Unknown command. Say \"help\" to hear what I can do.".to_string(),
                "Powering down. Stay safe.".to_string(),
            ]
        );
        assert!(assistant.shutdown_signal().is_requested());
    }

    #[tokio::test]
    async fn run_ends_when_input_closes() {
        let home = tempdir().expect("tempdir");
        let assistant =
            Assistant::new(config(), home.path(), Arc::new(NullEffector)).expect("assistant");
        let transcriber = ScriptedTranscriber::new(vec![Transcription::Heard("hello".to_string())]);
        let speaker = CollectingSpeaker::default();

        assistant.run(&transcriber, &speaker).await.expect("run");

        assert_eq!(speaker.spoken.lock().len(), 2);
        assert!(!assistant.shutdown_signal().is_requested());
    }
}
