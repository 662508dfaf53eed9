//! Suit actions: shield recall, stealth mode and the battle playlist.

use std::sync::Arc;

use serde_json::json;

use super::{definition, respond};
use crate::command::{boxed_handler_future, ActionKind, CommandRegistry, HandlerContext};
use crate::config::AssistantConfig;
use crate::error::CoreResult;

const PLAYING: &str = "Playing battle playlist.";

pub fn register(registry: &mut CommandRegistry, config: &AssistantConfig) -> CoreResult<()> {
    registry.register_builtin(
        definition(
            "recall_shield",
            &["recall shield"],
            ActionKind::Speak,
            "Recalling shield. Locking onto tracker signal.\nShield returning to arm.",
        ),
        respond("Recalling shield. Locking onto tracker signal.\nShield returning to arm."),
    )?;
    registry.register_builtin(
        definition(
            "activate_stealth",
            &["activate stealth"],
            ActionKind::Speak,
            "Stealth mode engaged. Cloaking systems on standby.",
        ),
        respond("Stealth mode engaged. Cloaking systems on standby."),
    )?;

    let payload = json!({ "open": config.music_url });
    registry.register_builtin(
        definition("play_music", &["play music"], ActionKind::Effector, PLAYING)
            .with_payload(payload.clone()),
        Arc::new(move |ctx: HandlerContext| {
            let payload = payload.clone();
            boxed_handler_future(async move {
                ctx.effector.invoke(ActionKind::Effector, &payload).await?;
                Ok(PLAYING.to_string())
            })
        }),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    use crate::builtins::test_support::Harness;
    use crate::command::ActionKind;
    use crate::config::AssistantConfig;
    use crate::error::CoreResult;
    use crate::platform::{Effector, NullEffector};
    use crate::routing::DispatchResult;

    #[derive(Default)]
    struct Recorder {
        payloads: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl Effector for Recorder {
        async fn invoke(&self, _kind: ActionKind, payload: &Value) -> CoreResult<String> {
            self.payloads.lock().push(payload.clone());
            Ok("opened".to_string())
        }
    }

    #[tokio::test]
    async fn recall_shield_speaks_two_lines() {
        let harness = Harness::new(Arc::new(NullEffector), Vec::new());
        let result = harness.say("Aalex recall shield").await;
        assert_eq!(
            result.spoken(),
            "Recalling shield. Locking onto tracker signal.\nShield returning to arm."
        );
    }

    #[tokio::test]
    async fn play_music_opens_configured_url() {
        let recorder = Arc::new(Recorder::default());
        let harness = Harness::new(recorder.clone(), Vec::new());

        let result = harness.say("play music").await;

        assert_eq!(result.spoken(), "Playing battle playlist.");
        let expected = json!({ "open": AssistantConfig::default().music_url });
        assert_eq!(*recorder.payloads.lock(), vec![expected]);
    }

    #[tokio::test]
    async fn play_music_without_platform_support_apologizes() {
        let harness = Harness::new(Arc::new(NullEffector), Vec::new());
        let result = harness.say("play music").await;
        assert!(matches!(result, DispatchResult::HandlerError { .. }));
    }
}
