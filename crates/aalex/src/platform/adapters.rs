pub mod console;
pub mod portable;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::types::Transcription;
use crate::command::ActionKind;
use crate::error::{CoreError, CoreResult};

/// Performs concrete platform actions on behalf of matched commands.
#[async_trait]
pub trait Effector: Send + Sync {
    fn id(&self) -> &str {
        "unsupported"
    }

    async fn invoke(&self, _kind: ActionKind, _payload: &Value) -> CoreResult<String> {
        Err(CoreError::NotImplemented)
    }
}

/// Text-to-speech output.
#[async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, text: &str) -> CoreResult<()>;
}

/// Speech-to-text input.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self) -> Transcription;
}

pub type SharedEffector = Arc<dyn Effector>;

/// Effector that performs nothing; every invocation is unsupported.
#[derive(Debug, Default)]
pub struct NullEffector;

impl Effector for NullEffector {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn null_effector_is_unsupported() {
        let effector = NullEffector;
        let result = effector.invoke(ActionKind::Effector, &json!({})).await;
        assert_eq!(result, Err(CoreError::NotImplemented));
        assert_eq!(effector.id(), "unsupported");
    }
}
