use serde::{Deserialize, Serialize};

/// Platform action understood by the system effector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectRequest {
    /// Open a URL, file or application bundle with the platform opener.
    Open { open: String },
    /// Start a detached program.
    Run {
        run: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

/// Outcome of one attempt to hear the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Transcription {
    Heard(String),
    /// Nothing was said before the recognizer gave up.
    Silence,
    /// The recognizer heard something it could not turn into text.
    Failed(String),
    /// The input source is gone; the listener should stop.
    Closed,
}
