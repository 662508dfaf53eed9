mod adapters;
pub mod factory;
pub mod types;

pub use adapters::console::{ConsoleSpeaker, StdinTranscriber};
pub use adapters::portable::SystemEffector;
pub use adapters::{Effector, NullEffector, SharedEffector, Speaker, Transcriber};
pub use factory::default_effector;
pub use types::{EffectRequest, Transcription};
