pub mod error;
pub mod config;
pub mod core;
pub mod platform;

pub mod command;
pub mod routing;
pub mod storage;
pub mod supervisor;
pub mod builtins;

pub use crate::config::{load_or_create_config, resolve_home_dir, AssistantConfig};
pub use crate::core::Assistant;
pub use crate::error::{CoreError, CoreResult};
pub use crate::routing::DispatchResult;
pub use crate::supervisor::{ProcessRecord, ProcessState, ProcessSupervisor};
