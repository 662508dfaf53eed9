//! Command definitions, registry and input normalization.

pub mod custom;
pub mod parser;
pub mod registry;
pub mod types;

pub use parser::{normalize, WakeWordSet};
pub use registry::{CommandEntry, CommandRegistry};
pub use types::{
    boxed_handler_future, ActionKind, CommandDefinition, CommandHandler, CommandOrigin,
    HandlerContext, HandlerFuture, ShutdownSignal,
};
