//! Input routing: maps normalized text to a registered command and runs it.

pub mod dispatcher;

pub use dispatcher::{DispatchResult, Dispatcher, DEFAULT_APOLOGY, DEFAULT_SUGGESTION};
