//! Persistence for user-defined commands.

pub mod file;

pub use file::{CustomCommandStore, LoadReport, LoadWarning, StoredCommand};
