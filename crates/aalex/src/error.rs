/// Unified error type for the aalex crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// Functionality not available on this platform or adapter.
    #[error("not implemented")]
    NotImplemented,
    /// Invalid input provided by the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A built-in command with the same name is already registered.
    #[error("duplicate command: {0}")]
    DuplicateCommand(String),
    /// The component id is not part of the configured catalog.
    #[error("unknown component: {0}")]
    UnknownComponent(String),
    /// The OS refused to create the component process.
    #[error("failed to launch {component}: {reason}")]
    LaunchFailed { component: String, reason: String },
    /// The custom command file could not be read or written as a whole.
    #[error("persistence error: {0}")]
    Persistence(String),
    /// A command handler reported a failure.
    #[error("handler failed: {0}")]
    Handler(String),
    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;
