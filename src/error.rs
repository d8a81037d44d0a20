//! Error types for the launcher front-end.

/// Top-level error type for the launcher front-end.
#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    /// The host rejected a command. Displays the host's message verbatim so
    /// console lines read `Failed to load mode: <host message>`.
    #[error("{0}")]
    Host(String),

    /// Envelope contract violation (version, identifiers).
    #[error("contract error: {0}")]
    Contract(#[from] crate::bridge::contract::ContractError),

    /// Host channel closed or a request could not be delivered.
    #[error("channel error: {0}")]
    Channel(String),

    /// A command result or event payload did not have the expected shape.
    #[error("payload error: {0}")]
    Payload(String),

    /// A view element the front-end writes to is missing.
    #[error("view error: {0}")]
    View(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, LauncherError>;
