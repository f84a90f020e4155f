//! Device layer error types.

/// Device layer errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The device is unreachable or refused the credentials.
    #[error("Failed to connect to {host}: {reason}")]
    Connection { host: String, reason: String },

    /// A session operation was attempted before `open` or after `close`.
    #[error("Session to {0} is not open")]
    NotOpen(String),

    /// A remote file could not be copied.
    #[error("Failed to transfer {path}: {reason}")]
    Transfer { path: String, reason: String },

    /// A structured query returned something that isn't a document.
    #[error("Query '{rpc}' failed: {reason}")]
    Query { rpc: String, reason: String },

    /// The command could not be issued at all. Errors reported by the
    /// device itself are returned as output text instead.
    #[error("Failed to issue '{command}': {reason}")]
    Command { command: String, reason: String },

    /// I/O operation failed.
    #[error(transparent)]
    IO(#[from] std::io::Error),

    /// JSON deserialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
