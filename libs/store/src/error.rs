//! Error types for the store client.

use thiserror::Error;

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure while talking to the engine.
    #[error("store I/O: {0}")]
    Io(#[from] std::io::Error),

    /// An operation exceeded its configured deadline.
    #[error("store {operation} timed out")]
    Timeout {
        /// The operation that timed out (connect/read/write).
        operation: &'static str,
    },

    /// The engine sent bytes that are not valid RESP.
    #[error("store protocol: {0}")]
    Protocol(String),

    /// The engine answered a command with an error reply.
    #[error("store command {command}: {message}")]
    Command {
        /// Name of the failing command.
        command: String,
        /// The engine's error message.
        message: String,
    },

    /// The engine answered with a structurally valid but unexpected reply.
    #[error("store command {command}: unexpected reply {reply}")]
    UnexpectedReply {
        /// Name of the command whose reply was malformed.
        command: String,
        /// Short rendering of the offending reply.
        reply: String,
    },

    /// A snapshot payload could not be serialized for materialization.
    #[error("serialize payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this error is the engine telling us a series already exists,
    /// which idempotent series creation treats as success.
    pub fn is_series_exists(&self) -> bool {
        matches!(self, StoreError::Command { message, .. } if message.contains("key already exists"))
    }
}
