use thiserror::Error;

use crate::data::DatabaseError;

/// Errors produced inside the preview subsystem.
///
/// None of these reach the operator directly; the session logs them and
/// degrades to a no-op or default value.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("frame message has no type tag")]
    UntaggedMessage,

    #[error("unknown frame message type: {0}")]
    UnknownMessageType(String),

    #[error("malformed {kind} message: {source}")]
    MalformedMessage {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("message from stale connection {0}")]
    StaleConnection(String),

    #[error("preference storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid tape at line {line}: {reason}")]
    Tape { line: usize, reason: String },

    #[error("replay step {step} failed: {reason}")]
    ReplayStep { step: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, PreviewError>;
