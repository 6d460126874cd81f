//! Errors raised while encoding or decoding protocol frames.

use thiserror::Error;

/// Errors that can occur during message serialization/deserialization
#[derive(Debug, Error)]
pub enum SerializationError {
    /// Frame is not valid JSON for the expected message type
    #[error("Invalid message format: {0}")]
    InvalidFormat(#[from] serde_json::Error),

    /// Message size exceeded maximum allowed
    #[error("Message size {actual} exceeds maximum {max}")]
    MessageTooLarge { actual: usize, max: usize },
}

impl SerializationError {
    /// Stable error code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) => "INVALID_MESSAGE",
            Self::MessageTooLarge { .. } => "MESSAGE_TOO_LARGE",
        }
    }
}

/// Result type for serialization operations
pub type Result<T> = std::result::Result<T, SerializationError>;
