//! Error types for the wire protocol

use thiserror::Error;

/// Wire protocol error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid record length: {length} (expected {min}..={max})")]
    InvalidLength { length: usize, min: usize, max: usize },

    #[error("Message too long: {size} bytes (max: {max})")]
    MessageTooLong { size: usize, max: usize },

    #[error("Truncated prelude: expected {expected} bytes, got {actual}")]
    TruncatedPrelude { expected: usize, actual: usize },
}

/// Result type alias for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
