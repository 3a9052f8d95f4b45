//! Secure stream error types

use std::io;
use std::time::Duration;

use crypto_session::CryptoError;
use thiserror::Error;
use wire_protocol::ProtocolError;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Handshake failed: {0}")]
    HandshakeFailed(#[source] io::Error),

    #[error("Handshake timeout after {0:?}")]
    HandshakeTimeout(Duration),

    #[error("Truncated record: expected {expected} bytes, got {actual}")]
    TruncatedRecord { expected: usize, actual: usize },

    #[error("Invalid record length: {0}")]
    InvalidLength(usize),

    /// The record failed authentication. Never retried: the peer or the
    /// path is not trustworthy.
    #[error("Decryption failed: record rejected")]
    DecryptFailed,

    #[error("Encryption failed")]
    SealFailed,

    #[error("Random source failed: {0}")]
    RngExhausted(#[source] rand::Error),

    #[error("Nonce overflow: maximum record count exceeded")]
    NonceOverflow,

    #[error("Message too long: {size} bytes (max: {max})")]
    MessageTooLong { size: usize, max: usize },

    #[error("Stream corrupted by an earlier failure")]
    StreamCorrupted,

    #[error("Read error: {0}")]
    Read(#[source] io::Error),

    #[error("Write error: {0}")]
    Write(#[source] io::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type StreamResult<T> = Result<T, StreamError>;

impl From<ProtocolError> for StreamError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidLength { length, .. } => StreamError::InvalidLength(length),
            ProtocolError::MessageTooLong { size, max } => StreamError::MessageTooLong { size, max },
            ProtocolError::TruncatedPrelude { expected, actual } => {
                StreamError::TruncatedRecord { expected, actual }
            }
        }
    }
}

impl From<CryptoError> for StreamError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::RngExhausted(e) => StreamError::RngExhausted(e),
            CryptoError::SealFailed => StreamError::SealFailed,
            CryptoError::DecryptFailed => StreamError::DecryptFailed,
            CryptoError::NonceOverflow => StreamError::NonceOverflow,
        }
    }
}
