//! Channel configuration

use std::time::Duration;

use crypto_session::NonceStrategy;
use serde::{Deserialize, Serialize};
use wire_protocol::MAX_RECORD_PLAINTEXT;

use crate::{StreamError, StreamResult};

/// Secure channel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Nonce discipline used by the writer
    pub nonce_strategy: NonceStrategy,
    /// Largest plaintext sealed into one record (1..=32768)
    pub max_record_plaintext: usize,
    /// Split writes larger than `max_record_plaintext` into several records.
    /// When disabled such writes fail with `MessageTooLong`.
    pub chunking: bool,
    /// Bound on the public key exchange, in milliseconds
    pub handshake_timeout_ms: Option<u64>,
    /// Buffer used when copying decrypted bytes (echo service)
    pub read_buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            nonce_strategy: NonceStrategy::Counter,
            max_record_plaintext: MAX_RECORD_PLAINTEXT,
            chunking: true,
            handshake_timeout_ms: None,
            read_buffer_size: 16 * 1024,
        }
    }
}

impl ChannelConfig {
    pub fn handshake_timeout(&self) -> Option<Duration> {
        self.handshake_timeout_ms.map(Duration::from_millis)
    }

    /// Reject values the channel cannot honour
    pub fn validate(&self) -> StreamResult<()> {
        if self.max_record_plaintext == 0 || self.max_record_plaintext > MAX_RECORD_PLAINTEXT {
            return Err(StreamError::InvalidConfig(format!(
                "max_record_plaintext must be between 1 and {}, got {}",
                MAX_RECORD_PLAINTEXT, self.max_record_plaintext
            )));
        }

        if self.handshake_timeout_ms == Some(0) {
            return Err(StreamError::InvalidConfig(
                "handshake_timeout_ms must be positive".to_string(),
            ));
        }

        if self.read_buffer_size == 0 {
            return Err(StreamError::InvalidConfig(
                "read_buffer_size must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
