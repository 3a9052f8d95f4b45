//! Crypto session error types

use thiserror::Error;

/// Cryptographic operation error
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Random source failed: {0}")]
    RngExhausted(#[source] rand::Error),

    #[error("Encryption failed")]
    SealFailed,

    #[error("Decryption failed: authentication tag mismatch")]
    DecryptFailed,

    #[error("Nonce overflow: maximum message count exceeded")]
    NonceOverflow,
}

pub type CryptoResult<T> = Result<T, CryptoError>;
