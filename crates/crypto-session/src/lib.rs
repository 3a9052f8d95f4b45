//! Crypto Session - NaCl box primitives for the secure stream
//!
//! Provides Curve25519 key exchange with XSalsa20-Poly1305 authenticated
//! encryption, plus the per-writer nonce discipline.

mod error;
mod nonce;
mod session;

#[cfg(test)]
mod mocks;

pub use error::*;
pub use nonce::*;
pub use session::*;

pub use wire_protocol::{NONCE_SIZE, PUBLIC_KEY_SIZE, TAG_SIZE};

/// Secret key size (256 bits / 32 bytes)
pub const SECRET_KEY_SIZE: usize = 32;
