//! Wire Protocol - on-the-wire layout of the boxed byte stream
//!
//! After a 32-byte public key exchange in each direction, every message is
//! carried in a record:
//!
//! ```text
//! [24-byte nonce][2-byte big-endian ciphertext length L][L bytes ciphertext ‖ tag]
//! ```

mod error;
mod record;

pub use error::*;
pub use record::*;

/// Public key size exchanged during the handshake (256 bits / 32 bytes)
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Nonce size for XSalsa20-Poly1305 (192 bits / 24 bytes)
pub const NONCE_SIZE: usize = 24;

/// Size of the ciphertext length field
pub const LENGTH_SIZE: usize = 2;

/// Fixed record prelude: nonce followed by the length field
pub const PRELUDE_SIZE: usize = NONCE_SIZE + LENGTH_SIZE;

/// Poly1305 authentication tag size (128 bits / 16 bytes)
pub const TAG_SIZE: usize = 16;

/// Maximum plaintext carried by a single record
pub const MAX_RECORD_PLAINTEXT: usize = 32768;

/// Smallest legal ciphertext length (empty plaintext + tag)
pub const MIN_CIPHERTEXT_LEN: usize = TAG_SIZE;

/// Largest legal ciphertext length
pub const MAX_CIPHERTEXT_LEN: usize = MAX_RECORD_PLAINTEXT + TAG_SIZE;

/// Largest record on the wire, prelude included
pub const MAX_RECORD_SIZE: usize = PRELUDE_SIZE + MAX_CIPHERTEXT_LEN;
