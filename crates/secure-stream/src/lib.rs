//! Secure Stream - authenticated-encryption byte streams over TCP
//!
//! Runs an anonymous Curve25519 key exchange on any reliable duplex stream,
//! then carries arbitrary byte streams as sealed XSalsa20-Poly1305 records.
//! The handshake does not authenticate the peer.

mod config;
mod error;
mod handshake;
mod net;
mod reader;
mod stream;
mod writer;

pub mod echo;

#[cfg(test)]
mod mocks;

pub use config::*;
pub use error::*;
pub use handshake::*;
pub use net::*;
pub use reader::*;
pub use stream::*;
pub use writer::*;

pub use crypto_session::{NonceStrategy, SharedKey};
pub use wire_protocol::{MAX_RECORD_PLAINTEXT, MAX_RECORD_SIZE};
