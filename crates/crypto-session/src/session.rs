//! Key exchange and sealing with Curve25519 + XSalsa20-Poly1305

use std::fmt;
use std::sync::Arc;

use crypto_box::aead::{AeadInPlace, Nonce, Tag};
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::{CryptoError, CryptoResult, NONCE_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, TAG_SIZE};

/// Ephemeral key pair, one per session
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new ephemeral key pair from the OS random source
    pub fn generate() -> CryptoResult<Self> {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a key pair from the given CSPRNG
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> CryptoResult<Self> {
        let mut bytes = Zeroizing::new([0u8; SECRET_KEY_SIZE]);
        rng.try_fill_bytes(&mut bytes[..])
            .map_err(CryptoError::RngExhausted)?;

        let secret = SecretKey::from(*bytes);
        let public = secret.public_key();
        Ok(Self { secret, public })
    }

    /// Get the public key bytes
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        *self.public.as_bytes()
    }

    /// Precompute the shared key with the peer's public key
    pub fn shared_key(&self, their_public: &[u8; PUBLIC_KEY_SIZE]) -> SharedKey {
        let their_public = PublicKey::from(*their_public);
        SharedKey {
            cipher: Arc::new(SalsaBox::new(&their_public, &self.secret)),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public_key_bytes())
            .finish_non_exhaustive()
    }
}

/// Precomputed shared secret for one session
///
/// Immutable once derived. Clones share the same precomputed state, so the
/// reader and writer of a channel can each hold one.
#[derive(Clone)]
pub struct SharedKey {
    cipher: Arc<SalsaBox>,
}

impl SharedKey {
    /// Encrypt `buffer` in place and return the detached tag
    pub fn seal_in_place(
        &self,
        nonce: &[u8; NONCE_SIZE],
        buffer: &mut [u8],
    ) -> CryptoResult<[u8; TAG_SIZE]> {
        let tag = self
            .cipher
            .encrypt_in_place_detached(Nonce::<SalsaBox>::from_slice(nonce), b"", buffer)
            .map_err(|_| CryptoError::SealFailed)?;

        let mut out = [0u8; TAG_SIZE];
        out.copy_from_slice(&tag);
        Ok(out)
    }

    /// Verify `tag` and decrypt `buffer` in place
    ///
    /// On failure `buffer` is left untouched and must be discarded.
    pub fn open_in_place(
        &self,
        nonce: &[u8; NONCE_SIZE],
        buffer: &mut [u8],
        tag: &[u8; TAG_SIZE],
    ) -> CryptoResult<()> {
        self.cipher
            .decrypt_in_place_detached(
                Nonce::<SalsaBox>::from_slice(nonce),
                b"",
                buffer,
                Tag::<SalsaBox>::from_slice(tag),
            )
            .map_err(|_| CryptoError::DecryptFailed)
    }

    /// Encrypt with authentication
    ///
    /// Returns: [ciphertext][16-byte auth tag]
    pub fn seal(&self, nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut out = Vec::with_capacity(plaintext.len() + TAG_SIZE);
        out.extend_from_slice(plaintext);
        let tag = self.seal_in_place(nonce, &mut out)?;
        out.extend_from_slice(&tag);
        Ok(out)
    }

    /// Decrypt and verify [ciphertext][16-byte auth tag]
    pub fn open(&self, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        if ciphertext.len() < TAG_SIZE {
            return Err(CryptoError::DecryptFailed);
        }

        let (body, tag_bytes) = ciphertext.split_at(ciphertext.len() - TAG_SIZE);
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(tag_bytes);

        let mut out = body.to_vec();
        self.open_in_place(nonce, &mut out, &tag)?;
        Ok(out)
    }
}

impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedKey(..)")
    }
}

/// One side of the public key exchange
pub struct KeyExchange {
    our_keypair: KeyPair,
}

impl KeyExchange {
    /// Start a new exchange with a fresh ephemeral key pair
    pub fn new() -> CryptoResult<Self> {
        Ok(Self::with_keypair(KeyPair::generate()?))
    }

    pub fn with_keypair(our_keypair: KeyPair) -> Self {
        Self { our_keypair }
    }

    /// Get our public key to send to the peer
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.our_keypair.public_key_bytes()
    }

    /// Complete the exchange with the peer's public key
    pub fn complete(self, their_public: &[u8; PUBLIC_KEY_SIZE]) -> SharedKey {
        tracing::trace!("precomputing shared key");
        self.our_keypair.shared_key(their_public)
    }
}
