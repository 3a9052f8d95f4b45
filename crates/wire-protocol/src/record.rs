//! Record prelude encoding and validation

use crate::{
    ProtocolError, ProtocolResult, LENGTH_SIZE, MAX_CIPHERTEXT_LEN, MAX_RECORD_PLAINTEXT,
    MIN_CIPHERTEXT_LEN, NONCE_SIZE, PRELUDE_SIZE, TAG_SIZE,
};

/// Fixed-size header written in front of every sealed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Nonce the ciphertext was sealed under, written as-is
    pub nonce: [u8; NONCE_SIZE],
    /// Length of the ciphertext including its trailing tag
    pub ciphertext_len: u16,
}

impl RecordHeader {
    /// Build the header for a record carrying `plaintext_len` bytes
    pub fn for_plaintext(nonce: [u8; NONCE_SIZE], plaintext_len: usize) -> ProtocolResult<Self> {
        if plaintext_len > MAX_RECORD_PLAINTEXT {
            return Err(ProtocolError::MessageTooLong {
                size: plaintext_len,
                max: MAX_RECORD_PLAINTEXT,
            });
        }

        // MAX_CIPHERTEXT_LEN fits in a u16
        let ciphertext_len = (plaintext_len + TAG_SIZE) as u16;
        Ok(Self {
            nonce,
            ciphertext_len,
        })
    }

    /// Parse and validate a prelude read off the wire
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        if bytes.len() < PRELUDE_SIZE {
            return Err(ProtocolError::TruncatedPrelude {
                expected: PRELUDE_SIZE,
                actual: bytes.len(),
            });
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[..NONCE_SIZE]);

        let mut length = [0u8; LENGTH_SIZE];
        length.copy_from_slice(&bytes[NONCE_SIZE..PRELUDE_SIZE]);
        let ciphertext_len = u16::from_be_bytes(length);
        validate_ciphertext_len(ciphertext_len as usize)?;

        Ok(Self {
            nonce,
            ciphertext_len,
        })
    }

    /// Serialize into a fresh prelude
    pub fn encode(&self) -> [u8; PRELUDE_SIZE] {
        let mut out = [0u8; PRELUDE_SIZE];
        self.encode_into(&mut out);
        out
    }

    /// Serialize into the first `PRELUDE_SIZE` bytes of `dst`
    ///
    /// Panics if `dst` is shorter than `PRELUDE_SIZE`.
    pub fn encode_into(&self, dst: &mut [u8]) {
        dst[..NONCE_SIZE].copy_from_slice(&self.nonce);
        dst[NONCE_SIZE..PRELUDE_SIZE].copy_from_slice(&self.ciphertext_len.to_be_bytes());
    }

    pub fn ciphertext_len(&self) -> usize {
        self.ciphertext_len as usize
    }

    /// Plaintext bytes the record opens to
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext_len().saturating_sub(TAG_SIZE)
    }

    /// Total record size on the wire
    pub fn record_len(&self) -> usize {
        PRELUDE_SIZE + self.ciphertext_len()
    }
}

/// Check a ciphertext length against the legal record bounds
pub fn validate_ciphertext_len(length: usize) -> ProtocolResult<usize> {
    if !(MIN_CIPHERTEXT_LEN..=MAX_CIPHERTEXT_LEN).contains(&length) {
        return Err(ProtocolError::InvalidLength {
            length,
            min: MIN_CIPHERTEXT_LEN,
            max: MAX_CIPHERTEXT_LEN,
        });
    }
    Ok(length)
}
