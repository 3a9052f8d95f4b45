//! Nonce generation for sealed records
//!
//! Every record sealed under a shared key needs a nonce that has never been
//! used with that key. Each writer owns its own source, so the two directions
//! of a channel never coordinate.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{CryptoError, CryptoResult, NONCE_SIZE};

/// Bytes of the nonce drawn at random once per writer in counter mode
pub const COUNTER_PREFIX_SIZE: usize = 16;

/// How a writer produces its nonces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonceStrategy {
    /// All 24 bytes fresh from the CSPRNG for every record
    Random,
    /// 16 random bytes fixed per writer, then a little-endian counter starting at 1
    #[default]
    Counter,
}

/// Per-writer nonce source
#[derive(Debug)]
pub struct NonceSource<R = OsRng> {
    rng: R,
    state: State,
}

#[derive(Debug)]
enum State {
    Random,
    Counter {
        prefix: [u8; COUNTER_PREFIX_SIZE],
        counter: u64,
    },
}

impl NonceSource<OsRng> {
    /// Create a source backed by the OS random source
    pub fn new(strategy: NonceStrategy) -> CryptoResult<Self> {
        Self::with_rng(strategy, OsRng)
    }
}

impl<R: RngCore + CryptoRng> NonceSource<R> {
    /// Create a source backed by the given CSPRNG
    ///
    /// In counter mode the prefix is drawn here, so a failing random source
    /// is reported at construction.
    pub fn with_rng(strategy: NonceStrategy, mut rng: R) -> CryptoResult<Self> {
        let state = match strategy {
            NonceStrategy::Random => State::Random,
            NonceStrategy::Counter => {
                let mut prefix = [0u8; COUNTER_PREFIX_SIZE];
                rng.try_fill_bytes(&mut prefix)
                    .map_err(CryptoError::RngExhausted)?;
                State::Counter { prefix, counter: 0 }
            }
        };
        Ok(Self { rng, state })
    }

    pub fn strategy(&self) -> NonceStrategy {
        match self.state {
            State::Random => NonceStrategy::Random,
            State::Counter { .. } => NonceStrategy::Counter,
        }
    }

    /// Produce the nonce for the next record
    pub fn next_nonce(&mut self) -> CryptoResult<[u8; NONCE_SIZE]> {
        let mut nonce = [0u8; NONCE_SIZE];

        match &mut self.state {
            State::Random => {
                self.rng
                    .try_fill_bytes(&mut nonce)
                    .map_err(CryptoError::RngExhausted)?;
            }
            State::Counter { prefix, counter } => {
                *counter = counter.checked_add(1).ok_or(CryptoError::NonceOverflow)?;
                nonce[..COUNTER_PREFIX_SIZE].copy_from_slice(prefix);
                nonce[COUNTER_PREFIX_SIZE..].copy_from_slice(&counter.to_le_bytes());
            }
        }

        Ok(nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::FailingRng;
    use std::collections::HashSet;

    #[test]
    fn test_counter_layout() {
        let mut source = NonceSource::new(NonceStrategy::Counter).unwrap();

        let first = source.next_nonce().unwrap();
        let second = source.next_nonce().unwrap();

        // Prefix is fixed for the writer's lifetime
        assert_eq!(
            first[..COUNTER_PREFIX_SIZE],
            second[..COUNTER_PREFIX_SIZE]
        );

        // Counter starts at 1, little-endian
        assert_eq!(first[COUNTER_PREFIX_SIZE..], 1u64.to_le_bytes());
        assert_eq!(second[COUNTER_PREFIX_SIZE..], 2u64.to_le_bytes());
    }

    #[test]
    fn test_counter_prefix_differs_between_writers() {
        let mut a = NonceSource::new(NonceStrategy::Counter).unwrap();
        let mut b = NonceSource::new(NonceStrategy::Counter).unwrap();
        assert_ne!(a.next_nonce().unwrap(), b.next_nonce().unwrap());
    }

    #[test]
    fn test_counter_overflow() {
        let mut source = NonceSource::new(NonceStrategy::Counter).unwrap();
        source.state = match source.state {
            State::Counter { prefix, .. } => State::Counter {
                prefix,
                counter: u64::MAX - 1,
            },
            State::Random => unreachable!(),
        };

        let last = source.next_nonce().unwrap();
        assert_eq!(last[COUNTER_PREFIX_SIZE..], [0xFF; 8]);

        assert!(matches!(
            source.next_nonce(),
            Err(CryptoError::NonceOverflow)
        ));
        // Stays failed rather than wrapping to a used value
        assert!(matches!(
            source.next_nonce(),
            Err(CryptoError::NonceOverflow)
        ));
    }

    #[test]
    fn test_uniqueness() {
        for strategy in [NonceStrategy::Random, NonceStrategy::Counter] {
            let mut source = NonceSource::new(strategy).unwrap();
            let mut seen = HashSet::new();
            for _ in 0..10_000 {
                assert!(seen.insert(source.next_nonce().unwrap()));
            }
            assert_eq!(source.strategy(), strategy);
        }
    }

    #[test]
    fn test_rng_failure() {
        assert!(matches!(
            NonceSource::with_rng(NonceStrategy::Counter, FailingRng),
            Err(CryptoError::RngExhausted(_))
        ));

        let mut source = NonceSource::with_rng(NonceStrategy::Random, FailingRng).unwrap();
        assert!(matches!(
            source.next_nonce(),
            Err(CryptoError::RngExhausted(_))
        ));
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(
            serde_json::to_string(&NonceStrategy::Counter).unwrap(),
            "\"counter\""
        );
        assert_eq!(
            serde_json::from_str::<NonceStrategy>("\"random\"").unwrap(),
            NonceStrategy::Random
        );
    }
}
