//! Deterministic session nonce sources

use parking_lot::Mutex;
use rand::RngCore;
use rand_chacha::{rand_core::SeedableRng, ChaCha20Rng};
use vecs_core::NonceEffects;

/// Nonces from a seeded ChaCha20 stream; the same seed replays the same run
#[derive(Debug)]
pub struct MockNonceHandler {
    rng: Mutex<ChaCha20Rng>,
}

impl MockNonceHandler {
    /// Handler with the default seed
    pub fn new() -> Self {
        Self::with_seed(42)
    }

    /// Handler with a specific seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha20Rng::seed_from_u64(seed)),
        }
    }
}

impl Default for MockNonceHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceEffects for MockNonceHandler {
    fn session_nonce(&self) -> u64 {
        self.rng.lock().next_u64()
    }
}

/// Returns the same nonce forever
#[derive(Debug, Clone, Copy)]
pub struct FixedNonceHandler(pub u64);

impl NonceEffects for FixedNonceHandler {
    fn session_nonce(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_nonces() {
        let a = MockNonceHandler::with_seed(7);
        let b = MockNonceHandler::with_seed(7);
        let left: Vec<u64> = (0..4).map(|_| a.session_nonce()).collect();
        let right: Vec<u64> = (0..4).map(|_| b.session_nonce()).collect();
        assert_eq!(left, right);
        assert_ne!(left[0], left[1]);
    }
}
