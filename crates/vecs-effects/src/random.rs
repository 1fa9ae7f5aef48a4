//! Session nonce handler
//!
//! Nonces only need to be unpredictable and distinct between incarnations
//! of a slot, which the thread-local CSPRNG provides.

use rand::Rng;
use vecs_core::NonceEffects;

/// Session nonces drawn from `rand::thread_rng()`
#[derive(Debug, Clone, Default)]
pub struct RealNonceHandler;

impl RealNonceHandler {
    /// Create a new handler
    pub fn new() -> Self {
        Self
    }
}

impl NonceEffects for RealNonceHandler {
    fn session_nonce(&self) -> u64 {
        rand::thread_rng().gen()
    }
}
