//! Session nonce generation

/// Source of session nonces
///
/// A fresh nonce is drawn every time a registry slot starts a new session
/// incarnation. Handles carry the nonce, so a slot that is reused for a
/// later incarnation rejects handles issued for an earlier one.
pub trait NonceEffects: Send + Sync {
    /// Draw a random 64-bit nonce
    fn session_nonce(&self) -> u64;
}

impl<T: NonceEffects + ?Sized> NonceEffects for std::sync::Arc<T> {
    fn session_nonce(&self) -> u64 {
        (**self).session_nonce()
    }
}
