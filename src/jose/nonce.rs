//! Anti-replay nonce tracking: a single mutable slot, not a prefetch pool.
//!
//! RFC 8555 §6.5 only requires the client to hold the freshest
//! `Replay-Nonce` it has seen; keeping more than one invites sending a
//! stale one under concurrency. `NoncePool` holds at most one.

use tokio::sync::Mutex;

#[derive(Default)]
pub struct NoncePool {
    slot: Mutex<Option<String>>,
}

impl NoncePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the current nonce, leaving the slot empty. `None` means the
    /// caller must fetch a fresh one from the directory's `newNonce`
    /// endpoint before signing.
    pub async fn take(&self) -> Option<String> {
        self.slot.lock().await.take()
    }

    /// Installs the nonce from a response's `Replay-Nonce` header,
    /// replacing whatever was there. Every response carries one; this is
    /// the only way the slot is refilled after being taken.
    pub async fn replace(&self, nonce: String) {
        *self.slot.lock().await = Some(nonce);
    }
}
