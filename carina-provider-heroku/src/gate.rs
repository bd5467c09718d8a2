//! Creation gate
//!
//! The platform cannot safely accept concurrent add-on creation requests, so
//! every create (for any app) runs under one gate, held from the create call
//! until the new add-on is provisioned and read back.

use log::debug;
use tokio::sync::{Mutex, MutexGuard};

/// Single-slot gate serializing add-on creation
///
/// One instance is owned by a provider and shared with every clone of it;
/// tests build a fresh gate per case.
#[derive(Debug, Default)]
pub struct CreationGate {
    slot: Mutex<()>,
}

/// Proof of holding the gate; dropping it lets the next creation proceed
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct CreationPermit<'a> {
    app: String,
    _guard: MutexGuard<'a, ()>,
}

impl CreationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the gate without a timeout
    pub async fn acquire(&self, app: &str) -> CreationPermit<'_> {
        debug!("Waiting for addon creation gate (app: {})", app);
        let guard = self.slot.lock().await;
        debug!("Acquired addon creation gate (app: {})", app);
        CreationPermit {
            app: app.to_string(),
            _guard: guard,
        }
    }

    /// True while some creation holds the gate
    pub fn is_held(&self) -> bool {
        self.slot.try_lock().is_err()
    }
}

impl Drop for CreationPermit<'_> {
    fn drop(&mut self) {
        debug!("Released addon creation gate (app: {})", self.app);
    }
}
