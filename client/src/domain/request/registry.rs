//! Registry of in-flight requests addressable by caller-supplied id.
//!
//! At most one live entry exists per id. Registering under an id that is in
//! use cancels the previous holder first, so the older call settles as
//! cancelled (last writer wins).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
struct Entry {
    token: CancellationToken,
    generation: u64,
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: HashMap<String, Entry>,
    next_generation: u64,
}

/// Map from request id to the cancellation handle of its in-flight call.
///
/// One instance is owned per executor and shared through `Arc`; there is no
/// process-wide singleton.
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    state: Mutex<RegistryState>,
}

impl CancellationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a call under `request_id`, cancelling any previous holder.
    ///
    /// The returned guard removes the entry when dropped, unless a newer call
    /// has already replaced it.
    pub fn register(self: &Arc<Self>, request_id: &str) -> RegistrationGuard {
        let token = CancellationToken::new();
        let generation = {
            let mut state = self.lock();
            state.next_generation = state.next_generation.wrapping_add(1);
            let generation = state.next_generation;
            let previous = state.entries.insert(
                request_id.to_owned(),
                Entry {
                    token: token.clone(),
                    generation,
                },
            );
            if let Some(previous) = previous {
                debug!(request_id, "superseding in-flight request");
                previous.token.cancel();
            }
            generation
        };

        RegistrationGuard {
            registry: Arc::clone(self),
            request_id: request_id.to_owned(),
            generation,
            token,
        }
    }

    /// Cancel and evict the call registered under `request_id`.
    ///
    /// Returns `false` when nothing is registered under that id.
    pub fn cancel(&self, request_id: &str) -> bool {
        let removed = self.lock().entries.remove(request_id);
        match removed {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel and evict every registered call; returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<Entry> = self.lock().entries.drain().map(|(_, entry)| entry).collect();
        for entry in &drained {
            entry.token.cancel();
        }
        drained.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a call is registered under `request_id`.
    pub fn contains(&self, request_id: &str) -> bool {
        self.lock().entries.contains_key(request_id)
    }

    fn release(&self, request_id: &str, generation: u64) {
        let mut state = self.lock();
        let owned = state
            .entries
            .get(request_id)
            .is_some_and(|entry| entry.generation == generation);
        if owned {
            state.entries.remove(request_id);
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // Entries stay consistent even if a holder panicked mid-operation:
        // every mutation is a single map call.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Registration of one in-flight call; evicts its entry on drop.
#[derive(Debug)]
pub struct RegistrationGuard {
    registry: Arc<CancellationRegistry>,
    request_id: String,
    generation: u64,
    token: CancellationToken,
}

impl RegistrationGuard {
    /// Token cancelled when the call is cancelled or superseded.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Id the call is registered under.
    pub fn request_id(&self) -> &str {
        self.request_id.as_str()
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.registry.release(&self.request_id, self.generation);
    }
}
