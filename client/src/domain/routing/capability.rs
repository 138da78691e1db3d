//! Memoized provider availability.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::domain::HttpError;

/// Stable identifier of an external provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderName(&'static str);

impl ProviderName {
    /// Vector-tile maps provider; the primary routing provider.
    pub const MAPS_VECTOR: Self = Self("maps-vector-provider");
    /// Open routing service; the secondary routing provider.
    pub const OPEN_ROUTING_SERVICE: Self = Self("open-routing-service");
    /// Places search provider.
    pub const PLACES: Self = Self("places-provider");

    /// Name a provider not covered by the built-in constants.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Provider name as a string slice.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Availability of one provider as last determined by its probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderCapability {
    /// Not probed yet.
    #[default]
    Unknown,
    /// Probe succeeded; the provider may be called.
    Available,
    /// Probe failed or reported the provider as unusable.
    Unavailable,
}

impl ProviderCapability {
    /// Whether calls to the provider should be attempted.
    pub fn is_available(self) -> bool {
        self == Self::Available
    }
}

/// Per-process availability cache, injected into whoever needs it.
///
/// The first resolution of a provider runs its probe and memoizes the result
/// for the lifetime of the cache; there is no expiry. Two callers resolving
/// the same unknown provider concurrently may both probe; the last answer
/// wins, which is harmless because probes are idempotent.
#[derive(Debug, Default)]
pub struct ProviderCapabilityCache {
    entries: Mutex<HashMap<ProviderName, ProviderCapability>>,
}

impl ProviderCapabilityCache {
    /// Empty cache; every provider starts as [`ProviderCapability::Unknown`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached capability without probing.
    pub fn get(&self, name: ProviderName) -> ProviderCapability {
        self.lock().get(&name).copied().unwrap_or_default()
    }

    /// Record a capability determined elsewhere.
    pub fn record(&self, name: ProviderName, available: bool) -> ProviderCapability {
        let capability = if available {
            ProviderCapability::Available
        } else {
            ProviderCapability::Unavailable
        };
        self.lock().insert(name, capability);
        capability
    }

    /// Return the cached capability, running `probe` first if the provider
    /// is still unknown. Probe errors resolve to `Unavailable`.
    pub async fn resolve_with<F, Fut>(&self, name: ProviderName, probe: F) -> ProviderCapability
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<bool, HttpError>>,
    {
        let cached = self.get(name);
        if cached != ProviderCapability::Unknown {
            return cached;
        }

        let available = match probe().await {
            Ok(available) => available,
            Err(error) => {
                warn!(provider = %name, %error, "provider probe failed");
                false
            }
        };
        let capability = self.record(name, available);
        debug!(provider = %name, ?capability, "provider capability resolved");
        capability
    }

    /// Resolved entries ordered by provider name.
    pub fn snapshot(&self) -> Vec<(ProviderName, ProviderCapability)> {
        let mut entries: Vec<_> = self
            .lock()
            .iter()
            .map(|(name, capability)| (*name, *capability))
            .collect();
        entries.sort_by_key(|(name, _)| *name);
        entries
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProviderName, ProviderCapability>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn probe_runs_once_and_is_memoized() {
        let cache = ProviderCapabilityCache::new();
        let probes = AtomicUsize::new(0);

        for _ in 0..3 {
            let capability = cache
                .resolve_with(ProviderName::OPEN_ROUTING_SERVICE, || async {
                    probes.fetch_add(1, Ordering::SeqCst);
                    Ok(true)
                })
                .await;
            assert_eq!(capability, ProviderCapability::Available);
        }
        assert_eq!(probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn probe_error_resolves_to_unavailable() {
        let cache = ProviderCapabilityCache::new();
        let capability = cache
            .resolve_with(ProviderName::PLACES, || async {
                Err(HttpError::network("dns failure"))
            })
            .await;

        assert_eq!(capability, ProviderCapability::Unavailable);
        assert_eq!(cache.get(ProviderName::PLACES), ProviderCapability::Unavailable);
    }

    #[test]
    fn unknown_until_resolved_and_snapshot_is_sorted() {
        let cache = ProviderCapabilityCache::new();
        assert_eq!(cache.get(ProviderName::MAPS_VECTOR), ProviderCapability::Unknown);

        cache.record(ProviderName::PLACES, false);
        cache.record(ProviderName::MAPS_VECTOR, true);
        assert_eq!(
            cache.snapshot(),
            vec![
                (ProviderName::MAPS_VECTOR, ProviderCapability::Available),
                (ProviderName::PLACES, ProviderCapability::Unavailable),
            ]
        );
    }
}
