//! Optimistic mutations over a live collection.
//!
//! A mutation snapshots the entries it may touch, applies the local change so
//! readers see it immediately, then awaits the server. Success merges the
//! server's authoritative fields over the optimistic values; failure restores
//! the snapshot and surfaces the error. Nothing is retried here.
//!
//! Two mutations over overlapping scopes are not serialized: if the first
//! fails after the second applied, its rollback restores the state the first
//! captured and overwrites the second's optimistic change.

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::HttpError;

mod chain;
mod collection;
mod reconcile;
mod snapshot;

pub use chain::{ChainReport, ChainStep, SkippedStep, run_chain};
pub use collection::LiveCollection;
pub use reconcile::{FieldOverlay, Reconcile};
pub use snapshot::{MutationScope, MutationSnapshot, ScopedEdit};

/// Applies optimistic mutations to one collection.
#[derive(Debug)]
pub struct OptimisticCoordinator<K, V> {
    collection: LiveCollection<K, V>,
}

impl<K, V> Clone for OptimisticCoordinator<K, V> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
        }
    }
}

impl<K, V> OptimisticCoordinator<K, V>
where
    K: Ord + Clone + std::fmt::Debug,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Coordinator mutating `collection`; clones share the same items.
    pub fn new(collection: LiveCollection<K, V>) -> Self {
        Self { collection }
    }

    /// Collection this coordinator mutates.
    pub fn collection(&self) -> &LiveCollection<K, V> {
        &self.collection
    }

    /// Apply `local_update` to the scoped items, await `server_call`, then
    /// reconcile or roll back.
    ///
    /// The local update is visible to every collection handle before the
    /// server call is first polled. On failure the collection is left
    /// deep-equal to its state before the update, for the scoped keys.
    ///
    /// ```rust,ignore
    /// let update = coordinator
    ///     .apply_optimistic(
    ///         &MutationScope::single(poi_id),
    ///         |edit| {
    ///             if let Some(poi) = edit.get_mut(&poi_id) {
    ///                 poi.scheduled_day = Some(day);
    ///             }
    ///         },
    ///         commands.schedule_poi(trip, poi_id, day),
    ///     )
    ///     .await?;
    /// ```
    pub async fn apply_optimistic<R, Fut>(
        &self,
        scope: &MutationScope<K>,
        local_update: impl FnOnce(&mut ScopedEdit<'_, K, V>),
        server_call: Fut,
    ) -> Result<R, HttpError>
    where
        R: Reconcile<K>,
        Fut: Future<Output = Result<R, HttpError>>,
    {
        let snapshot = self.collection.with_items(|items| {
            let snapshot = MutationSnapshot::capture(items, scope);
            local_update(&mut ScopedEdit::new(items, scope));
            snapshot
        });
        debug!(keys = scope.len(), "optimistic update applied");

        match server_call.await {
            Ok(response) => {
                self.reconcile(&response);
                Ok(response)
            }
            Err(error) => {
                snapshot.restore(&self.collection);
                if error.is_cancelled() {
                    debug!(keys = scope.len(), "mutation cancelled; local update rolled back");
                } else {
                    warn!(keys = scope.len(), %error, "mutation failed; local update rolled back");
                }
                Err(error)
            }
        }
    }

    /// Merge the response's authoritative fields into the collection.
    ///
    /// Keys the collection no longer holds are ignored. A field that cannot be
    /// decoded into the item type leaves that item's optimistic value in place.
    pub fn reconcile(&self, response: &impl Reconcile<K>) {
        let overlays = response.authoritative_fields();
        if overlays.is_empty() {
            return;
        }
        self.collection.with_items(|items| {
            for (key, fields) in overlays {
                let Some(current) = items.get_mut(&key) else {
                    debug!(?key, "server reported an item not held locally");
                    continue;
                };
                match reconcile::merge_fields(current, &fields) {
                    Ok(merged) => *current = merged,
                    Err(error) => warn!(?key, %error, "server fields could not be merged"),
                }
            }
        });
    }
}
