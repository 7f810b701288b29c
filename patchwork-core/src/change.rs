//! Change propagation after each commit.
//!
//! [`ChangeTracker`] answers "did this id change in the last commit" and "did
//! anything below it change" for renderers. [`ChangeListeners`] pushes the
//! same information to registered collaborators.

use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;

use patchwork_types::EntityId;

use crate::patch::Patch;

// ============================================================================
// Tracker
// ============================================================================

/// Ids touched by the most recent commit, plus all their ancestors.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    changed: BTreeSet<EntityId>,
    changed_ancestors: BTreeSet<EntityId>,
    update_times: BTreeMap<EntityId, SystemTime>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tracked sets with the ids of `patch`.
    ///
    /// Ancestors come from the paths the patch recorded, so ids that were
    /// removed still mark their parents.
    pub fn record(&mut self, patch: &Patch, at: SystemTime) {
        self.changed.clear();
        self.changed_ancestors.clear();
        for id in patch.ids() {
            self.changed.insert(id);
            self.update_times.insert(id, at);
            if let Some(path) = patch.path_of(id) {
                for ancestor in path.ancestors() {
                    self.changed_ancestors.insert(ancestor.id());
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.changed.clear();
        self.changed_ancestors.clear();
    }

    pub fn is_changed(&self, id: EntityId) -> bool {
        self.changed.contains(&id)
    }

    pub fn has_changed_descendant(&self, id: EntityId) -> bool {
        self.changed_ancestors.contains(&id)
    }

    pub fn changed_ids(&self) -> &BTreeSet<EntityId> {
        &self.changed
    }

    pub fn changed_ancestor_ids(&self) -> &BTreeSet<EntityId> {
        &self.changed_ancestors
    }

    /// When `id` last changed in any commit, undo and redo included.
    pub fn latest_update_time(&self, id: EntityId) -> Option<SystemTime> {
        self.update_times.get(&id).copied()
    }

    fn affected(&self, id: EntityId) -> bool {
        self.is_changed(id) || self.has_changed_descendant(id)
    }
}

// ============================================================================
// Listeners
// ============================================================================

/// Receives the watched ids affected by a commit.
pub trait ChangeListener: Send {
    fn on_change(&mut self, ids: &[EntityId]);
}

impl<F: FnMut(&[EntityId]) + Send> ChangeListener for F {
    fn on_change(&mut self, ids: &[EntityId]) {
        self(ids)
    }
}

/// Registration token returned by [`ChangeListeners::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerHandle(u64);

struct Registration {
    listener: Box<dyn ChangeListener>,
    watched: BTreeSet<EntityId>,
}

/// Per-engine listener registry.
#[derive(Default)]
pub struct ChangeListeners {
    next_handle: u64,
    registrations: BTreeMap<ListenerHandle, Registration>,
}

impl std::fmt::Debug for ChangeListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeListeners")
            .field("count", &self.registrations.len())
            .finish()
    }
}

impl ChangeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn ChangeListener>) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle);
        self.next_handle += 1;
        self.registrations.insert(
            handle,
            Registration {
                listener,
                watched: BTreeSet::new(),
            },
        );
        handle
    }

    /// Returns false for an unknown handle.
    pub fn watch(&mut self, handle: ListenerHandle, id: EntityId) -> bool {
        match self.registrations.get_mut(&handle) {
            Some(registration) => {
                registration.watched.insert(id);
                true
            }
            None => false,
        }
    }

    pub fn unwatch(&mut self, handle: ListenerHandle, id: EntityId) -> bool {
        self.registrations
            .get_mut(&handle)
            .map_or(false, |r| r.watched.remove(&id))
    }

    /// Drop the listener and every id it watched.
    pub fn unregister(&mut self, handle: ListenerHandle) -> bool {
        self.registrations.remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Call each listener once with the watched ids `tracker` marks as
    /// changed or as having a changed descendant.
    pub fn notify(&mut self, tracker: &ChangeTracker) {
        for registration in self.registrations.values_mut() {
            let ids: Vec<EntityId> = registration
                .watched
                .iter()
                .copied()
                .filter(|id| tracker.affected(*id))
                .collect();
            if !ids.is_empty() {
                registration.listener.on_change(&ids);
            }
        }
    }
}
