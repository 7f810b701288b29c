//! Store-action dispatch.
//!
//! `can_apply_store` is the guard, `apply_store_action` the mutation. The
//! engine always asks the guard first, against the same transient it is
//! about to mutate, so `apply_store_action` may assume the action fits.

mod container;
mod primitive;

use patchwork_types::{PrimitiveKind, StoreAction, StorePath};

use crate::store::{StoreRead, TransientStore};

/// Whether `action` would do something sensible against `store`.
///
/// Writes to a path holding another kind, out-of-range indices, stepping a
/// navigable past its ends and other no-ops are rejected.
pub fn can_apply_store(action: &StoreAction, store: &impl StoreRead) -> bool {
    let ok = match action {
        StoreAction::Primitive(a) => primitive::can_apply_primitive(a, store),
        StoreAction::Sequence(a) => container::can_apply_sequence(a, store),
        StoreAction::Set(a) => container::can_apply_set(a, store),
        StoreAction::Navigable(a) => container::can_apply_navigable(a, store),
        StoreAction::AdjacencyList(a) => container::can_apply_adjacency(a, store),
        StoreAction::ChildList(a) => container::can_apply_child_list(a, store),
        StoreAction::Erase { path } => store.contains(path.id()),
    };
    if !ok {
        log::debug!(target: "dispatch", "rejected {:?}", action);
    }
    ok
}

/// Mutate `store` per `action`. Containers that do not exist yet are
/// declared on first write.
pub fn apply_store_action(action: &StoreAction, store: &mut TransientStore) {
    match action {
        StoreAction::Primitive(a) => primitive::dispatch_primitive(a, store),
        StoreAction::Sequence(a) => container::dispatch_sequence(a, store),
        StoreAction::Set(a) => container::dispatch_set(a, store),
        StoreAction::Navigable(a) => container::dispatch_navigable(a, store),
        StoreAction::AdjacencyList(a) => container::dispatch_adjacency(a, store),
        StoreAction::ChildList(a) => container::dispatch_child_list(a, store),
        StoreAction::Erase { path } => {
            store.erase_path(path.id());
        }
    }
}

/// `path` is free or already holds `kind`.
fn accepts(store: &impl StoreRead, path: &StorePath, kind: PrimitiveKind) -> bool {
    store.kind_of(path.id()).map_or(true, |found| found == kind)
}

/// `path` exists and holds `kind`.
fn holds(store: &impl StoreRead, path: &StorePath, kind: PrimitiveKind) -> bool {
    store.kind_of(path.id()) == Some(kind)
}
