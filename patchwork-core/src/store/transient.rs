use patchwork_types::{EntityId, Primitive, StorePath};

use super::{Store, StoreKind, StoreRead, Tries};

/// Mutable staging view over a [`Store`].
///
/// Built from a snapshot in O(1). Nodes shared with that snapshot are copied
/// on first write; nodes created during this batch are edited in place.
/// [`TransientStore::persistent`] freezes the current state without ending
/// the batch, so a frozen snapshot never observes later edits.
#[derive(Debug, Clone, Default)]
pub struct TransientStore {
    tries: Tries,
}

impl StoreRead for TransientStore {
    fn tries(&self) -> &Tries {
        &self.tries
    }
}

impl From<&Store> for TransientStore {
    fn from(store: &Store) -> Self {
        Self {
            tries: store.clone().into_tries(),
        }
    }
}

impl From<Store> for TransientStore {
    fn from(store: Store) -> Self {
        Self {
            tries: store.into_tries(),
        }
    }
}

impl TransientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: StoreKind>(&mut self, path: &StorePath, value: T) {
        self.tries.set(path, value);
    }

    pub fn set_primitive(&mut self, path: &StorePath, value: Primitive) {
        self.tries.set_primitive(path, value);
    }

    /// Remove the `T` at `id`. Returns false if nothing was stored there.
    pub fn erase<T: StoreKind>(&mut self, id: EntityId) -> bool {
        self.tries.erase::<T>(id)
    }

    /// Remove whatever is stored at `id`, regardless of kind.
    pub fn erase_path(&mut self, id: EntityId) -> bool {
        self.tries.erase_any(id)
    }

    /// Reset the value at `path` to `T::default()`.
    pub fn clear<T: StoreKind>(&mut self, path: &StorePath) {
        self.tries.set(path, T::default());
    }

    pub fn get_mut<T: StoreKind>(&mut self, id: EntityId) -> Option<&mut T> {
        self.tries.get_mut::<T>(id)
    }

    /// Freeze the staged state into a new snapshot.
    pub fn persistent(&self) -> Store {
        Store::from_tries(self.tries.clone())
    }

    pub fn into_persistent(self) -> Store {
        Store::from_tries(self.tries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frozen_snapshot_never_changes() {
        let path = StorePath::new("/count");
        let mut transient = TransientStore::new();
        transient.set(&path, 1i32);
        let frozen = transient.persistent();
        transient.set(&path, 2i32);
        if let Some(v) = transient.get_mut::<i32>(path.id()) {
            *v += 1;
        }
        assert_eq!(*frozen.get::<i32>(path.id()), 1);
        assert_eq!(*transient.get::<i32>(path.id()), 3);
    }

    #[test]
    fn edits_do_not_leak_into_source_store() {
        let path = StorePath::new("/name");
        let store = Store::new().with_set(&path, "a".to_string());
        let mut transient = TransientStore::from(&store);
        transient.set(&path, "b".to_string());
        assert_eq!(store.get::<String>(path.id()), "a");
        assert_eq!(transient.into_persistent().get::<String>(path.id()), "b");
    }

    #[test]
    fn clear_and_erase_path() {
        let list = StorePath::new("/list");
        let flag = StorePath::new("/flag");
        let mut transient = TransientStore::new();
        transient.set(&list, vec![patchwork_types::Primitive::Int(1)]);
        transient.set(&flag, true);
        transient.clear::<Vec<Primitive>>(&list);
        assert!(transient.get::<Vec<Primitive>>(list.id()).is_empty());
        assert!(transient.erase_path(flag.id()));
        assert!(!transient.erase_path(flag.id()));
        assert!(!transient.contains(flag.id()));
    }

    #[test]
    fn untouched_store_freezes_to_shared_roots() {
        let store = Store::new().with_set(&StorePath::new("/a"), 1u32);
        let transient = TransientStore::from(&store);
        assert!(transient.persistent().ptr_eq(&store));
    }
}
