//! Persistent and transient stores.
//!
//! A [`Store`] is an immutable snapshot: one structurally-shared trie per
//! primitive kind plus a path index. `with_*` methods return a new store and
//! leave `self` untouched. A [`TransientStore`] is the mutable staging view the
//! engine edits during one drain; freezing it back is O(1).

mod kind;
mod transient;
pub mod trie;

use patchwork_types::{EntityId, Primitive, PrimitiveKind, StorePath};

pub(crate) use kind::for_kind;
pub use kind::{PathEntry, ScalarKind, StoreKind, Tries};
pub use transient::TransientStore;

/// Read access shared by [`Store`] and [`TransientStore`], so container
/// handles and guards can run against either.
pub trait StoreRead {
    #[doc(hidden)]
    fn tries(&self) -> &Tries;

    fn try_get<T: StoreKind>(&self, id: EntityId) -> Option<&T> {
        self.tries().typed::<T>(id)
    }

    /// Value at `id`. Reading a path that was never declared is a logic error.
    fn get<T: StoreKind>(&self, id: EntityId) -> &T {
        match self.try_get::<T>(id) {
            Some(value) => value,
            None => panic!(
                "no {} stored at {} ({})",
                T::KIND,
                id,
                self.path_of(id)
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "undeclared path".to_string())
            ),
        }
    }

    /// 1 if a `T` is stored at `id`, else 0.
    fn count<T: StoreKind>(&self, id: EntityId) -> usize {
        usize::from(self.try_get::<T>(id).is_some())
    }

    fn contains(&self, id: EntityId) -> bool {
        self.tries().index.contains_key(id.get())
    }

    fn kind_of(&self, id: EntityId) -> Option<PrimitiveKind> {
        self.tries().entry(id).map(|e| e.kind)
    }

    fn path_of(&self, id: EntityId) -> Option<&StorePath> {
        self.tries().entry(id).map(|e| &e.path)
    }

    fn get_primitive(&self, id: EntityId) -> Option<Primitive> {
        self.tries().primitive(id)
    }
}

impl Tries {
    pub(crate) fn entry(&self, id: EntityId) -> Option<&PathEntry> {
        self.index.get(id.get())
    }

    pub(crate) fn typed<T: StoreKind>(&self, id: EntityId) -> Option<&T> {
        T::trie(self).get(id.get())
    }

    pub(crate) fn primitive(&self, id: EntityId) -> Option<Primitive> {
        let kind = self.entry(id)?.kind;
        for_kind!(kind, T => self.typed::<T>(id).cloned().map(<T as StoreKind>::into_primitive))
    }

    /// Register `path` under `kind`, panicking if it already holds another
    /// kind or its id is taken by a different path.
    fn declare(&mut self, path: &StorePath, kind: PrimitiveKind) {
        let id = path.id();
        match self.index.get(id.get()) {
            Some(entry) => {
                if entry.path != *path {
                    panic!(
                        "entity id {} collides: {} and {}",
                        id, entry.path, path
                    );
                }
                if entry.kind != kind {
                    panic!(
                        "{} holds a {} and cannot be written as {}",
                        path, entry.kind, kind
                    );
                }
            }
            None => {
                self.index.insert(
                    id.get(),
                    PathEntry {
                        path: path.clone(),
                        kind,
                    },
                );
            }
        }
    }

    pub(crate) fn set<T: StoreKind>(&mut self, path: &StorePath, value: T) {
        self.declare(path, T::KIND);
        T::trie_mut(self).insert(path.id().get(), value);
    }

    pub(crate) fn set_primitive(&mut self, path: &StorePath, value: Primitive) {
        for_kind!(value.kind(), T => {
            if let Some(typed) = T::from_primitive(value) {
                self.set::<T>(path, typed);
            }
        })
    }

    pub(crate) fn get_mut<T: StoreKind>(&mut self, id: EntityId) -> Option<&mut T> {
        T::trie_mut(self).get_mut(id.get())
    }

    pub(crate) fn erase<T: StoreKind>(&mut self, id: EntityId) -> bool {
        let kind = match self.entry(id) {
            Some(entry) => entry.kind,
            None => return false,
        };
        if kind != T::KIND {
            panic!("{} holds a {}, not a {}", id, kind, T::KIND);
        }
        T::trie_mut(self).remove(id.get());
        self.index.remove(id.get());
        true
    }

    pub(crate) fn erase_any(&mut self, id: EntityId) -> bool {
        match self.entry(id).map(|e| e.kind) {
            Some(kind) => for_kind!(kind, T => self.erase::<T>(id)),
            None => false,
        }
    }

    fn content_eq(&self, other: &Tries) -> bool {
        PrimitiveKind::ALL.iter().all(|&kind| {
            for_kind!(kind, T => T::trie(self).content_eq(T::trie(other), T::value_eq))
        })
    }
}

/// Immutable, structurally-shared snapshot of all application state.
#[derive(Debug, Clone, Default)]
pub struct Store {
    tries: Tries,
}

impl StoreRead for Store {
    fn tries(&self) -> &Tries {
        &self.tries
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_tries(tries: Tries) -> Self {
        Self { tries }
    }

    pub(crate) fn into_tries(self) -> Tries {
        self.tries
    }

    /// New store differing from `self` only at `path`.
    pub fn with_set<T: StoreKind>(&self, path: &StorePath, value: T) -> Store {
        let mut tries = self.tries.clone();
        tries.set(path, value);
        Store { tries }
    }

    pub fn with_primitive(&self, path: &StorePath, value: Primitive) -> Store {
        let mut tries = self.tries.clone();
        tries.set_primitive(path, value);
        Store { tries }
    }

    pub fn with_erase<T: StoreKind>(&self, id: EntityId) -> Store {
        let mut tries = self.tries.clone();
        tries.erase::<T>(id);
        Store { tries }
    }

    /// Number of stored paths across all kinds.
    pub fn len(&self) -> usize {
        self.tries.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tries.index.is_empty()
    }

    /// Every stored path with its id and kind, in ascending id order.
    pub fn paths(&self) -> impl Iterator<Item = (EntityId, &StorePath, PrimitiveKind)> + '_ {
        self.tries
            .index
            .iter()
            .map(|(id, entry)| (EntityId::new(id), &entry.path, entry.kind))
    }

    pub(crate) fn typed_trie<T: StoreKind>(&self) -> &trie::Trie<T> {
        T::trie(&self.tries)
    }

    /// All values of one kind in ascending id order.
    pub fn iter<T: StoreKind>(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        T::trie(&self.tries)
            .iter()
            .map(|(id, value)| (EntityId::new(id), value))
    }

    /// True when both snapshots share every root node.
    pub fn ptr_eq(&self, other: &Store) -> bool {
        PrimitiveKind::ALL
            .iter()
            .all(|&kind| for_kind!(kind, T => T::trie(&self.tries).ptr_eq(T::trie(&other.tries))))
    }
}

impl PartialEq for Store {
    fn eq(&self, other: &Self) -> bool {
        self.tries.content_eq(&other.tries)
    }
}

impl Eq for Store {}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(path: &str) -> StorePath {
        StorePath::new(path)
    }

    #[test]
    fn with_set_leaves_original_untouched() {
        let s = Store::new().with_set(&p("/a"), 1i32);
        let s2 = s.with_set(&p("/a"), 2i32).with_set(&p("/b"), true);
        assert_eq!(*s.get::<i32>(p("/a").id()), 1);
        assert_eq!(s.count::<bool>(p("/b").id()), 0);
        assert_eq!(*s2.get::<i32>(p("/a").id()), 2);
        assert!(*s2.get::<bool>(p("/b").id()));
        assert_eq!(s2.len(), 2);
    }

    #[test]
    fn with_erase_removes_value_and_path() {
        let s = Store::new()
            .with_set(&p("/a"), "x".to_string())
            .with_set(&p("/b"), 3u32);
        let erased = s.with_erase::<String>(p("/a").id());
        assert_eq!(erased.count::<String>(p("/a").id()), 0);
        assert!(erased.path_of(p("/a").id()).is_none());
        assert_eq!(s.count::<String>(p("/a").id()), 1);
        assert_eq!(erased.len(), 1);
    }

    #[test]
    #[should_panic(expected = "cannot be written as")]
    fn kind_of_a_path_never_changes() {
        let s = Store::new().with_set(&p("/a"), 1i32);
        let _ = s.with_set(&p("/a"), 1.0f32);
    }

    #[test]
    #[should_panic(expected = "undeclared path")]
    fn get_of_undeclared_path_panics() {
        let _ = Store::new().get::<i32>(p("/nope").id());
    }

    #[test]
    fn equality_is_by_content() {
        let a = Store::new().with_set(&p("/f"), f32::NAN).with_set(&p("/i"), 1i32);
        let b = Store::new().with_set(&p("/i"), 1i32).with_set(&p("/f"), f32::NAN);
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert_ne!(a, a.with_set(&p("/i"), 2i32));
        assert!(a.ptr_eq(&a.clone()));
    }

    #[test]
    fn primitive_round_trip_through_store() {
        let seq = Primitive::Sequence(vec![Primitive::Int(1), Primitive::Int(2)]);
        let s = Store::new().with_primitive(&p("/seq"), seq.clone());
        assert_eq!(s.kind_of(p("/seq").id()), Some(PrimitiveKind::Sequence));
        assert_eq!(s.get_primitive(p("/seq").id()), Some(seq));
        let paths: Vec<_> = s.paths().map(|(_, path, _)| path.clone()).collect();
        assert_eq!(paths, vec![p("/seq")]);
    }
}
