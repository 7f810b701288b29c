use std::collections::BTreeSet;

use patchwork_types::{EntityId, Primitive, StorePath};

use super::{required, ElementDiff};
use crate::error::PatchError;
use crate::patch::{PatchOp, PatchOpKind};
use crate::store::{StoreRead, TransientStore};

/// Unordered set of `u32` ids stored at a path. Membership only; no positions.
#[derive(Debug, Clone)]
pub struct IdSet {
    path: StorePath,
    id: EntityId,
}

impl IdSet {
    pub fn new(path: impl Into<StorePath>) -> Self {
        let path = path.into();
        let id = path.id();
        Self { path, id }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn declare(&self, store: &mut TransientStore) {
        if store.count::<BTreeSet<u32>>(self.id) == 0 {
            store.set(&self.path, BTreeSet::<u32>::new());
        }
    }

    pub fn get<'a>(&self, store: &'a impl StoreRead) -> &'a BTreeSet<u32> {
        store.get::<BTreeSet<u32>>(self.id)
    }

    pub fn contains(&self, store: &impl StoreRead, value: u32) -> bool {
        self.get(store).contains(&value)
    }

    /// Returns false if `value` was already a member.
    pub fn insert(&self, store: &mut TransientStore, value: u32) -> bool {
        self.values_mut(store).insert(value)
    }

    /// Returns false if `value` was not a member.
    pub fn erase(&self, store: &mut TransientStore, value: u32) -> bool {
        self.values_mut(store).remove(&value)
    }

    pub fn clear(&self, store: &mut TransientStore) {
        store.clear::<BTreeSet<u32>>(&self.path);
    }

    fn values_mut<'a>(&self, store: &'a mut TransientStore) -> &'a mut BTreeSet<u32> {
        match store.get_mut::<BTreeSet<u32>>(self.id) {
            Some(values) => values,
            None => panic!("id set {} was never declared", self.path),
        }
    }
}

fn member(id: EntityId, value: &Primitive) -> Result<u32, PatchError> {
    value.as_uint().ok_or_else(|| PatchError::BadElement {
        id,
        reason: format!("id set element must be a uint, got {}", value.kind()),
    })
}

impl ElementDiff for BTreeSet<u32> {
    fn diff_elements(before: &Self, after: &Self, ops: &mut Vec<PatchOp>) {
        for gone in before.difference(after) {
            ops.push(PatchOp::erase(Primitive::UInt(*gone)));
        }
        for new in after.difference(before) {
            ops.push(PatchOp::insert(Primitive::UInt(*new)));
        }
    }

    fn apply_element_op(&mut self, id: EntityId, op: &PatchOp) -> Result<(), PatchError> {
        match op.kind {
            PatchOpKind::Insert => {
                self.insert(member(id, required(id, op, &op.value)?)?);
            }
            PatchOpKind::Erase => {
                self.remove(&member(id, required(id, op, &op.old)?)?);
            }
            _ => {
                return Err(PatchError::BadElement {
                    id,
                    reason: format!("{} is not a set op", op.kind),
                })
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_operations() {
        let set = IdSet::new("/selection");
        let mut store = TransientStore::new();
        set.declare(&mut store);
        assert!(set.insert(&mut store, 4));
        assert!(!set.insert(&mut store, 4));
        assert!(set.insert(&mut store, 1));
        assert!(set.contains(&store, 1));
        assert!(set.erase(&mut store, 1));
        assert!(!set.erase(&mut store, 1));
        assert_eq!(set.get(&store).iter().copied().collect::<Vec<_>>(), vec![4]);
        set.clear(&mut store);
        assert!(set.get(&store).is_empty());
    }

    #[test]
    fn diff_and_replay() {
        let before: BTreeSet<u32> = [1, 2, 3].into_iter().collect();
        let after: BTreeSet<u32> = [2, 3, 8].into_iter().collect();
        let mut ops = Vec::new();
        <BTreeSet<u32>>::diff_elements(&before, &after, &mut ops);
        assert_eq!(
            ops,
            vec![
                PatchOp::erase(Primitive::UInt(1)),
                PatchOp::insert(Primitive::UInt(8))
            ]
        );
        let mut replayed = before.clone();
        for op in &ops {
            replayed.apply_element_op(EntityId::new(0), op).unwrap();
        }
        assert_eq!(replayed, after);
    }
}
