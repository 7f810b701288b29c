use std::fmt;
use std::marker::PhantomData;

use patchwork_types::{EntityId, Primitive, StorePath};

use super::{required, Element, ElementDiff};
use crate::error::PatchError;
use crate::patch::{PatchOp, PatchOpKind};
use crate::store::{StoreRead, TransientStore};

/// Ordered list of elements stored as one `Vec<Primitive>` at a path.
///
/// Index-taking writes panic when out of range, as the matching `Vec`
/// methods do; the dispatcher checks ranges before calling them.
pub struct Sequence<T> {
    path: StorePath,
    id: EntityId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Sequence<T> {
    fn clone(&self) -> Self {
        Self::at(self.path.clone())
    }
}

impl<T> fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sequence").field(&self.path).finish()
    }
}

impl<T> Sequence<T> {
    fn at(path: StorePath) -> Self {
        let id = path.id();
        Self {
            path,
            id,
            _marker: PhantomData,
        }
    }
}

impl<T: Element> Sequence<T> {
    pub fn new(path: impl Into<StorePath>) -> Self {
        Self::at(path.into())
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Create the path as an empty sequence if it does not exist yet.
    pub fn declare(&self, store: &mut TransientStore) {
        if store.count::<Vec<Primitive>>(self.id) == 0 {
            store.set(&self.path, Vec::<Primitive>::new());
        }
    }

    pub fn raw<'a>(&self, store: &'a impl StoreRead) -> &'a [Primitive] {
        store.get::<Vec<Primitive>>(self.id)
    }

    pub fn get(&self, store: &impl StoreRead) -> Vec<T> {
        self.raw(store).iter().map(|p| self.element(p)).collect()
    }

    pub fn get_at(&self, store: &impl StoreRead, index: usize) -> Option<T> {
        self.raw(store).get(index).map(|p| self.element(p))
    }

    pub fn len(&self, store: &impl StoreRead) -> usize {
        self.raw(store).len()
    }

    pub fn is_empty(&self, store: &impl StoreRead) -> bool {
        self.raw(store).is_empty()
    }

    pub fn set(&self, store: &mut TransientStore, values: Vec<T>) {
        let values: Vec<Primitive> = values.into_iter().map(Element::into_element).collect();
        store.set(&self.path, values);
    }

    pub fn set_at(&self, store: &mut TransientStore, index: usize, value: T) {
        self.values_mut(store)[index] = value.into_element();
    }

    pub fn push_back(&self, store: &mut TransientStore, value: T) {
        self.values_mut(store).push(value.into_element());
    }

    pub fn pop_back(&self, store: &mut TransientStore) -> Option<T> {
        let popped = self.values_mut(store).pop()?;
        Some(self.element(&popped))
    }

    pub fn insert(&self, store: &mut TransientStore, index: usize, value: T) {
        self.values_mut(store).insert(index, value.into_element());
    }

    pub fn erase(&self, store: &mut TransientStore, index: usize) -> T {
        let removed = self.values_mut(store).remove(index);
        self.element(&removed)
    }

    pub fn resize(&self, store: &mut TransientStore, len: usize, fill: T) {
        self.values_mut(store).resize(len, fill.into_element());
    }

    pub fn truncate(&self, store: &mut TransientStore, len: usize) {
        self.values_mut(store).truncate(len);
    }

    pub fn clear(&self, store: &mut TransientStore) {
        store.clear::<Vec<Primitive>>(&self.path);
    }

    fn values_mut<'a>(&self, store: &'a mut TransientStore) -> &'a mut Vec<Primitive> {
        match store.get_mut::<Vec<Primitive>>(self.id) {
            Some(values) => values,
            None => panic!("sequence {} was never declared", self.path),
        }
    }

    fn element(&self, value: &Primitive) -> T {
        match T::from_element(value) {
            Some(element) => element,
            None => panic!("sequence {} holds a {} element", self.path, value.kind()),
        }
    }
}

impl ElementDiff for Vec<Primitive> {
    /// `Set(i)` for each differing index of the common prefix, `PopBack` for
    /// surplus `before` elements (tail first), `PushBack` for surplus `after`
    /// elements.
    fn diff_elements(before: &Self, after: &Self, ops: &mut Vec<PatchOp>) {
        let common = before.len().min(after.len());
        for i in 0..common {
            if before[i] != after[i] {
                ops.push(PatchOp::set(i, after[i].clone(), before[i].clone()));
            }
        }
        for old in before[common..].iter().rev() {
            ops.push(PatchOp::pop_back(old.clone()));
        }
        for value in &after[common..] {
            ops.push(PatchOp::push_back(value.clone()));
        }
    }

    fn apply_element_op(&mut self, id: EntityId, op: &PatchOp) -> Result<(), PatchError> {
        match op.kind {
            PatchOpKind::Set(index) => {
                let value = required(id, op, &op.value)?;
                let len = self.len();
                let slot = self
                    .get_mut(index)
                    .ok_or(PatchError::IndexOutOfRange { id, index, len })?;
                *slot = value.clone();
            }
            PatchOpKind::PushBack => {
                let value = required(id, op, &op.value)?;
                self.push(value.clone());
            }
            PatchOpKind::PopBack => {
                self.pop().ok_or(PatchError::EmptySequence(id))?;
            }
            PatchOpKind::Insert
            | PatchOpKind::Erase
            | PatchOpKind::Add
            | PatchOpKind::Remove
            | PatchOpKind::Replace => {
                return Err(PatchError::BadElement {
                    id,
                    reason: format!("{} is not a sequence op", op.kind),
                })
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i32]) -> Vec<Primitive> {
        values.iter().map(|&v| Primitive::Int(v)).collect()
    }

    fn replay(before: &[i32], ops: &[PatchOp]) -> Vec<Primitive> {
        let mut values = ints(before);
        for op in ops {
            values.apply_element_op(EntityId::new(1), op).unwrap();
        }
        values
    }

    #[test]
    fn typed_operations() {
        let seq: Sequence<i32> = Sequence::new("/foo/bar");
        let mut store = TransientStore::new();
        seq.declare(&mut store);
        seq.push_back(&mut store, 1);
        seq.push_back(&mut store, 2);
        seq.insert(&mut store, 0, 7);
        assert_eq!(seq.get(&store), vec![7, 1, 2]);
        assert_eq!(seq.erase(&mut store, 1), 1);
        seq.set_at(&mut store, 1, 9);
        assert_eq!(seq.get(&store), vec![7, 9]);
        seq.resize(&mut store, 4, 0);
        assert_eq!(seq.get(&store), vec![7, 9, 0, 0]);
        assert_eq!(seq.pop_back(&mut store), Some(0));
        seq.clear(&mut store);
        assert!(seq.is_empty(&store));
        assert_eq!(seq.pop_back(&mut store), None);
    }

    #[test]
    fn declare_keeps_existing_values() {
        let seq: Sequence<String> = Sequence::new("/names");
        let mut store = TransientStore::new();
        seq.set(&mut store, vec!["a".into()]);
        seq.declare(&mut store);
        assert_eq!(seq.get(&store), vec!["a".to_string()]);
    }

    #[test]
    fn single_change_is_one_set_op() {
        let before = ints(&[1, 2, 3, 4, 5]);
        let after = ints(&[1, 2, 9, 4, 5]);
        let mut ops = Vec::new();
        <Vec<Primitive>>::diff_elements(&before, &after, &mut ops);
        assert_eq!(ops, vec![PatchOp::set(2, Primitive::Int(9), Primitive::Int(3))]);
    }

    #[test]
    fn shrink_pops_tail_first_and_grow_pushes() {
        let mut ops = Vec::new();
        <Vec<Primitive>>::diff_elements(&ints(&[1, 2, 3]), &ints(&[5]), &mut ops);
        assert_eq!(
            ops,
            vec![
                PatchOp::set(0, Primitive::Int(5), Primitive::Int(1)),
                PatchOp::pop_back(Primitive::Int(3)),
                PatchOp::pop_back(Primitive::Int(2)),
            ]
        );
        assert_eq!(replay(&[1, 2, 3], &ops), ints(&[5]));

        let mut ops = Vec::new();
        <Vec<Primitive>>::diff_elements(&ints(&[]), &ints(&[1, 2]), &mut ops);
        assert_eq!(replay(&[], &ops), ints(&[1, 2]));
    }

    #[test]
    fn bad_ops_are_errors() {
        let mut values = ints(&[]);
        let id = EntityId::new(3);
        assert_eq!(
            values.apply_element_op(id, &PatchOp::pop_back(Primitive::Int(1))),
            Err(PatchError::EmptySequence(id))
        );
        assert_eq!(
            values.apply_element_op(id, &PatchOp::set(2, Primitive::Int(1), Primitive::Int(0))),
            Err(PatchError::IndexOutOfRange { id, index: 2, len: 0 })
        );
    }
}
