use patchwork_types::StorePath;

use super::{Element, Sequence};
use crate::store::{StoreRead, TransientStore};

const VALUE: &str = "Value";
const CURSOR: &str = "Cursor";

/// A sequence plus a cursor into it, like a back/forward navigation list.
///
/// Stored as two paths: the entries at `<path>/Value` and the `u32` cursor at
/// `<path>/Cursor`. When the list is empty the cursor is 0 and points at
/// nothing.
#[derive(Debug, Clone)]
pub struct Navigable<T> {
    path: StorePath,
    entries: Sequence<T>,
    cursor: StorePath,
}

impl<T: Element> Navigable<T> {
    pub fn new(path: impl Into<StorePath>) -> Self {
        let path = path.into();
        Self {
            entries: Sequence::new(path.join(VALUE)),
            cursor: path.join(CURSOR),
            path,
        }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    pub fn entries(&self) -> &Sequence<T> {
        &self.entries
    }

    pub fn cursor_path(&self) -> &StorePath {
        &self.cursor
    }

    pub fn declare(&self, store: &mut TransientStore) {
        self.entries.declare(store);
        if store.count::<u32>(self.cursor.id()) == 0 {
            store.set(&self.cursor, 0u32);
        }
    }

    pub fn get(&self, store: &impl StoreRead) -> Vec<T> {
        self.entries.get(store)
    }

    pub fn len(&self, store: &impl StoreRead) -> usize {
        self.entries.len(store)
    }

    pub fn is_empty(&self, store: &impl StoreRead) -> bool {
        self.entries.is_empty(store)
    }

    pub fn cursor(&self, store: &impl StoreRead) -> usize {
        *store.get::<u32>(self.cursor.id()) as usize
    }

    /// Entry under the cursor.
    pub fn current(&self, store: &impl StoreRead) -> Option<T> {
        self.entries.get_at(store, self.cursor(store))
    }

    pub fn can_step_forward(&self, store: &impl StoreRead) -> bool {
        self.cursor(store) + 1 < self.len(store)
    }

    pub fn can_step_backward(&self, store: &impl StoreRead) -> bool {
        self.cursor(store) > 0
    }

    /// Drop every entry after the cursor, append `value` and move onto it.
    pub fn push(&self, store: &mut TransientStore, value: T) {
        if !self.entries.is_empty(store) {
            let keep = self.cursor(store) + 1;
            self.entries.truncate(store, keep);
        }
        self.entries.push_back(store, value);
        let last = self.entries.len(store) - 1;
        self.set_cursor(store, last);
    }

    /// Move the cursor to `index`, clamped to the last entry.
    pub fn move_to(&self, store: &mut TransientStore, index: usize) {
        let clamped = index.min(self.len(store).saturating_sub(1));
        self.set_cursor(store, clamped);
    }

    pub fn step_forward(&self, store: &mut TransientStore) -> bool {
        if !self.can_step_forward(store) {
            return false;
        }
        let next = self.cursor(store) + 1;
        self.set_cursor(store, next);
        true
    }

    pub fn step_backward(&self, store: &mut TransientStore) -> bool {
        if !self.can_step_backward(store) {
            return false;
        }
        let previous = self.cursor(store) - 1;
        self.set_cursor(store, previous);
        true
    }

    pub fn clear(&self, store: &mut TransientStore) {
        self.entries.clear(store);
        self.set_cursor(store, 0);
    }

    fn set_cursor(&self, store: &mut TransientStore, index: usize) {
        store.set(&self.cursor, index as u32);
    }
}
