use std::cmp::Ordering;

use patchwork_types::StorePath;

use super::Sequence;
use crate::store::{StoreRead, TransientStore};

const PREFIXES: &str = "Prefixes";

/// Lowest non-negative integer, as a string, not already in `existing`.
pub fn next_prefix<S: AsRef<str>>(existing: &[S]) -> String {
    let mut n: u64 = 0;
    loop {
        let candidate = n.to_string();
        if !existing.iter().any(|p| p.as_ref() == candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn leading_number(prefix: &str) -> Option<u64> {
    let digits = prefix.bytes().take_while(u8::is_ascii_digit).count();
    prefix[..digits].parse().ok()
}

fn compare_prefixes(a: &str, b: &str) -> Ordering {
    match (leading_number(a), leading_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Order by leading integer, then by the full string. Prefixes without a
/// leading integer sort last.
pub fn sort_prefixes<S: AsRef<str>>(prefixes: &mut [S]) {
    prefixes.sort_by(|a, b| compare_prefixes(a.as_ref(), b.as_ref()));
}

/// Dynamically sized collection of child entities.
///
/// The allocated prefixes are kept sorted in a `Sequence<String>` at
/// `<path>/Prefixes`; the child with prefix `p` owns every path under
/// `<path>/<p>`.
#[derive(Debug, Clone)]
pub struct ChildList {
    path: StorePath,
    prefixes: Sequence<String>,
}

impl ChildList {
    pub fn new(path: impl Into<StorePath>) -> Self {
        let path = path.into();
        Self {
            prefixes: Sequence::new(path.join(PREFIXES)),
            path,
        }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// True if `path` is where some child list keeps its prefixes. Sequences
    /// stored there may only hold strings.
    pub fn is_prefixes_path(path: &StorePath) -> bool {
        path.name() == Some(PREFIXES)
    }

    pub fn prefixes_path(&self) -> &StorePath {
        self.prefixes.path()
    }

    pub fn declare(&self, store: &mut TransientStore) {
        self.prefixes.declare(store);
    }

    pub fn prefixes(&self, store: &impl StoreRead) -> Vec<String> {
        self.prefixes.get(store)
    }

    pub fn contains(&self, store: &impl StoreRead, prefix: &str) -> bool {
        self.prefixes.get(store).iter().any(|p| p == prefix)
    }

    /// Root path of the child with `prefix`.
    pub fn child_path(&self, prefix: &str) -> StorePath {
        self.path.join(prefix)
    }

    /// Allocate a new child prefix and return it.
    pub fn add(&self, store: &mut TransientStore) -> String {
        let mut prefixes = self.prefixes.get(store);
        let prefix = next_prefix(&prefixes);
        prefixes.push(prefix.clone());
        sort_prefixes(&mut prefixes);
        self.prefixes.set(store, prefixes);
        prefix
    }

    /// Drop `prefix` and erase every path the child owned. Returns false if
    /// the prefix was not allocated.
    pub fn remove(&self, store: &mut TransientStore, prefix: &str) -> bool {
        let mut prefixes = self.prefixes.get(store);
        let before = prefixes.len();
        prefixes.retain(|p| p != prefix);
        if prefixes.len() == before {
            return false;
        }
        self.prefixes.set(store, prefixes);

        let root = self.child_path(prefix);
        let owned: Vec<_> = store
            .persistent()
            .paths()
            .filter(|(_, path, _)| **path == root || path.is_descendant_of(&root))
            .map(|(id, _, _)| id)
            .collect();
        for id in owned {
            store.erase_path(id);
        }
        true
    }
}
