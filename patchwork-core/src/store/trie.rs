//! Persistent 16-way bitmapped radix trie keyed by 64-bit entity ids.
//!
//! Nodes are `Arc`-shared. Edits go through `Arc::make_mut`, so a trie that
//! owns its nodes uniquely is edited in place, while one that shares nodes
//! with a frozen snapshot copies only the root-to-leaf path it touches.
//! Keys are consumed four bits at a time, most significant first, which
//! makes in-order traversal ascending by key.

use std::sync::Arc;

const BITS: u32 = 4;
const MAX_DEPTH: u32 = u64::BITS / BITS;

#[derive(Debug, Clone)]
enum Node<V> {
    Leaf(u64, V),
    Branch {
        bitmap: u16,
        children: Vec<Arc<Node<V>>>,
    },
}

fn chunk(key: u64, depth: u32) -> u32 {
    debug_assert!(depth < MAX_DEPTH);
    ((key >> (u64::BITS - BITS * (depth + 1))) & 0xF) as u32
}

fn slot(bitmap: u16, bit: u16) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

/// One difference found while walking two tries side by side.
#[derive(Debug)]
pub enum TrieDiff<'a, V> {
    Removed(u64, &'a V),
    Added(u64, &'a V),
    /// Present on both sides in distinct (non-shared) nodes. The values may
    /// still be equal; the caller decides.
    Both(u64, &'a V, &'a V),
}

#[derive(Debug, Clone)]
pub struct Trie<V> {
    root: Option<Arc<Node<V>>>,
    len: usize,
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self { root: None, len: 0 }
    }
}

impl<V> Trie<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, key: u64) -> Option<&V> {
        let mut node = self.root.as_deref()?;
        let mut depth = 0;
        loop {
            match node {
                Node::Leaf(k, v) => return if *k == key { Some(v) } else { None },
                Node::Branch { bitmap, children } => {
                    let bit = 1u16 << chunk(key, depth);
                    if bitmap & bit == 0 {
                        return None;
                    }
                    node = children[slot(*bitmap, bit)].as_ref();
                    depth += 1;
                }
            }
        }
    }

    pub fn contains_key(&self, key: u64) -> bool {
        self.get(key).is_some()
    }

    /// True if both tries are rooted at the same shared node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            stack: self.root.as_deref().into_iter().collect(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Merge-walk `self` (before) against `other` (after) in key order,
    /// skipping every subtree the two share.
    pub fn diff<'a>(&'a self, other: &'a Self, visit: &mut impl FnMut(TrieDiff<'a, V>)) {
        diff_nodes(self.root.as_ref(), other.root.as_ref(), visit);
    }

    /// Content equality under `eq`. Shared subtrees are not visited.
    pub fn content_eq(&self, other: &Self, eq: impl Fn(&V, &V) -> bool) -> bool {
        if self.len != other.len {
            return false;
        }
        let mut equal = true;
        self.diff(other, &mut |d| match d {
            TrieDiff::Both(_, a, b) => equal &= eq(a, b),
            _ => equal = false,
        });
        equal
    }
}

impl<V: Clone> Trie<V> {
    /// Insert or overwrite. Returns the previous value.
    pub fn insert(&mut self, key: u64, value: V) -> Option<V> {
        let previous = match self.root.as_mut() {
            None => {
                self.root = Some(Arc::new(Node::Leaf(key, value)));
                None
            }
            Some(root) => insert_at(root, key, value, 0),
        };
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Remove `key`. Returns true if it was present.
    pub fn remove(&mut self, key: u64) -> bool {
        if !self.contains_key(key) {
            return false;
        }
        let emptied = match self.root.as_mut() {
            Some(root) => remove_at(root, key, 0),
            None => false,
        };
        if emptied {
            self.root = None;
        }
        self.len -= 1;
        true
    }

    /// Mutable access to one value, copying shared nodes on the way down.
    pub fn get_mut(&mut self, key: u64) -> Option<&mut V> {
        if !self.contains_key(key) {
            return None;
        }
        get_mut_at(self.root.as_mut()?, key, 0)
    }
}

fn insert_at<V: Clone>(node: &mut Arc<Node<V>>, key: u64, value: V, depth: u32) -> Option<V> {
    let split = match node.as_ref() {
        Node::Leaf(k, _) if *k != key => Some(*k),
        _ => None,
    };
    if let Some(existing) = split {
        // Push the resident leaf down one level and retry as a branch.
        let resident = Arc::clone(node);
        *node = Arc::new(Node::Branch {
            bitmap: 1u16 << chunk(existing, depth),
            children: vec![resident],
        });
    }
    match Arc::make_mut(node) {
        Node::Leaf(_, v) => Some(std::mem::replace(v, value)),
        Node::Branch { bitmap, children } => {
            let bit = 1u16 << chunk(key, depth);
            let idx = slot(*bitmap, bit);
            if *bitmap & bit != 0 {
                insert_at(&mut children[idx], key, value, depth + 1)
            } else {
                children.insert(idx, Arc::new(Node::Leaf(key, value)));
                *bitmap |= bit;
                None
            }
        }
    }
}

/// `key` must be present below `node`. Returns true when `node` is left empty.
fn remove_at<V: Clone>(node: &mut Arc<Node<V>>, key: u64, depth: u32) -> bool {
    if let Node::Leaf(..) = node.as_ref() {
        return true;
    }
    let collapse = match Arc::make_mut(node) {
        Node::Leaf(..) => None,
        Node::Branch { bitmap, children } => {
            let bit = 1u16 << chunk(key, depth);
            let idx = slot(*bitmap, bit);
            if remove_at(&mut children[idx], key, depth + 1) {
                children.remove(idx);
                *bitmap &= !bit;
            }
            if children.is_empty() {
                return true;
            }
            if children.len() == 1 && matches!(children[0].as_ref(), Node::Leaf(..)) {
                children.pop()
            } else {
                None
            }
        }
    };
    if let Some(leaf) = collapse {
        *node = leaf;
    }
    false
}

fn get_mut_at<V: Clone>(node: &mut Arc<Node<V>>, key: u64, depth: u32) -> Option<&mut V> {
    match Arc::make_mut(node) {
        Node::Leaf(k, v) => {
            if *k == key {
                Some(v)
            } else {
                None
            }
        }
        Node::Branch { bitmap, children } => {
            let bit = 1u16 << chunk(key, depth);
            if *bitmap & bit == 0 {
                return None;
            }
            let idx = slot(*bitmap, bit);
            get_mut_at(&mut children[idx], key, depth + 1)
        }
    }
}

fn child<V>(bitmap: u16, children: &[Arc<Node<V>>], c: u32) -> Option<&Arc<Node<V>>> {
    let bit = 1u16 << c;
    if bitmap & bit == 0 {
        None
    } else {
        Some(&children[slot(bitmap, bit)])
    }
}

fn leaves<V>(node: &Node<V>) -> Vec<(u64, &V)> {
    Iter { stack: vec![node] }.collect()
}

fn diff_nodes<'a, V>(
    before: Option<&'a Arc<Node<V>>>,
    after: Option<&'a Arc<Node<V>>>,
    visit: &mut impl FnMut(TrieDiff<'a, V>),
) {
    match (before, after) {
        (None, None) => {}
        (Some(a), None) => {
            for (k, v) in leaves(a) {
                visit(TrieDiff::Removed(k, v));
            }
        }
        (None, Some(b)) => {
            for (k, v) in leaves(b) {
                visit(TrieDiff::Added(k, v));
            }
        }
        (Some(a), Some(b)) if Arc::ptr_eq(a, b) => {}
        (Some(a), Some(b)) => match (a.as_ref(), b.as_ref()) {
            (
                Node::Branch {
                    bitmap: bitmap_a,
                    children: children_a,
                },
                Node::Branch {
                    bitmap: bitmap_b,
                    children: children_b,
                },
            ) => {
                for c in 0..16 {
                    diff_nodes(
                        child(*bitmap_a, children_a, c),
                        child(*bitmap_b, children_b, c),
                        visit,
                    );
                }
            }
            _ => merge_join(leaves(a), leaves(b), visit),
        },
    }
}

fn merge_join<'a, V>(
    before: Vec<(u64, &'a V)>,
    after: Vec<(u64, &'a V)>,
    visit: &mut impl FnMut(TrieDiff<'a, V>),
) {
    let mut before = before.into_iter().peekable();
    let mut after = after.into_iter().peekable();
    loop {
        let next_before = before.peek().map(|(k, _)| *k);
        let next_after = after.peek().map(|(k, _)| *k);
        let step = match (next_before, next_after) {
            (None, None) => break,
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(&b),
        };
        match step {
            std::cmp::Ordering::Less => {
                if let Some((k, v)) = before.next() {
                    visit(TrieDiff::Removed(k, v));
                }
            }
            std::cmp::Ordering::Greater => {
                if let Some((k, v)) = after.next() {
                    visit(TrieDiff::Added(k, v));
                }
            }
            std::cmp::Ordering::Equal => {
                if let (Some((k, a)), Some((_, b))) = (before.next(), after.next()) {
                    visit(TrieDiff::Both(k, a, b));
                }
            }
        }
    }
}

pub struct Iter<'a, V> {
    stack: Vec<&'a Node<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (u64, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Leaf(k, v) => return Some((*k, v)),
                Node::Branch { children, .. } => {
                    self.stack.extend(children.iter().rev().map(|c| c.as_ref()));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie_of(keys: &[u64]) -> Trie<u64> {
        let mut trie = Trie::new();
        for &k in keys {
            trie.insert(k, k.wrapping_mul(10));
        }
        trie
    }

    fn diff_keys(a: &Trie<u64>, b: &Trie<u64>) -> (Vec<u64>, Vec<u64>, Vec<u64>) {
        let (mut removed, mut added, mut changed) = (Vec::new(), Vec::new(), Vec::new());
        a.diff(b, &mut |d| match d {
            TrieDiff::Removed(k, _) => removed.push(k),
            TrieDiff::Added(k, _) => added.push(k),
            TrieDiff::Both(k, x, y) => {
                if x != y {
                    changed.push(k)
                }
            }
        });
        (removed, added, changed)
    }

    #[test]
    fn insert_get_overwrite() {
        let mut trie = Trie::new();
        assert_eq!(trie.insert(7, "a"), None);
        assert_eq!(trie.insert(7, "b"), Some("a"));
        assert_eq!(trie.get(7), Some(&"b"));
        assert_eq!(trie.get(8), None);
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn keys_sharing_long_prefixes() {
        let keys = [0u64, 1, 0x10, u64::MAX, u64::MAX - 1, 0x8000_0000_0000_0000];
        let trie = trie_of(&keys);
        for k in keys {
            assert_eq!(trie.get(k), Some(&(k.wrapping_mul(10))));
        }
        assert_eq!(trie.len(), keys.len());
    }

    #[test]
    fn iterates_in_ascending_order() {
        let keys = [99u64, 3, u64::MAX, 0x1234_5678_9abc_def0, 42, 0];
        let trie = trie_of(&keys);
        let mut sorted = keys.to_vec();
        sorted.sort();
        assert_eq!(trie.keys().collect::<Vec<_>>(), sorted);
    }

    #[test]
    fn remove_collapses_and_empties() {
        let mut trie = trie_of(&[1, 2, 3]);
        assert!(trie.remove(2));
        assert!(!trie.remove(2));
        assert_eq!(trie.keys().collect::<Vec<_>>(), vec![1, 3]);
        assert!(trie.remove(1));
        assert!(trie.remove(3));
        assert!(trie.is_empty());
        assert!(trie.ptr_eq(&Trie::new()));
    }

    #[test]
    fn clone_is_unaffected_by_later_edits() {
        let original = trie_of(&[1, 2, 3]);
        let mut edited = original.clone();
        assert!(edited.ptr_eq(&original));
        edited.insert(2, 0);
        edited.insert(4, 40);
        if let Some(v) = edited.get_mut(1) {
            *v = 11;
        }
        assert_eq!(original.get(1), Some(&10));
        assert_eq!(original.get(2), Some(&20));
        assert_eq!(original.get(4), None);
        assert_eq!(edited.get(1), Some(&11));
        assert!(!edited.ptr_eq(&original));
    }

    #[test]
    fn diff_reports_changes_in_order() {
        let before = trie_of(&[1, 2, 3, 1000]);
        let mut after = before.clone();
        after.remove(2);
        after.insert(5, 50);
        after.insert(1000, 7);
        let (removed, added, changed) = diff_keys(&before, &after);
        assert_eq!(removed, vec![2]);
        assert_eq!(added, vec![5]);
        assert_eq!(changed, vec![1000]);
    }

    #[test]
    fn diff_of_shared_trie_visits_nothing() {
        let trie = trie_of(&(0..200).collect::<Vec<_>>());
        let copy = trie.clone();
        let mut visited = 0;
        trie.diff(&copy, &mut |_| visited += 1);
        assert_eq!(visited, 0);
    }

    #[test]
    fn diff_leaf_against_branch() {
        let before = trie_of(&[5]);
        let after = trie_of(&[5, 6, 7]);
        let (removed, added, changed) = diff_keys(&before, &after);
        assert!(removed.is_empty());
        assert_eq!(added, vec![6, 7]);
        assert!(changed.is_empty());
        assert!(before.content_eq(&trie_of(&[5]), |a, b| a == b));
        assert!(!before.content_eq(&after, |a, b| a == b));
    }
}
