use std::collections::BTreeSet;

use patchwork_types::{EntityId, IdPair, Primitive, StorePath};

use super::{required, ElementDiff};
use crate::error::PatchError;
use crate::patch::{PatchOp, PatchOpKind};
use crate::store::{StoreRead, TransientStore};

/// Directed graph stored as a set of `(source, destination)` id pairs.
///
/// Nodes are referenced by id only, so cycles need no special ownership.
#[derive(Debug, Clone)]
pub struct AdjacencyList {
    path: StorePath,
    id: EntityId,
}

impl AdjacencyList {
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
        if store.count::<BTreeSet<IdPair>>(self.id) == 0 {
            store.set(&self.path, BTreeSet::<IdPair>::new());
        }
    }

    pub fn get<'a>(&self, store: &'a impl StoreRead) -> &'a BTreeSet<IdPair> {
        store.get::<BTreeSet<IdPair>>(self.id)
    }

    pub fn is_connected(&self, store: &impl StoreRead, edge: IdPair) -> bool {
        self.get(store).contains(&edge)
    }

    /// Number of edges ending at `destination`.
    pub fn source_count(&self, store: &impl StoreRead, destination: EntityId) -> usize {
        self.get(store)
            .iter()
            .filter(|e| e.destination == destination)
            .count()
    }

    /// Number of edges leaving `source`.
    pub fn destination_count(&self, store: &impl StoreRead, source: EntityId) -> usize {
        self.get(store).iter().filter(|e| e.source == source).count()
    }

    /// True if `to` is reachable from `from` along directed edges. A node
    /// always reaches itself.
    pub fn has_path(&self, store: &impl StoreRead, from: EntityId, to: EntityId) -> bool {
        let edges = self.get(store);
        let mut visited = BTreeSet::new();
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if !visited.insert(node) {
                continue;
            }
            let first = IdPair::new(node, EntityId::new(0));
            stack.extend(
                edges
                    .range(first..)
                    .take_while(|e| e.source == node)
                    .map(|e| e.destination)
                    .filter(|d| !visited.contains(d)),
            );
        }
        false
    }

    /// Returns false if the edge already existed.
    pub fn connect(&self, store: &mut TransientStore, edge: IdPair) -> bool {
        self.edges_mut(store).insert(edge)
    }

    /// Returns false if the edge did not exist.
    pub fn disconnect(&self, store: &mut TransientStore, edge: IdPair) -> bool {
        self.edges_mut(store).remove(&edge)
    }

    /// Connect if absent, disconnect if present. Returns the new state.
    pub fn toggle_connection(&self, store: &mut TransientStore, edge: IdPair) -> bool {
        let edges = self.edges_mut(store);
        if edges.remove(&edge) {
            false
        } else {
            edges.insert(edge);
            true
        }
    }

    /// Remove every edge touching `node`. Returns how many were removed.
    pub fn disconnect_output(&self, store: &mut TransientStore, node: EntityId) -> usize {
        let edges = self.edges_mut(store);
        let before = edges.len();
        edges.retain(|e| !e.touches(node));
        before - edges.len()
    }

    fn edges_mut<'a>(&self, store: &'a mut TransientStore) -> &'a mut BTreeSet<IdPair> {
        match store.get_mut::<BTreeSet<IdPair>>(self.id) {
            Some(edges) => edges,
            None => panic!("adjacency list {} was never declared", self.path),
        }
    }
}

fn edge(id: EntityId, value: &Primitive) -> Result<IdPair, PatchError> {
    let text = value.as_str().ok_or_else(|| PatchError::BadElement {
        id,
        reason: format!("edge must be carried as a string, got {}", value.kind()),
    })?;
    text.parse::<IdPair>()
        .map_err(|reason| PatchError::BadElement { id, reason })
}

/// Pairs travel through patches in their `"source-destination"` text form.
impl ElementDiff for BTreeSet<IdPair> {
    fn diff_elements(before: &Self, after: &Self, ops: &mut Vec<PatchOp>) {
        for gone in before.difference(after) {
            ops.push(PatchOp::erase(Primitive::String(gone.to_string())));
        }
        for new in after.difference(before) {
            ops.push(PatchOp::insert(Primitive::String(new.to_string())));
        }
    }

    fn apply_element_op(&mut self, id: EntityId, op: &PatchOp) -> Result<(), PatchError> {
        match op.kind {
            PatchOpKind::Insert => {
                self.insert(edge(id, required(id, op, &op.value)?)?);
            }
            PatchOpKind::Erase => {
                self.remove(&edge(id, required(id, op, &op.old)?)?);
            }
            _ => {
                return Err(PatchError::BadElement {
                    id,
                    reason: format!("{} is not an edge op", op.kind),
                })
            }
        }
        Ok(())
    }
}
