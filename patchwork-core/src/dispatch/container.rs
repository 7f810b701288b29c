use std::collections::BTreeSet;

use patchwork_types::{
    AdjacencyListAction, ChildListAction, IdPair, NavigableAction, Primitive, PrimitiveKind,
    SequenceAction, SetAction, StorePath,
};

use super::{accepts, holds};
use crate::container::{AdjacencyList, ChildList, IdSet, Navigable, Sequence};
use crate::store::{StoreRead, TransientStore};

// ============================================================================
// Sequence
// ============================================================================

/// Sequences stay homogeneous: a new element must match the existing ones.
fn fits(values: &[Primitive], value: &Primitive) -> bool {
    values.first().map_or(true, |first| first.kind() == value.kind())
}

fn homogeneous(values: &[Primitive]) -> bool {
    values.iter().all(|v| fits(values, v))
}

/// A child list's prefix sequence only ever holds strings.
fn allowed_at(path: &StorePath, value: &Primitive) -> bool {
    !ChildList::is_prefixes_path(path) || value.kind() == PrimitiveKind::String
}

fn sequence_values<'a>(store: &'a impl StoreRead, path: &StorePath) -> Option<&'a [Primitive]> {
    store
        .try_get::<Vec<Primitive>>(path.id())
        .map(Vec::as_slice)
}

pub(super) fn can_apply_sequence(action: &SequenceAction, store: &impl StoreRead) -> bool {
    let path = action.path();
    if !accepts(store, path, PrimitiveKind::Sequence) {
        return false;
    }
    let values = sequence_values(store, path).unwrap_or(&[]);
    let fits_here = |value: &Primitive| fits(values, value) && allowed_at(path, value);
    match action {
        SequenceAction::Set { values: new, .. } => {
            homogeneous(new) && new.iter().all(|v| allowed_at(path, v))
        }
        SequenceAction::SetAt { index, value, .. } => *index < values.len() && fits_here(value),
        SequenceAction::PushBack { value, .. } => fits_here(value),
        SequenceAction::PopBack { .. } => !values.is_empty(),
        SequenceAction::Insert { index, value, .. } => *index <= values.len() && fits_here(value),
        SequenceAction::Erase { index, .. } => *index < values.len(),
        SequenceAction::Resize { len, fill, .. } => *len != values.len() && fits_here(fill),
        SequenceAction::Clear { .. } => true,
    }
}

pub(super) fn dispatch_sequence(action: &SequenceAction, store: &mut TransientStore) {
    let seq = Sequence::<Primitive>::new(action.path().clone());
    seq.declare(store);
    match action {
        SequenceAction::Set { values, .. } => seq.set(store, values.clone()),
        SequenceAction::SetAt { index, value, .. } => seq.set_at(store, *index, value.clone()),
        SequenceAction::PushBack { value, .. } => seq.push_back(store, value.clone()),
        SequenceAction::PopBack { .. } => {
            seq.pop_back(store);
        }
        SequenceAction::Insert { index, value, .. } => seq.insert(store, *index, value.clone()),
        SequenceAction::Erase { index, .. } => {
            seq.erase(store, *index);
        }
        SequenceAction::Resize { len, fill, .. } => seq.resize(store, *len, fill.clone()),
        SequenceAction::Clear { .. } => seq.clear(store),
    }
}

// ============================================================================
// IdSet
// ============================================================================

pub(super) fn can_apply_set(action: &SetAction, store: &impl StoreRead) -> bool {
    let path = action.path();
    if !accepts(store, path, PrimitiveKind::IdSet) {
        return false;
    }
    let members = store.try_get::<BTreeSet<u32>>(path.id());
    match action {
        SetAction::Insert { value, .. } => members.map_or(true, |m| !m.contains(value)),
        SetAction::Erase { value, .. } => members.map_or(false, |m| m.contains(value)),
        SetAction::Clear { .. } => true,
    }
}

pub(super) fn dispatch_set(action: &SetAction, store: &mut TransientStore) {
    let set = IdSet::new(action.path().clone());
    set.declare(store);
    match action {
        SetAction::Insert { value, .. } => {
            set.insert(store, *value);
        }
        SetAction::Erase { value, .. } => {
            set.erase(store, *value);
        }
        SetAction::Clear { .. } => set.clear(store),
    }
}

// ============================================================================
// Navigable
// ============================================================================

pub(super) fn can_apply_navigable(action: &NavigableAction, store: &impl StoreRead) -> bool {
    let nav = Navigable::<Primitive>::new(action.path().clone());
    let entries = nav.entries().path();
    let cursor = nav.cursor_path();
    if !accepts(store, entries, PrimitiveKind::Sequence) || !accepts(store, cursor, PrimitiveKind::UInt) {
        return false;
    }
    let declared = holds(store, entries, PrimitiveKind::Sequence) && holds(store, cursor, PrimitiveKind::UInt);
    match action {
        NavigableAction::Push { value, .. } => {
            fits(sequence_values(store, entries).unwrap_or(&[]), value)
        }
        NavigableAction::MoveTo { index, .. } => {
            declared && *index < nav.len(store)
        }
        NavigableAction::StepForward { .. } => declared && nav.can_step_forward(store),
        NavigableAction::StepBackward { .. } => declared && nav.can_step_backward(store),
        NavigableAction::Clear { .. } => true,
    }
}

pub(super) fn dispatch_navigable(action: &NavigableAction, store: &mut TransientStore) {
    let nav = Navigable::<Primitive>::new(action.path().clone());
    nav.declare(store);
    match action {
        NavigableAction::Push { value, .. } => nav.push(store, value.clone()),
        NavigableAction::MoveTo { index, .. } => nav.move_to(store, *index),
        NavigableAction::StepForward { .. } => {
            nav.step_forward(store);
        }
        NavigableAction::StepBackward { .. } => {
            nav.step_backward(store);
        }
        NavigableAction::Clear { .. } => nav.clear(store),
    }
}

// ============================================================================
// AdjacencyList
// ============================================================================

pub(super) fn can_apply_adjacency(action: &AdjacencyListAction, store: &impl StoreRead) -> bool {
    let path = action.path();
    if !accepts(store, path, PrimitiveKind::IdPairSet) {
        return false;
    }
    let edges = store.try_get::<BTreeSet<IdPair>>(path.id());
    let connected = |edge: &IdPair| edges.map_or(false, |e| e.contains(edge));
    match action {
        AdjacencyListAction::Connect { edge, .. } => !connected(edge),
        AdjacencyListAction::Disconnect { edge, .. } => connected(edge),
        AdjacencyListAction::ToggleConnection { .. } => true,
        AdjacencyListAction::DisconnectOutput { node, .. } => {
            edges.map_or(false, |e| e.iter().any(|edge| edge.touches(*node)))
        }
    }
}

pub(super) fn dispatch_adjacency(action: &AdjacencyListAction, store: &mut TransientStore) {
    let graph = AdjacencyList::new(action.path().clone());
    graph.declare(store);
    match action {
        AdjacencyListAction::Connect { edge, .. } => {
            graph.connect(store, *edge);
        }
        AdjacencyListAction::Disconnect { edge, .. } => {
            graph.disconnect(store, *edge);
        }
        AdjacencyListAction::ToggleConnection { edge, .. } => {
            graph.toggle_connection(store, *edge);
        }
        AdjacencyListAction::DisconnectOutput { node, .. } => {
            let removed = graph.disconnect_output(store, *node);
            log::debug!(target: "dispatch", "disconnected {} edges of {}", removed, node);
        }
    }
}

// ============================================================================
// ChildList
// ============================================================================

pub(super) fn can_apply_child_list(action: &ChildListAction, store: &impl StoreRead) -> bool {
    let list = ChildList::new(action.path().clone());
    if !accepts(store, list.prefixes_path(), PrimitiveKind::Sequence) {
        return false;
    }
    // Read the raw elements: a typed read would panic on a non-string prefix.
    let prefixes = sequence_values(store, list.prefixes_path()).unwrap_or(&[]);
    if prefixes.iter().any(|p| p.kind() != PrimitiveKind::String) {
        return false;
    }
    match action {
        ChildListAction::Add { .. } => true,
        ChildListAction::Remove { prefix, .. } => {
            prefixes.iter().any(|p| p.as_str() == Some(prefix.as_str()))
        }
    }
}

pub(super) fn dispatch_child_list(action: &ChildListAction, store: &mut TransientStore) {
    let list = ChildList::new(action.path().clone());
    list.declare(store);
    match action {
        ChildListAction::Add { .. } => {
            let prefix = list.add(store);
            log::debug!(target: "dispatch", "allocated child {} under {}", prefix, list.path());
        }
        ChildListAction::Remove { prefix, .. } => {
            list.remove(store, prefix);
        }
    }
}
