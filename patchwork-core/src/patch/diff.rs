use std::collections::BTreeSet;

use patchwork_types::{EntityId, IdPair, Primitive, StorePath};

use super::{Patch, PatchOp};
use crate::container::ElementDiff;
use crate::store::trie::TrieDiff;
use crate::store::{Store, StoreKind, StoreRead};

/// Structural diff of two snapshots, limited to paths at or below `base`.
///
/// Each kind's tries are merge-walked in id order; subtrees the snapshots
/// share are skipped without being visited. Scalars yield Add/Remove/Replace.
/// Containers that appear or vanish yield Add/Remove of the whole value,
/// changed containers yield element ops. `create_patch(s, s, _)` is empty.
pub fn create_patch(before: &Store, after: &Store, base: &StorePath) -> Patch {
    let mut patch = Patch::new(base.id());
    if before.ptr_eq(after) {
        return patch;
    }
    diff_kind::<bool>(before, after, base, &mut patch, replace);
    diff_kind::<i32>(before, after, base, &mut patch, replace);
    diff_kind::<u32>(before, after, base, &mut patch, replace);
    diff_kind::<f32>(before, after, base, &mut patch, replace);
    diff_kind::<String>(before, after, base, &mut patch, replace);
    diff_kind::<Vec<u8>>(before, after, base, &mut patch, replace);
    diff_kind(
        before,
        after,
        base,
        &mut patch,
        <Vec<Primitive> as ElementDiff>::diff_elements,
    );
    diff_kind(
        before,
        after,
        base,
        &mut patch,
        <BTreeSet<u32> as ElementDiff>::diff_elements,
    );
    diff_kind(
        before,
        after,
        base,
        &mut patch,
        <BTreeSet<IdPair> as ElementDiff>::diff_elements,
    );
    patch
}

fn replace<T: StoreKind>(old: &T, new: &T, ops: &mut Vec<PatchOp>) {
    ops.push(PatchOp::replace(
        new.clone().into_primitive(),
        old.clone().into_primitive(),
    ));
}

fn in_scope(path: &StorePath, base: &StorePath) -> bool {
    base.is_root() || path == base || path.is_descendant_of(base)
}

fn diff_kind<T: StoreKind>(
    before: &Store,
    after: &Store,
    base: &StorePath,
    patch: &mut Patch,
    changed: fn(&T, &T, &mut Vec<PatchOp>),
) {
    before
        .typed_trie::<T>()
        .diff(after.typed_trie::<T>(), &mut |entry| {
            let (key, side) = match &entry {
                TrieDiff::Removed(k, _) => (*k, before),
                TrieDiff::Added(k, _) | TrieDiff::Both(k, _, _) => (*k, after),
            };
            let id = EntityId::new(key);
            let Some(path) = side.path_of(id) else {
                return;
            };
            if !in_scope(path, base) {
                return;
            }
            let mut ops = Vec::new();
            match entry {
                TrieDiff::Removed(_, old) => ops.push(PatchOp::remove(old.clone().into_primitive())),
                TrieDiff::Added(_, new) => ops.push(PatchOp::add(new.clone().into_primitive())),
                TrieDiff::Both(_, old, new) => {
                    if !old.value_eq(new) {
                        changed(old, new, &mut ops);
                    }
                }
            }
            for op in ops {
                patch.push(path, id, op);
            }
        });
}
