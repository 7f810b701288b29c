use std::collections::BTreeSet;

use patchwork_types::EntityId;

use super::{Patch, PatchOp, PatchOpKind};

enum Collapse {
    Cancel,
    Op(PatchOp),
}

/// Fold `b` into `a`, where `a` happened first.
///
/// Ids present in only one patch copy through. When both patches hold a
/// single whole-value op (Add/Remove/Replace) for an id, the pair collapses
/// into at most one op by net effect:
///
/// - Add then Remove cancels; Add then Add/Replace stays an Add of the new
///   value, since the path did not exist before `a`.
/// - Remove or Replace followed by a write cancels when the write restores
///   the original old value, and is otherwise a Replace keeping that old value.
/// - Replace then Remove is a Remove of the original old value.
///
/// Anything involving several ops or container element ops is concatenated,
/// `a` before `b`, which stays correct but may under-compress.
pub fn merge(a: &Patch, b: &Patch) -> Patch {
    let mut out = Patch::new(a.base_id);
    let ids: BTreeSet<EntityId> = a.ops.keys().chain(b.ops.keys()).copied().collect();
    for id in ids {
        let ops = match (a.ops.get(&id), b.ops.get(&id)) {
            (Some(ops), None) | (None, Some(ops)) => ops.clone(),
            (Some(first), Some(second)) => merge_ops(first, second),
            (None, None) => continue,
        };
        if ops.is_empty() {
            continue;
        }
        if let Some(path) = b.paths.get(&id).or_else(|| a.paths.get(&id)) {
            out.paths.insert(id, path.clone());
        }
        out.ops.insert(id, ops);
    }
    out
}

fn merge_ops(a: &[PatchOp], b: &[PatchOp]) -> Vec<PatchOp> {
    if let ([first], [second]) = (a, b) {
        match collapse(first, second) {
            Some(Collapse::Cancel) => return Vec::new(),
            Some(Collapse::Op(op)) => return vec![op],
            None => {}
        }
    }
    a.iter().chain(b).cloned().collect()
}

/// `None` when the pair is not two whole-value ops.
fn collapse(a: &PatchOp, b: &PatchOp) -> Option<Collapse> {
    use PatchOpKind::*;

    if a.kind.is_element_op() || b.kind.is_element_op() {
        return None;
    }
    let replaced = || {
        if b.value == a.old {
            Collapse::Cancel
        } else {
            Collapse::Op(PatchOp {
                kind: Replace,
                value: b.value.clone(),
                old: a.old.clone(),
            })
        }
    };
    let collapsed = match (a.kind, b.kind) {
        (Add, Remove) => Collapse::Cancel,
        (Add, _) => Collapse::Op(PatchOp {
            kind: Add,
            value: b.value.clone(),
            old: None,
        }),
        // Removing twice should not happen; keep the first removal.
        (Remove, Remove) => Collapse::Op(a.clone()),
        (Replace, Remove) => Collapse::Op(PatchOp {
            kind: Remove,
            value: None,
            old: a.old.clone(),
        }),
        (Remove, _) | (Replace, _) => replaced(),
        _ => return None,
    };
    Some(collapsed)
}
