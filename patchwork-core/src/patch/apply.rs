use std::collections::BTreeSet;

use patchwork_types::{EntityId, IdPair, Primitive, PrimitiveKind};

use super::{Patch, PatchOp, PatchOpKind};
use crate::container::ElementDiff;
use crate::error::PatchError;
use crate::store::{StoreRead, TransientStore};

/// Replay `patch` onto `store`, op by op in id order.
///
/// Stops at the first op that does not fit the store. Ops before it have
/// already been applied, so callers that need all-or-nothing apply to a
/// scratch transient.
pub fn apply_patch(store: &mut TransientStore, patch: &Patch) -> Result<(), PatchError> {
    for (id, ops) in &patch.ops {
        for op in ops {
            apply_op(store, patch, *id, op)?;
        }
    }
    Ok(())
}

fn value(id: EntityId, op: &PatchOp) -> Result<&Primitive, PatchError> {
    op.value.as_ref().ok_or_else(|| PatchError::MissingValue {
        id,
        op: op.kind.to_string(),
    })
}

fn existing_kind(store: &TransientStore, id: EntityId, op: &PatchOp) -> Result<PrimitiveKind, PatchError> {
    store.kind_of(id).ok_or_else(|| PatchError::MissingEntry {
        id,
        op: op.kind.to_string(),
    })
}

fn apply_op(
    store: &mut TransientStore,
    patch: &Patch,
    id: EntityId,
    op: &PatchOp,
) -> Result<(), PatchError> {
    match op.kind {
        PatchOpKind::Add => {
            let value = value(id, op)?;
            if let Some(found) = store.kind_of(id) {
                if found != value.kind() {
                    return Err(PatchError::KindMismatch {
                        id,
                        expected: value.kind(),
                        found,
                    });
                }
            }
            let path = patch.path_of(id).ok_or(PatchError::UnknownPath(id))?;
            store.set_primitive(path, value.clone());
        }
        PatchOpKind::Remove => {
            if !store.erase_path(id) {
                return Err(PatchError::MissingEntry {
                    id,
                    op: op.kind.to_string(),
                });
            }
        }
        PatchOpKind::Replace => {
            let value = value(id, op)?;
            let found = existing_kind(store, id, op)?;
            if found != value.kind() {
                return Err(PatchError::KindMismatch {
                    id,
                    expected: value.kind(),
                    found,
                });
            }
            let path = match store.path_of(id) {
                Some(path) => path.clone(),
                None => return Err(PatchError::UnknownPath(id)),
            };
            store.set_primitive(&path, value.clone());
        }
        PatchOpKind::Insert
        | PatchOpKind::Erase
        | PatchOpKind::PushBack
        | PatchOpKind::PopBack
        | PatchOpKind::Set(_) => match existing_kind(store, id, op)? {
            PrimitiveKind::Sequence => apply_element::<Vec<Primitive>>(store, id, op)?,
            PrimitiveKind::IdSet => apply_element::<BTreeSet<u32>>(store, id, op)?,
            PrimitiveKind::IdPairSet => apply_element::<BTreeSet<IdPair>>(store, id, op)?,
            kind => {
                return Err(PatchError::NotAContainer {
                    id,
                    op: op.kind.to_string(),
                    kind,
                })
            }
        },
    }
    Ok(())
}

fn apply_element<T: ElementDiff>(
    store: &mut TransientStore,
    id: EntityId,
    op: &PatchOp,
) -> Result<(), PatchError> {
    match store.get_mut::<T>(id) {
        Some(container) => container.apply_element_op(id, op),
        None => Err(PatchError::MissingEntry {
            id,
            op: op.kind.to_string(),
        }),
    }
}
