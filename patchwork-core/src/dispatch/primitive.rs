use std::collections::BTreeSet;

use patchwork_types::{Primitive, PrimitiveAction, PrimitiveKind, StorePath};

use super::{accepts, holds};
use crate::store::{StoreRead, TransientStore};

pub(super) fn can_apply_primitive(action: &PrimitiveAction, store: &impl StoreRead) -> bool {
    match action {
        PrimitiveAction::SetBool { path, .. } => accepts(store, path, PrimitiveKind::Bool),
        PrimitiveAction::ToggleBool { path } => holds(store, path, PrimitiveKind::Bool),
        PrimitiveAction::SetInt { path, .. } => accepts(store, path, PrimitiveKind::Int),
        PrimitiveAction::SetUInt { path, .. } => accepts(store, path, PrimitiveKind::UInt),
        PrimitiveAction::SetFloat { path, .. } => accepts(store, path, PrimitiveKind::Float),
        PrimitiveAction::SetString { path, .. } => accepts(store, path, PrimitiveKind::String),
        PrimitiveAction::SetBlob { path, .. } => accepts(store, path, PrimitiveKind::Blob),
        PrimitiveAction::SetMany { values } => can_apply_many(values, store),
    }
}

/// Every pair must be a scalar write the store accepts. No path may appear
/// twice.
fn can_apply_many(values: &[(StorePath, Primitive)], store: &impl StoreRead) -> bool {
    let mut seen = BTreeSet::new();
    !values.is_empty()
        && values.iter().all(|(path, value)| {
            seen.insert(path.id())
                && !value.kind().is_container()
                && accepts(store, path, value.kind())
        })
}

pub(super) fn dispatch_primitive(action: &PrimitiveAction, store: &mut TransientStore) {
    match action {
        PrimitiveAction::SetBool { path, value } => store.set(path, *value),
        PrimitiveAction::ToggleBool { path } => {
            let current = *store.get::<bool>(path.id());
            store.set(path, !current);
        }
        PrimitiveAction::SetInt { path, value } => store.set(path, *value),
        PrimitiveAction::SetUInt { path, value } => store.set(path, *value),
        PrimitiveAction::SetFloat { path, value } => store.set(path, *value),
        PrimitiveAction::SetString { path, value } => store.set(path, value.clone()),
        PrimitiveAction::SetBlob { path, value } => store.set(path, value.clone()),
        PrimitiveAction::SetMany { values } => {
            for (path, value) in values {
                store.set_primitive(path, value.clone());
            }
        }
    }
}
