//! Typed container handles over store paths.
//!
//! A handle is just a path (and its id). Reads take any [`StoreRead`];
//! writes take the [`TransientStore`] of the current batch. Each container
//! value type also knows how to diff itself element by element and replay
//! those element ops ([`ElementDiff`]), which the patch engine relies on.

mod adjacency;
mod child_list;
mod navigable;
mod sequence;
mod set;

use patchwork_types::{EntityId, Primitive};

use crate::error::PatchError;
use crate::patch::PatchOp;
use crate::store::{ScalarKind, StoreKind};

pub use adjacency::AdjacencyList;
pub use child_list::{next_prefix, sort_prefixes, ChildList};
pub use navigable::Navigable;
pub use sequence::Sequence;
pub use set::IdSet;

/// Types a [`Sequence`] or [`Navigable`] can hold. Scalars convert to and
/// from their primitive; `Primitive` itself is the untyped element used by
/// the dispatcher.
pub trait Element: Clone {
    fn into_element(self) -> Primitive;
    fn from_element(value: &Primitive) -> Option<Self>;
}

impl<T: ScalarKind> Element for T {
    fn into_element(self) -> Primitive {
        self.into_primitive()
    }

    fn from_element(value: &Primitive) -> Option<Self> {
        T::from_primitive(value.clone())
    }
}

impl Element for Primitive {
    fn into_element(self) -> Primitive {
        self
    }

    fn from_element(value: &Primitive) -> Option<Self> {
        Some(value.clone())
    }
}

/// Element-level diff and replay for container values.
pub trait ElementDiff: StoreKind {
    /// Append the ops turning `before` into `after`.
    fn diff_elements(before: &Self, after: &Self, ops: &mut Vec<PatchOp>);

    fn apply_element_op(&mut self, id: EntityId, op: &PatchOp) -> Result<(), PatchError>;
}

fn required<'a>(
    id: EntityId,
    op: &PatchOp,
    value: &'a Option<Primitive>,
) -> Result<&'a Primitive, PatchError> {
    value.as_ref().ok_or_else(|| PatchError::MissingValue {
        id,
        op: op.kind.to_string(),
    })
}
