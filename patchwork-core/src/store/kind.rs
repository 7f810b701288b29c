use std::collections::BTreeSet;
use std::fmt;

use patchwork_types::{IdPair, Primitive, PrimitiveKind, StorePath};

use super::trie::Trie;

/// Path index entry: which path an id stands for and the kind stored there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub path: StorePath,
    pub kind: PrimitiveKind,
}

/// The per-kind tries plus the path index. Shared by [`super::Store`] and
/// [`super::TransientStore`]; cloning it is a handful of `Arc` bumps.
#[doc(hidden)]
#[derive(Debug, Clone, Default)]
pub struct Tries {
    pub(crate) bools: Trie<bool>,
    pub(crate) ints: Trie<i32>,
    pub(crate) uints: Trie<u32>,
    pub(crate) floats: Trie<f32>,
    pub(crate) strings: Trie<String>,
    pub(crate) sequences: Trie<Vec<Primitive>>,
    pub(crate) id_sets: Trie<BTreeSet<u32>>,
    pub(crate) id_pair_sets: Trie<BTreeSet<IdPair>>,
    pub(crate) blobs: Trie<Vec<u8>>,
    pub(crate) index: Trie<PathEntry>,
}

/// A Rust type that can live at a store path. One implementation per
/// [`PrimitiveKind`].
pub trait StoreKind: Clone + Default + fmt::Debug + Send + Sync + 'static {
    const KIND: PrimitiveKind;

    #[doc(hidden)]
    fn trie(tries: &Tries) -> &Trie<Self>;
    #[doc(hidden)]
    fn trie_mut(tries: &mut Tries) -> &mut Trie<Self>;

    fn into_primitive(self) -> Primitive;
    fn from_primitive(value: Primitive) -> Option<Self>;

    /// Equality used by diffing. Floats compare with `total_cmp`.
    fn value_eq(&self, other: &Self) -> bool;
}

/// Kinds that may be elements of a `Sequence`.
pub trait ScalarKind: StoreKind {}

macro_rules! store_kind {
    ($ty:ty, $kind:ident, $field:ident, |$a:ident, $b:ident| $eq:expr) => {
        impl StoreKind for $ty {
            const KIND: PrimitiveKind = PrimitiveKind::$kind;

            fn trie(tries: &Tries) -> &Trie<Self> {
                &tries.$field
            }

            fn trie_mut(tries: &mut Tries) -> &mut Trie<Self> {
                &mut tries.$field
            }

            fn into_primitive(self) -> Primitive {
                Primitive::$kind(self)
            }

            fn from_primitive(value: Primitive) -> Option<Self> {
                match value {
                    Primitive::$kind(v) => Some(v),
                    _ => None,
                }
            }

            fn value_eq(&self, other: &Self) -> bool {
                let ($a, $b) = (self, other);
                $eq
            }
        }
    };
}

store_kind!(bool, Bool, bools, |a, b| a == b);
store_kind!(i32, Int, ints, |a, b| a == b);
store_kind!(u32, UInt, uints, |a, b| a == b);
store_kind!(f32, Float, floats, |a, b| a.total_cmp(b).is_eq());
store_kind!(String, String, strings, |a, b| a == b);
store_kind!(Vec<Primitive>, Sequence, sequences, |a, b| a == b);
store_kind!(BTreeSet<u32>, IdSet, id_sets, |a, b| a == b);
store_kind!(BTreeSet<IdPair>, IdPairSet, id_pair_sets, |a, b| a == b);
store_kind!(Vec<u8>, Blob, blobs, |a, b| a == b);

impl ScalarKind for bool {}
impl ScalarKind for i32 {}
impl ScalarKind for u32 {}
impl ScalarKind for f32 {}
impl ScalarKind for String {}

/// Run `$body` with `$t` bound to the Rust type stored for `$kind`.
macro_rules! for_kind {
    ($kind:expr, $t:ident => $body:expr) => {
        match $kind {
            ::patchwork_types::PrimitiveKind::Bool => {
                type $t = bool;
                $body
            }
            ::patchwork_types::PrimitiveKind::Int => {
                type $t = i32;
                $body
            }
            ::patchwork_types::PrimitiveKind::UInt => {
                type $t = u32;
                $body
            }
            ::patchwork_types::PrimitiveKind::Float => {
                type $t = f32;
                $body
            }
            ::patchwork_types::PrimitiveKind::String => {
                type $t = ::std::string::String;
                $body
            }
            ::patchwork_types::PrimitiveKind::Sequence => {
                type $t = ::std::vec::Vec<::patchwork_types::Primitive>;
                $body
            }
            ::patchwork_types::PrimitiveKind::IdSet => {
                type $t = ::std::collections::BTreeSet<u32>;
                $body
            }
            ::patchwork_types::PrimitiveKind::IdPairSet => {
                type $t = ::std::collections::BTreeSet<::patchwork_types::IdPair>;
                $body
            }
            ::patchwork_types::PrimitiveKind::Blob => {
                type $t = ::std::vec::Vec<u8>;
                $body
            }
        }
    };
}

pub(crate) use for_kind;
