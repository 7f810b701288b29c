use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::IdPair;

/// Every value kind the store can hold at a path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Primitive {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Float(f32),
    String(String),
    Sequence(Vec<Primitive>),
    IdSet(BTreeSet<u32>),
    IdPairSet(BTreeSet<IdPair>),
    /// Opaque collaborator snapshot (e.g. a text buffer). Diffed as a scalar.
    Blob(Vec<u8>),
}

/// Tag of a [`Primitive`]. The kind stored at a path never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Bool,
    Int,
    UInt,
    Float,
    String,
    Sequence,
    IdSet,
    IdPairSet,
    Blob,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 9] = [
        PrimitiveKind::Bool,
        PrimitiveKind::Int,
        PrimitiveKind::UInt,
        PrimitiveKind::Float,
        PrimitiveKind::String,
        PrimitiveKind::Sequence,
        PrimitiveKind::IdSet,
        PrimitiveKind::IdPairSet,
        PrimitiveKind::Blob,
    ];

    /// Containers are diffed element-by-element rather than replaced whole.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Sequence | PrimitiveKind::IdSet | PrimitiveKind::IdPairSet
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int => "int",
            PrimitiveKind::UInt => "uint",
            PrimitiveKind::Float => "float",
            PrimitiveKind::String => "string",
            PrimitiveKind::Sequence => "sequence",
            PrimitiveKind::IdSet => "id_set",
            PrimitiveKind::IdPairSet => "id_pair_set",
            PrimitiveKind::Blob => "blob",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b).is_eq(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::IdSet(a), Self::IdSet(b)) => a == b,
            (Self::IdPairSet(a), Self::IdPairSet(b)) => a == b,
            (Self::Blob(a), Self::Blob(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Primitive {}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Bool(_) => PrimitiveKind::Bool,
            Self::Int(_) => PrimitiveKind::Int,
            Self::UInt(_) => PrimitiveKind::UInt,
            Self::Float(_) => PrimitiveKind::Float,
            Self::String(_) => PrimitiveKind::String,
            Self::Sequence(_) => PrimitiveKind::Sequence,
            Self::IdSet(_) => PrimitiveKind::IdSet,
            Self::IdPairSet(_) => PrimitiveKind::IdPairSet,
            Self::Blob(_) => PrimitiveKind::Blob,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u32> {
        match self {
            Self::UInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::UInt(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::IdSet(ids) => write!(f, "{:?}", ids),
            Self::IdPairSet(pairs) => {
                let joined: Vec<String> = pairs.iter().map(|p| p.to_string()).collect();
                write!(f, "{{{}}}", joined.join(", "))
            }
            Self::Blob(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Primitive {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Primitive {
    fn from(value: u32) -> Self {
        Self::UInt(value)
    }
}

impl From<f32> for Primitive {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
