use std::path::PathBuf;

use patchwork_types::{EntityId, PrimitiveKind};
use thiserror::Error;

/// A patch that does not fit the store it is applied to.
#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    #[error("{op} on {id} carries no value")]
    MissingValue { id: EntityId, op: String },

    #[error("{op} on {id}: nothing stored there")]
    MissingEntry { id: EntityId, op: String },

    #[error("add on {0}: patch records no path for it")]
    UnknownPath(EntityId),

    #[error("{id} holds a {found}, patch expects a {expected}")]
    KindMismatch {
        id: EntityId,
        expected: PrimitiveKind,
        found: PrimitiveKind,
    },

    #[error("{op} on {id}: {kind} is not a container")]
    NotAContainer {
        id: EntityId,
        op: String,
        kind: PrimitiveKind,
    },

    #[error("index {index} out of range for {id} (len {len})")]
    IndexOutOfRange { id: EntityId, index: usize, len: usize },

    #[error("pop back on empty sequence {0}")]
    EmptySequence(EntityId),

    #[error("bad element for {id}: {reason}")]
    BadElement { id: EntityId, reason: String },
}

/// Failure to open or save a project file. Opening never leaves the engine in
/// a partially loaded state.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed project {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unrecognized project extension: {0}")]
    UnknownFormat(PathBuf),

    #[error("unsupported format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("invalid state document: {0}")]
    InvalidState(String),

    #[error("gesture {gesture}, action {action}: {reason}")]
    Replay {
        gesture: usize,
        action: usize,
        reason: String,
    },

    #[error("no current project path")]
    NoCurrentProject,

    #[error("no config directory for the default project")]
    NoDefaultProject,
}
