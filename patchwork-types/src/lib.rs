//! # patchwork-types
//!
//! Shared type definitions for the patchwork state store.
//! This crate contains the data structures that producers (UI, I/O callbacks,
//! background jobs) and the store engine in `patchwork-core` both speak:
//! paths and entity ids, primitive values, and the closed action vocabulary.

pub mod action;
pub mod dispatch;
mod id;
mod path;
mod primitive;

pub use action::*;
pub use dispatch::Dispatcher;
pub use id::{EntityId, IdPair};
pub use path::StorePath;
pub use primitive::{Primitive, PrimitiveKind};
