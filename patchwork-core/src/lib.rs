//! # patchwork-core
//!
//! Persistent application-state store with structural diffing, a concurrent
//! action queue and gesture-based undo/redo. Independent of any UI framework:
//! renderers read immutable snapshots and submit actions, nothing else.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use patchwork_core::config::Config;
//! use patchwork_core::engine::{Engine, StoreBuilder};
//! use patchwork_types::{Dispatcher, PrimitiveAction, StorePath};
//!
//! // 1. Declare the default store and build the engine
//! let defaults = StoreBuilder::new()
//!     .value("/mixer/volume", 0.8f32)
//!     .child_list("/tracks")
//!     .build();
//! let mut engine = Engine::new(defaults, &Config::load());
//!
//! // 2. Hand senders to producers on any thread
//! let tx = engine.sender();
//! tx.dispatch(PrimitiveAction::SetFloat { path: StorePath::new("/mixer/volume"), value: 0.5 }.into());
//!
//! // 3. Once per tick on the owning thread: drain, commit, notify listeners
//! engine.tick();
//! let snapshot = engine.store().clone();
//! ```
//!
//! ## Module Overview
//!
//! - [`store`]: `Store` (immutable snapshot over persistent tries) and
//!   `TransientStore` (mutable staging view for one drain)
//! - [`container`]: typed handles: `Sequence`, `IdSet`, `Navigable`,
//!   `AdjacencyList`, `ChildList`, plus the child prefix allocator
//! - [`patch`]: `create_patch`, `merge`, `apply_patch` and the `Patch` document
//! - [`queue`]: multi-producer action queue over crossbeam channels
//! - [`dispatch`]: `can_apply_store` / `apply_store_action` for the closed store actions
//! - [`history`]: gestures, debounce and the undo record list
//! - [`change`]: change tracking and listener notification after each commit
//! - [`engine`]: the consumer that ties everything together
//! - [`persistence`]: `.pws` state snapshots and `.pwa` action logs
//! - [`config`]: TOML configuration (embedded defaults + user override)
//! - [`recent_projects`]: most-recently-used project list

pub mod change;
pub mod config;
pub mod container;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod history;
pub mod patch;
pub mod persistence;
pub mod queue;
pub mod recent_projects;
pub mod store;

pub use engine::{Engine, StoreBuilder};
pub use error::{PatchError, ProjectError};
pub use store::{Store, StoreRead, TransientStore};
