#![allow(dead_code)]
//! Test harness utilities for patchwork-core integration tests.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use patchwork_core::config::Config;
use patchwork_core::engine::{Engine, StoreBuilder};
use patchwork_types::{Action, Primitive, PrimitiveAction, SequenceAction, StorePath};

/// Fixed point in time, `ms` milliseconds after the epoch.
pub fn at(ms: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(ms)
}

pub fn path(p: &str) -> StorePath {
    StorePath::new(p)
}

/// A small mixer-like default store.
pub fn default_store() -> patchwork_core::Store {
    StoreBuilder::new()
        .value("/mixer/volume", 1.0f32)
        .value("/mixer/mute", false)
        .value("/title", "untitled".to_string())
        .sequence::<Primitive>("/foo/bar", vec![])
        .id_set("/selection")
        .navigable("/pages")
        .adjacency_list("/graph")
        .child_list("/tracks")
        .build()
}

/// Engine over `default_store()` with the embedded config (500ms gestures).
pub fn engine() -> Engine {
    Engine::new(default_store(), &Config::embedded())
}

pub fn set_volume(value: f32) -> Action {
    PrimitiveAction::SetFloat {
        path: path("/mixer/volume"),
        value,
    }
    .into()
}

pub fn toggle_mute() -> Action {
    PrimitiveAction::ToggleBool {
        path: path("/mixer/mute"),
    }
    .into()
}

pub fn push_back(value: i32) -> Action {
    SequenceAction::PushBack {
        path: path("/foo/bar"),
        value: value.into(),
    }
    .into()
}

/// Enqueue `action` at `ms` and drain at the same instant.
pub fn apply_at(engine: &mut Engine, action: Action, ms: u64) {
    engine.sender().enqueue_at(action, at(ms));
    engine.tick_at(at(ms));
}
