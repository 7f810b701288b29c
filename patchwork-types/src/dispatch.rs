//! Dispatch abstraction for submitting actions to the store engine.

use crate::Action;

/// Trait for handing actions to the store engine.
///
/// Producers (UI input, I/O callbacks, background jobs) only ever see this
/// trait; the engine's queue sender implements it. Dispatch never blocks and
/// never reports failure: rejected actions are silent no-ops on the consumer
/// side.
pub trait Dispatcher {
    fn dispatch(&self, action: Action);
}
