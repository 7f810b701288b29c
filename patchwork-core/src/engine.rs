//! The consumer side: owns the canonical store and everything that mutates it.
//!
//! Producers only ever hold an [`ActionSender`]. Once per application tick the
//! owner calls [`Engine::tick`], which drains the queue, applies every
//! accepted action to the transient store, commits a new snapshot, tells
//! listeners what changed and seals the active gesture once its debounce
//! window has passed.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use patchwork_types::{
    Action, ActionMoment, EntityId, HistoryAction, Primitive, ProjectAction, StorePath,
};

use crate::change::{ChangeListeners, ChangeTracker};
use crate::config::Config;
use crate::container::{AdjacencyList, ChildList, Element, IdSet, Navigable, Sequence};
use crate::dispatch::{apply_store_action, can_apply_store};
use crate::error::ProjectError;
use crate::history::{ActiveGesture, StoreHistory};
use crate::patch::{create_patch, Patch};
use crate::persistence::{self, ProjectFormat};
use crate::queue::{action_queue, ActionReceiver, ActionSender};
use crate::recent_projects::RecentProjects;
use crate::store::{Store, StoreKind, TransientStore};

// ============================================================================
// StoreBuilder
// ============================================================================

/// Declares the paths of the default store.
#[derive(Debug, Default)]
pub struct StoreBuilder {
    store: TransientStore,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value<T: StoreKind>(mut self, path: impl Into<StorePath>, value: T) -> Self {
        self.store.set(&path.into(), value);
        self
    }

    pub fn sequence<T: Element>(mut self, path: impl Into<StorePath>, values: Vec<T>) -> Self {
        let seq = Sequence::<T>::new(path);
        seq.declare(&mut self.store);
        seq.set(&mut self.store, values);
        self
    }

    pub fn id_set(mut self, path: impl Into<StorePath>) -> Self {
        IdSet::new(path).declare(&mut self.store);
        self
    }

    pub fn navigable(mut self, path: impl Into<StorePath>) -> Self {
        Navigable::<Primitive>::new(path).declare(&mut self.store);
        self
    }

    pub fn adjacency_list(mut self, path: impl Into<StorePath>) -> Self {
        AdjacencyList::new(path).declare(&mut self.store);
        self
    }

    pub fn child_list(mut self, path: impl Into<StorePath>) -> Self {
        ChildList::new(path).declare(&mut self.store);
        self
    }

    pub fn build(self) -> Store {
        self.store.into_persistent()
    }
}

// ============================================================================
// Engine
// ============================================================================

pub struct Engine {
    default_store: Store,
    store: Store,
    transient: TransientStore,
    history: StoreHistory,
    active: ActiveGesture,
    tracker: ChangeTracker,
    listeners: ChangeListeners,
    sender: ActionSender,
    receiver: ActionReceiver,
    max_records: usize,
    current_project: Option<PathBuf>,
    default_project: Option<PathBuf>,
    recent: Option<RecentProjects>,
}

impl Engine {
    /// Engine starting from `default_store`, with the history and project
    /// settings from `config`.
    pub fn new(default_store: Store, config: &Config) -> Self {
        let (sender, receiver) = action_queue();
        Self {
            store: default_store.clone(),
            transient: TransientStore::from(&default_store),
            history: StoreHistory::new(default_store.clone(), config.max_records()),
            active: ActiveGesture::new(config.gesture_duration()),
            tracker: ChangeTracker::new(),
            listeners: ChangeListeners::new(),
            sender,
            receiver,
            max_records: config.max_records(),
            current_project: None,
            default_project: config.default_project(),
            recent: None,
            default_store,
        }
    }

    /// Keep `recent` up to date (and saved) on every successful open or save.
    pub fn with_recent_projects(mut self, recent: RecentProjects) -> Self {
        self.recent = Some(recent);
        self
    }

    pub fn with_default_project(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_project = Some(path.into());
        self
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    /// A producer handle for this engine's queue.
    pub fn sender(&self) -> ActionSender {
        self.sender.clone()
    }

    /// Current committed snapshot. Cloning it is O(1).
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn default_store(&self) -> &Store {
        &self.default_store
    }

    pub fn history(&self) -> &StoreHistory {
        &self.history
    }

    pub fn active_gesture(&self) -> &ActiveGesture {
        &self.active
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn listeners_mut(&mut self) -> &mut ChangeListeners {
        &mut self.listeners
    }

    /// Whether `id` changed in the most recent commit.
    pub fn is_changed(&self, id: EntityId) -> bool {
        self.tracker.is_changed(id)
    }

    /// Whether anything below `id` changed in the most recent commit.
    pub fn has_changed_descendant(&self, id: EntityId) -> bool {
        self.tracker.has_changed_descendant(id)
    }

    pub fn latest_update_time(&self, id: EntityId) -> Option<SystemTime> {
        self.tracker.latest_update_time(id)
    }

    pub fn current_project(&self) -> Option<&Path> {
        self.current_project.as_deref()
    }

    pub fn default_project(&self) -> Option<&Path> {
        self.default_project.as_deref()
    }

    pub fn recent_projects(&self) -> Option<&RecentProjects> {
        self.recent.as_ref()
    }

    pub fn set_widget_gesturing(&mut self, gesturing: bool) {
        self.active.set_widget_gesturing(gesturing);
    }

    pub fn gesture_time_remaining(&self, now: SystemTime) -> Duration {
        self.active.time_remaining(now)
    }

    /// Whether `action` would be accepted if it were drained now.
    pub fn can_apply(&self, action: &Action) -> bool {
        match action {
            Action::Store(a) => can_apply_store(a, &self.transient),
            Action::History(HistoryAction::Undo) => {
                self.active.is_active() || self.history.can_undo()
            }
            Action::History(HistoryAction::Redo) => {
                !self.active.is_active() && self.history.can_redo()
            }
            Action::History(HistoryAction::SetIndex(index)) => *index < self.history.len(),
            Action::Project(ProjectAction::Open { path } | ProjectAction::Save { path }) => {
                ProjectFormat::from_path(path).is_ok()
            }
            Action::Project(ProjectAction::OpenEmpty) => true,
            Action::Project(ProjectAction::OpenDefault | ProjectAction::SaveDefault) => {
                self.default_project.is_some()
            }
            Action::Project(ProjectAction::SaveCurrent) => self.current_project.is_some(),
        }
    }

    // ------------------------------------------------------------------------
    // Drain
    // ------------------------------------------------------------------------

    pub fn tick(&mut self) {
        self.tick_at(SystemTime::now());
    }

    /// Drain the queue as of `now`.
    pub fn tick_at(&mut self, now: SystemTime) {
        self.tracker.clear();
        for moment in self.receiver.drain_all() {
            self.process(moment, now);
        }
        self.commit(now);
        if self.active.is_expired(now) {
            self.finalize_gesture(now);
        }
    }

    /// Drain and seal the active gesture regardless of its debounce window.
    pub fn flush(&mut self) {
        self.flush_at(SystemTime::now());
    }

    pub fn flush_at(&mut self, now: SystemTime) {
        self.tick_at(now);
        self.finalize_gesture(now);
    }

    fn process(&mut self, moment: ActionMoment, now: SystemTime) {
        match &moment.action {
            Action::Store(action) => {
                if self.active.is_expired(moment.queued_at) {
                    self.commit(now);
                    self.finalize_gesture(moment.queued_at);
                }
                if !can_apply_store(action, &self.transient) {
                    return;
                }
                apply_store_action(action, &mut self.transient);
                self.active.push(moment);
            }
            Action::History(action) => {
                let action = *action;
                self.commit(now);
                self.finalize_gesture(now);
                self.run_history(action, now);
            }
            Action::Project(action) => {
                let action = action.clone();
                self.commit(now);
                self.finalize_gesture(now);
                if let Err(e) = self.run_project(&action, now) {
                    log::error!(target: "persistence", "{:?} failed: {}", action, e);
                }
            }
        }
    }

    /// Freeze the transient into the canonical store and propagate changes.
    fn commit(&mut self, at: SystemTime) {
        let next = self.transient.persistent();
        if next.ptr_eq(&self.store) {
            return;
        }
        let patch = create_patch(&self.store, &next, &StorePath::root());
        self.store = next;
        if patch.is_empty() {
            return;
        }
        self.active.touch(patch.ids(), at);
        self.propagate(&patch, at);
    }

    fn finalize_gesture(&mut self, at: SystemTime) {
        if !self.active.is_active() {
            return;
        }
        let (gesture, updates) = self.active.take();
        let actions = gesture.len();
        if self
            .history
            .add_gesture(self.store.clone(), gesture, updates, at)
            .is_some()
        {
            log::debug!(
                target: "history",
                "record {} sealed ({} actions)",
                self.history.index(),
                actions
            );
        }
    }

    fn propagate(&mut self, patch: &Patch, at: SystemTime) {
        self.tracker.record(patch, at);
        self.listeners.notify(&self.tracker);
    }

    /// Make `store` canonical (undo, redo, load) and propagate the difference.
    fn swap_to(&mut self, store: Store, at: SystemTime) {
        let patch = create_patch(&self.store, &store, &StorePath::root());
        self.store = store;
        self.transient = TransientStore::from(&self.store);
        if !patch.is_empty() {
            self.propagate(&patch, at);
        }
    }

    // ------------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------------

    pub fn undo(&mut self) {
        self.apply_history(HistoryAction::Undo);
    }

    pub fn redo(&mut self) {
        self.apply_history(HistoryAction::Redo);
    }

    pub fn set_history_index(&mut self, index: usize) {
        self.apply_history(HistoryAction::SetIndex(index));
    }

    /// Seal pending work, then move through history right away instead of
    /// waiting for the next drain.
    fn apply_history(&mut self, action: HistoryAction) {
        let now = SystemTime::now();
        self.commit(now);
        self.finalize_gesture(now);
        self.run_history(action, now);
    }

    fn run_history(&mut self, action: HistoryAction, now: SystemTime) {
        let target = match action {
            HistoryAction::Undo => self.history.undo().cloned(),
            HistoryAction::Redo => self.history.redo().cloned(),
            HistoryAction::SetIndex(index) => self.history.set_index(index).cloned(),
        };
        match target {
            Some(store) => {
                log::debug!(target: "history", "{:?} -> record {}", action, self.history.index());
                self.swap_to(store, now);
            }
            None => log::debug!(target: "history", "{:?} rejected", action),
        }
    }

    // ------------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------------

    fn run_project(&mut self, action: &ProjectAction, now: SystemTime) -> Result<(), ProjectError> {
        match action {
            ProjectAction::Open { path } => self.load(path, now),
            ProjectAction::OpenEmpty => {
                self.reset(self.default_store.clone(), now);
                self.current_project = None;
                Ok(())
            }
            ProjectAction::OpenDefault => {
                let path = self.default_project.clone().ok_or(ProjectError::NoDefaultProject)?;
                if path.exists() {
                    self.load(&path, now)
                } else {
                    log::info!(target: "persistence", "{} does not exist yet, starting empty", path.display());
                    self.reset(self.default_store.clone(), now);
                    self.current_project = Some(path);
                    Ok(())
                }
            }
            ProjectAction::Save { path } => self.save(path),
            ProjectAction::SaveCurrent => {
                let path = self.current_project.clone().ok_or(ProjectError::NoCurrentProject)?;
                self.save(&path)
            }
            ProjectAction::SaveDefault => {
                let path = self.default_project.clone().ok_or(ProjectError::NoDefaultProject)?;
                self.save(&path)
            }
        }
    }

    /// Open `path`, replacing the store and history. On error nothing changes.
    pub fn open_project(&mut self, path: &Path) -> Result<(), ProjectError> {
        self.flush();
        self.load(path, SystemTime::now())
    }

    /// Flush pending actions and write the current state to `path`.
    pub fn save_project(&mut self, path: &Path) -> Result<(), ProjectError> {
        self.flush();
        self.save(path)
    }

    /// Drop all history and start over from the default store.
    pub fn open_empty(&mut self) {
        self.flush();
        self.reset(self.default_store.clone(), SystemTime::now());
        self.current_project = None;
    }

    fn load(&mut self, path: &Path, now: SystemTime) -> Result<(), ProjectError> {
        let history = persistence::read_project(path, &self.default_store, self.max_records)?;
        let store = history.current().store.clone();
        self.history = history;
        self.active = ActiveGesture::new(self.active.duration());
        self.swap_to(store, now);
        self.remember(path);
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<(), ProjectError> {
        persistence::write_project(path, &self.history, &self.default_store)?;
        self.remember(path);
        Ok(())
    }

    fn reset(&mut self, store: Store, now: SystemTime) {
        self.history.reset(store.clone());
        self.active = ActiveGesture::new(self.active.duration());
        self.swap_to(store, now);
    }

    fn remember(&mut self, path: &Path) {
        self.current_project = Some(path.to_path_buf());
        if let Some(recent) = &mut self.recent {
            recent.add(path);
            recent.save();
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("paths", &self.store.len())
            .field("history_index", &self.history.index())
            .field("records", &self.history.len())
            .field("current_project", &self.current_project)
            .finish()
    }
}
