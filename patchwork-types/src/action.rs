//! Action types for the dispatch system.
//!
//! Actions are the only way producers mutate the store. Every variant names the
//! path it targets and carries its payload; the set is closed so the dispatcher
//! in `patchwork-core` matches it exhaustively.

use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::{EntityId, IdPair, Primitive, StorePath};

// ============================================================================
// Store actions
// ============================================================================

/// Writes to scalar paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveAction {
    SetBool { path: StorePath, value: bool },
    ToggleBool { path: StorePath },
    SetInt { path: StorePath, value: i32 },
    SetUInt { path: StorePath, value: u32 },
    SetFloat { path: StorePath, value: f32 },
    SetString { path: StorePath, value: String },
    SetBlob { path: StorePath, value: Vec<u8> },
    /// Several scalar writes applied as one action (e.g. a preset recall).
    SetMany { values: Vec<(StorePath, Primitive)> },
}

impl PrimitiveAction {
    pub fn path(&self) -> Option<&StorePath> {
        match self {
            PrimitiveAction::SetBool { path, .. }
            | PrimitiveAction::ToggleBool { path }
            | PrimitiveAction::SetInt { path, .. }
            | PrimitiveAction::SetUInt { path, .. }
            | PrimitiveAction::SetFloat { path, .. }
            | PrimitiveAction::SetString { path, .. }
            | PrimitiveAction::SetBlob { path, .. } => Some(path),
            PrimitiveAction::SetMany { .. } => None,
        }
    }
}

/// Positional edits of a `Sequence` container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SequenceAction {
    Set { path: StorePath, values: Vec<Primitive> },
    SetAt { path: StorePath, index: usize, value: Primitive },
    PushBack { path: StorePath, value: Primitive },
    PopBack { path: StorePath },
    Insert { path: StorePath, index: usize, value: Primitive },
    Erase { path: StorePath, index: usize },
    Resize { path: StorePath, len: usize, fill: Primitive },
    Clear { path: StorePath },
}

impl SequenceAction {
    pub fn path(&self) -> &StorePath {
        match self {
            SequenceAction::Set { path, .. }
            | SequenceAction::SetAt { path, .. }
            | SequenceAction::PushBack { path, .. }
            | SequenceAction::PopBack { path }
            | SequenceAction::Insert { path, .. }
            | SequenceAction::Erase { path, .. }
            | SequenceAction::Resize { path, .. }
            | SequenceAction::Clear { path } => path,
        }
    }
}

/// Membership edits of an id set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SetAction {
    Insert { path: StorePath, value: u32 },
    Erase { path: StorePath, value: u32 },
    Clear { path: StorePath },
}

impl SetAction {
    pub fn path(&self) -> &StorePath {
        match self {
            SetAction::Insert { path, .. }
            | SetAction::Erase { path, .. }
            | SetAction::Clear { path } => path,
        }
    }
}

/// Cursor-over-sequence edits (browser-style back/forward lists).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NavigableAction {
    Push { path: StorePath, value: Primitive },
    MoveTo { path: StorePath, index: usize },
    StepForward { path: StorePath },
    StepBackward { path: StorePath },
    Clear { path: StorePath },
}

impl NavigableAction {
    pub fn path(&self) -> &StorePath {
        match self {
            NavigableAction::Push { path, .. }
            | NavigableAction::MoveTo { path, .. }
            | NavigableAction::StepForward { path }
            | NavigableAction::StepBackward { path }
            | NavigableAction::Clear { path } => path,
        }
    }
}

/// Edge edits of a directed graph stored as an id-pair set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdjacencyListAction {
    Connect { path: StorePath, edge: IdPair },
    Disconnect { path: StorePath, edge: IdPair },
    ToggleConnection { path: StorePath, edge: IdPair },
    /// Remove every edge with `node` as its source or destination.
    DisconnectOutput { path: StorePath, node: EntityId },
}

impl AdjacencyListAction {
    pub fn path(&self) -> &StorePath {
        match self {
            AdjacencyListAction::Connect { path, .. }
            | AdjacencyListAction::Disconnect { path, .. }
            | AdjacencyListAction::ToggleConnection { path, .. }
            | AdjacencyListAction::DisconnectOutput { path, .. } => path,
        }
    }
}

/// Allocation and removal of child prefixes in a dynamic child collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChildListAction {
    Add { path: StorePath },
    Remove { path: StorePath, prefix: String },
}

impl ChildListAction {
    pub fn path(&self) -> &StorePath {
        match self {
            ChildListAction::Add { path } | ChildListAction::Remove { path, .. } => path,
        }
    }
}

/// Everything that writes to the store. These are the actions recorded in
/// gestures and saved in the action project format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreAction {
    Primitive(PrimitiveAction),
    Sequence(SequenceAction),
    Set(SetAction),
    Navigable(NavigableAction),
    AdjacencyList(AdjacencyListAction),
    ChildList(ChildListAction),
    /// Tear down a path of any kind (owning entity destroyed).
    Erase { path: StorePath },
}

impl StoreAction {
    pub fn path(&self) -> Option<&StorePath> {
        match self {
            StoreAction::Primitive(a) => a.path(),
            StoreAction::Sequence(a) => Some(a.path()),
            StoreAction::Set(a) => Some(a.path()),
            StoreAction::Navigable(a) => Some(a.path()),
            StoreAction::AdjacencyList(a) => Some(a.path()),
            StoreAction::ChildList(a) => Some(a.path()),
            StoreAction::Erase { path } => Some(path),
        }
    }
}

// ============================================================================
// History and project actions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryAction {
    Undo,
    Redo,
    SetIndex(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectAction {
    Open { path: PathBuf },
    OpenEmpty,
    OpenDefault,
    Save { path: PathBuf },
    SaveCurrent,
    SaveDefault,
}

// ============================================================================
// Action — top-level
// ============================================================================

/// Top-level action enum. Produced by collaborators on any thread and consumed
/// exactly once by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Store(StoreAction),
    History(HistoryAction),
    Project(ProjectAction),
}

/// Outcome of folding two adjacent gesture actions together.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionMerge {
    /// Both actions collapse into this one.
    Merged(Action),
    /// The pair has no net effect.
    Cancel,
    /// Keep both.
    Distinct,
}

impl Action {
    /// Entity id of the single path this action writes, if any.
    pub fn target(&self) -> Option<EntityId> {
        match self {
            Action::Store(a) => a.path().map(StorePath::id),
            Action::History(_) | Action::Project(_) => None,
        }
    }

    /// Store actions are recorded in gestures and written to action-format
    /// projects. History and project actions are structural and never saved.
    pub fn is_savable(&self) -> bool {
        matches!(self, Action::Store(_))
    }

    /// Fold `next`, which immediately follows `self` in a gesture, into `self`.
    pub fn merge(&self, next: &Action) -> ActionMerge {
        let (Action::Store(a), Action::Store(b)) = (self, next) else {
            return ActionMerge::Distinct;
        };
        match (a, b) {
            (StoreAction::Primitive(a), StoreAction::Primitive(b)) => merge_primitive(a, b),
            (
                StoreAction::Sequence(SequenceAction::Set { path: p1, .. }),
                StoreAction::Sequence(SequenceAction::Set { path: p2, .. }),
            ) if p1 == p2 => ActionMerge::Merged(next.clone()),
            (
                StoreAction::Sequence(SequenceAction::SetAt {
                    path: p1,
                    index: i1,
                    ..
                }),
                StoreAction::Sequence(SequenceAction::SetAt {
                    path: p2,
                    index: i2,
                    ..
                }),
            ) if p1 == p2 && i1 == i2 => ActionMerge::Merged(next.clone()),
            (
                StoreAction::Navigable(NavigableAction::MoveTo { path: p1, .. }),
                StoreAction::Navigable(NavigableAction::MoveTo { path: p2, .. }),
            ) if p1 == p2 => ActionMerge::Merged(next.clone()),
            _ => ActionMerge::Distinct,
        }
    }
}

fn merge_primitive(a: &PrimitiveAction, b: &PrimitiveAction) -> ActionMerge {
    use PrimitiveAction::*;
    let same_path = match (a.path(), b.path()) {
        (Some(p1), Some(p2)) => p1 == p2,
        _ => false,
    };
    if !same_path {
        return ActionMerge::Distinct;
    }
    match (a, b) {
        (ToggleBool { .. }, ToggleBool { .. }) => ActionMerge::Cancel,
        (SetBool { path, value }, ToggleBool { .. }) => {
            ActionMerge::Merged(Action::Store(StoreAction::Primitive(SetBool {
                path: path.clone(),
                value: !*value,
            })))
        }
        (SetBool { .. }, SetBool { .. })
        | (ToggleBool { .. }, SetBool { .. })
        | (SetInt { .. }, SetInt { .. })
        | (SetUInt { .. }, SetUInt { .. })
        | (SetFloat { .. }, SetFloat { .. })
        | (SetString { .. }, SetString { .. })
        | (SetBlob { .. }, SetBlob { .. }) => {
            ActionMerge::Merged(Action::Store(StoreAction::Primitive(b.clone())))
        }
        _ => ActionMerge::Distinct,
    }
}

impl From<StoreAction> for Action {
    fn from(action: StoreAction) -> Self {
        Action::Store(action)
    }
}

impl From<PrimitiveAction> for Action {
    fn from(action: PrimitiveAction) -> Self {
        Action::Store(StoreAction::Primitive(action))
    }
}

impl From<SequenceAction> for Action {
    fn from(action: SequenceAction) -> Self {
        Action::Store(StoreAction::Sequence(action))
    }
}

impl From<SetAction> for Action {
    fn from(action: SetAction) -> Self {
        Action::Store(StoreAction::Set(action))
    }
}

impl From<NavigableAction> for Action {
    fn from(action: NavigableAction) -> Self {
        Action::Store(StoreAction::Navigable(action))
    }
}

impl From<AdjacencyListAction> for Action {
    fn from(action: AdjacencyListAction) -> Self {
        Action::Store(StoreAction::AdjacencyList(action))
    }
}

impl From<ChildListAction> for Action {
    fn from(action: ChildListAction) -> Self {
        Action::Store(StoreAction::ChildList(action))
    }
}

impl From<HistoryAction> for Action {
    fn from(action: HistoryAction) -> Self {
        Action::History(action)
    }
}

impl From<ProjectAction> for Action {
    fn from(action: ProjectAction) -> Self {
        Action::Project(action)
    }
}

// ============================================================================
// ActionMoment — an action plus the time it was queued
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMoment {
    pub action: Action,
    #[serde(with = "system_time_ms")]
    pub queued_at: SystemTime,
}

impl ActionMoment {
    pub fn new(action: Action, queued_at: SystemTime) -> Self {
        Self { action, queued_at }
    }
}

/// Serializes a `SystemTime` as whole milliseconds since the Unix epoch.
pub mod system_time_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn set_int(path: &str, value: i32) -> Action {
        PrimitiveAction::SetInt {
            path: StorePath::new(path),
            value,
        }
        .into()
    }

    fn toggle(path: &str) -> Action {
        PrimitiveAction::ToggleBool {
            path: StorePath::new(path),
        }
        .into()
    }

    #[test]
    fn target_is_path_id() {
        let action = set_int("/mixer/volume", 3);
        assert_eq!(action.target(), Some(StorePath::new("/mixer/volume").id()));
        assert_eq!(Action::History(HistoryAction::Undo).target(), None);
        let many: Action = PrimitiveAction::SetMany { values: vec![] }.into();
        assert_eq!(many.target(), None);
    }

    #[test]
    fn only_store_actions_are_savable() {
        assert!(set_int("/a", 1).is_savable());
        assert!(!Action::History(HistoryAction::Redo).is_savable());
        assert!(!Action::Project(ProjectAction::SaveCurrent).is_savable());
    }

    #[test]
    fn repeated_sets_keep_latest() {
        assert_eq!(
            set_int("/a", 1).merge(&set_int("/a", 2)),
            ActionMerge::Merged(set_int("/a", 2))
        );
        assert_eq!(set_int("/a", 1).merge(&set_int("/b", 2)), ActionMerge::Distinct);
    }

    #[test]
    fn double_toggle_cancels() {
        assert_eq!(toggle("/a").merge(&toggle("/a")), ActionMerge::Cancel);
        assert_eq!(toggle("/a").merge(&toggle("/b")), ActionMerge::Distinct);
    }

    #[test]
    fn set_then_toggle_folds_into_set() {
        let set: Action = PrimitiveAction::SetBool {
            path: StorePath::new("/a"),
            value: true,
        }
        .into();
        let expected: Action = PrimitiveAction::SetBool {
            path: StorePath::new("/a"),
            value: false,
        }
        .into();
        assert_eq!(set.merge(&toggle("/a")), ActionMerge::Merged(expected));
    }

    #[test]
    fn set_at_merges_only_on_same_index() {
        let at = |index, value| -> Action {
            SequenceAction::SetAt {
                path: StorePath::new("/seq"),
                index,
                value: Primitive::Int(value),
            }
            .into()
        };
        assert_eq!(at(0, 1).merge(&at(0, 2)), ActionMerge::Merged(at(0, 2)));
        assert_eq!(at(0, 1).merge(&at(1, 2)), ActionMerge::Distinct);
    }

    #[test]
    fn moment_serializes_time_as_millis() {
        let moment = ActionMoment::new(
            set_int("/a", 1),
            UNIX_EPOCH + Duration::from_millis(1_500),
        );
        let json = serde_json::to_string(&moment).unwrap();
        assert!(json.contains("\"queued_at\":1500"));
        let back: ActionMoment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, moment);
    }
}
