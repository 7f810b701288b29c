//! Project files.
//!
//! Two formats, told apart by extension: `.pws` holds a snapshot of the
//! store, `.pwa` holds the gestures that rebuild it from the default store.
//! Loading builds a complete [`StoreHistory`] off to the side; callers swap it
//! in only once everything parsed and replayed.

pub mod action_format;
pub mod state_format;

use std::path::Path;
use std::time::SystemTime;

use serde::Deserialize;

use patchwork_types::{Action, StorePath};

use crate::dispatch::{apply_store_action, can_apply_store};
use crate::error::ProjectError;
use crate::history::{Gesture, StoreHistory};
use crate::patch::create_patch;
use crate::store::{Store, TransientStore};

pub const FORMAT_VERSION: u32 = 1;

pub const STATE_EXTENSION: &str = "pws";
pub const ACTION_EXTENSION: &str = "pwa";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFormat {
    /// Nested snapshot of the store.
    State,
    /// Replayable gestures.
    Actions,
}

impl ProjectFormat {
    pub fn from_path(path: &Path) -> Result<Self, ProjectError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(STATE_EXTENSION) => Ok(ProjectFormat::State),
            Some(ACTION_EXTENSION) => Ok(ProjectFormat::Actions),
            _ => Err(ProjectError::UnknownFormat(path.to_path_buf())),
        }
    }
}

#[derive(Deserialize)]
struct Header {
    format_version: u32,
}

fn check_version(text: &str, source: &Path) -> Result<(), ProjectError> {
    let header: Header = serde_json::from_str(text).map_err(|e| parse_error(source, e))?;
    if header.format_version != FORMAT_VERSION {
        return Err(ProjectError::UnsupportedVersion {
            found: header.format_version,
            expected: FORMAT_VERSION,
        });
    }
    Ok(())
}

fn parse_error(source: &Path, e: serde_json::Error) -> ProjectError {
    ProjectError::Parse {
        path: source.to_path_buf(),
        source: e,
    }
}

/// Read `path` into a fresh history. Action files replay onto `default`.
pub fn read_project(
    path: &Path,
    default: &Store,
    max_records: usize,
) -> Result<StoreHistory, ProjectError> {
    let format = ProjectFormat::from_path(path)?;
    let text = std::fs::read_to_string(path).map_err(|e| ProjectError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let history = match format {
        ProjectFormat::State => StoreHistory::new(state_format::decode(&text, path)?, max_records),
        ProjectFormat::Actions => {
            let log = action_format::decode(&text, path)?;
            let origin = log.origin.as_ref().unwrap_or(default);
            replay(origin, log.gestures, max_records)?
        }
    };
    log::info!(
        target: "persistence",
        "loaded {} ({} records)",
        path.display(),
        history.len()
    );
    Ok(history)
}

/// Write the current record of `history` to `path` in the format its
/// extension names. An action file carries the history's origin unless it
/// is `default`, the store replay falls back to.
pub fn write_project(
    path: &Path,
    history: &StoreHistory,
    default: &Store,
) -> Result<(), ProjectError> {
    let text = match ProjectFormat::from_path(path)? {
        ProjectFormat::State => state_format::encode(&history.current().store)?,
        ProjectFormat::Actions => {
            let origin = Some(history.origin()).filter(|origin| *origin != default);
            action_format::encode(origin, history.gestures())?
        }
    };
    let io_error = |e: std::io::Error| ProjectError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, text).map_err(io_error)?;
    log::info!(target: "persistence", "saved {}", path.display());
    Ok(())
}

/// Rebuild a history by dispatching each gesture onto `default`, one record
/// per gesture. Any action the dispatcher rejects fails the whole replay.
pub fn replay(
    default: &Store,
    gestures: Vec<Gesture>,
    max_records: usize,
) -> Result<StoreHistory, ProjectError> {
    let mut history = StoreHistory::new(default.clone(), max_records);
    for (g, gesture) in gestures.into_iter().enumerate() {
        let mut transient = TransientStore::from(&history.current().store);
        let mut committed = None;
        for (a, moment) in gesture.actions().iter().enumerate() {
            let Action::Store(action) = &moment.action else {
                return Err(ProjectError::Replay {
                    gesture: g,
                    action: a,
                    reason: "not a store action".to_string(),
                });
            };
            if !can_apply_store(action, &transient) {
                return Err(ProjectError::Replay {
                    gesture: g,
                    action: a,
                    reason: format!("rejected {:?}", action),
                });
            }
            apply_store_action(action, &mut transient);
            committed = Some(moment.queued_at);
        }
        let committed = committed.unwrap_or_else(SystemTime::now);
        let store = transient.into_persistent();
        let patch = create_patch(&history.current().store, &store, &StorePath::root());
        let updates = patch.ids().map(|id| (id, committed)).collect();
        history.add_gesture(store, gesture, updates, committed);
    }
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreRead;
    use patchwork_types::{ActionMoment, HistoryAction, Primitive, PrimitiveAction};
    use std::path::PathBuf;
    use std::time::UNIX_EPOCH;

    fn gesture(actions: Vec<Action>) -> Gesture {
        Gesture::from_actions(
            actions
                .into_iter()
                .map(|a| ActionMoment::new(a, UNIX_EPOCH))
                .collect(),
        )
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            ProjectFormat::from_path(Path::new("a/b.pws")).unwrap(),
            ProjectFormat::State
        );
        assert_eq!(
            ProjectFormat::from_path(Path::new("b.pwa")).unwrap(),
            ProjectFormat::Actions
        );
        assert!(matches!(
            ProjectFormat::from_path(Path::new("b.json")),
            Err(ProjectError::UnknownFormat(p)) if p == PathBuf::from("b.json")
        ));
    }

    #[test]
    fn replay_records_one_entry_per_gesture() {
        let x = StorePath::new("/x");
        let default = Store::new().with_set(&x, 0i32);
        let gestures = vec![
            gesture(vec![PrimitiveAction::SetInt { path: x.clone(), value: 1 }.into()]),
            gesture(vec![PrimitiveAction::SetInt { path: x.clone(), value: 2 }.into()]),
        ];
        let history = replay(&default, gestures, 100).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(*history.current().store.get::<i32>(x.id()), 2);
    }

    #[test]
    fn replay_fails_on_rejected_action() {
        let gestures = vec![gesture(vec![PrimitiveAction::ToggleBool {
            path: StorePath::new("/missing"),
        }
        .into()])];
        assert!(matches!(
            replay(&Store::new(), gestures, 100),
            Err(ProjectError::Replay { gesture: 0, action: 0, .. })
        ));
        let gestures = vec![gesture(vec![Action::History(HistoryAction::Undo)])];
        assert!(matches!(
            replay(&Store::new(), gestures, 100),
            Err(ProjectError::Replay { .. })
        ));
    }

    #[test]
    fn replay_rejects_set_many_with_repeated_path() {
        let fresh = StorePath::new("/fresh");
        let gestures = vec![gesture(vec![PrimitiveAction::SetMany {
            values: vec![
                (fresh.clone(), Primitive::Int(1)),
                (fresh, Primitive::Bool(true)),
            ],
        }
        .into()])];
        assert!(matches!(
            replay(&Store::new(), gestures, 100),
            Err(ProjectError::Replay { gesture: 0, action: 0, .. })
        ));
    }

    #[test]
    fn action_file_keeps_a_non_default_origin() {
        let x = StorePath::new("/x");
        let y = StorePath::new("/y");
        let default = Store::new().with_set(&x, 0i32).with_set(&y, 0i32);
        let loaded = default.with_set(&x, 5i32);
        let history = replay(
            &loaded,
            vec![gesture(vec![PrimitiveAction::SetInt { path: y.clone(), value: 1 }.into()])],
            100,
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("song.pwa");
        write_project(&file, &history, &default).unwrap();
        let reopened = read_project(&file, &default, 100).unwrap();
        assert_eq!(*reopened.current().store.get::<i32>(x.id()), 5);
        assert_eq!(*reopened.current().store.get::<i32>(y.id()), 1);
        assert!(*reopened.origin() == loaded);

        // A history that starts from the default store writes no origin.
        let plain = StoreHistory::new(default.clone(), 100);
        write_project(&file, &plain, &default).unwrap();
        let text = std::fs::read_to_string(&file).unwrap();
        assert!(!text.contains("origin"));
    }
}
