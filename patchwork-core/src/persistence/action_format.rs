//! Replayable action log.
//!
//! Stores the gestures that lead from the default store to the saved state,
//! one inner array per undo step:
//!
//! ```json
//! { "format_version": 1,
//!   "gestures": [[{ "action": { "Store": ... }, "queued_at": 1700000000000 }]] }
//! ```
//!
//! A history that did not start from the default store (one opened from a
//! state file) also writes its starting snapshot under `"origin"`, in the
//! state format's nested shape, and replay starts from there instead.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check_version, parse_error, state_format, FORMAT_VERSION};
use crate::error::ProjectError;
use crate::history::Gesture;
use crate::store::Store;

#[derive(Serialize, Deserialize)]
struct ActionDocument {
    format_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    origin: Option<Value>,
    gestures: Vec<Gesture>,
}

/// A decoded action document.
#[derive(Debug)]
pub struct ActionLog {
    /// Snapshot to replay onto; `None` means the default store.
    pub origin: Option<Store>,
    pub gestures: Vec<Gesture>,
}

/// Encode `gestures`, dropping any action that is not savable.
pub fn encode<'a>(
    origin: Option<&Store>,
    gestures: impl IntoIterator<Item = &'a Gesture>,
) -> Result<String, ProjectError> {
    let gestures = gestures
        .into_iter()
        .map(|g| {
            Gesture::from_actions(
                g.actions()
                    .iter()
                    .filter(|m| m.action.is_savable())
                    .cloned()
                    .collect(),
            )
        })
        .filter(|g| !g.is_empty())
        .collect();
    let document = ActionDocument {
        format_version: FORMAT_VERSION,
        origin: origin.map(state_format::to_tree).transpose()?,
        gestures,
    };
    serde_json::to_string_pretty(&document).map_err(|e| ProjectError::InvalidState(e.to_string()))
}

pub fn decode(text: &str, source: &Path) -> Result<ActionLog, ProjectError> {
    check_version(text, source)?;
    let document: ActionDocument =
        serde_json::from_str(text).map_err(|e| parse_error(source, e))?;
    Ok(ActionLog {
        origin: document.origin.as_ref().map(state_format::from_tree).transpose()?,
        gestures: document.gestures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwork_types::{Action, ActionMoment, HistoryAction, PrimitiveAction, StorePath};
    use std::time::{Duration, UNIX_EPOCH};

    fn moment(action: Action) -> ActionMoment {
        ActionMoment::new(action, UNIX_EPOCH + Duration::from_millis(42))
    }

    #[test]
    fn structural_actions_are_not_saved() {
        let set: Action = PrimitiveAction::SetUInt {
            path: StorePath::new("/tempo"),
            value: 128,
        }
        .into();
        let mut first = Gesture::new();
        first.push(moment(set.clone()));
        first.push(moment(Action::History(HistoryAction::Undo)));
        let mut second = Gesture::new();
        second.push(moment(Action::History(HistoryAction::Redo)));

        let text = encode(None, [&first, &second]).unwrap();
        assert!(text.contains("\"queued_at\": 42"));
        assert!(!text.contains("origin"));
        let log = decode(&text, Path::new("song.pwa")).unwrap();
        assert!(log.origin.is_none());
        assert_eq!(log.gestures.len(), 1);
        assert_eq!(log.gestures[0].actions(), &[moment(set)]);
    }

    #[test]
    fn origin_snapshot_round_trips() {
        let tempo = StorePath::new("/tempo");
        let origin = Store::new().with_set(&tempo, 140u32);
        let mut gesture = Gesture::new();
        gesture.push(moment(
            PrimitiveAction::SetUInt {
                path: tempo.clone(),
                value: 128,
            }
            .into(),
        ));

        let text = encode(Some(&origin), [&gesture]).unwrap();
        assert!(text.contains("\"origin\""));
        let log = decode(&text, Path::new("song.pwa")).unwrap();
        assert_eq!(log.origin, Some(origin));
        assert_eq!(log.gestures.len(), 1);
    }

    #[test]
    fn wrong_version_is_rejected() {
        let text = r#"{"format_version":2,"gestures":[]}"#;
        assert!(matches!(
            decode(text, Path::new("song.pwa")),
            Err(ProjectError::UnsupportedVersion { found: 2, .. })
        ));
    }
}
