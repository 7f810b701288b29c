mod common;

use std::time::UNIX_EPOCH;

use common::{apply_at, at, engine, path, push_back, set_volume, toggle_mute};
use patchwork_core::history::Gesture;
use patchwork_core::persistence::action_format;
use patchwork_core::recent_projects::RecentProjects;
use patchwork_core::{ProjectError, StoreRead};
use patchwork_types::{Action, ActionMoment, PrimitiveAction, ProjectAction};

fn edited_engine() -> patchwork_core::Engine {
    let mut engine = engine();
    apply_at(&mut engine, set_volume(0.5), 0);
    engine.tick_at(at(1000));
    apply_at(&mut engine, push_back(4), 2000);
    apply_at(&mut engine, toggle_mute(), 2100);
    engine.flush_at(at(2200));
    engine
}

#[test]
fn test_state_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("song.pws");
    let mut engine = edited_engine();
    engine.save_project(&file).unwrap();
    assert_eq!(engine.current_project(), Some(file.as_path()));

    let mut reopened = common::engine();
    reopened.open_project(&file).unwrap();
    assert!(*reopened.store() == *engine.store());
    assert_eq!(reopened.history().len(), 1);
    assert!(!reopened.history().can_undo());
    assert_eq!(reopened.current_project(), Some(file.as_path()));
}

#[test]
fn test_action_file_roundtrip_keeps_undo_steps() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("nested/song.pwa");
    let mut engine = edited_engine();
    engine.save_project(&file).unwrap();

    let mut reopened = common::engine();
    reopened.open_project(&file).unwrap();
    assert!(*reopened.store() == *engine.store());
    assert_eq!(reopened.history().len(), engine.history().len());

    reopened.undo();
    assert_eq!(*reopened.store().get::<f32>(path("/mixer/volume").id()), 0.5);
    assert!(!*reopened.store().get::<bool>(path("/mixer/mute").id()));
}

#[test]
fn test_action_file_saves_only_up_to_current_record() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("song.pwa");
    let mut engine = edited_engine();
    engine.undo();
    engine.save_project(&file).unwrap();

    let mut reopened = common::engine();
    reopened.open_project(&file).unwrap();
    assert_eq!(reopened.history().len(), 2);
    assert!(*reopened.store() == *engine.store());
}

#[test]
fn test_malformed_file_leaves_engine_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("broken.pws");
    std::fs::write(&file, "{ not json").unwrap();

    let mut engine = edited_engine();
    let before = engine.store().clone();
    let records = engine.history().len();
    let err = engine.open_project(&file).unwrap_err();
    assert!(matches!(err, ProjectError::Parse { .. }));
    assert!(*engine.store() == before);
    assert_eq!(engine.history().len(), records);
    assert_eq!(engine.current_project(), None);
}

#[test]
fn test_rejected_replay_leaves_engine_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("bad.pwa");
    let bogus = Gesture::from_actions(vec![ActionMoment::new(
        PrimitiveAction::ToggleBool {
            path: path("/not/declared"),
        }
        .into(),
        UNIX_EPOCH,
    )]);
    std::fs::write(&file, action_format::encode(None, [&bogus]).unwrap()).unwrap();

    let mut engine = edited_engine();
    let before = engine.store().clone();
    let err = engine.open_project(&file).unwrap_err();
    assert!(matches!(err, ProjectError::Replay { gesture: 0, action: 0, .. }));
    assert!(*engine.store() == before);
}

#[test]
fn test_missing_and_unknown_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine();
    assert!(matches!(
        engine.open_project(&dir.path().join("missing.pws")),
        Err(ProjectError::Io { .. })
    ));
    assert!(matches!(
        engine.save_project(&dir.path().join("song.txt")),
        Err(ProjectError::UnknownFormat(_))
    ));
}

#[test]
fn test_queued_project_actions() {
    let dir = tempfile::tempdir().unwrap();
    let default_file = dir.path().join("default.pws");
    let mut engine = common::engine().with_default_project(&default_file);
    let tx = engine.sender();

    // No file yet: starts from the default store and adopts the path
    tx.enqueue_at(Action::Project(ProjectAction::OpenDefault), at(0));
    engine.tick_at(at(0));
    assert_eq!(engine.current_project(), Some(default_file.as_path()));
    assert!(!default_file.exists());

    apply_at(&mut engine, set_volume(0.5), 100);
    tx.enqueue_at(Action::Project(ProjectAction::SaveCurrent), at(200));
    engine.tick_at(at(200));
    assert!(default_file.exists());
    assert_eq!(engine.history().len(), 2);

    tx.enqueue_at(Action::Project(ProjectAction::OpenEmpty), at(300));
    engine.tick_at(at(300));
    assert_eq!(engine.current_project(), None);
    assert_eq!(engine.history().len(), 1);
    assert_eq!(*engine.store().get::<f32>(path("/mixer/volume").id()), 1.0);

    tx.enqueue_at(Action::Project(ProjectAction::OpenDefault), at(400));
    engine.tick_at(at(400));
    assert_eq!(*engine.store().get::<f32>(path("/mixer/volume").id()), 0.5);
}

#[test]
fn test_save_current_without_project_is_rejected() {
    let engine = engine();
    assert!(!engine.can_apply(&Action::Project(ProjectAction::SaveCurrent)));
    assert!(engine.can_apply(&Action::Project(ProjectAction::OpenEmpty)));
}

#[test]
fn test_action_file_after_state_load_keeps_loaded_state() {
    let dir = tempfile::tempdir().unwrap();
    let state_file = dir.path().join("song.pws");
    let action_file = dir.path().join("song.pwa");

    let mut engine = engine();
    apply_at(&mut engine, set_volume(0.25), 0);
    engine.save_project(&state_file).unwrap();

    let mut edited = common::engine();
    edited.open_project(&state_file).unwrap();
    apply_at(
        &mut edited,
        PrimitiveAction::SetString {
            path: path("/title"),
            value: "take two".to_string(),
        }
        .into(),
        1000,
    );
    edited.save_project(&action_file).unwrap();

    let mut reopened = common::engine();
    reopened.open_project(&action_file).unwrap();
    assert!(*reopened.store() == *edited.store());
    assert_eq!(*reopened.store().get::<f32>(path("/mixer/volume").id()), 0.25);
    assert_eq!(reopened.store().get::<String>(path("/title").id()), "take two");

    // Undo lands on the loaded state, not the default store.
    reopened.undo();
    assert_eq!(*reopened.store().get::<f32>(path("/mixer/volume").id()), 0.25);
    assert_eq!(reopened.store().get::<String>(path("/title").id()), "untitled");
}

#[test]
fn test_open_and_save_update_recent_projects() {
    let dir = tempfile::tempdir().unwrap();
    let recent_file = dir.path().join("config/recent.json");
    let first = dir.path().join("first.pws");
    let second = dir.path().join("second.pwa");

    let mut engine = common::engine().with_recent_projects(RecentProjects::load_from(&recent_file, 5));
    engine.save_project(&first).unwrap();
    engine.save_project(&second).unwrap();
    engine.open_project(&first).unwrap();

    let recent = engine.recent_projects().unwrap();
    let names: Vec<&str> = recent.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);

    let stored = RecentProjects::load_from(&recent_file, 5);
    assert_eq!(stored.most_recent().map(|e| e.path.as_path()), Some(first.as_path()));
    assert_eq!(stored.entries.len(), 2);

    // A failed open is not remembered.
    assert!(engine.open_project(&dir.path().join("missing.pws")).is_err());
    assert_eq!(engine.recent_projects().unwrap().entries.len(), 2);
}

