use practask::commands::*;
use practask::error::Error;
use practask::models::TaskStatus;
use practask::storage::{JsonStore, Store};
use practask::tasks::{Page, TaskFilter, TaskPatch};
use practask::tracker::{ItemPatch, TaskDraft};
use std::path::PathBuf;

const USER: &str = "local";

/// Runs `f` against a store backed by a fresh file in a temp directory.
fn with_test_db<F>(f: F)
where
    F: FnOnce(&JsonStore, PathBuf),
{
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("practask").join("db.json");
    let store = JsonStore::open(&db_path).unwrap();
    f(&store, db_path);
}

fn weekly(days: &str) -> TaskDraft {
    TaskDraft {
        task_type: Some("practice".into()),
        cycle_type: Some("weekly".into()),
        week_days: Some(days.into()),
        task_plan_date: Some("2025-03-03".into()),
        task_finish_date: Some("2025-03-16".into()),
        resource_id: Some("lesson-3".into()),
        ..TaskDraft::default()
    }
}

#[test]
fn test_add_and_reopen() {
    with_test_db(|store, path| {
        let task = cmd_add(store, USER, weekly("0,2,4"), true).unwrap();
        assert_eq!(task.task_num, 6);
        assert!(path.exists());

        let reopened = JsonStore::open(&path).unwrap();
        let db = reopened.snapshot().unwrap();
        assert_eq!(db.tasks.len(), 1);
        assert_eq!(db.tasks[0], task);
        assert_eq!(db.items_of(&task.id).count(), 6);
        assert!(db.items_of(&task.id).all(|i| i.resource_id.as_deref() == Some("lesson-3")));
    });
}

#[test]
fn test_commit_leaves_no_temp_file() {
    with_test_db(|store, path| {
        cmd_add(store, USER, weekly("1"), true).unwrap();
        let mut entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        entries.sort();
        assert_eq!(entries, vec!["db.json".to_string(), "db.json.lock".to_string()]);
    });
}

#[test]
fn test_persisted_fields_round_trip() {
    with_test_db(|store, path| {
        let task = cmd_add(store, USER, weekly("0"), true).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

        let t = &json["tasks"][0];
        for field in [
            "id", "user_id", "resource_id", "task_type", "cycle_type", "week_days", "task_plan_date",
            "task_finish_date", "task_num", "finished_task_num", "task_status", "create_date", "update_date",
        ] {
            assert!(t.get(field).is_some(), "task field {} missing", field);
        }
        assert_eq!(t["task_type"], "practice");
        assert_eq!(t["cycle_type"], "weekly");
        assert_eq!(t["task_status"], "pending");
        assert_eq!(t["id"], task.id.as_str());

        let i = &json["task_items"][0];
        for field in [
            "id", "user_id", "task_id", "resource_id", "plan_time", "begin_time", "end_time", "score",
            "create_date", "update_date",
        ] {
            assert!(i.get(field).is_some(), "item field {} missing", field);
        }
    });
}

#[test]
fn test_score_updates_progress_on_disk() {
    with_test_db(|store, path| {
        let task = cmd_add(store, USER, weekly("0,2,4"), true).unwrap();
        let ids: Vec<u64> = store.snapshot().unwrap().items_of(&task.id).map(|i| i.id).collect();

        cmd_score(store, USER, ids[0], 91.0, true).unwrap();
        cmd_score(store, USER, ids[0], 93.0, true).unwrap();
        cmd_update_item(store, USER, ids[1], ItemPatch::score(70.0), true).unwrap();

        let reopened = JsonStore::open(&path).unwrap();
        let t = reopened.snapshot().unwrap().task(&task.id).cloned().unwrap();
        assert_eq!(t.finished_task_num, 2);
        assert_eq!(t.task_num, 6);
    });
}

#[test]
fn test_edit_and_remove() {
    with_test_db(|store, _path| {
        let a = cmd_add(store, USER, weekly("3"), true).unwrap();
        let b = cmd_add(store, USER, weekly("5"), true).unwrap();

        let patch = TaskPatch { task_status: Some(TaskStatus::InProgress), ..TaskPatch::default() };
        let edited = cmd_edit(store, USER, &a.id, patch, true).unwrap();
        assert_eq!(edited.task_status, TaskStatus::InProgress);

        let removed = cmd_remove(store, USER, &[a.id.clone(), b.id.clone()], true).unwrap();
        assert_eq!(removed, 2);
        let db = store.snapshot().unwrap();
        assert!(db.tasks.is_empty());
        assert!(db.task_items.is_empty());
    });
}

#[test]
fn test_remove_item_keeps_counters() {
    with_test_db(|store, _path| {
        let task = cmd_add(store, USER, weekly("0,1"), true).unwrap();
        let first = store.snapshot().unwrap().items_of(&task.id).next().unwrap().id;
        cmd_remove_item(store, USER, first, true).unwrap();

        let t = store.snapshot().unwrap().task(&task.id).cloned().unwrap();
        assert_eq!(t.task_num, 4);
        assert_eq!(store.snapshot().unwrap().items_of(&task.id).count(), 3);
    });
}

#[test]
fn test_listing_commands_succeed() {
    with_test_db(|store, _path| {
        cmd_list(store, USER, TaskFilter::default(), Page::default()).unwrap();
        let task = cmd_add(store, USER, weekly("0"), true).unwrap();
        cmd_list(store, USER, TaskFilter::default(), Page::default()).unwrap();
        cmd_show(store, USER, &task.id, Page::default()).unwrap();
        cmd_items(store, USER, Some(&task.id), Page::default()).unwrap();
        cmd_stats(store, USER).unwrap();
        cmd_due(store, USER).unwrap();
    });
}

#[test]
fn test_errors_are_reported_not_panicked() {
    with_test_db(|store, _path| {
        let err = cmd_show(store, USER, "nope", Page::default()).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.to_string(), "task nope not found");

        let mut bad = weekly("0");
        bad.task_type = Some("karaoke".into());
        let err = cmd_add(store, USER, bad, true).unwrap_err();
        assert!(err.to_string().contains("karaoke"));
        assert!(store.snapshot().unwrap().tasks.is_empty());
    });
}

#[test]
fn test_reset() {
    with_test_db(|store, path| {
        cmd_add(store, USER, weekly("0"), true).unwrap();
        cmd_reset(store, true).unwrap();
        assert!(!path.exists());
        assert!(store.snapshot().unwrap().tasks.is_empty());
    });
}

#[test]
fn test_corrupt_database_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(JsonStore::open(&path).is_err());
}

#[test]
fn test_terminal_failures_are_errors() {
    let err = Error::Terminal(std::io::Error::new(std::io::ErrorKind::NotConnected, "no tty"));
    assert_eq!(err.to_string(), "terminal error: no tty");
    assert!(!err.is_retryable());
    assert!(std::error::Error::source(&err).is_some());
}
