//! End-to-end tests for the write service against a real database.

use chrono::{Duration, Utc};
use taskdeck_core::db;
use taskdeck_core::model::{Priority, Status};
use taskdeck_core::service::{
    NewTask, TaskPatch, create_task, create_user, delete_user, resolve_tag, update_task,
};
use taskdeck_core::{Error, ValidationKind};

#[test]
fn create_then_patch_then_replace_tags() {
    let mut conn = db::open_in_memory().expect("open db");

    // Create with two tags and a due date five days out.
    let created = create_task(
        &mut conn,
        &NewTask {
            title: "Test Task".to_string(),
            priority: Priority::Medium,
            due_date: Some(Utc::now() + Duration::days(5)),
            tags: vec!["Urgent".to_string(), "Work".to_string()],
            ..NewTask::default()
        },
    )
    .expect("create task");

    assert_eq!(created.status, Status::Todo, "status defaults to TODO");
    assert_eq!(created.priority, Priority::Medium);
    assert_eq!(created.tags.len(), 2);
    let names: Vec<&str> = created.tags.iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"Urgent"));
    assert!(names.contains(&"Work"));

    // Patch status and priority without touching tags.
    let patched = update_task(
        &mut conn,
        created.id,
        &TaskPatch {
            status: Some(Status::InProgress),
            priority: Some(Priority::Low),
            ..TaskPatch::default()
        },
    )
    .expect("patch scalars");

    assert_eq!(patched.status, Status::InProgress);
    assert_eq!(patched.priority, Priority::Low);
    assert_eq!(patched.tags.len(), 2, "omitted tags field leaves the set");

    // Patch with an explicit tags list: full replacement.
    let replaced = update_task(
        &mut conn,
        created.id,
        &TaskPatch {
            tags: Some(vec!["Work".to_string()]),
            ..TaskPatch::default()
        },
    )
    .expect("replace tags");

    assert_eq!(replaced.tags.len(), 1);
    assert_eq!(replaced.tags[0].name, "Work");
}

#[test]
fn due_date_must_be_strictly_future() {
    let mut conn = db::open_in_memory().expect("open db");

    let ok = create_task(
        &mut conn,
        &NewTask {
            title: "future".to_string(),
            due_date: Some(Utc::now() + Duration::minutes(1)),
            ..NewTask::default()
        },
    );
    assert!(ok.is_ok());

    for offset in [Duration::zero(), -Duration::minutes(1), -Duration::days(3)] {
        let err = create_task(
            &mut conn,
            &NewTask {
                title: "stale".to_string(),
                due_date: Some(Utc::now() + offset),
                ..NewTask::default()
            },
        )
        .expect_err("non-future due date");

        assert!(matches!(
            err,
            Error::Validation {
                kind: ValidationKind::DueDateNotInFuture,
                ..
            }
        ));
    }
}

#[test]
fn timestamps_behave_across_updates() {
    let mut conn = db::open_in_memory().expect("open db");

    let created = create_task(
        &mut conn,
        &NewTask {
            title: "clockwork".to_string(),
            ..NewTask::default()
        },
    )
    .expect("create task");
    assert!(created.updated_at >= created.created_at);

    let first = update_task(
        &mut conn,
        created.id,
        &TaskPatch {
            description: Some("pass one".to_string()),
            ..TaskPatch::default()
        },
    )
    .expect("first update");

    let second = update_task(
        &mut conn,
        created.id,
        &TaskPatch {
            description: Some("pass two".to_string()),
            ..TaskPatch::default()
        },
    )
    .expect("second update");

    assert_eq!(first.created_at, created.created_at);
    assert_eq!(second.created_at, created.created_at);
    assert!(first.updated_at >= created.updated_at);
    assert!(second.updated_at >= first.updated_at);
}

#[test]
fn deleting_assignee_clears_reference_but_keeps_task() {
    let mut conn = db::open_in_memory().expect("open db");

    let user = create_user(&conn, "casey").expect("create user");
    let task = create_task(
        &mut conn,
        &NewTask {
            title: "handoff".to_string(),
            assigned_to: Some(user.id),
            ..NewTask::default()
        },
    )
    .expect("create task");
    assert_eq!(task.assigned_to, Some(user.id));

    delete_user(&conn, user.id).expect("delete user");

    let survivor = taskdeck_core::db::query::get_task(&conn, task.id)
        .expect("query task")
        .expect("task still exists");
    assert_eq!(survivor.assigned_to, None);
}

#[test]
fn update_of_missing_task_is_not_found() {
    let mut conn = db::open_in_memory().expect("open db");

    let err = update_task(&mut conn, 404, &TaskPatch::default()).expect_err("missing task");
    assert!(matches!(err, Error::NotFound { entity: "task", .. }));
}

#[test]
fn provided_null_due_date_clears_the_field() {
    let mut conn = db::open_in_memory().expect("open db");

    let created = create_task(
        &mut conn,
        &NewTask {
            title: "deadline".to_string(),
            due_date: Some(Utc::now() + Duration::days(2)),
            ..NewTask::default()
        },
    )
    .expect("create task");
    assert!(created.due_date.is_some());

    let cleared = update_task(
        &mut conn,
        created.id,
        &TaskPatch {
            due_date: Some(None),
            ..TaskPatch::default()
        },
    )
    .expect("clear due date");
    assert!(cleared.due_date.is_none());
}

#[test]
fn concurrent_resolution_converges_on_one_tag_row() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("taskdeck.sqlite3");

    // Create the schema before the writers race.
    db::open(&path).expect("initialize db");

    let mut handles = Vec::new();
    for _ in 0..4 {
        let path = path.clone();
        handles.push(std::thread::spawn(move || {
            let conn = db::open(&path).expect("open db in writer thread");
            for _ in 0..10 {
                resolve_tag(&conn, "Contended").expect("resolve tag");
            }
        }));
    }
    for handle in handles {
        handle.join().expect("writer thread");
    }

    let conn = db::open(&path).expect("reopen db");
    let rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM tags WHERE name = 'Contended'",
            [],
            |r| r.get(0),
        )
        .expect("count tags");
    assert_eq!(rows, 1);
}
