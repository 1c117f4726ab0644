//! The task write service.
//!
//! Create/update/delete of tasks together with their tag associations. Every
//! mutating operation runs inside a single transaction: concurrent readers
//! never observe a half-applied update (in particular, never an empty tag
//! set in the middle of a tag replacement).

use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::debug;

use crate::db::query::{self, datetime_to_micros};
use crate::error::{Error, Result, ValidationKind};
use crate::model::{Priority, Status, Tag, Task, User};
use crate::validate;

/// Input for [`create_task`]. Scalar fields default like the schema does.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub due_date: Option<chrono::DateTime<Utc>>,
    pub assigned_to: Option<i64>,
    /// Tag names to resolve and attach; duplicates collapse.
    pub tags: Vec<String>,
}

/// Input for [`update_task`]. Absent fields are left unchanged.
///
/// The double `Option` on `due_date` and `assigned_to` distinguishes
/// "not provided" (outer `None`) from "provided as null" (inner `None`,
/// which clears the field). A provided `tags` list replaces the whole tag
/// set; partial tag patching is deliberately out of scope.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<chrono::DateTime<Utc>>>,
    pub assigned_to: Option<Option<i64>>,
    pub tags: Option<Vec<String>>,
}

/// Return the existing tag with this name, or atomically insert one.
///
/// Upsert rather than read-then-write: two writers racing on the same name
/// converge on the single row guarded by the UNIQUE constraint. Safe to call
/// repeatedly; always resolves to the same underlying record.
///
/// # Errors
///
/// Returns an error only on underlying storage failure.
pub fn resolve_tag(conn: &Connection, name: &str) -> Result<Tag> {
    conn.execute(
        "INSERT INTO tags (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
        params![name],
    )?;

    let tag = conn.query_row(
        "SELECT tag_id, name FROM tags WHERE name = ?1",
        params![name],
        |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )?;
    Ok(tag)
}

fn attach_tag(conn: &Connection, task_id: i64, tag_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES (?1, ?2)",
        params![task_id, tag_id],
    )?;
    Ok(())
}

fn ensure_user_exists(conn: &Connection, user_id: i64) -> Result<()> {
    query::get_user(conn, user_id)?
        .map(|_| ())
        .ok_or_else(|| Error::not_found("user", user_id))
}

/// Create a task with the given scalar fields and resolve-and-attach its
/// tags, all in one transaction.
///
/// # Errors
///
/// Returns `Validation` if the title or any tag name is blank or the due
/// date is not strictly in the future, `NotFound` if `assigned_to`
/// references a missing user, or `Storage` on persistence failure. On any
/// error nothing is persisted.
pub fn create_task(conn: &mut Connection, input: &NewTask) -> Result<Task> {
    let now = Utc::now();
    validate::check_non_blank("title", &input.title)?;
    for name in &input.tags {
        validate::check_non_blank("tag name", name)?;
    }
    validate::check_due_date(input.due_date, now)?;

    let tx = conn.transaction()?;

    if let Some(user_id) = input.assigned_to {
        ensure_user_exists(&tx, user_id)?;
    }

    let now_us = datetime_to_micros(now);
    tx.execute(
        "INSERT INTO tasks (title, description, status, priority, due_date_us,
                            assigned_to, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            input.title,
            input.description,
            input.status.as_str(),
            input.priority.as_str(),
            input.due_date.map(datetime_to_micros),
            input.assigned_to,
            now_us
        ],
    )?;
    let task_id = tx.last_insert_rowid();

    for name in &input.tags {
        let tag = resolve_tag(&tx, name)?;
        attach_tag(&tx, task_id, tag.id)?;
    }

    let task =
        query::get_task(&tx, task_id)?.ok_or_else(|| Error::not_found("task", task_id))?;

    tx.commit()?;
    debug!(task_id, title = %task.title, "created task");
    Ok(task)
}

/// Apply a partial update to an existing task.
///
/// Provided scalar fields overwrite; a provided `tags` list replaces the
/// whole tag set (clear, then resolve-and-attach). `updated_at` is refreshed
/// on any successful update. The whole update commits or none of it does.
///
/// # Errors
///
/// Returns `NotFound` if the task (or a newly assigned user) does not exist,
/// `Validation` for a provided blank title or tag name or a due date not
/// strictly in the future, or `Storage` on persistence failure.
pub fn update_task(conn: &mut Connection, task_id: i64, patch: &TaskPatch) -> Result<Task> {
    let now = Utc::now();
    if let Some(ref title) = patch.title {
        validate::check_non_blank("title", title)?;
    }
    if let Some(ref names) = patch.tags {
        for name in names {
            validate::check_non_blank("tag name", name)?;
        }
    }
    if let Some(due_date) = patch.due_date {
        validate::check_due_date(due_date, now)?;
    }

    let tx = conn.transaction()?;

    let existing =
        query::get_task(&tx, task_id)?.ok_or_else(|| Error::not_found("task", task_id))?;

    if let Some(Some(user_id)) = patch.assigned_to {
        ensure_user_exists(&tx, user_id)?;
    }

    let title = patch.title.as_ref().unwrap_or(&existing.title);
    let description = patch.description.as_ref().unwrap_or(&existing.description);
    let status = patch.status.unwrap_or(existing.status);
    let priority = patch.priority.unwrap_or(existing.priority);
    let due_date = patch.due_date.unwrap_or(existing.due_date);
    let assigned_to = patch.assigned_to.unwrap_or(existing.assigned_to);

    // updated_at must never fall below created_at, even if the wall clock
    // stepped backwards between the two writes.
    let updated_us = datetime_to_micros(now).max(datetime_to_micros(existing.created_at));

    tx.execute(
        "UPDATE tasks
         SET title = ?1, description = ?2, status = ?3, priority = ?4,
             due_date_us = ?5, assigned_to = ?6, updated_at_us = ?7
         WHERE task_id = ?8",
        params![
            title,
            description,
            status.as_str(),
            priority.as_str(),
            due_date.map(datetime_to_micros),
            assigned_to,
            updated_us,
            task_id
        ],
    )?;

    if let Some(ref names) = patch.tags {
        // Replace, not merge: clear the current set, then re-resolve.
        tx.execute("DELETE FROM task_tags WHERE task_id = ?1", params![task_id])?;
        for name in names {
            let tag = resolve_tag(&tx, name)?;
            attach_tag(&tx, task_id, tag.id)?;
        }
    }

    let task =
        query::get_task(&tx, task_id)?.ok_or_else(|| Error::not_found("task", task_id))?;

    tx.commit()?;
    debug!(task_id, "updated task");
    Ok(task)
}

/// Delete a task; its tag associations cascade away with it.
///
/// # Errors
///
/// Returns `NotFound` if no task has this id.
pub fn delete_task(conn: &Connection, task_id: i64) -> Result<()> {
    let rows = conn.execute("DELETE FROM tasks WHERE task_id = ?1", params![task_id])?;
    if rows == 0 {
        return Err(Error::not_found("task", task_id));
    }
    debug!(task_id, "deleted task");
    Ok(())
}

/// Delete a tag by explicit request; it is detached from all tasks.
///
/// # Errors
///
/// Returns `NotFound` if no tag has this id.
pub fn delete_tag(conn: &Connection, tag_id: i64) -> Result<()> {
    let rows = conn.execute("DELETE FROM tags WHERE tag_id = ?1", params![tag_id])?;
    if rows == 0 {
        return Err(Error::not_found("tag", tag_id));
    }
    debug!(tag_id, "deleted tag");
    Ok(())
}

/// Create an identity record.
///
/// Uniqueness is enforced by the schema, not a pre-read: a racing insert of
/// the same username loses at the UNIQUE constraint and is reported as a
/// validation failure, never a storage one.
///
/// # Errors
///
/// Returns `Validation` of kind `DuplicateUsername` when the username is
/// already taken, or `Storage` on any other persistence failure.
pub fn create_user(conn: &Connection, username: &str) -> Result<User> {
    let inserted = conn.execute("INSERT INTO users (username) VALUES (?1)", params![username]);
    match inserted {
        Ok(_) => Ok(User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
        }),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Err(Error::validation(
                ValidationKind::DuplicateUsername,
                format!("username '{username}' is already taken"),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete an identity record.
///
/// Tasks assigned to this user keep existing; their `assigned_to` reference
/// is cleared by the storage layer (`ON DELETE SET NULL`).
///
/// # Errors
///
/// Returns `NotFound` if no user has this id.
pub fn delete_user(conn: &Connection, user_id: i64) -> Result<()> {
    let rows = conn.execute("DELETE FROM users WHERE user_id = ?1", params![user_id])?;
    if rows == 0 {
        return Err(Error::not_found("user", user_id));
    }
    debug!(user_id, "deleted user");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{NewTask, TaskPatch, create_task, create_user, resolve_tag, update_task};
    use crate::db;
    use crate::error::{Error, ValidationKind};
    use chrono::{Duration, Utc};

    fn is_validation(err: &Error, kind: ValidationKind) -> bool {
        matches!(err, Error::Validation { kind: k, .. } if *k == kind)
    }

    #[test]
    fn resolve_tag_is_idempotent() {
        let conn = db::open_in_memory().expect("open db");

        let first = resolve_tag(&conn, "Urgent").expect("first resolve");
        let second = resolve_tag(&conn, "Urgent").expect("second resolve");
        assert_eq!(first, second);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM tags WHERE name = 'Urgent'", [], |r| {
                r.get(0)
            })
            .expect("count tags");
        assert_eq!(rows, 1);
    }

    #[test]
    fn resolve_tag_is_case_sensitive() {
        let conn = db::open_in_memory().expect("open db");

        let upper = resolve_tag(&conn, "Work").expect("resolve Work");
        let lower = resolve_tag(&conn, "work").expect("resolve work");
        assert_ne!(upper.id, lower.id);
    }

    #[test]
    fn duplicate_tag_specs_collapse_on_create() {
        let mut conn = db::open_in_memory().expect("open db");

        let task = create_task(
            &mut conn,
            &NewTask {
                title: "dedup".to_string(),
                tags: vec!["Work".to_string(), "Work".to_string()],
                ..NewTask::default()
            },
        )
        .expect("create task");

        assert_eq!(task.tags.len(), 1);
        assert_eq!(task.tags[0].name, "Work");
    }

    #[test]
    fn failed_validation_leaves_no_rows_behind() {
        let mut conn = db::open_in_memory().expect("open db");

        let result = create_task(
            &mut conn,
            &NewTask {
                title: "expired".to_string(),
                due_date: Some(Utc::now() - Duration::hours(1)),
                tags: vec!["Ghost".to_string()],
                ..NewTask::default()
            },
        );
        assert!(result.is_err());

        let tasks: i64 = conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |r| r.get(0))
            .expect("count tasks");
        let tags: i64 = conn
            .query_row("SELECT COUNT(*) FROM tags", [], |r| r.get(0))
            .expect("count tags");
        assert_eq!(tasks, 0);
        assert_eq!(tags, 0, "validation failure must precede tag resolution");
    }

    #[test]
    fn blank_title_is_a_validation_failure_not_storage() {
        let mut conn = db::open_in_memory().expect("open db");

        let err = create_task(
            &mut conn,
            &NewTask {
                title: "   ".to_string(),
                ..NewTask::default()
            },
        )
        .expect_err("blank title");
        assert!(
            is_validation(&err, ValidationKind::BlankField),
            "expected blank-field validation, got {err}"
        );

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |r| r.get(0))
            .expect("count tasks");
        assert_eq!(rows, 0);
    }

    #[test]
    fn blank_tag_name_is_rejected_before_any_write() {
        let mut conn = db::open_in_memory().expect("open db");

        let err = create_task(
            &mut conn,
            &NewTask {
                title: "tagged".to_string(),
                tags: vec!["Work".to_string(), "  ".to_string()],
                ..NewTask::default()
            },
        )
        .expect_err("blank tag name");
        assert!(is_validation(&err, ValidationKind::BlankField));

        let tags: i64 = conn
            .query_row("SELECT COUNT(*) FROM tags", [], |r| r.get(0))
            .expect("count tags");
        assert_eq!(tags, 0);
    }

    #[test]
    fn update_rejects_blank_title_and_keeps_the_old_one() {
        let mut conn = db::open_in_memory().expect("open db");

        let task = create_task(
            &mut conn,
            &NewTask {
                title: "keep me".to_string(),
                ..NewTask::default()
            },
        )
        .expect("create task");

        let err = update_task(
            &mut conn,
            task.id,
            &TaskPatch {
                title: Some(String::new()),
                ..TaskPatch::default()
            },
        )
        .expect_err("blank title");
        assert!(is_validation(&err, ValidationKind::BlankField));

        let title: String = conn
            .query_row(
                "SELECT title FROM tasks WHERE task_id = ?1",
                [task.id],
                |r| r.get(0),
            )
            .expect("read title");
        assert_eq!(title, "keep me");
    }

    #[test]
    fn duplicate_username_is_a_validation_failure() {
        let conn = db::open_in_memory().expect("open db");

        create_user(&conn, "casey").expect("first insert");
        let err = create_user(&conn, "casey").expect_err("duplicate username");
        assert!(
            is_validation(&err, ValidationKind::DuplicateUsername),
            "expected duplicate-username validation, got {err}"
        );
    }

    #[test]
    fn create_rejects_missing_assignee() {
        let mut conn = db::open_in_memory().expect("open db");

        let result = create_task(
            &mut conn,
            &NewTask {
                title: "orphaned".to_string(),
                assigned_to: Some(99),
                ..NewTask::default()
            },
        );
        assert!(matches!(
            result,
            Err(crate::Error::NotFound { entity: "user", .. })
        ));
    }
}
