//! SQLite query helpers for the tracker.
//!
//! Provides typed structs and composable query functions for the read path:
//! list/filter tasks, get by id, tag and user lookups. All functions take a
//! shared `&Connection` and return typed records, never raw rows.
//!
//! Filter fields combine with AND semantics; the string-valued filters are
//! case-insensitive exact matches, mirroring the HTTP query parameters.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params, params_from_iter, types::Type};
use std::fmt::{self, Write as _};
use std::str::FromStr;

use crate::error::Result;
use crate::model::{ParseEnumError, Priority, Status, Tag, Task, User};

// ---------------------------------------------------------------------------
// Timestamp conversion
// ---------------------------------------------------------------------------

/// Convert a stored microsecond timestamp back to `DateTime<Utc>`.
pub(crate) fn micros_to_datetime(us: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(us).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Integer,
            format!("timestamp out of range: {us}").into(),
        )
    })
}

/// Convert a `DateTime<Utc>` to the stored microsecond representation.
pub(crate) fn datetime_to_micros(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_micros()
}

fn parse_stored_enum<T>(raw: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    raw.parse().map_err(|error: ParseEnumError| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(error))
    })
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Sort order for task listings.
///
/// Wire form follows the HTTP `ordering` parameter: a field name with an
/// optional `-` prefix for descending. Priority ordering ranks severity
/// (LOW < MEDIUM < HIGH < CRITICAL), not the lexicographic accident of the
/// stored strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest first (the default).
    #[default]
    CreatedAsc,
    /// Most recently created first.
    CreatedDesc,
    /// Oldest update first.
    UpdatedAsc,
    /// Most recently updated first.
    UpdatedDesc,
    /// Least severe first.
    PriorityAsc,
    /// Most severe first.
    PriorityDesc,
}

impl SortOrder {
    const fn sql_clause(self) -> &'static str {
        match self {
            Self::CreatedAsc => "ORDER BY t.created_at_us ASC, t.task_id ASC",
            Self::CreatedDesc => "ORDER BY t.created_at_us DESC, t.task_id ASC",
            Self::UpdatedAsc => "ORDER BY t.updated_at_us ASC, t.task_id ASC",
            Self::UpdatedDesc => "ORDER BY t.updated_at_us DESC, t.task_id ASC",
            Self::PriorityAsc => {
                "ORDER BY CASE t.priority \
                 WHEN 'LOW' THEN 0 \
                 WHEN 'MEDIUM' THEN 1 \
                 WHEN 'HIGH' THEN 2 \
                 WHEN 'CRITICAL' THEN 3 \
                 END ASC, t.task_id ASC"
            }
            Self::PriorityDesc => {
                "ORDER BY CASE t.priority \
                 WHEN 'LOW' THEN 0 \
                 WHEN 'MEDIUM' THEN 1 \
                 WHEN 'HIGH' THEN 2 \
                 WHEN 'CRITICAL' THEN 3 \
                 END DESC, t.task_id ASC"
            }
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreatedAsc => f.write_str("created_at"),
            Self::CreatedDesc => f.write_str("-created_at"),
            Self::UpdatedAsc => f.write_str("updated_at"),
            Self::UpdatedDesc => f.write_str("-updated_at"),
            Self::PriorityAsc => f.write_str("priority"),
            Self::PriorityDesc => f.write_str("-priority"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "created_at" => Ok(Self::CreatedAsc),
            "-created_at" => Ok(Self::CreatedDesc),
            "updated_at" => Ok(Self::UpdatedAsc),
            "-updated_at" => Ok(Self::UpdatedDesc),
            "priority" => Ok(Self::PriorityAsc),
            "-priority" => Ok(Self::PriorityDesc),
            _ => Err(ParseEnumError {
                expected: "ordering",
                got: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Filter criteria for task listings.
///
/// All fields are optional. When multiple fields are set, they are combined
/// with AND semantics.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Filter by status (case-insensitive exact match).
    pub status: Option<String>,
    /// Filter by priority (case-insensitive exact match).
    pub priority: Option<String>,
    /// Filter by assigned user's username (case-insensitive exact match).
    pub assigned_to: Option<String>,
    /// Filter by tag name (case-insensitive exact match).
    pub tag: Option<String>,
    /// Inclusive lower bound on `due_date`.
    pub due_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `due_date`.
    pub due_before: Option<DateTime<Utc>>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
    /// Sort order.
    pub sort: SortOrder,
}

fn filter_clauses(filter: &TaskFilter) -> (String, String, Vec<Box<dyn rusqlite::types::ToSql>>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut joins = String::new();

    if let Some(ref status) = filter.status {
        param_values.push(Box::new(status.clone()));
        conditions.push(format!("t.status = upper(trim(?{}))", param_values.len()));
    }

    if let Some(ref priority) = filter.priority {
        param_values.push(Box::new(priority.clone()));
        conditions.push(format!("t.priority = upper(trim(?{}))", param_values.len()));
    }

    if let Some(due_after) = filter.due_after {
        param_values.push(Box::new(datetime_to_micros(due_after)));
        conditions.push(format!("t.due_date_us >= ?{}", param_values.len()));
    }

    if let Some(due_before) = filter.due_before {
        param_values.push(Box::new(datetime_to_micros(due_before)));
        conditions.push(format!("t.due_date_us <= ?{}", param_values.len()));
    }

    // Username and tag filters require JOINs
    if let Some(ref username) = filter.assigned_to {
        param_values.push(Box::new(username.clone()));
        let _ = write!(
            joins,
            " INNER JOIN users u ON u.user_id = t.assigned_to \
             AND u.username = ?{} COLLATE NOCASE",
            param_values.len()
        );
    }

    if let Some(ref tag) = filter.tag {
        param_values.push(Box::new(tag.clone()));
        let _ = write!(
            joins,
            " INNER JOIN task_tags tt ON tt.task_id = t.task_id \
             INNER JOIN tags tg ON tg.tag_id = tt.tag_id \
             AND tg.name = ?{} COLLATE NOCASE",
            param_values.len()
        );
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    (joins, where_clause, param_values)
}

// ---------------------------------------------------------------------------
// Task read path
// ---------------------------------------------------------------------------

const TASK_COLUMNS: &str = "t.task_id, t.title, t.description, t.status, t.priority, \
                            t.due_date_us, t.assigned_to, t.created_at_us, t.updated_at_us";

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get(3)?;
    let priority: String = row.get(4)?;
    let due_date_us: Option<i64> = row.get(5)?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: parse_stored_enum::<Status>(&status)?,
        priority: parse_stored_enum::<Priority>(&priority)?,
        due_date: due_date_us.map(micros_to_datetime).transpose()?,
        created_at: micros_to_datetime(row.get(7)?)?,
        updated_at: micros_to_datetime(row.get(8)?)?,
        assigned_to: row.get(6)?,
        tags: Vec::new(),
    })
}

/// Fetch a single task by id, with its tags resolved.
///
/// Returns `None` if the task does not exist.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_task(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.task_id = ?1");
    let mut stmt = conn.prepare(&sql)?;

    let result = stmt.query_row(params![task_id], row_to_task);
    match result {
        Ok(mut task) => {
            task.tags = task_tags(conn, task.id)?;
            Ok(Some(task))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// List tasks matching the given filter criteria, tags resolved.
///
/// Returns tasks in the requested sort order, limited by `filter.limit` and
/// offset by `filter.offset`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_tasks(conn: &Connection, filter: &TaskFilter) -> Result<Vec<Task>> {
    let (joins, where_clause, param_values) = filter_clauses(filter);
    let sort_clause = filter.sort.sql_clause();

    let limit_clause = match (filter.limit, filter.offset) {
        (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
        (Some(limit), None) => format!(" LIMIT {limit}"),
        (None, Some(offset)) => format!(" LIMIT -1 OFFSET {offset}"),
        (None, None) => String::new(),
    };

    let sql = format!(
        "SELECT DISTINCT {TASK_COLUMNS} FROM tasks t{joins}{where_clause} {sort_clause}{limit_clause}"
    );

    let mut stmt = conn.prepare(&sql)?;

    let params_ref: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(AsRef::as_ref).collect();

    let rows = stmt.query_map(params_from_iter(params_ref), row_to_task)?;

    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row?);
    }

    for task in &mut tasks {
        task.tags = task_tags(conn, task.id)?;
    }

    Ok(tasks)
}

/// Count tasks matching the filter, ignoring `limit`/`offset`.
///
/// Used by the HTTP surface to populate the pagination envelope.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_tasks(conn: &Connection, filter: &TaskFilter) -> Result<u64> {
    let (joins, where_clause, param_values) = filter_clauses(filter);
    let sql = format!("SELECT COUNT(DISTINCT t.task_id) FROM tasks t{joins}{where_clause}");

    let params_ref: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(AsRef::as_ref).collect();

    let count: i64 = conn.query_row(&sql, params_from_iter(params_ref), |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Get all tags attached to a task, ordered by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn task_tags(conn: &Connection, task_id: i64) -> Result<Vec<Tag>> {
    let sql = "SELECT tg.tag_id, tg.name \
               FROM task_tags tt \
               INNER JOIN tags tg ON tg.tag_id = tt.tag_id \
               WHERE tt.task_id = ?1 \
               ORDER BY tg.name";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![task_id], |row| {
        Ok(Tag {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;

    let mut tags = Vec::new();
    for row in rows {
        tags.push(row?);
    }
    Ok(tags)
}

// ---------------------------------------------------------------------------
// Tag read path
// ---------------------------------------------------------------------------

/// Fetch a single tag by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_tag(conn: &Connection, tag_id: i64) -> Result<Option<Tag>> {
    let result = conn.query_row(
        "SELECT tag_id, name FROM tags WHERE tag_id = ?1",
        params![tag_id],
        |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    );

    match result {
        Ok(tag) => Ok(Some(tag)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// List all tags ordered by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_tags(conn: &Connection, limit: Option<u32>, offset: Option<u32>) -> Result<Vec<Tag>> {
    let limit_clause = match (limit, offset) {
        (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
        (Some(limit), None) => format!(" LIMIT {limit}"),
        (None, Some(offset)) => format!(" LIMIT -1 OFFSET {offset}"),
        (None, None) => String::new(),
    };

    let sql = format!("SELECT tag_id, name FROM tags ORDER BY name ASC, tag_id ASC{limit_clause}");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(Tag {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;

    let mut tags = Vec::new();
    for row in rows {
        tags.push(row?);
    }
    Ok(tags)
}

/// Count all tags.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_tags(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

// ---------------------------------------------------------------------------
// User read path
// ---------------------------------------------------------------------------

/// Fetch a user by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    let result = conn.query_row(
        "SELECT user_id, username FROM users WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
            })
        },
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
