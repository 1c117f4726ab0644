//! Canonical SQLite schema for taskdeck.
//!
//! The layout is the classic two-entity shape plus a join table:
//! - `tasks` keeps scalar fields, enum columns CHECK-constrained to their
//!   closed value sets
//! - `tags` carries a UNIQUE name so get-or-create can be an atomic upsert
//! - `task_tags` models the many-to-many association
//! - `users` is the minimal identity table `assigned_to` points at;
//!   deleting a user nulls the reference rather than cascading

/// Migration v1: core tables.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE CHECK (length(trim(username)) > 0)
);

CREATE TABLE IF NOT EXISTS tasks (
    task_id INTEGER PRIMARY KEY,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'TODO' CHECK (status IN ('TODO', 'IN_PROGRESS', 'DONE')),
    priority TEXT NOT NULL DEFAULT 'LOW' CHECK (priority IN ('LOW', 'MEDIUM', 'HIGH', 'CRITICAL')),
    due_date_us INTEGER,
    assigned_to INTEGER REFERENCES users(user_id) ON DELETE SET NULL,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    CHECK (updated_at_us >= created_at_us)
);

CREATE TABLE IF NOT EXISTS tags (
    tag_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE CHECK (length(trim(name)) > 0)
);

CREATE TABLE IF NOT EXISTS task_tags (
    task_id INTEGER NOT NULL REFERENCES tasks(task_id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(tag_id) ON DELETE CASCADE,
    PRIMARY KEY (task_id, tag_id)
);
";

/// Migration v2: read-path indexes for the list filters.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_tasks_status_created
    ON tasks(status, created_at_us);

CREATE INDEX IF NOT EXISTS idx_tasks_priority_created
    ON tasks(priority, created_at_us);

CREATE INDEX IF NOT EXISTS idx_tasks_assigned
    ON tasks(assigned_to);

CREATE INDEX IF NOT EXISTS idx_tasks_due
    ON tasks(due_date_us);

CREATE INDEX IF NOT EXISTS idx_task_tags_tag
    ON task_tags(tag_id, task_id);
";

/// Indexes expected by the list/filter query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_tasks_status_created",
    "idx_tasks_priority_created",
    "idx_tasks_assigned",
    "idx_tasks_due",
    "idx_task_tags_tag",
];
