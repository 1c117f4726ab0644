use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Shared state for the HTTP handlers.
///
/// The core is synchronous rusqlite, so the single connection lives behind a
/// mutex and handlers run their queries under it. SQLite's own busy timeout
/// covers any second process pointed at the same file.
pub struct AppState {
    db: Mutex<Connection>,
}

impl AppState {
    #[must_use]
    pub const fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Lock the shared connection. A poisoned lock is recovered rather than
    /// propagated; the connection itself holds no invariants across a panic.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
