//! taskdeck-core library.
//!
//! The contractual core of the tracker: the Task/Tag data model, field
//! validation, and the transactional write service over SQLite. The HTTP
//! surface lives in `taskdeck-server` and only ever talks to this crate.

pub mod db;
pub mod error;
pub mod model;
pub mod service;
pub mod validate;

pub use error::{Error, Result, ValidationKind};
