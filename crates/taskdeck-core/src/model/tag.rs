use serde::{Deserialize, Serialize};

/// A named label attachable to many tasks.
///
/// `name` is the effective dedup key: the tag resolver converges all
/// resolutions of one name onto a single row, backed by a UNIQUE constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}
