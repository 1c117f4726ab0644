use serde::{Deserialize, Serialize};

/// A minimal identity record.
///
/// Tasks reference users through `assigned_to`; deleting a user clears that
/// reference on its tasks rather than deleting them. No credential or
/// profile logic lives here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}
