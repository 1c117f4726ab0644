//! Plain data records for the tracker's entities.

pub mod tag;
pub mod task;
pub mod user;

pub use tag::Tag;
pub use task::{ParseEnumError, Priority, Status, Task};
pub use user::User;
