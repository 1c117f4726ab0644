//! taskdeck-server library.
//!
//! The HTTP surface over `taskdeck-core`: route registration, request and
//! response shapes, the pagination envelope, and error-to-status mapping.
//! The binary in `main.rs` wires this into an actix-web server.

pub mod api;
pub mod app_state;
pub mod pagination;
