//! Domain types and client-side state for the Terroir & Time game client.
//!
//! Everything here is pure: DTOs mirrored from the backend, request and
//! response bodies, the reducer-style [`store::GameStore`], per-action
//! [`forms`], and display helpers. I/O lives in `terroir-client`.

pub mod error;
pub mod format;
pub mod forms;
pub mod models;
pub mod requests;
pub mod store;
pub mod types;
