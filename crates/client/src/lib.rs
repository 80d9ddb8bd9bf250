//! Networked half of the Terroir & Time client.
//!
//! [`api::TerroirApi`] speaks HTTP to the game backend,
//! [`token_store`] keeps the bearer token between runs, and
//! [`session::GameSession`] ties them to the [`terroir_core::store::GameStore`].

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod token_store;

pub use error::{ClientError, ClientResult};
pub use session::GameSession;
