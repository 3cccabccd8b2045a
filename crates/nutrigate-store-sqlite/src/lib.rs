//! SQLite backend for the nutrigate credential, parameter and audit stores.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;
pub mod provision;

pub use error::{Error, Result};
pub use provision::{NewGuestToken, NewSession, NewUser};
pub use store::SqliteStore;
