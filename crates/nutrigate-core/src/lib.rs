//! Token resolution and permission decisions for the nutrition platform API.
//!
//! This crate is deliberately free of HTTP and database dependencies. Stores
//! are reached through the traits in [`store`]; the HTTP layer turns an
//! [`AuthError`] into a response using [`AuthError::failure`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod audit;
pub mod authenticator;
pub mod credential;
pub mod error;
pub mod expiry;
pub mod identity;
pub mod permission;
pub mod resolver;
pub mod store;

#[cfg(test)]
mod testing;

pub use audit::SessionAuditor;
pub use authenticator::{Authenticator, extract_bearer};
pub use error::{AuthError, Failure, Result, UnknownResource};
pub use expiry::ExpirationPolicy;
pub use identity::{Identity, UserCategory};
pub use permission::{Resource, authorize, category_of, is_allowed};
pub use resolver::{Resolution, TokenResolver};
