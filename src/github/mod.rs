//! Access to the GitHub GraphQL API.
//!
//! [`resolve_token`] finds a credential, [`Client`] executes queries with
//! retry and lazy pagination, and [`discover_repositories`] enumerates the
//! repositories the authenticated [`Identity`] is associated with.

mod auth;
mod client;
mod connection;
mod discovery;
mod identity;
pub mod queries;
mod retry;

pub use auth::resolve_token;
pub use client::Client;
pub use connection::Connection;
pub use discovery::discover_repositories;
pub use identity::{Identity, fetch_identity};
