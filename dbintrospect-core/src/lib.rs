//! Read-only schema introspection for PostgreSQL and ScyllaDB.
//!
//! This crate lists schemas or keyspaces, tables, columns, indexes,
//! constraints and materialized views, and normalizes each backend's
//! catalog rows into plain serializable records.
//!
//! # Security Guarantees
//! - Only catalog `SELECT` statements are ever issued
//! - PostgreSQL sessions are read-only at the server; ScyllaDB has no such
//!   mode and relies on the statement set alone
//! - Every caller-supplied name passes the identifier check before any
//!   network interaction
//! - Passwords are held in zeroizing containers and never logged
//!
//! # Architecture
//! - [`catalog`]: the query-and-rows seam every backend driver sits behind
//! - [`session`]: lazy, idempotently closable single-session management
//! - [`adapters`]: one introspection engine per backend, feature-gated
//!
//! # Example
//! ```rust,no_run
//! use dbintrospect_core::adapters::postgres::{PostgresConfig, PostgresIntrospector};
//! use dbintrospect_core::with_scoped;
//!
//! # async fn example() -> dbintrospect_core::Result<()> {
//! let config = PostgresConfig::new(None, None, Some("app"), Some("secret"), Some("appdb"))?;
//! let indexes = with_scoped(PostgresIntrospector::new(config), |db| {
//!     Box::pin(async move { db.get_table_indexes("public", "users").await })
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod adapters;
pub mod catalog;
pub mod credentials;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod session;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use adapters::{AdapterFeature, BackendKind, Introspector};
pub use catalog::{CatalogRow, CatalogSession, Connector};
pub use credentials::Credentials;
pub use error::{BoxError, IntrospectError, Result};
pub use identifier::{is_valid_identifier, validate_identifier};
pub use session::{Closeable, SessionManager, with_scoped};
