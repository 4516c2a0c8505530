//! Backend adapters for schema introspection.
//!
//! Each adapter pairs a [`Connector`](crate::catalog::Connector) for its
//! driver with an introspection engine exposing that backend's operation
//! set. The two backends share no code beyond the catalog and session
//! traits: their data and security models differ too much.
//!
//! # Module Structure
//! - `postgres`: PostgreSQL over sqlx, read-only enforced by the server
//! - `scylladb`: ScyllaDB/Cassandra over the scylla driver, read-only by
//!   convention only

use crate::session::Closeable;

#[cfg(feature = "postgresql")]
pub mod postgres;

#[cfg(feature = "scylladb")]
pub mod scylladb;

/// Backend engine an adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Relational engine with an SQL catalog
    PostgreSQL,
    /// Wide-column engine with a keyspace/partition model
    ScyllaDB,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PostgreSQL => write!(f, "PostgreSQL"),
            Self::ScyllaDB => write!(f, "ScyllaDB"),
        }
    }
}

/// Features that adapters may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterFeature {
    /// The server itself rejects writes on the session
    ReadOnlyMode,
    /// Catalog results are ordered by the server
    ServerSideOrdering,
    /// Table constraint introspection
    Constraints,
    /// Materialized view introspection
    MaterializedViews,
}

/// Common surface of both introspection engines.
pub trait Introspector: Closeable {
    /// Backend this introspector talks to.
    fn backend_kind(&self) -> BackendKind;

    /// Checks if the adapter supports a specific feature.
    fn supports_feature(&self, feature: AdapterFeature) -> bool;

    /// Credential-free description of the connection target.
    fn target(&self) -> String;
}
