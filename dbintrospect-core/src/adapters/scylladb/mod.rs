//! ScyllaDB/Cassandra schema introspection over `system_schema`.
//!
//! # Module Structure
//! - `config`: Contact point and optional credentials
//! - `connection`: Driver connector, session and CQL value decoding
//! - `models`: Normalized column, index and view records plus the column
//!   ordering rule
//!
//! # Security Guarantees
//! - Every statement is a `SELECT` on `system_schema`
//! - Keyspace and table names are validated, then bound as parameters
//! - The server offers no read-only session mode; this adapter reports
//!   `AdapterFeature::ReadOnlyMode` as unsupported

mod config;
mod connection;
mod models;

#[cfg(test)]
mod tests;

use super::{AdapterFeature, BackendKind, Introspector};
use crate::Result;
use crate::catalog::{Connector, text_column};
use crate::identifier::{KEYSPACE_NAME, TABLE_NAME, require_identifier};
use crate::session::{Closeable, SessionManager};
use async_trait::async_trait;
use tracing::{Instrument, Span};

pub use config::{DEFAULT_HOST, DEFAULT_PORT, ScyllaConfig};
pub use connection::{ScyllaConnector, ScyllaSession};
pub use models::{
    ColumnKind, EXCLUDED_KEYSPACES, MaterializedView, ScyllaColumn, ScyllaIndex,
    is_system_keyspace, sort_columns,
};

// CQL has no NOT IN and no ORDER BY on these tables; filtering and
// ordering happen client-side.
const LIST_KEYSPACES: &str = "SELECT keyspace_name FROM system_schema.keyspaces";

const LIST_TABLES: &str = "SELECT table_name FROM system_schema.tables WHERE keyspace_name = ?";

const DESCRIBE_TABLE: &str = "SELECT column_name, type, kind, position \
     FROM system_schema.columns WHERE keyspace_name = ? AND table_name = ?";

const TABLE_INDEXES: &str = "SELECT index_name, kind, options \
     FROM system_schema.indexes WHERE keyspace_name = ? AND table_name = ?";

const MATERIALIZED_VIEWS: &str =
    "SELECT view_name, base_table_name FROM system_schema.views WHERE keyspace_name = ?";

/// ScyllaDB introspection engine.
///
/// Holds at most one driver session, opened on the first operation.
/// Keyspace and table arguments are validated, keyspace first, before the
/// session is touched.
///
/// # Example
/// ```rust,no_run
/// use dbintrospect_core::adapters::scylladb::{ScyllaConfig, ScyllaIntrospector};
///
/// # async fn example() -> dbintrospect_core::Result<()> {
/// let mut db = ScyllaIntrospector::new(ScyllaConfig::new(None, None, None, None));
/// for column in db.describe_table("shop", "orders").await? {
///     println!("{} {} ({})", column.column_name, column.r#type, column.kind);
/// }
/// db.close().await;
/// # Ok(())
/// # }
/// ```
pub struct ScyllaIntrospector<C: Connector = ScyllaConnector> {
    manager: SessionManager<C>,
}

impl<C: Connector> std::fmt::Debug for ScyllaIntrospector<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScyllaIntrospector")
            .field("manager", &self.manager)
            .finish()
    }
}

impl ScyllaIntrospector {
    /// Creates an introspector for the configured cluster without connecting.
    pub fn new(config: ScyllaConfig) -> Self {
        Self::with_connector(ScyllaConnector::new(config))
    }
}

impl<C: Connector> ScyllaIntrospector<C> {
    /// Creates an introspector that opens sessions through `connector`.
    pub fn with_connector(connector: C) -> Self {
        Self {
            manager: SessionManager::new(connector),
        }
    }

    /// Parents every event emitted by this introspector under `span`.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.manager = self.manager.with_span(span);
        self
    }

    /// Whether a session is currently open.
    pub const fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// Opens the session now instead of on first use.
    ///
    /// # Errors
    /// Returns `IntrospectError::ConnectionFailed` if no node could be
    /// reached or authentication failed.
    pub async fn ensure_connected(&mut self) -> Result<()> {
        self.manager.ensure_connected().await.map(|_| ())
    }

    /// Closes the session if one is open. Safe to call repeatedly.
    pub async fn close(&mut self) {
        self.manager.close().await;
    }

    /// Lists user keyspaces in name order, without the server's system
    /// keyspaces.
    ///
    /// # Errors
    /// `ConnectionFailed` or `BackendQueryFailed`.
    pub async fn list_keyspaces(&mut self) -> Result<Vec<String>> {
        let span = tracing::info_span!(parent: self.manager.span(), "list_keyspaces");
        async {
            let rows = self
                .manager
                .query("list_keyspaces", "cluster", LIST_KEYSPACES, &[])
                .await?;
            let mut keyspaces: Vec<String> =
                text_column(&rows, "keyspace_name", "list_keyspaces")?
                    .into_iter()
                    .filter(|name| !is_system_keyspace(name))
                    .collect();
            keyspaces.sort();
            tracing::debug!(count = keyspaces.len(), "Listed keyspaces");
            Ok(keyspaces)
        }
        .instrument(span)
        .await
    }

    /// Lists the tables of `keyspace` in name order.
    ///
    /// # Errors
    /// `InvalidIdentifier` before any network use, then `ConnectionFailed`
    /// or `BackendQueryFailed`.
    pub async fn list_tables(&mut self, keyspace: &str) -> Result<Vec<String>> {
        let span = tracing::info_span!(parent: self.manager.span(), "list_tables", keyspace);
        async {
            require_identifier(keyspace, KEYSPACE_NAME)?;
            let rows = self
                .manager
                .query(
                    "list_tables",
                    &format!("keyspace '{keyspace}'"),
                    LIST_TABLES,
                    &[keyspace],
                )
                .await?;
            let mut tables = text_column(&rows, "table_name", "list_tables")?;
            tables.sort();
            tracing::debug!(count = tables.len(), "Listed tables");
            Ok(tables)
        }
        .instrument(span)
        .await
    }

    /// Describes the columns of `keyspace.table`, ordered partition key
    /// first, then clustering, static and regular columns, each by position.
    ///
    /// # Errors
    /// `InvalidIdentifier` for the keyspace, then for the table, before any
    /// network use; afterwards `ConnectionFailed` or `BackendQueryFailed`.
    pub async fn describe_table(&mut self, keyspace: &str, table: &str) -> Result<Vec<ScyllaColumn>> {
        let span =
            tracing::info_span!(parent: self.manager.span(), "describe_table", keyspace, table);
        async {
            require_identifier(keyspace, KEYSPACE_NAME)?;
            require_identifier(table, TABLE_NAME)?;
            let rows = self
                .manager
                .query(
                    "describe_table",
                    &format!("table '{keyspace}.{table}'"),
                    DESCRIBE_TABLE,
                    &[keyspace, table],
                )
                .await?;
            let mut columns = rows
                .iter()
                .map(ScyllaColumn::from_row)
                .collect::<Result<Vec<_>>>()?;
            sort_columns(&mut columns);
            Ok(columns)
        }
        .instrument(span)
        .await
    }

    /// Lists the secondary indexes of `keyspace.table` in catalog order.
    ///
    /// # Errors
    /// Same classes as [`describe_table`](Self::describe_table).
    pub async fn get_table_indexes(
        &mut self,
        keyspace: &str,
        table: &str,
    ) -> Result<Vec<ScyllaIndex>> {
        let span =
            tracing::info_span!(parent: self.manager.span(), "get_table_indexes", keyspace, table);
        async {
            require_identifier(keyspace, KEYSPACE_NAME)?;
            require_identifier(table, TABLE_NAME)?;
            let rows = self
                .manager
                .query(
                    "get_table_indexes",
                    &format!("table '{keyspace}.{table}'"),
                    TABLE_INDEXES,
                    &[keyspace, table],
                )
                .await?;
            rows.iter().map(ScyllaIndex::from_row).collect()
        }
        .instrument(span)
        .await
    }

    /// Lists the materialized views of `keyspace` by view name.
    ///
    /// # Errors
    /// `InvalidIdentifier` before any network use, then `ConnectionFailed`
    /// or `BackendQueryFailed`.
    pub async fn get_materialized_views(&mut self, keyspace: &str) -> Result<Vec<MaterializedView>> {
        let span =
            tracing::info_span!(parent: self.manager.span(), "get_materialized_views", keyspace);
        async {
            require_identifier(keyspace, KEYSPACE_NAME)?;
            let rows = self
                .manager
                .query(
                    "get_materialized_views",
                    &format!("keyspace '{keyspace}'"),
                    MATERIALIZED_VIEWS,
                    &[keyspace],
                )
                .await?;
            let mut views = rows
                .iter()
                .map(MaterializedView::from_row)
                .collect::<Result<Vec<_>>>()?;
            views.sort_by(|a, b| a.view_name.cmp(&b.view_name));
            Ok(views)
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl<C: Connector> Closeable for ScyllaIntrospector<C> {
    async fn close(&mut self) {
        self.manager.close().await;
    }
}

impl<C: Connector> Introspector for ScyllaIntrospector<C> {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::ScyllaDB
    }

    fn supports_feature(&self, feature: AdapterFeature) -> bool {
        matches!(feature, AdapterFeature::MaterializedViews)
    }

    fn target(&self) -> String {
        self.manager.connector().target()
    }
}
