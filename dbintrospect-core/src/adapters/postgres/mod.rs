//! PostgreSQL schema introspection over a single read-only session.
//!
//! # Module Structure
//! - `config`: Connection parameters and defaults
//! - `connection`: sqlx connector, read-only session and row decoding
//! - `models`: Normalized column, index and constraint records
//!
//! # Security Guarantees
//! - Every statement is a catalog `SELECT`
//! - Sessions run with `default_transaction_read_only = on`
//! - Schema and table names are validated, then bound as parameters

mod config;
mod connection;
mod models;


use super::{AdapterFeature, BackendKind, Introspector};
use crate::Result;
use crate::catalog::{Connector, text_column};
use crate::identifier::{SCHEMA_NAME, TABLE_NAME, require_identifier};
use crate::session::{Closeable, SessionManager};
use async_trait::async_trait;
use tracing::{Instrument, Span};

pub use config::{DEFAULT_HOST, DEFAULT_PORT, PostgresConfig};
pub use connection::{PgConnector, PgSession};
pub use models::{
    EXCLUDED_SCHEMA_PREFIXES, EXCLUDED_SCHEMAS, PgColumn, PgConstraint, PgIndex, is_system_schema,
};

const LIST_SCHEMAS: &str = r"
    SELECT schema_name::text AS schema_name
    FROM information_schema.schemata
    WHERE schema_name NOT IN ('information_schema', 'pg_catalog')
      AND schema_name NOT LIKE 'pg\_toast%'
      AND schema_name NOT LIKE 'pg\_temp%'
    ORDER BY schema_name";

const LIST_TABLES: &str = "
    SELECT table_name::text AS table_name
    FROM information_schema.tables
    WHERE table_schema = $1
      AND table_type = 'BASE TABLE'
    ORDER BY table_name";

const DESCRIBE_TABLE: &str = "
    SELECT
        column_name::text AS column_name,
        data_type::text AS data_type,
        is_nullable::text AS is_nullable,
        column_default::text AS column_default
    FROM information_schema.columns
    WHERE table_schema = $1
      AND table_name = $2
    ORDER BY ordinal_position";

const TABLE_INDEXES: &str = "
    SELECT indexname::text AS indexname, indexdef
    FROM pg_indexes
    WHERE schemaname = $1
      AND tablename = $2
    ORDER BY indexname";

const TABLE_CONSTRAINTS: &str = "
    SELECT
        c.conname::text AS constraint_name,
        pg_get_constraintdef(c.oid) AS constraint_def
    FROM pg_constraint c
    JOIN pg_namespace n ON n.oid = c.connamespace
    JOIN pg_class t ON t.oid = c.conrelid
    WHERE n.nspname = $1
      AND t.relname = $2
    ORDER BY c.conname";

/// Read-only PostgreSQL introspection engine.
///
/// Holds at most one session, opened on the first operation. Each operation
/// validates its identifier arguments (schema first, then table) before the
/// session is touched, so a rejected name never causes a connection attempt.
///
/// # Example
/// ```rust,no_run
/// use dbintrospect_core::adapters::postgres::{PostgresConfig, PostgresIntrospector};
///
/// # async fn example() -> dbintrospect_core::Result<()> {
/// let config = PostgresConfig::new(None, None, Some("app"), Some("secret"), Some("appdb"))?;
/// let mut db = PostgresIntrospector::new(config);
///
/// for table in db.list_tables("public").await? {
///     let columns = db.describe_table("public", &table).await?;
///     println!("{table}: {} columns", columns.len());
/// }
/// db.close().await;
/// # Ok(())
/// # }
/// ```
pub struct PostgresIntrospector<C: Connector = PgConnector> {
    manager: SessionManager<C>,
}

impl<C: Connector> std::fmt::Debug for PostgresIntrospector<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresIntrospector")
            .field("manager", &self.manager)
            .finish()
    }
}

impl PostgresIntrospector {
    /// Creates an introspector for the configured database without connecting.
    pub fn new(config: PostgresConfig) -> Self {
        Self::with_connector(PgConnector::new(config))
    }
}

impl<C: Connector> PostgresIntrospector<C> {
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

    /// Opens the read-only session now instead of on first use.
    ///
    /// # Errors
    /// Returns `IntrospectError::ConnectionFailed` if the server is
    /// unreachable, rejects the credentials, or refuses read-only mode.
    pub async fn ensure_connected(&mut self) -> Result<()> {
        self.manager.ensure_connected().await.map(|_| ())
    }

    /// Closes the session if one is open. Safe to call repeatedly.
    pub async fn close(&mut self) {
        self.manager.close().await;
    }

    /// Lists user schemas in name order.
    ///
    /// `information_schema`, `pg_catalog` and every `pg_toast*`/`pg_temp*`
    /// schema are excluded.
    ///
    /// # Errors
    /// `ConnectionFailed` or `BackendQueryFailed`.
    pub async fn list_schemas(&mut self) -> Result<Vec<String>> {
        let span = tracing::info_span!(parent: self.manager.span(), "list_schemas");
        async {
            let rows = self
                .manager
                .query("list_schemas", "database", LIST_SCHEMAS, &[])
                .await?;
            let schemas: Vec<String> = text_column(&rows, "schema_name", "list_schemas")?
                .into_iter()
                .filter(|name| !is_system_schema(name))
                .collect();
            tracing::debug!(count = schemas.len(), "Listed schemas");
            Ok(schemas)
        }
        .instrument(span)
        .await
    }

    /// Lists base tables of `schema` in name order. Views are not included.
    ///
    /// # Errors
    /// `InvalidIdentifier` before any network use, then `ConnectionFailed`
    /// or `BackendQueryFailed`.
    pub async fn list_tables(&mut self, schema: &str) -> Result<Vec<String>> {
        let span = tracing::info_span!(parent: self.manager.span(), "list_tables", schema);
        async {
            require_identifier(schema, SCHEMA_NAME)?;
            let rows = self
                .manager
                .query(
                    "list_tables",
                    &format!("schema '{schema}'"),
                    LIST_TABLES,
                    &[schema],
                )
                .await?;
            let tables = text_column(&rows, "table_name", "list_tables")?;
            tracing::debug!(count = tables.len(), "Listed tables");
            Ok(tables)
        }
        .instrument(span)
        .await
    }

    /// Describes the columns of `schema.table` in ordinal position order.
    ///
    /// An unknown table yields an empty list, as the catalog does.
    ///
    /// # Errors
    /// `InvalidIdentifier` for the schema, then for the table, before any
    /// network use; afterwards `ConnectionFailed` or `BackendQueryFailed`.
    pub async fn describe_table(&mut self, schema: &str, table: &str) -> Result<Vec<PgColumn>> {
        let span =
            tracing::info_span!(parent: self.manager.span(), "describe_table", schema, table);
        async {
            require_identifier(schema, SCHEMA_NAME)?;
            require_identifier(table, TABLE_NAME)?;
            let rows = self
                .manager
                .query(
                    "describe_table",
                    &format!("table '{schema}.{table}'"),
                    DESCRIBE_TABLE,
                    &[schema, table],
                )
                .await?;
            rows.iter().map(PgColumn::from_row).collect()
        }
        .instrument(span)
        .await
    }

    /// Lists the indexes of `schema.table` with their definitions, by name.
    ///
    /// # Errors
    /// Same classes as [`describe_table`](Self::describe_table).
    pub async fn get_table_indexes(&mut self, schema: &str, table: &str) -> Result<Vec<PgIndex>> {
        let span =
            tracing::info_span!(parent: self.manager.span(), "get_table_indexes", schema, table);
        async {
            require_identifier(schema, SCHEMA_NAME)?;
            require_identifier(table, TABLE_NAME)?;
            let rows = self
                .manager
                .query(
                    "get_table_indexes",
                    &format!("table '{schema}.{table}'"),
                    TABLE_INDEXES,
                    &[schema, table],
                )
                .await?;
            rows.iter().map(PgIndex::from_row).collect()
        }
        .instrument(span)
        .await
    }

    /// Lists primary key, foreign key, unique and check constraints of
    /// `schema.table` with their definitions, by name.
    ///
    /// # Errors
    /// Same classes as [`describe_table`](Self::describe_table).
    pub async fn get_table_constraints(
        &mut self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<PgConstraint>> {
        let span = tracing::info_span!(
            parent: self.manager.span(),
            "get_table_constraints",
            schema,
            table
        );
        async {
            require_identifier(schema, SCHEMA_NAME)?;
            require_identifier(table, TABLE_NAME)?;
            let rows = self
                .manager
                .query(
                    "get_table_constraints",
                    &format!("table '{schema}.{table}'"),
                    TABLE_CONSTRAINTS,
                    &[schema, table],
                )
                .await?;
            rows.iter().map(PgConstraint::from_row).collect()
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl<C: Connector> Closeable for PostgresIntrospector<C> {
    async fn close(&mut self) {
        self.manager.close().await;
    }
}

impl<C: Connector> Introspector for PostgresIntrospector<C> {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::PostgreSQL
    }

    fn supports_feature(&self, feature: AdapterFeature) -> bool {
        matches!(
            feature,
            AdapterFeature::ReadOnlyMode
                | AdapterFeature::ServerSideOrdering
                | AdapterFeature::Constraints
        )
    }

    fn target(&self) -> String {
        self.manager.connector().target()
    }
}
