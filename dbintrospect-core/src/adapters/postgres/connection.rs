//! PostgreSQL session management over a single sqlx connection.
//!
//! # Security Features
//! - Every session is switched to `default_transaction_read_only = on`
//!   before it is handed out, so the server rejects writes on its own
//! - The connection target shown in logs and errors never carries the
//!   password
//! - A session that fails to enter read-only mode is closed, never used

use super::config::PostgresConfig;
use crate::catalog::{CatalogRow, CatalogSession, Connector};
use crate::error::BoxError;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgDatabaseError, PgRow, PgSeverity};
use sqlx::{Column, ConnectOptions, Connection, Row, TypeInfo, ValueRef};

/// Statement that turns every later transaction on the session read-only.
pub(crate) const READ_ONLY_STATEMENT: &str = "SET default_transaction_read_only = on";

/// Opens read-only PostgreSQL sessions for one configured database.
#[derive(Debug, Clone)]
pub struct PgConnector {
    config: PostgresConfig,
}

impl PgConnector {
    /// Creates a connector; no connection is attempted.
    pub const fn new(config: PostgresConfig) -> Self {
        Self { config }
    }

    /// The configuration sessions are opened with.
    pub const fn config(&self) -> &PostgresConfig {
        &self.config
    }

    fn connect_options(&self) -> PgConnectOptions {
        let credentials = self.config.credentials();
        PgConnectOptions::new()
            .host(self.config.host())
            .port(self.config.port())
            .username(credentials.username())
            .password(credentials.password())
            .database(self.config.database())
            .application_name(&format!("dbintrospect-{}", env!("CARGO_PKG_VERSION")))
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Session = PgSession;

    fn target(&self) -> String {
        self.config.to_string()
    }

    async fn connect(&self) -> Result<PgSession, BoxError> {
        let mut conn = self.connect_options().connect().await?;

        if let Err(e) = sqlx::query(READ_ONLY_STATEMENT).execute(&mut conn).await {
            tracing::error!(error = %e, "Failed to enable read-only mode, discarding session");
            if let Err(close_err) = conn.close().await {
                tracing::debug!(error = %close_err, "Close after failed read-only setup also failed");
            }
            return Err(e.into());
        }

        tracing::debug!("Session set to read-only");
        Ok(PgSession {
            conn,
            broken: false,
        })
    }
}

/// One open PostgreSQL connection in read-only mode.
#[derive(Debug)]
pub struct PgSession {
    conn: PgConnection,
    broken: bool,
}

/// Transport-level failures leave the connection in an unknown state.
///
/// A server error also ends the session when the backend is going away:
/// FATAL or PANIC severity, or SQLSTATE class `08` (connection exception)
/// or `57P` (operator intervention, e.g. `pg_terminate_backend`).
fn is_transport_error(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => {
            let severity = db
                .try_downcast_ref::<PgDatabaseError>()
                .map(PgDatabaseError::severity);
            ends_session(severity, db.code().as_deref())
        }
        _ => false,
    }
}

fn ends_session(severity: Option<PgSeverity>, code: Option<&str>) -> bool {
    matches!(severity, Some(PgSeverity::Fatal | PgSeverity::Panic))
        || code.is_some_and(|code| code.starts_with("08") || code.starts_with("57P"))
}

#[async_trait]
impl CatalogSession for PgSession {
    async fn execute(&mut self, query: &str, params: &[&str]) -> Result<Vec<CatalogRow>, BoxError> {
        let mut statement = sqlx::query(query);
        for param in params {
            statement = statement.bind(*param);
        }

        let rows = match statement.fetch_all(&mut self.conn).await {
            Ok(rows) => rows,
            Err(e) => {
                if is_transport_error(&e) {
                    self.broken = true;
                }
                return Err(e.into());
            }
        };

        rows.iter().map(decode_row).collect()
    }

    fn is_usable(&self) -> bool {
        !self.broken
    }

    async fn close(self) -> Result<(), BoxError> {
        self.conn.close().await.map_err(Into::into)
    }
}

/// Converts a driver row into a catalog row, keyed by column name.
///
/// Catalog queries cast name-typed columns to `text`; anything that is not
/// a boolean or a number is decoded as text.
fn decode_row(row: &PgRow) -> Result<CatalogRow, BoxError> {
    let mut out = CatalogRow::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_name = raw.type_info().name().to_string();
            match type_name.as_str() {
                "BOOL" => Value::from(row.try_get::<bool, _>(index)?),
                "INT2" => Value::from(row.try_get::<i16, _>(index)?),
                "INT4" => Value::from(row.try_get::<i32, _>(index)?),
                "INT8" => Value::from(row.try_get::<i64, _>(index)?),
                "FLOAT4" => Value::from(row.try_get::<f32, _>(index)?),
                "FLOAT8" => Value::from(row.try_get::<f64, _>(index)?),
                _ => Value::from(row.try_get::<String, _>(index)?),
            }
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PostgresConfig {
        PostgresConfig::new(
            Some("db.internal"),
            Some(6543),
            Some("reader"),
            Some("hunter2"),
            Some("inventory"),
        )
        .unwrap()
    }

    #[test]
    fn test_target_omits_credentials() {
        let connector = PgConnector::new(config());
        let target = connector.target();
        assert_eq!(target, "postgres://db.internal:6543/inventory");
        assert!(!target.contains("hunter2"));
        assert!(!format!("{connector:?}").contains("hunter2"));
    }

    #[test]
    fn test_connect_options_carry_config() {
        let connector = PgConnector::new(config());
        let options = connector.connect_options();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "reader");
        assert_eq!(options.get_database(), Some("inventory"));
        assert!(
            options
                .get_application_name()
                .is_some_and(|name| name.starts_with("dbintrospect-"))
        );
    }

    #[test]
    fn test_transport_errors_mark_session_broken() {
        let io = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(is_transport_error(&io));
        assert!(is_transport_error(&sqlx::Error::WorkerCrashed));
        assert!(!is_transport_error(&sqlx::Error::RowNotFound));
        assert!(!is_transport_error(&sqlx::Error::ColumnNotFound(
            "indexdef".to_string()
        )));
    }

    #[derive(Debug)]
    struct ServerError {
        code: &'static str,
    }

    impl std::fmt::Display for ServerError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "server error {}", self.code)
        }
    }

    impl std::error::Error for ServerError {}

    impl sqlx::error::DatabaseError for ServerError {
        fn message(&self) -> &str {
            "server error"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(std::borrow::Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    fn server_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ServerError { code }))
    }

    #[test]
    fn test_terminated_backend_marks_session_broken() {
        // admin_shutdown, raised after pg_terminate_backend
        assert!(is_transport_error(&server_error("57P01")));
        assert!(is_transport_error(&server_error("57P02")));
        assert!(is_transport_error(&server_error("08006")));

        // read_only_sql_transaction and undefined_table keep the session
        assert!(!is_transport_error(&server_error("25006")));
        assert!(!is_transport_error(&server_error("42P01")));
        assert!(!is_transport_error(&server_error("57014")));
    }

    #[test]
    fn test_fatal_severity_ends_session() {
        assert!(ends_session(Some(PgSeverity::Fatal), Some("XX000")));
        assert!(ends_session(Some(PgSeverity::Panic), None));
        assert!(!ends_session(Some(PgSeverity::Error), Some("42601")));
        assert!(!ends_session(None, None));
    }
}
