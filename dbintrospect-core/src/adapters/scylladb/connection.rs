//! ScyllaDB session management and CQL value decoding.
//!
//! # Security
//! CQL has no session-level read-only switch. Sessions opened here are
//! ordinary sessions; safety rests on the introspector issuing nothing but
//! `SELECT` statements against `system_schema`.

use super::config::ScyllaConfig;
use crate::catalog::{CatalogRow, CatalogSession, Connector};
use crate::error::BoxError;
use async_trait::async_trait;
use scylla::frame::response::result::{CqlValue, Row};
use scylla::{Session, SessionBuilder};
use serde_json::{Map, Value};

/// Opens driver sessions against one contact point.
#[derive(Debug, Clone)]
pub struct ScyllaConnector {
    config: ScyllaConfig,
}

impl ScyllaConnector {
    /// Creates a connector; no connection is attempted.
    pub const fn new(config: ScyllaConfig) -> Self {
        Self { config }
    }

    /// The configuration sessions are opened with.
    pub const fn config(&self) -> &ScyllaConfig {
        &self.config
    }
}

#[async_trait]
impl Connector for ScyllaConnector {
    type Session = ScyllaSession;

    fn target(&self) -> String {
        self.config.to_string()
    }

    async fn connect(&self) -> Result<ScyllaSession, BoxError> {
        let mut builder = SessionBuilder::new().known_node(self.config.known_node());
        if let Some(credentials) = self.config.credentials() {
            tracing::debug!(user = credentials.username(), "Using password authentication");
            builder = builder.user(credentials.username(), credentials.password());
        }
        let session = builder.build().await?;
        Ok(ScyllaSession { session })
    }
}

/// One driver session and the cluster connections behind it.
pub struct ScyllaSession {
    session: Session,
}

impl std::fmt::Debug for ScyllaSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScyllaSession").finish_non_exhaustive()
    }
}

#[async_trait]
impl CatalogSession for ScyllaSession {
    async fn execute(&mut self, query: &str, params: &[&str]) -> Result<Vec<CatalogRow>, BoxError> {
        let values: Vec<String> = params.iter().map(ToString::to_string).collect();
        let result = self.session.query_unpaged(query, values).await?;

        let names: Vec<String> = result
            .col_specs()
            .iter()
            .map(|spec| spec.name.clone())
            .collect();
        let rows: Vec<Row> = result.rows_or_empty();

        Ok(rows.iter().map(|row| decode_row(&names, row)).collect())
    }

    // The driver reconnects its node pools on its own.
    fn is_usable(&self) -> bool {
        true
    }

    async fn close(self) -> Result<(), BoxError> {
        // Dropping the session shuts down its connection pools.
        drop(self.session);
        Ok(())
    }
}

fn decode_row(names: &[String], row: &Row) -> CatalogRow {
    names
        .iter()
        .zip(&row.columns)
        .map(|(name, value)| {
            let value = value.as_ref().map_or(Value::Null, cql_value_to_json);
            (name.clone(), value)
        })
        .collect()
}

/// Converts a CQL value to JSON; maps become objects keyed by their
/// stringified keys.
pub(crate) fn cql_value_to_json(value: &CqlValue) -> Value {
    match value {
        CqlValue::Empty => Value::Null,
        CqlValue::Boolean(b) => Value::Bool(*b),
        CqlValue::TinyInt(i) => Value::from(*i),
        CqlValue::SmallInt(i) => Value::from(*i),
        CqlValue::Int(i) => Value::from(*i),
        CqlValue::BigInt(i) => Value::from(*i),
        CqlValue::Float(f) => Value::from(*f),
        CqlValue::Double(f) => Value::from(*f),
        CqlValue::Ascii(s) | CqlValue::Text(s) => Value::from(s.clone()),
        CqlValue::Uuid(u) => Value::from(u.to_string()),
        CqlValue::List(items) | CqlValue::Set(items) => {
            Value::Array(items.iter().map(cql_value_to_json).collect())
        }
        CqlValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (cql_map_key_to_string(k), cql_value_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
        CqlValue::Tuple(values) => Value::Array(
            values
                .iter()
                .map(|v| v.as_ref().map_or(Value::Null, cql_value_to_json))
                .collect(),
        ),
        other => Value::from(format!("{other:?}")),
    }
}

fn cql_map_key_to_string(key: &CqlValue) -> String {
    match key {
        CqlValue::Ascii(s) | CqlValue::Text(s) => s.clone(),
        CqlValue::Uuid(u) => u.to_string(),
        CqlValue::Int(i) => i.to_string(),
        CqlValue::BigInt(i) => i.to_string(),
        other => format!("{other:?}"),
    }
}
