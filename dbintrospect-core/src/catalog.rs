//! Backend-neutral catalog access.
//!
//! Each backend driver is wrapped in a [`CatalogSession`] that executes a
//! catalog query with bound string parameters and hands back rows as
//! JSON maps. A [`Connector`] knows how to open such a session from
//! its stored configuration. The introspection engines are written against
//! these two traits only, so the same validation, connection and
//! error-reporting flow drives both backends and can be exercised in tests
//! with an in-memory session.

use crate::Result;
use crate::error::{BoxError, IntrospectError};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One catalog row, keyed by column name.
pub type CatalogRow = Map<String, Value>;

/// An open, exclusively owned backend session.
#[async_trait]
pub trait CatalogSession: Send {
    /// Executes a read-only catalog query with positional string parameters.
    ///
    /// # Errors
    /// Returns the driver's error, boxed. Callers attach operation context.
    async fn execute(
        &mut self,
        query: &str,
        params: &[&str],
    ) -> std::result::Result<Vec<CatalogRow>, BoxError>;

    /// Whether the session can still serve queries.
    ///
    /// A session that hit a transport failure reports `false` so the
    /// manager replaces it on the next operation.
    fn is_usable(&self) -> bool;

    /// Releases the session and its transport.
    ///
    /// # Errors
    /// Returns the driver's error if the orderly shutdown failed; the
    /// underlying handle is released either way.
    async fn close(self) -> std::result::Result<(), BoxError>
    where
        Self: Sized;
}

/// Opens sessions for one configured backend target.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Session type produced by this connector.
    type Session: CatalogSession;

    /// Credential-free description of the target, used in logs and errors.
    fn target(&self) -> String;

    /// Opens and prepares a new session.
    ///
    /// # Errors
    /// Returns the driver's transport or authentication error, boxed.
    async fn connect(&self) -> std::result::Result<Self::Session, BoxError>;
}

/// Typed field access on catalog rows with consistent error reporting.
///
/// # Example
/// ```rust
/// use dbintrospect_core::catalog::{CatalogRow, RowExt};
/// use serde_json::json;
///
/// let row: CatalogRow = json!({"table_name": "users", "position": 2})
///     .as_object()
///     .cloned()
///     .unwrap_or_default();
///
/// assert_eq!(row.text("table_name", "list_tables").unwrap(), "users");
/// assert_eq!(row.opt_int("position", "describe_table").unwrap(), Some(2));
/// ```
pub trait RowExt {
    /// Extracts a required text field.
    ///
    /// # Errors
    /// Fails when the field is missing, null, or not text.
    fn text(&self, field: &str, operation: &str) -> Result<String>;

    /// Extracts an optional text field; missing and null both map to `None`.
    ///
    /// # Errors
    /// Fails when the field holds a non-text value.
    fn opt_text(&self, field: &str, operation: &str) -> Result<Option<String>>;

    /// Extracts an optional 32-bit integer field.
    ///
    /// # Errors
    /// Fails when the field holds a non-integer or out-of-range value.
    fn opt_int(&self, field: &str, operation: &str) -> Result<Option<i32>>;
}

impl RowExt for CatalogRow {
    fn text(&self, field: &str, operation: &str) -> Result<String> {
        self.opt_text(field, operation)?
            .ok_or_else(|| IntrospectError::parse_field(field, operation, "value is missing"))
    }

    fn opt_text(&self, field: &str, operation: &str) -> Result<Option<String>> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(IntrospectError::parse_field(
                field,
                operation,
                format!("expected text, found {other}"),
            )),
        }
    }

    fn opt_int(&self, field: &str, operation: &str) -> Result<Option<i32>> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| {
                    IntrospectError::parse_field(
                        field,
                        operation,
                        format!("expected 32-bit integer, found {n}"),
                    )
                }),
            Some(other) => Err(IntrospectError::parse_field(
                field,
                operation,
                format!("expected integer, found {other}"),
            )),
        }
    }
}

/// Collects one required text field from every row, keeping row order.
pub(crate) fn text_column(rows: &[CatalogRow], field: &str, operation: &str) -> Result<Vec<String>> {
    rows.iter().map(|row| row.text(field, operation)).collect()
}
