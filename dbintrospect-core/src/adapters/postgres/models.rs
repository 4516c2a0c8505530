//! Normalized PostgreSQL catalog records.

use crate::Result;
use crate::catalog::{CatalogRow, RowExt};
use serde::{Deserialize, Serialize};

/// Schemas hidden from `list_schemas` by exact name.
pub const EXCLUDED_SCHEMAS: [&str; 2] = ["information_schema", "pg_catalog"];

/// Schema name prefixes hidden from `list_schemas`.
pub const EXCLUDED_SCHEMA_PREFIXES: [&str; 2] = ["pg_toast", "pg_temp"];

/// Whether a schema belongs to the server rather than to users.
pub fn is_system_schema(name: &str) -> bool {
    EXCLUDED_SCHEMAS.contains(&name)
        || EXCLUDED_SCHEMA_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
}

/// One column of a table, in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PgColumn {
    /// Column name
    pub column_name: String,
    /// Declared type as rendered by `information_schema`
    pub data_type: String,
    /// `YES` or `NO`, as reported by the catalog
    pub is_nullable: String,
    /// Default expression, if any
    pub column_default: Option<String>,
}

impl PgColumn {
    /// Whether the catalog reported the column as nullable.
    pub fn nullable(&self) -> bool {
        self.is_nullable == "YES"
    }

    pub(crate) fn from_row(row: &CatalogRow) -> Result<Self> {
        const OP: &str = "describe_table";
        Ok(Self {
            column_name: row.text("column_name", OP)?,
            data_type: row.text("data_type", OP)?,
            is_nullable: row.text("is_nullable", OP)?,
            column_default: row.opt_text("column_default", OP)?,
        })
    }
}

/// One index with its full `CREATE INDEX` definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PgIndex {
    /// Index name
    pub indexname: String,
    /// Definition text from `pg_indexes`
    pub indexdef: String,
}

impl PgIndex {
    pub(crate) fn from_row(row: &CatalogRow) -> Result<Self> {
        const OP: &str = "get_table_indexes";
        Ok(Self {
            indexname: row.text("indexname", OP)?,
            indexdef: row.text("indexdef", OP)?,
        })
    }
}

/// One table constraint rendered by `pg_get_constraintdef`.
///
/// Primary key, foreign key, unique and check constraints all share this
/// shape; the kind is visible in the definition text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PgConstraint {
    /// Constraint name
    pub constraint_name: String,
    /// Definition text, e.g. `PRIMARY KEY (id)`
    pub constraint_def: String,
}

impl PgConstraint {
    pub(crate) fn from_row(row: &CatalogRow) -> Result<Self> {
        const OP: &str = "get_table_constraints";
        Ok(Self {
            constraint_name: row.text("constraint_name", OP)?,
            constraint_def: row.text("constraint_def", OP)?,
        })
    }
}
