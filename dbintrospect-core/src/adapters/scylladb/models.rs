//! Normalized ScyllaDB schema records and the column ordering rule.
//!
//! `system_schema.columns` returns columns in an order that says nothing
//! about their role in the table. Callers want them laid out the way the
//! table is declared: partition key components first, then clustering
//! columns, then static columns, then everything else, each group in
//! position order. [`sort_columns`] produces that layout.

use crate::Result;
use crate::catalog::{CatalogRow, RowExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Keyspaces owned by the server, hidden from `list_keyspaces`.
pub const EXCLUDED_KEYSPACES: [&str; 5] = [
    "system",
    "system_schema",
    "system_auth",
    "system_distributed",
    "system_traces",
];

/// Whether a keyspace belongs to the server rather than to users.
pub fn is_system_keyspace(name: &str) -> bool {
    EXCLUDED_KEYSPACES.contains(&name)
}

/// Role of a column in a CQL table, in layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Component of the partition key
    PartitionKey,
    /// Clustering column
    Clustering,
    /// Column shared by all rows of a partition
    Static,
    /// Ordinary column
    Regular,
}

impl ColumnKind {
    /// Parses the catalog's `kind` text.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "partition_key" => Some(Self::PartitionKey),
            "clustering" => Some(Self::Clustering),
            "static" => Some(Self::Static),
            "regular" => Some(Self::Regular),
            _ => None,
        }
    }

    /// Catalog spelling of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PartitionKey => "partition_key",
            Self::Clustering => "clustering",
            Self::Static => "static",
            Self::Regular => "regular",
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of a CQL table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScyllaColumn {
    /// Column name
    pub column_name: String,
    /// CQL type, e.g. `text` or `frozen<list<int>>`
    #[serde(rename = "type")]
    pub r#type: String,
    /// Role of the column in the table
    pub kind: ColumnKind,
    /// Position within its kind group; absent on some server versions
    pub position: Option<i32>,
}

impl ScyllaColumn {
    pub(crate) fn from_row(row: &CatalogRow) -> Result<Self> {
        const OP: &str = "describe_table";
        let column_name = row.text("column_name", OP)?;
        let raw_kind = row.text("kind", OP)?;
        let kind = ColumnKind::parse(&raw_kind).unwrap_or_else(|| {
            tracing::warn!(
                column = %column_name,
                kind = %raw_kind,
                "Unknown column kind, treating as regular"
            );
            ColumnKind::Regular
        });
        Ok(Self {
            column_name,
            r#type: row.text("type", OP)?,
            kind,
            position: row.opt_int("position", OP)?,
        })
    }
}

/// Orders columns by kind, then by position; a missing position sorts last
/// within its kind. The sort is stable, so ties keep catalog order.
pub fn sort_columns(columns: &mut [ScyllaColumn]) {
    columns.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| compare_positions(a.position, b.position))
    });
}

fn compare_positions(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// One secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScyllaIndex {
    /// Index name
    pub index_name: String,
    /// Index kind, e.g. `COMPOSITES` or `CUSTOM`
    pub kind: String,
    /// Index options rendered as compact JSON, empty when there are none
    pub options: String,
}

impl ScyllaIndex {
    pub(crate) fn from_row(row: &CatalogRow) -> Result<Self> {
        const OP: &str = "get_table_indexes";
        Ok(Self {
            index_name: row.text("index_name", OP)?,
            kind: row.text("kind", OP)?,
            options: render_options(row.get("options")),
        })
    }
}

/// Renders an options map as text; absent, null and empty maps become `""`.
pub(crate) fn render_options(options: Option<&Value>) -> String {
    match options {
        None | Some(Value::Null) => String::new(),
        Some(Value::Object(map)) if map.is_empty() => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// One materialized view and the table it is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedView {
    /// View name
    pub view_name: String,
    /// Base table name
    pub base_table_name: String,
}

impl MaterializedView {
    pub(crate) fn from_row(row: &CatalogRow) -> Result<Self> {
        const OP: &str = "get_materialized_views";
        Ok(Self {
            view_name: row.text("view_name", OP)?,
            base_table_name: row.text("base_table_name", OP)?,
        })
    }
}
