//! Read-only schema introspection CLI.
//!
//! Runs one introspection operation against PostgreSQL or ScyllaDB and
//! prints the result as JSON on stdout. Connection settings come from
//! flags or the matching environment variables; logs go to stderr.
//!
//! # Security Guarantees
//! - Only catalog reads are issued
//! - Passwords are never logged and hidden from `--help` output
//! - The session is closed before the process exits, on success or error

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dbintrospect_core::adapters::postgres::{PostgresConfig, PostgresIntrospector};
use dbintrospect_core::adapters::scylladb::{ScyllaConfig, ScyllaIntrospector};
use dbintrospect_core::logging::init_logging;
use dbintrospect_core::{AdapterFeature, IntrospectError, Introspector, Result, with_scoped};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "dbintrospect")]
#[command(about = "Read-only schema introspection for PostgreSQL and ScyllaDB")]
#[command(version)]
#[command(long_about = "
dbintrospect - read-only schema introspection

Lists schemas, tables, columns, indexes, constraints and materialized views
and prints them as JSON.

SECURITY FEATURES:
- Catalog reads only
- PostgreSQL sessions are read-only at the server
- Schema, keyspace and table names are validated before any query

EXAMPLES:
  POSTGRES_USER=app POSTGRES_PASSWORD=... POSTGRES_DATABASE=appdb \\
    dbintrospect postgres describe-table public users
  dbintrospect --pretty scylla --host 10.0.0.5 list-keyspaces
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub backend: Backend,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all logging except errors")]
    pub quiet: bool,

    /// Pretty-print JSON
    #[arg(long, help = "Pretty-print the JSON result")]
    pub pretty: bool,
}

#[derive(Debug, Subcommand)]
pub enum Backend {
    /// Introspect a PostgreSQL database
    Postgres(PostgresArgs),
    /// Introspect a ScyllaDB or Cassandra cluster
    Scylla(ScyllaArgs),
}

#[derive(Debug, Args)]
pub struct PostgresArgs {
    #[command(flatten)]
    pub connection: PostgresConnection,

    #[command(subcommand)]
    pub operation: PostgresOperation,
}

#[derive(Debug, Args)]
pub struct PostgresConnection {
    #[arg(long, env = "POSTGRES_HOST", help = "Server host [default: localhost]")]
    pub host: Option<String>,

    #[arg(long, env = "POSTGRES_PORT", help = "Server port [default: 5432]")]
    pub port: Option<u16>,

    #[arg(long, env = "POSTGRES_USER", help = "Login user")]
    pub user: Option<String>,

    #[arg(
        long,
        env = "POSTGRES_PASSWORD",
        hide_env_values = true,
        help = "Login password"
    )]
    pub password: Option<String>,

    #[arg(long, env = "POSTGRES_DATABASE", help = "Database to introspect")]
    pub database: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum PostgresOperation {
    /// List user schemas
    ListSchemas,
    /// List base tables in a schema
    ListTables { schema: String },
    /// Describe the columns of a table
    DescribeTable { schema: String, table: String },
    /// List the indexes of a table
    Indexes { schema: String, table: String },
    /// List the constraints of a table
    Constraints { schema: String, table: String },
}

#[derive(Debug, Args)]
pub struct ScyllaArgs {
    #[command(flatten)]
    pub connection: ScyllaConnection,

    #[command(subcommand)]
    pub operation: ScyllaOperation,
}

#[derive(Debug, Args)]
pub struct ScyllaConnection {
    #[arg(long, env = "SCYLLA_HOST", help = "Contact point host [default: localhost]")]
    pub host: Option<String>,

    #[arg(long, env = "SCYLLA_PORT", help = "Contact point port [default: 9042]")]
    pub port: Option<u16>,

    #[arg(long, env = "SCYLLA_USER", help = "User; authentication needs user and password")]
    pub user: Option<String>,

    #[arg(
        long,
        env = "SCYLLA_PASSWORD",
        hide_env_values = true,
        help = "Password"
    )]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ScyllaOperation {
    /// List user keyspaces
    ListKeyspaces,
    /// List tables in a keyspace
    ListTables { keyspace: String },
    /// Describe the columns of a table, key columns first
    DescribeTable { keyspace: String, table: String },
    /// List the secondary indexes of a table
    Indexes { keyspace: String, table: String },
    /// List the materialized views of a keyspace
    Views { keyspace: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    let output = match cli.backend {
        Backend::Postgres(args) => run_postgres(args)
            .await
            .context("PostgreSQL introspection failed")?,
        Backend::Scylla(args) => run_scylla(args)
            .await
            .context("ScyllaDB introspection failed")?,
    };

    println!("{}", render(&output, cli.global.pretty)?);
    Ok(())
}

/// Logs the target and flags backends whose sessions are not read-only.
fn announce<I: Introspector>(db: &I) {
    info!(backend = %db.backend_kind(), target = %db.target(), "Starting introspection");
    if !db.supports_feature(AdapterFeature::ReadOnlyMode) {
        warn!(
            backend = %db.backend_kind(),
            "Backend has no server-side read-only mode; relying on catalog SELECTs only"
        );
    }
}

async fn run_postgres(args: PostgresArgs) -> Result<Value> {
    let c = &args.connection;
    let config = PostgresConfig::new(
        c.host.as_deref(),
        c.port,
        c.user.as_deref(),
        c.password.as_deref(),
        c.database.as_deref(),
    )?;
    let db = PostgresIntrospector::new(config).with_span(tracing::info_span!("postgres"));
    announce(&db);

    let operation = args.operation;
    with_scoped(db, |db| {
        Box::pin(async move {
            match operation {
                PostgresOperation::ListSchemas => to_json(&db.list_schemas().await?),
                PostgresOperation::ListTables { schema } => {
                    to_json(&db.list_tables(&schema).await?)
                }
                PostgresOperation::DescribeTable { schema, table } => {
                    to_json(&db.describe_table(&schema, &table).await?)
                }
                PostgresOperation::Indexes { schema, table } => {
                    to_json(&db.get_table_indexes(&schema, &table).await?)
                }
                PostgresOperation::Constraints { schema, table } => {
                    to_json(&db.get_table_constraints(&schema, &table).await?)
                }
            }
        })
    })
    .await
}

async fn run_scylla(args: ScyllaArgs) -> Result<Value> {
    let c = &args.connection;
    let config = ScyllaConfig::new(
        c.host.as_deref(),
        c.port,
        c.user.as_deref(),
        c.password.as_deref(),
    );
    let db = ScyllaIntrospector::new(config).with_span(tracing::info_span!("scylla"));
    announce(&db);

    let operation = args.operation;
    with_scoped(db, |db| {
        Box::pin(async move {
            match operation {
                ScyllaOperation::ListKeyspaces => to_json(&db.list_keyspaces().await?),
                ScyllaOperation::ListTables { keyspace } => {
                    to_json(&db.list_tables(&keyspace).await?)
                }
                ScyllaOperation::DescribeTable { keyspace, table } => {
                    to_json(&db.describe_table(&keyspace, &table).await?)
                }
                ScyllaOperation::Indexes { keyspace, table } => {
                    to_json(&db.get_table_indexes(&keyspace, &table).await?)
                }
                ScyllaOperation::Views { keyspace } => {
                    to_json(&db.get_materialized_views(&keyspace).await?)
                }
            }
        })
    })
    .await
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| IntrospectError::serialization("Failed to serialize operation result", e))
}

fn render(value: &Value, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.map_err(|e| IntrospectError::serialization("Failed to render JSON output", e))
}
