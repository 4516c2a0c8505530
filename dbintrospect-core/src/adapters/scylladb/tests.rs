//! Unit tests for the ScyllaDB introspector against a scripted session.

use super::*;
use crate::error::IntrospectError;
use crate::test_support::{Script, ScriptedConnector};
use serde_json::json;
use std::sync::Arc;

fn introspector() -> (ScyllaIntrospector<ScriptedConnector>, Arc<Script>) {
    let (connector, script) = ScriptedConnector::new();
    (ScyllaIntrospector::with_connector(connector), script)
}

#[tokio::test]
async fn test_list_keyspaces_filters_and_sorts() {
    let (mut db, script) = introspector();
    script.push_rows(vec![
        json!({"keyspace_name": "system_traces"}),
        json!({"keyspace_name": "shop"}),
        json!({"keyspace_name": "system"}),
        json!({"keyspace_name": "analytics"}),
        json!({"keyspace_name": "system_auth"}),
        json!({"keyspace_name": "system_schema"}),
        json!({"keyspace_name": "system_distributed"}),
        json!({"keyspace_name": "system_views"}),
    ]);

    let keyspaces = db.list_keyspaces().await.unwrap();
    assert_eq!(keyspaces, vec!["analytics", "shop", "system_views"]);
}

#[tokio::test]
async fn test_list_tables_sorted_and_bound() {
    let (mut db, script) = introspector();
    script.push_rows(vec![
        json!({"table_name": "users"}),
        json!({"table_name": "orders"}),
    ]);

    let tables = db.list_tables("shop").await.unwrap();
    assert_eq!(tables, vec!["orders", "users"]);

    let (query, params) = &script.executed()[0];
    assert!(query.contains("keyspace_name = ?"));
    assert_eq!(params, &vec!["shop".to_string()]);
}

#[tokio::test]
async fn test_describe_table_reorders_columns() {
    let (mut db, script) = introspector();
    script.push_rows(vec![
        json!({"column_name": "note", "type": "text", "kind": "regular", "position": 1}),
        json!({"column_name": "user_id", "type": "uuid", "kind": "partition_key", "position": 0}),
        json!({"column_name": "created_at", "type": "timestamp", "kind": "clustering", "position": 0}),
        json!({"column_name": "owner", "type": "text", "kind": "static", "position": 2}),
    ]);

    let columns = db.describe_table("shop", "orders").await.unwrap();
    let layout: Vec<(ColumnKind, Option<i32>)> =
        columns.iter().map(|c| (c.kind, c.position)).collect();
    assert_eq!(
        layout,
        vec![
            (ColumnKind::PartitionKey, Some(0)),
            (ColumnKind::Clustering, Some(0)),
            (ColumnKind::Static, Some(2)),
            (ColumnKind::Regular, Some(1)),
        ]
    );
    assert_eq!(columns[0].r#type, "uuid");

    let (_, params) = &script.executed()[0];
    assert_eq!(params, &vec!["shop".to_string(), "orders".to_string()]);
}

#[tokio::test]
async fn test_indexes_keep_catalog_order() {
    let (mut db, script) = introspector();
    script.push_rows(vec![
        json!({"index_name": "orders_by_status", "kind": "COMPOSITES",
               "options": {"target": "status"}}),
        json!({"index_name": "orders_by_email", "kind": "COMPOSITES", "options": null}),
    ]);

    let indexes = db.get_table_indexes("shop", "orders").await.unwrap();
    assert_eq!(indexes[0].index_name, "orders_by_status");
    assert_eq!(indexes[0].options, r#"{"target":"status"}"#);
    assert_eq!(indexes[1].index_name, "orders_by_email");
    assert_eq!(indexes[1].options, "");
}

#[tokio::test]
async fn test_materialized_views_sorted() {
    let (mut db, script) = introspector();
    script.push_rows(vec![
        json!({"view_name": "orders_by_user", "base_table_name": "orders"}),
        json!({"view_name": "orders_by_day", "base_table_name": "orders"}),
    ]);

    let views = db.get_materialized_views("shop").await.unwrap();
    let names: Vec<&str> = views.iter().map(|v| v.view_name.as_str()).collect();
    assert_eq!(names, vec!["orders_by_day", "orders_by_user"]);
    assert!(views.iter().all(|v| v.base_table_name == "orders"));
}

#[tokio::test]
async fn test_invalid_keyspace_rejected_first_without_connecting() {
    let (mut db, script) = introspector();

    let err = db.describe_table("shop.x", "bad table").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid keyspace name: shop.x");

    let err = db.get_table_indexes("shop", "o'rders").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid table name: o'rders");

    let err = db.get_materialized_views("a b").await.unwrap_err();
    assert!(matches!(err, IntrospectError::InvalidIdentifier { .. }));

    assert_eq!(script.connects(), 0);
    assert!(script.executed().is_empty());
}

#[tokio::test]
async fn test_backend_failure_propagates() {
    let (mut db, script) = introspector();
    script.push_error("Keyspace shop does not exist");

    let err = db.list_tables("shop").await.unwrap_err();
    assert!(matches!(err, IntrospectError::BackendQueryFailed { .. }));
    assert!(err.to_string().contains("keyspace 'shop'"));
}

#[tokio::test]
async fn test_close_twice() {
    let (mut db, script) = introspector();
    db.close().await;
    db.close().await;

    db.list_keyspaces().await.unwrap();
    db.close().await;
    db.close().await;
    assert_eq!(script.connects(), 1);
    assert_eq!(script.closes(), 1);
}

#[test]
fn test_capabilities() {
    let (db, _script) = introspector();
    assert_eq!(db.backend_kind(), BackendKind::ScyllaDB);
    assert!(!db.supports_feature(AdapterFeature::ReadOnlyMode));
    assert!(!db.supports_feature(AdapterFeature::Constraints));
    assert!(db.supports_feature(AdapterFeature::MaterializedViews));
}

fn assert_send<T: Send>(_: &T) {}

// Compiles only if every operation future is Send for any connector.
fn operation_futures_are_send<C: crate::catalog::Connector>(db: &mut ScyllaIntrospector<C>) {
    assert_send(&db.list_keyspaces());
    assert_send(&db.list_tables("shop"));
    assert_send(&db.describe_table("shop", "orders"));
    assert_send(&db.get_table_indexes("shop", "orders"));
    assert_send(&db.get_materialized_views("shop"));
    assert_send(&db.ensure_connected());
    assert_send(&db.close());
}

#[test]
fn test_operation_futures_are_send() {
    let (mut db, script) = introspector();
    operation_futures_are_send(&mut db);
    assert_eq!(script.connects(), 0);
}
