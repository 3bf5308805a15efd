//! Integration tests for the full pipeline over a real SQLite database
//!
//! Covers the envelope contract end to end: filter syntax and operators,
//! type coercion (including blob hex), permissions, pagination, updates,
//! inserts with RETURNING, and foreign-key eager loading.

use std::sync::Arc;

use lattice_core::{
    Ability, Actor, ColumnRules, OpenAccess, Record, RetCode, RoleTable,
};
use lattice_pipeline::{QueryParams, TableBinding, TableView};
use lattice_sqlite::{SqliteBackend, SqliteConfig, SqlitePool};
use serde_json::{json, Value};

fn seeded_pool() -> SqlitePool {
    let pool = SqlitePool::new(SqliteConfig::memory()).expect("create pool");
    pool.with_connection(|conn| {
        conn.execute_batch(
            r#"
            CREATE TABLE test (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                binary BLOB NOT NULL,
                count INTEGER NOT NULL,
                active BOOLEAN NOT NULL DEFAULT 0,
                flt FLOAT NOT NULL DEFAULT 0,
                json JSON
            );
            CREATE TABLE topic (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                owner_id INTEGER NOT NULL REFERENCES test(id)
            );

            INSERT INTO test (name, binary, count, active, flt, json) VALUES
                ('Name1', x'7465737431', 1, 0, 0.0, '{"q": 1}'),
                ('Name2', x'7465737432', 2, 0, 0.0, '{"q": 2}'),
                ('Name3', x'7465737433', 3, 1, 0.0, '{"q": 3}'),
                ('Name4', x'7465737434', 4, 1, 0.0, '{"q": 4}'),
                ('Name5', x'7465737435', 5, 1, 0.0, '{"q": 5}');

            INSERT INTO topic (title, owner_id) VALUES
                ('TopicA', 1),
                ('TopicB', 2);
            "#,
        )?;
        Ok(())
    })
    .expect("seed schema");
    pool
}

fn open_view(pool: &SqlitePool, table: &str) -> TableView {
    let backend = Arc::new(SqliteBackend::new(pool.clone()));
    let binding = Arc::new(TableBinding::new(backend, table));
    TableView::new(binding, Arc::new(OpenAccess))
}

fn anon() -> Actor {
    Actor::anonymous()
}

// =============================================================================
// fetch_one: filters, syntax, coercion
// =============================================================================

#[tokio::test]
async fn test_fetch_one_without_filters() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    let env = view.fetch_one(&anon(), None, &QueryParams::new()).await;

    assert_eq!(env.code, RetCode::Success);
    let record = env.data.as_object().expect("record payload");
    assert_eq!(record["name"], json!("Name1"));
    // Blobs come back hex-encoded.
    assert_eq!(record["binary"], json!("7465737431"));
}

#[tokio::test]
async fn test_fetch_one_unmatched_filter_is_not_found() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    let params = QueryParams::new().with_filter("name", json!(1));
    let env = view.fetch_one(&anon(), None, &params).await;

    assert_eq!(env.code, RetCode::NotFound);
    assert_eq!(env.data, Value::Null);
}

#[tokio::test]
async fn test_unknown_column_vs_malformed_key() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    // Unknown column is a schema problem.
    let params = QueryParams::new().with_filter("qqq", json!(1));
    let env = view.fetch_one(&anon(), None, &params).await;
    assert_eq!(env.code, RetCode::Failed);

    // Malformed key is a syntax problem; callers must see the difference.
    let params = QueryParams::new().with_filter("qqq.a.b", json!(1));
    let env = view.fetch_one(&anon(), None, &params).await;
    assert_eq!(env.code, RetCode::InvalidParams);
}

#[tokio::test]
async fn test_uncoercible_float_value() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    let params = QueryParams::new().with_filter("flt", json!("qq"));
    let env = view.fetch_one(&anon(), None, &params).await;

    assert_eq!(env.code, RetCode::InvalidParams);
}

#[tokio::test]
async fn test_comparison_operators_on_float() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    for key in ["flt", "flt.eq", "flt.le"] {
        let params = QueryParams::new().with_filter(key, json!("0"));
        let env = view.fetch_one(&anon(), None, &params).await;
        assert_eq!(env.code, RetCode::Success, "filter {key}");
    }

    // Nothing is strictly below the stored minimum.
    let params = QueryParams::new().with_filter("flt.lt", json!("0"));
    let env = view.fetch_one(&anon(), None, &params).await;
    assert_eq!(env.code, RetCode::NotFound);
}

#[tokio::test]
async fn test_in_operator_binds_each_element() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    let params = QueryParams::new().with_filter("count.in", json!(["1", "3"]));
    let env = view.fetch_list(&anon(), None, &params, 10, 1).await;

    assert_eq!(env.code, RetCode::Success);
    assert_eq!(env.data["total"], json!(2));
}

#[tokio::test]
async fn test_select_narrows_record() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    let params = QueryParams::new()
        .with_filter("name", json!("Name2"))
        .with_select("name,count");
    let env = view.fetch_one(&anon(), None, &params).await;

    assert_eq!(env.code, RetCode::Success);
    let record = env.data.as_object().unwrap();
    assert_eq!(record.len(), 2);
    assert_eq!(record["name"], json!("Name2"));
    assert_eq!(record["count"], json!(2));
}

#[tokio::test]
async fn test_order_applies_to_fetch_one() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    let params = QueryParams::new().with_order("count.desc");
    let env = view.fetch_one(&anon(), None, &params).await;

    assert_eq!(env.code, RetCode::Success);
    assert_eq!(env.data["name"], json!("Name5"));
}

#[tokio::test]
async fn test_boolean_filter_accepts_text() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    let params = QueryParams::new().with_filter("active", json!("true"));
    let env = view.fetch_list(&anon(), None, &params, 10, 1).await;

    assert_eq!(env.code, RetCode::Success);
    assert_eq!(env.data["total"], json!(3));
}

// =============================================================================
// fetch_list: pagination
// =============================================================================

#[tokio::test]
async fn test_pagination_block_and_item_order() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    let params = QueryParams::new()
        .with_order("count.asc")
        .with_select("name");
    let env = view.fetch_list(&anon(), None, &params, 2, 2).await;

    assert_eq!(env.code, RetCode::Success);
    assert_eq!(env.data["total"], json!(5));
    assert_eq!(env.data["size"], json!(2));
    assert_eq!(env.data["page"], json!(2));
    assert_eq!(env.data["pages"], json!(3));
    // Page 2 at size 2 starts at offset 2.
    assert_eq!(env.data["items"], json!([["Name3"], ["Name4"]]));
}

#[tokio::test]
async fn test_pagination_empty_result_is_success() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    let params = QueryParams::new().with_filter("count.gt", json!("100"));
    let env = view.fetch_list(&anon(), None, &params, 10, 1).await;

    assert_eq!(env.code, RetCode::Success);
    assert_eq!(env.data["total"], json!(0));
    assert_eq!(env.data["pages"], json!(0));
    assert_eq!(env.data["items"], json!([]));
}

// =============================================================================
// update
// =============================================================================

#[tokio::test]
async fn test_update_matching_row() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    let mut payload = Record::new();
    payload.insert("count".into(), json!("9"));
    let params = QueryParams::new().with_filter("name", json!("Name1"));
    let env = view.update(&anon(), None, &params, &payload).await;

    assert_eq!(env.code, RetCode::Success);
    assert_eq!(env.data, json!({ "count": 1 }));

    let env = view.fetch_one(&anon(), None, &params).await;
    assert_eq!(env.data["count"], json!(9));
}

#[tokio::test]
async fn test_update_zero_matches_is_success() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    let mut payload = Record::new();
    payload.insert("count".into(), json!("9"));
    let params = QueryParams::new().with_filter("name", json!("NoSuchName"));
    let env = view.update(&anon(), None, &params, &payload).await;

    assert_eq!(env.code, RetCode::Success);
    assert_eq!(env.data, json!({ "count": 0 }));
}

// =============================================================================
// insert
// =============================================================================

#[tokio::test]
async fn test_insert_returns_inserted_record() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    let mut payload = Record::new();
    payload.insert("name".into(), json!("Name6"));
    payload.insert("binary".into(), json!("6e6577"));
    payload.insert("count".into(), json!("6"));
    let env = view.insert(&payload).await;

    assert_eq!(env.code, RetCode::Success);
    let record = env.data.as_object().expect("inserted record");
    assert_eq!(record["name"], json!("Name6"));
    assert_eq!(record["binary"], json!("6e6577"));
    assert_eq!(record["count"], json!(6));
    assert!(record["id"].as_i64().unwrap() > 5);
}

#[tokio::test]
async fn test_insert_odd_length_blob_names_the_defect() {
    let pool = seeded_pool();
    let view = open_view(&pool, "test");

    let mut payload = Record::new();
    payload.insert("name".into(), json!("Name7"));
    payload.insert("binary".into(), json!("abc"));
    payload.insert("count".into(), json!("7"));
    let env = view.insert(&payload).await;

    assert_eq!(env.code, RetCode::InvalidParams);
    let reason = env.data.as_str().unwrap();
    assert!(reason.contains("odd-length"), "reason: {reason}");
}

// =============================================================================
// permissions
// =============================================================================

fn restricted_view(pool: &SqlitePool) -> TableView {
    let backend = Arc::new(SqliteBackend::new(pool.clone()));
    let binding = Arc::new(TableBinding::new(backend, "test"));
    let provider = RoleTable::new(Ability::DenyAll).role(
        "user",
        Ability::Rules(ColumnRules::new().readable("name").read_write("count")),
    );
    TableView::new(binding, Arc::new(provider))
}

#[tokio::test]
async fn test_read_scope_trims_columns() {
    let pool = seeded_pool();
    let view = restricted_view(&pool);
    let user = Actor::new("u1").with_role("user");

    let env = view.fetch_one(&user, Some("user"), &QueryParams::new()).await;

    assert_eq!(env.code, RetCode::Success);
    let record = env.data.as_object().unwrap();
    assert_eq!(record.len(), 2);
    assert!(record.contains_key("name"));
    assert!(record.contains_key("count"));
}

#[tokio::test]
async fn test_forbidden_actor_sees_not_found() {
    let pool = seeded_pool();
    let view = restricted_view(&pool);

    // Row exists, but an actor with no readable columns must not learn that.
    let env = view
        .fetch_one(&Actor::anonymous(), Some("user"), &QueryParams::new())
        .await;

    assert_eq!(env.code, RetCode::NotFound);
}

#[tokio::test]
async fn test_write_scope_filters_payload() {
    let pool = seeded_pool();
    let view = restricted_view(&pool);
    let user = Actor::new("u1").with_role("user");

    // `name` is read-only for this role; only `count` lands.
    let mut payload = Record::new();
    payload.insert("name".into(), json!("Hacked"));
    payload.insert("count".into(), json!("10"));
    let params = QueryParams::new().with_filter("count", json!("1"));
    let env = view.update(&user, Some("user"), &params, &payload).await;

    assert_eq!(env.code, RetCode::Success);
    assert_eq!(env.data, json!({ "count": 1 }));

    let open = open_view(&pool, "test");
    let check = QueryParams::new().with_filter("count", json!("10"));
    let env = open.fetch_one(&Actor::anonymous(), None, &check).await;
    assert_eq!(env.data["name"], json!("Name1"));
}

#[tokio::test]
async fn test_write_denied_everywhere_fails() {
    let pool = seeded_pool();
    let view = restricted_view(&pool);
    let user = Actor::new("u1").with_role("user");

    let mut payload = Record::new();
    payload.insert("name".into(), json!("Hacked"));
    let env = view
        .update(&user, Some("user"), &QueryParams::new(), &payload)
        .await;

    assert_eq!(env.code, RetCode::Failed);
}

// =============================================================================
// foreign-key eager load
// =============================================================================

#[tokio::test]
async fn test_loadfk_embeds_referenced_record() {
    let pool = seeded_pool();
    let view = open_view(&pool, "topic");

    let params = QueryParams::new()
        .with_filter("title", json!("TopicA"))
        .with_loadfk(json!({ "owner_id": null }));
    let env = view.fetch_one(&anon(), None, &params).await;

    assert_eq!(env.code, RetCode::Success);
    let owner = env.data["owner_id"].as_object().expect("embedded record");
    assert_eq!(owner["name"], json!("Name1"));
}

#[tokio::test]
async fn test_loadfk_unknown_column_fails() {
    let pool = seeded_pool();
    let view = open_view(&pool, "topic");

    let params = QueryParams::new()
        .with_filter("title", json!("TopicA"))
        .with_loadfk(json!({ "aaa": null }));
    let env = view.fetch_one(&anon(), None, &params).await;

    assert_eq!(env.code, RetCode::Failed);
}

#[tokio::test]
async fn test_loadfk_must_be_an_object() {
    let pool = seeded_pool();
    let view = open_view(&pool, "topic");

    let params = QueryParams::new()
        .with_filter("title", json!("TopicA"))
        .with_loadfk(json!("owner_id"));
    let env = view.fetch_one(&anon(), None, &params).await;

    assert_eq!(env.code, RetCode::Failed);
}

#[tokio::test]
async fn test_loadfk_non_fk_column_fails() {
    let pool = seeded_pool();
    let view = open_view(&pool, "topic");

    let params = QueryParams::new()
        .with_filter("title", json!("TopicA"))
        .with_loadfk(json!({ "title": null }));
    let env = view.fetch_one(&anon(), None, &params).await;

    assert_eq!(env.code, RetCode::Failed);
}

// =============================================================================
// metadata binding
// =============================================================================

#[tokio::test]
async fn test_unknown_declared_type_fails_the_bind() {
    let pool = seeded_pool();
    pool.with_connection(|conn| {
        conn.execute_batch("CREATE TABLE weird (id INTEGER PRIMARY KEY, geo GEOMETRY);")?;
        Ok(())
    })
    .unwrap();

    let view = open_view(&pool, "weird");
    let env = view.fetch_one(&anon(), None, &QueryParams::new()).await;

    assert_eq!(env.code, RetCode::Failed);
    assert!(env.data.as_str().unwrap().contains("GEOMETRY"));
}

#[tokio::test]
async fn test_missing_table_fails() {
    let pool = seeded_pool();
    let view = open_view(&pool, "missing");

    let env = view.fetch_one(&anon(), None, &QueryParams::new()).await;
    assert_eq!(env.code, RetCode::Failed);
}
