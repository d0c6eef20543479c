use super::*;
use crate::client::Cursor;
use crate::model::ModelHooks;
use crate::schema::register;
use crate::testing::ScriptedClient;
use crate::{fields, values};

macro_rules! user_model {
    () => {
        struct User;
        impl ModelHooks for User {}
        impl Model for User {}
    };
}

fn setup<M: Model>() -> (Arc<ScriptedClient>, Arc<ModelMeta>) {
    let client = ScriptedClient::new(&["id", "name", "age"]);
    let meta = register::<M>(client.clone()).unwrap();
    client.take_log();
    (client, meta)
}

fn ids<M>(records: &[Record<M>]) -> Vec<Value> {
    records.iter().map(|r| r.get("id").unwrap().clone()).collect()
}

// ==================== SQL composition ====================

#[test]
fn select_with_where_and_order() {
    user_model!();
    let (_, meta) = setup::<User>();

    let q = Query::<User>::new(meta)
        .where_raw("age > ?", values![29])
        .where_eq("name", "John")
        .order_by("`id` DESC");

    assert_eq!(
        q.to_sql(),
        "SELECT * FROM `user` WHERE age > ? AND `name` = ? ORDER BY `id` DESC"
    );
    assert_eq!(q.params(), &[Value::Int(29), Value::from("John")]);
}

#[test]
fn bare_select_has_no_trailing_space() {
    user_model!();
    let (_, meta) = setup::<User>();

    let q = Query::<User>::new(meta);
    assert_eq!(q.to_sql(), "SELECT * FROM `user`");
    assert_eq!(q.where_clause(), None);
}

#[test]
fn null_filter_becomes_is_null() {
    user_model!();
    let (_, meta) = setup::<User>();

    let q = Query::<User>::new(meta).where_eq("name", Value::Null);
    assert_eq!(q.to_sql(), "SELECT * FROM `user` WHERE `name` IS NULL");
    assert!(q.params().is_empty());
}

#[test]
fn filter_matches_chained_where_eq() {
    user_model!();
    let (_, meta) = setup::<User>();

    let a = Query::<User>::new(meta.clone()).filter(fields![name = "John", age = 30]);
    let b = Query::<User>::new(meta)
        .where_eq("name", "John")
        .where_eq("age", 30);

    assert_eq!(a.to_sql(), b.to_sql());
    assert_eq!(a.params(), b.params());
}

#[test]
fn order_by_overwrites() {
    user_model!();
    let (_, meta) = setup::<User>();

    let q = Query::<User>::new(meta)
        .order_by("`age`")
        .order_by("`name` DESC");
    assert_eq!(q.to_sql(), "SELECT * FROM `user` ORDER BY `name` DESC");
}

#[test]
fn custom_operation() {
    user_model!();
    let (_, meta) = setup::<User>();

    let q = Query::<User>::new(meta).with_operation("SELECT DISTINCT *");
    assert_eq!(q.to_sql(), "SELECT DISTINCT * FROM `user`");
}

#[test]
fn limit_rendering() {
    assert_eq!(Limit::Offset(0).to_string(), "LIMIT 0");
    assert_eq!(Limit::Window(10, 5).to_string(), "LIMIT 10, 5");
}

// ==================== Index access ====================

#[test]
fn index_uses_limit_then_cache() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_rows(vec![values![1, "John", 25]]);

    let mut q = Query::<User>::new(meta);
    let first = q.at(0).unwrap().unwrap();
    assert_eq!(first.get("name"), Some(&Value::from("John")));
    assert!(!first.is_new());
    assert_eq!(q.limit(), Some(Limit::Window(0, 1)));
    assert_eq!(
        client.take_sql(),
        vec!["SELECT * FROM `user` LIMIT 0, 1".to_string()]
    );

    // Served from the one-row cache: no statement, out of range is None.
    assert!(q.is_cached());
    assert!(q.at(0).unwrap().is_some());
    assert!(q.at(3).unwrap().is_none());
    assert!(client.take_log().is_empty());
}

#[test]
fn index_past_end_is_none() {
    user_model!();
    let (client, meta) = setup::<User>();

    let mut q = Query::<User>::new(meta);
    assert!(q.at(7).unwrap().is_none());
    assert_eq!(
        client.take_sql(),
        vec!["SELECT * FROM `user` LIMIT 7, 1".to_string()]
    );
}

#[test]
fn negative_index_counts_first() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_scalar(3);
    client.push_rows(vec![values![3, "Bob", 30]]);

    let mut q = Query::<User>::new(meta);
    let last = q.at(-1).unwrap().unwrap();
    assert_eq!(last.get("id"), Some(&Value::Int(3)));
    assert_eq!(
        client.take_sql(),
        vec![
            "SELECT COUNT(0) FROM `user`".to_string(),
            "SELECT * FROM `user` LIMIT 2, 1".to_string(),
        ]
    );
}

#[test]
fn negative_index_beyond_count_skips_select() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_scalar(1);

    let mut q = Query::<User>::new(meta);
    assert!(q.at(-5).unwrap().is_none());
    assert_eq!(client.take_log().len(), 1);
    assert!(!q.is_cached());
}

#[test]
fn negative_index_on_cache() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_rows(vec![values![1, "John", 25], values![2, "John", 30]]);

    let mut q = Query::<User>::new(meta);
    q.records().unwrap();
    client.take_log();

    assert_eq!(
        q.at(-1).unwrap().unwrap().get("id"),
        Some(&Value::Int(2))
    );
    assert!(q.at(-3).unwrap().is_none());
    assert!(client.take_log().is_empty());
}

// ==================== Slicing ====================

#[test]
fn slice_to_stop() {
    user_model!();
    let (client, meta) = setup::<User>();

    let mut q = Query::<User>::new(meta);
    q.slice(..10).unwrap();
    assert_eq!(q.limit(), Some(Limit::Window(0, 10)));
    assert_eq!(
        client.take_sql(),
        vec!["SELECT * FROM `user` LIMIT 0, 10".to_string()]
    );
}

#[test]
fn slice_window() {
    user_model!();
    let (client, meta) = setup::<User>();

    let mut q = Query::<User>::new(meta).where_eq("name", "John");
    q.slice(10..20).unwrap();
    let log = client.take_log();
    assert_eq!(
        log[0].sql,
        "SELECT * FROM `user` WHERE `name` = ? LIMIT 10, 10"
    );
    assert_eq!(log[0].params, values!["John"]);
}

#[test]
fn slice_inclusive_end() {
    user_model!();
    let (client, meta) = setup::<User>();

    let mut q = Query::<User>::new(meta);
    q.slice(2..=4).unwrap();
    assert_eq!(
        client.take_sql(),
        vec!["SELECT * FROM `user` LIMIT 2, 3".to_string()]
    );
}

#[test]
fn inverted_slice_is_limit_zero() {
    user_model!();
    let (client, meta) = setup::<User>();

    let mut q = Query::<User>::new(meta);
    #[allow(clippy::reversed_empty_ranges)]
    let rows = q.slice(2..1).unwrap();
    assert!(rows.is_empty());
    assert_eq!(q.limit(), Some(Limit::Offset(0)));
    assert!(q.is_cached());
    assert_eq!(
        client.take_sql(),
        vec!["SELECT * FROM `user` LIMIT 0".to_string()]
    );
}

#[test]
fn open_slice_fetches_everything() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_rows(vec![
        values![1, "John", 25],
        values![2, "John", 30],
        values![3, "Bob", 30],
    ]);

    let mut q = Query::<User>::new(meta);
    let tail = q.slice(1..).unwrap();
    assert_eq!(ids(&tail), values![2, 3]);
    assert_eq!(q.limit(), None);
    assert_eq!(client.take_sql(), vec!["SELECT * FROM `user`".to_string()]);

    // The cache holds every row, not just the slice.
    assert_eq!(q.len().unwrap(), 3);
    assert!(q.slice(5..).unwrap().is_empty());
    assert_eq!(ids(&q.slice(..).unwrap()), values![1, 2, 3]);
    assert!(client.take_log().is_empty());
}

#[test]
fn cached_slice_clamps() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_rows(vec![values![1, "a", 1], values![2, "b", 2]]);

    let mut q = Query::<User>::new(meta);
    q.records().unwrap();
    client.take_log();

    assert_eq!(ids(&q.slice(1..10).unwrap()), values![2]);
    assert!(q.slice(2..1).unwrap().is_empty());
    assert!(client.take_log().is_empty());
}

// ==================== Count / delete ====================

#[test]
fn count_without_cache_runs_count() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_scalar(2);

    let q = Query::<User>::new(meta)
        .where_eq("name", "John")
        .order_by("`id`");
    assert_eq!(q.count().unwrap(), 2);

    let log = client.take_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].sql, "SELECT COUNT(0) FROM `user` WHERE `name` = ?");
    assert_eq!(log[0].params, values!["John"]);
}

#[test]
fn count_with_cache_uses_len() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_rows(vec![values![1, "John", 25], values![2, "John", 30]]);

    let mut q = Query::<User>::new(meta);
    q.records().unwrap();
    client.take_log();

    assert_eq!(q.count().unwrap(), 2);
    assert_eq!(q.count_of("*").unwrap(), 2);
    assert!(client.take_log().is_empty());

    // Any other expression still hits the database.
    client.push_scalar(1);
    assert_eq!(q.count_of("distinct(name)").unwrap(), 1);
    assert_eq!(
        client.take_sql(),
        vec!["SELECT COUNT(distinct(name)) FROM `user`".to_string()]
    );
}

#[test]
fn count_distinct_quotes_column() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_scalar(Value::Text("4".into()));

    let q = Query::<User>::new(meta);
    assert_eq!(q.count_distinct("name").unwrap(), 4);
    assert_eq!(
        client.take_sql(),
        vec!["SELECT COUNT(DISTINCT `name`) FROM `user`".to_string()]
    );
}

#[test]
fn count_accepts_integral_scalars() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_scalar(0);
    client.push_scalar(3.0);
    client.push_scalar(" 12 ");

    let q = Query::<User>::new(meta);
    assert_eq!(q.count().unwrap(), 0);
    assert_eq!(q.count().unwrap(), 3);
    assert_eq!(q.count().unwrap(), 12);
}

#[test]
fn count_rejects_unreadable_scalar() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_scalar(Value::Null);
    client.push_scalar("many");
    client.push_scalar(2.5);
    client.push_cursor(Cursor::default());

    let q = Query::<User>::new(meta);
    for _ in 0..4 {
        let err = q.count().unwrap_err();
        assert!(matches!(err, OrmError::Serialization(_)), "{err}");
    }

    let err = {
        client.push_scalar(Value::Null);
        q.count_of("distinct(name)").unwrap_err()
    };
    assert_eq!(
        err.to_string(),
        "Serialization error: COUNT(distinct(name)) returned NULL, not an integer \
         (sql: SELECT COUNT(distinct(name)) FROM `user`)"
    );
}

#[test]
fn delete_uses_where_only() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_cursor(Cursor::affected(2, None));

    let q = Query::<User>::new(meta)
        .where_eq("name", "John")
        .order_by("`id`");
    assert_eq!(q.delete().unwrap(), 2);
    assert_eq!(
        client.take_sql(),
        vec!["DELETE FROM `user` WHERE `name` = ?".to_string()]
    );
}

#[test]
fn failed_select_rolls_back() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_error("no such column: agee");

    let mut q = Query::<User>::new(meta).where_raw("agee > 1", values![]);
    let err = q.records().unwrap_err();
    assert!(err.is_query_execution());
    assert_eq!(client.rollbacks(), 1);
    assert!(!q.is_cached());
}

#[test]
fn fetch_all_builds_persisted_records() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_rows(vec![values![1, "John", 25], values![2, "John", 30]]);

    let users = Query::<User>::new(meta).fetch_all().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| !u.is_new() && !u.is_dirty()));
    assert_eq!(users[1].pk(), &Value::Int(2));
}

#[test]
fn iter_materializes_once() {
    user_model!();
    let (client, meta) = setup::<User>();
    client.push_rows(vec![values![1, "a", 1], values![2, "b", 2]]);

    let mut q = Query::<User>::new(meta);
    assert_eq!(q.iter().unwrap().count(), 2);
    assert_eq!(q.iter().unwrap().count(), 2);
    assert!(!q.is_empty().unwrap());
    assert_eq!(client.take_log().len(), 1);
}
