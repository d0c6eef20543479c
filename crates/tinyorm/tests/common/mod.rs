#![allow(dead_code)]

use std::sync::Arc;
use tinyorm::{Model, Record, SqliteClient, Value};

pub const USER_SCHEMA: &str = "
    CREATE TABLE user (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        age  INTEGER
    );
";

/// Logs to the test writer when `RUST_LOG` is set, e.g. `RUST_LOG=tinyorm=debug`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An in-memory database with an empty `user` table.
pub fn empty_db() -> Arc<SqliteClient> {
    init_tracing();
    let db = SqliteClient::open_in_memory().expect("open in-memory sqlite");
    db.with_connection(|c| c.execute_batch(USER_SCHEMA))
        .expect("create user table");
    Arc::new(db)
}

/// `user` seeded with (1, John, 25), (2, John, 30), (3, Bob, 30).
pub fn user_db() -> Arc<SqliteClient> {
    let db = empty_db();
    db.with_connection(|c| {
        c.execute_batch(
            "INSERT INTO user (name, age) VALUES ('John', 25), ('John', 30), ('Bob', 30);",
        )
    })
    .expect("seed user table");
    db
}

pub fn ids<M>(records: &[Record<M>]) -> Vec<i64> {
    records
        .iter()
        .map(|r| r.pk().as_i64().expect("integer key"))
        .collect()
}

pub fn row<M: Model>(record: &Record<M>) -> (i64, String, i64) {
    let get = |field: &str| record.get(field).cloned().unwrap_or(Value::Null);
    (
        get("id").as_i64().unwrap_or_default(),
        get("name").as_str().unwrap_or_default().to_string(),
        get("age").as_i64().unwrap_or_default(),
    )
}
