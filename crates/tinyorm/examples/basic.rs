//! Basic usage example for tinyorm
//!
//! Run with: cargo run --example basic -p tinyorm
//!
//! Set `RUST_LOG=tinyorm=debug` to see every statement.

use std::sync::Arc;
use std::time::Duration;
use tinyorm::{
    CompositeMonitor, Defaults, InstrumentedClient, LoggingMonitor, Model, MonitorConfig,
    SqliteClient, StatsMonitor, fields, values,
};
use tracing_subscriber::EnvFilter;

fn user_defaults() -> Defaults {
    Defaults::new().value("name", "John Doe")
}

#[derive(Model)]
#[orm(table = "user", defaults = user_defaults)]
struct User;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let sqlite = SqliteClient::open_in_memory()?;
    sqlite.with_connection(|c| {
        c.execute_batch(
            "CREATE TABLE user (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                age  INTEGER
            )",
        )
    })?;

    let stats = Arc::new(StatsMonitor::new());
    let client = InstrumentedClient::new(sqlite)
        .with_config(
            MonitorConfig::new()
                .with_slow_query_threshold(Duration::from_millis(50))
                .enable_monitoring(),
        )
        .with_monitor(
            CompositeMonitor::new()
                .add(LoggingMonitor::new())
                .add_arc(stats.clone()),
        );

    tinyorm::register::<User>(Arc::new(client))?;

    // ============================================
    // Create
    // ============================================
    for (name, age) in [("John", 25), ("John", 30), ("Bob", 30)] {
        User::from_fields(fields![name = name, age = age])?.save()?;
    }
    let mut anonymous = User::from_fields(fields![age = 99])?;
    anonymous.save()?;
    println!("created {anonymous}");

    // ============================================
    // Read
    // ============================================
    let johns = User::filter(fields![name = "John"])?;
    println!("johns: {}", johns.count()?);
    println!(
        "distinct names among johns: {}",
        johns.count_of("distinct(name)")?
    );

    let mut adults = User::where_raw("age > ?", values![26])?.order_by("`id` DESC");
    for user in adults.iter()? {
        println!("age > 26: {user}");
    }

    if let Some(last) = User::query()?.at(-1)? {
        println!("last: {last}");
    }
    println!("first two: {:?}", User::query()?.slice(..2)?);

    // ============================================
    // Update
    // ============================================
    let mut bob = User::find_by(fields![name = "Bob"])?.ok_or("Bob is missing")?;
    bob.set("age", 31)?;
    bob.save()?;

    bob.set("id", 100)?;
    bob.save()?;
    println!("bob moved to {}", bob.pk());

    // ============================================
    // Delete
    // ============================================
    bob.delete()?;
    let removed = User::filter(fields![name = "John"])?.delete()?;
    println!("removed {removed} johns");

    let s = stats.stats();
    println!(
        "statements: {} select, {} insert, {} update, {} delete",
        s.select_count, s.insert_count, s.update_count, s.delete_count
    );

    Ok(())
}
