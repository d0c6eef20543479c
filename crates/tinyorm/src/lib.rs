//! # tinyorm
//!
//! A lightweight record-mapping ORM with lazy, cached query results and
//! dirty tracking.
//!
//! ## Features
//!
//! - **Schema from the table**: a model's fields are discovered once from the
//!   live table, not declared in Rust
//! - **Lazy queries**: `where` / `order_by` only build state; index and slice
//!   access map onto `LIMIT`, and the first fetch is cached
//! - **Partial updates**: only fields assigned since the last save are written,
//!   keyed by the previous primary key
//! - **Hooks**: before/after update and delete
//! - **Query monitoring**: wrap any client with timing, logging and stats
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tinyorm::sqlite::SqliteClient;
//! use tinyorm::{Model, fields, values};
//!
//! #[derive(Model)]
//! struct User;
//!
//! let db = Arc::new(SqliteClient::open_in_memory()?);
//! tinyorm::register::<User>(db.clone())?;
//!
//! // INSERT INTO `user` (`name`, `age`) VALUES (?, ?)
//! let mut bob = User::from_fields(fields![name = "Bob", age = 30])?;
//! bob.save()?;
//!
//! // UPDATE `user` SET `age` = ? WHERE `id` = ?
//! bob.set("age", 31)?;
//! bob.save()?;
//!
//! // SELECT * FROM `user` WHERE age > ? ORDER BY `id` DESC LIMIT 0, 10
//! let page = User::where_raw("age > ?", values![18])?
//!     .order_by("`id` DESC")
//!     .slice(..10)?;
//!
//! // SELECT COUNT(0) FROM `user` WHERE `name` = ?
//! let johns = User::filter(fields![name = "John"])?.count()?;
//! ```

pub mod client;
pub mod error;
pub mod exec;
pub mod ident;
pub mod model;
pub mod monitor;
pub mod query;
pub mod record;
pub mod schema;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod testing;

pub use client::{Cursor, GenericClient, Row};
pub use error::{DbError, OrmError, OrmResult};
pub use exec::{RawQuery, execute, raw};
pub use ident::quote_ident;
pub use model::{DefaultValue, Defaults, Model, ModelHooks, default_table_name};
pub use monitor::{
    CompositeMonitor, InstrumentedClient, LoggingMonitor, MonitorConfig, NoopMonitor,
    QueryContext, QueryMonitor, QueryResult, QueryStats, QueryType, StatsMonitor,
};
pub use query::{Limit, Query};
pub use record::Record;
pub use schema::{FieldSpec, ModelMeta, is_registered, register};
pub use value::Value;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteClient, SqliteConfig};

#[cfg(feature = "derive")]
pub use tinyorm_derive::Model;
