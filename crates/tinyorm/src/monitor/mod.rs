//! Statement monitoring for any [`GenericClient`](crate::GenericClient).
//!
//! [`InstrumentedClient`] wraps a client, times every statement and reports a
//! [`QueryContext`] plus a [`QueryResult`] to a [`QueryMonitor`]. Monitoring
//! is off until enabled through [`MonitorConfig`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tinyorm::monitor::{InstrumentedClient, LoggingMonitor, MonitorConfig};
//! use std::time::Duration;
//!
//! let config = MonitorConfig::new()
//!     .with_slow_query_threshold(Duration::from_millis(50))
//!     .enable_monitoring();
//!
//! let client = InstrumentedClient::new(SqliteClient::open_in_memory()?)
//!     .with_config(config)
//!     .with_monitor(LoggingMonitor::new());
//!
//! tinyorm::register::<User>(std::sync::Arc::new(client))?;
//! ```

mod config;
mod instrumented;
mod monitors;
mod types;


pub use config::MonitorConfig;
pub use instrumented::InstrumentedClient;
pub use monitors::{CompositeMonitor, LoggingMonitor, NoopMonitor, QueryStats, StatsMonitor};
pub use types::{QueryContext, QueryMonitor, QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
