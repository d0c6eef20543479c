use super::config::MonitorConfig;
use super::monitors::NoopMonitor;
use super::types::{QueryContext, QueryMonitor, QueryResult};
use crate::client::{Cursor, GenericClient};
use crate::error::DbError;
use crate::value::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A database client that wraps another `GenericClient` with monitoring.
///
/// Monitoring must be explicitly enabled via `MonitorConfig::enable_monitoring()`.
/// `commit` and `rollback` are forwarded untimed.
pub struct InstrumentedClient<C> {
    client: C,
    monitor: Arc<dyn QueryMonitor>,
    config: MonitorConfig,
}

impl<C: GenericClient> InstrumentedClient<C> {
    /// Wrap `client` with monitoring disabled.
    pub fn new(client: C) -> Self {
        Self {
            client,
            monitor: Arc::new(NoopMonitor),
            config: MonitorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    /// Set the monitor from an `Arc`, keeping a handle for the caller.
    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn enable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = true;
        self
    }

    pub fn disable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = false;
        self
    }

    pub fn is_monitoring_enabled(&self) -> bool {
        self.config.monitoring_enabled
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn inner(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    fn report_result(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        self.monitor.on_query_complete(ctx, duration, result);

        if let Some(threshold) = self.config.slow_query_threshold {
            if duration > threshold {
                self.monitor.on_slow_query(ctx, duration);
            }
        }
    }
}

impl<C: GenericClient> GenericClient for InstrumentedClient<C> {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<Cursor, DbError> {
        if !self.config.monitoring_enabled {
            return self.client.execute(sql, params);
        }

        let ctx = QueryContext::new(sql, params.len());
        self.monitor.on_query_start(&ctx);

        let start = Instant::now();
        let result = self.client.execute(sql, params);
        let duration = start.elapsed();

        let query_result = match &result {
            Ok(cursor) if cursor.description().is_empty() => {
                QueryResult::Affected(cursor.row_count())
            }
            Ok(cursor) => QueryResult::Rows(cursor.rows().len()),
            Err(err) => QueryResult::error(err.to_string()),
        };

        self.report_result(&ctx, duration, &query_result);
        result
    }

    fn commit(&self) -> Result<(), DbError> {
        self.client.commit()
    }

    fn rollback(&self) -> Result<(), DbError> {
        self.client.rollback()
    }
}
