//! Background worker for periodic introspection

use crate::introspector::{IntrospectionReport, SchemaIntrospector};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration};

/// Background worker that refreshes registry row counts on a schedule
///
/// Row counts are soft state: between two cycles readers may see counts that
/// are one interval old.
///
/// # Examples
///
/// ```no_run
/// use groundwork_registry::{IntrospectionConfig, IntrospectionWorker, SchemaIntrospector, SourceRegistry};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let registry = Arc::new(SourceRegistry::new(vec![])?);
///     let introspector = Arc::new(SchemaIntrospector::new(registry, vec![], IntrospectionConfig::default()));
///     let (stop, stopped) = tokio::sync::watch::channel(false);
///
///     let mut worker = IntrospectionWorker::new(introspector);
///     let handle = tokio::spawn(async move { worker.run(stopped).await });
///
///     stop.send(true)?;
///     handle.await?;
///     Ok(())
/// }
/// ```
pub struct IntrospectionWorker {
    introspector: Arc<SchemaIntrospector>,
    interval: Duration,
    cycles: usize,
    last_report: Option<IntrospectionReport>,
}

impl IntrospectionWorker {
    /// Create a worker using the introspector's configured interval
    pub fn new(introspector: Arc<SchemaIntrospector>) -> Self {
        let interval = introspector.config().interval();
        Self::with_interval(introspector, interval)
    }

    /// Create a worker with an explicit interval
    pub fn with_interval(introspector: Arc<SchemaIntrospector>, interval: Duration) -> Self {
        Self {
            introspector,
            interval,
            cycles: 0,
            last_report: None,
        }
    }

    /// Completed cycles
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    /// Report of the most recent cycle
    pub fn last_report(&self) -> Option<&IntrospectionReport> {
        self.last_report.as_ref()
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.interval);

        tracing::info!("Introspection worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.cycle().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Shutdown signal received, stopping introspection worker");
                        break;
                    }
                }
            }
        }

        tracing::info!("Introspection worker stopped after {} cycles", self.cycles);
    }

    /// Run a fixed number of cycles (useful for testing)
    pub async fn run_cycles(&mut self, cycles: usize) {
        let mut ticker = interval(self.interval);

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting introspection cycle {}/{}", cycle + 1, cycles);
            self.cycle().await;
        }
    }

    async fn cycle(&mut self) {
        let introspector = Arc::clone(&self.introspector);
        match tokio::task::spawn_blocking(move || introspector.introspect_all()).await {
            Ok(report) => {
                if report.is_partial() {
                    tracing::warn!(
                        failed = ?report.failed_stores(),
                        "Introspection cycle completed with failures"
                    );
                } else {
                    tracing::info!(
                        tables = report.tables_updated(),
                        "Introspection cycle completed"
                    );
                }
                self.last_report = Some(report);
            }
            Err(e) => {
                tracing::error!("Introspection cycle aborted: {}", e);
            }
        }
        self.cycles += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStoreAdapter;
    use crate::config::IntrospectionConfig;
    use crate::registry::SourceRegistry;
    use groundwork_domain::{DataSource, IntegrationStatus, SourceType, TableSchema};
    use serde_json::json;

    fn introspector(store: &MemoryStoreAdapter) -> Arc<SchemaIntrospector> {
        let registry = Arc::new(
            SourceRegistry::new(vec![DataSource::new(
                "pg.equipment",
                "Equipment DB",
                SourceType::Relational,
                IntegrationStatus::Real,
            )
            .with_table(TableSchema::new("readings"))])
            .unwrap(),
        );
        Arc::new(SchemaIntrospector::new(
            registry,
            vec![Arc::new(store.clone())],
            IntrospectionConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_run_cycles() {
        let store = MemoryStoreAdapter::new("pg.equipment")
            .with_table("readings", vec![json!({"a": 1}), json!({"a": 2})]);
        let introspector = introspector(&store);
        let mut worker = IntrospectionWorker::with_interval(Arc::clone(&introspector), Duration::from_millis(5));

        worker.run_cycles(3).await;

        assert_eq!(worker.cycles(), 3);
        assert_eq!(store.call_count(), 3);
        assert!(!worker.last_report().unwrap().is_partial());
        assert_eq!(introspector.describe_table("readings").unwrap().table.row_count, 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let store = MemoryStoreAdapter::new("pg.equipment");
        let mut worker = IntrospectionWorker::with_interval(introspector(&store), Duration::from_millis(5));
        let (stop, stopped) = watch::channel(false);

        let handle = tokio::spawn(async move {
            worker.run(stopped).await;
            worker.cycles()
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        stop.send(true).unwrap();

        let cycles = handle.await.unwrap();
        assert!(cycles >= 1);
    }
}
