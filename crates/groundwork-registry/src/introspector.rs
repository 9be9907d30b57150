//! Schema introspection against the live stores.
//!
//! Discovers what actually exists, independent of the declared schema, and
//! answers "which table contains X". A failing store never stops the others:
//! each store yields its own `Result`, and the report carries the failures.

use crate::config::IntrospectionConfig;
use crate::probe::{probe_entities, ProbeReport};
use crate::registry::{RegistryError, SourceRegistry};
use crate::scoring::{rank_tables, TableMatch};
use groundwork_domain::{
    AdapterError, IntegrationStatus, Row, SourceType, StoreAdapter, TableSchema,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Failure to introspect a single store
#[derive(Debug, Error)]
pub enum IntrospectionError {
    /// The store adapter failed
    #[error("Store {source_id} failed: {error}")]
    Adapter {
        /// Store that failed
        source_id: String,
        /// Adapter error
        error: AdapterError,
    },

    /// The adapter serves a source the registry does not know
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// What one successful store scan found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSummary {
    /// Tables present in the store
    pub tables_seen: usize,
    /// Declared tables whose counts were refreshed
    pub tables_matched: usize,
    /// Sum of row counts across all tables seen
    pub total_rows: u64,
    /// Tables present in the store but not declared in the registry
    pub unregistered_tables: Vec<String>,
}

/// Outcome for one store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreReport {
    /// Store id
    pub source_id: String,
    /// Present on success
    pub summary: Option<StoreSummary>,
    /// Present on failure
    pub error: Option<String>,
}

/// Outcome of one introspection pass over every store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionReport {
    /// One report per adapter, in adapter order
    pub stores: Vec<StoreReport>,
}

impl IntrospectionReport {
    /// True when at least one store failed
    pub fn is_partial(&self) -> bool {
        self.stores.iter().any(|s| s.error.is_some())
    }

    /// Ids of the stores that failed
    pub fn failed_stores(&self) -> Vec<&str> {
        self.stores
            .iter()
            .filter(|s| s.error.is_some())
            .map(|s| s.source_id.as_str())
            .collect()
    }

    /// Declared tables refreshed across all stores
    pub fn tables_updated(&self) -> usize {
        self.stores
            .iter()
            .filter_map(|s| s.summary.as_ref())
            .map(|s| s.tables_matched)
            .sum()
    }
}

/// One entry of `list_databases`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSummary {
    /// Source id
    pub id: String,
    /// Source name
    pub name: String,
    /// Store kind
    pub source_type: SourceType,
    /// Integration status
    pub integration_status: IntegrationStatus,
    /// Declared tables
    pub table_count: usize,
    /// Sum of last known row counts
    pub total_rows: u64,
    /// Demo or stub
    pub is_demo: bool,
}

/// Result of `describe_table`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescription {
    /// Owning source id
    pub source_id: String,
    /// Owning source name
    pub source_name: String,
    /// Owning source status
    pub integration_status: IntegrationStatus,
    /// Declared schema with last known row count
    pub table: TableSchema,
}

/// Result of `preview_rows`; `error` is set when nothing could be fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowPreview {
    /// Owning source id, if the table is declared
    pub source_id: Option<String>,
    /// Table requested
    pub table: String,
    /// Rows fetched
    pub rows: Vec<Row>,
    /// Why the preview is empty, if it failed
    pub error: Option<String>,
}

/// Read-only view of the live stores behind the registry
pub struct SchemaIntrospector {
    registry: Arc<SourceRegistry>,
    adapters: Vec<Arc<dyn StoreAdapter>>,
    config: IntrospectionConfig,
}

impl SchemaIntrospector {
    /// Create an introspector over the given adapters
    pub fn new(
        registry: Arc<SourceRegistry>,
        adapters: Vec<Arc<dyn StoreAdapter>>,
        config: IntrospectionConfig,
    ) -> Self {
        Self {
            registry,
            adapters,
            config,
        }
    }

    /// The registry this introspector refreshes
    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// Configuration in use
    pub fn config(&self) -> &IntrospectionConfig {
        &self.config
    }

    /// Adapter serving `source_id`, if connected
    pub fn adapter(&self, source_id: &str) -> Option<&Arc<dyn StoreAdapter>> {
        self.adapters.iter().find(|a| a.source_id() == source_id)
    }

    /// Scan every connected store and refresh registry row counts
    pub fn introspect_all(&self) -> IntrospectionReport {
        let mut report = IntrospectionReport::default();

        for adapter in &self.adapters {
            let source_id = adapter.source_id().to_string();
            match self.introspect_store(adapter.as_ref()) {
                Ok(summary) => {
                    tracing::debug!(
                        source_id = %source_id,
                        tables = summary.tables_seen,
                        matched = summary.tables_matched,
                        "Store introspected"
                    );
                    report.stores.push(StoreReport {
                        source_id,
                        summary: Some(summary),
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(source_id = %source_id, error = %e, "Store introspection failed");
                    report.stores.push(StoreReport {
                        source_id,
                        summary: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        report
    }

    /// Scan a single store
    pub fn introspect_store(
        &self,
        adapter: &dyn StoreAdapter,
    ) -> Result<StoreSummary, IntrospectionError> {
        let source_id = adapter.source_id();
        let stats = adapter
            .list_tables()
            .map_err(|error| IntrospectionError::Adapter {
                source_id: source_id.to_string(),
                error,
            })?;

        let declared = self
            .registry
            .get_source(source_id)
            .ok_or_else(|| RegistryError::SourceNotFound(source_id.to_string()))?;
        let tables_matched = self.registry.update_row_counts(source_id, &stats)?;

        Ok(StoreSummary {
            tables_seen: stats.len(),
            tables_matched,
            total_rows: stats.iter().map(|s| s.row_count).sum(),
            unregistered_tables: stats
                .iter()
                .filter(|s| declared.table(&s.name).is_none())
                .map(|s| s.name.clone())
                .collect(),
        })
    }

    /// Summarize every registered source
    pub fn list_databases(&self) -> Vec<DatabaseSummary> {
        self.registry
            .get_all_sources()
            .into_iter()
            .map(|s| DatabaseSummary {
                table_count: s.tables.len(),
                total_rows: s.tables.iter().map(|t| t.row_count).sum(),
                is_demo: s.integration_status.is_demo(),
                id: s.id,
                name: s.name,
                source_type: s.source_type,
                integration_status: s.integration_status,
            })
            .collect()
    }

    /// Declared schema of a table, looked up by name
    pub fn describe_table(&self, name: &str) -> Option<TableDescription> {
        let (source_id, table) = self.registry.find_table(name)?;
        let source = self.registry.get_source(&source_id)?;
        Some(TableDescription {
            source_id,
            source_name: source.name,
            integration_status: source.integration_status,
            table,
        })
    }

    /// Fetch sample rows from a declared table
    ///
    /// `limit` is clamped to the configured maximum. Unknown tables and store
    /// failures produce an empty preview with `error` set.
    pub fn preview_rows(&self, name: &str, limit: usize) -> RowPreview {
        let limit = limit.min(self.config.preview_limit_max);
        let Some((source_id, _)) = self.registry.find_table(name) else {
            return RowPreview {
                source_id: None,
                table: name.to_string(),
                rows: Vec::new(),
                error: Some(format!("Table '{}' is not registered", name)),
            };
        };

        let result = match self.adapter(&source_id) {
            Some(adapter) => adapter.preview_rows(name, limit).map_err(|e| e.to_string()),
            None => Err(format!("No adapter connected for source '{}'", source_id)),
        };

        match result {
            Ok(rows) => RowPreview {
                source_id: Some(source_id),
                table: name.to_string(),
                rows,
                error: None,
            },
            Err(error) => {
                tracing::warn!(source_id = %source_id, table = name, error = %error, "Row preview failed");
                RowPreview {
                    source_id: Some(source_id),
                    table: name.to_string(),
                    rows: Vec::new(),
                    error: Some(error),
                }
            }
        }
    }

    /// Rank declared tables by how well they match a free-text description
    pub fn find_table_for_data(&self, description: &str) -> Vec<TableMatch> {
        rank_tables(description, &self.registry.get_all_sources())
    }

    /// Probe every store for the given terms in parallel
    ///
    /// Uses the configured timeout and row limit; see [`probe_entities`].
    pub async fn probe(&self, terms: &[String]) -> ProbeReport {
        probe_entities(
            &self.adapters,
            terms,
            self.config.probe_timeout(),
            self.config.probe_limit,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStoreAdapter;
    use groundwork_domain::{ColumnSchema, DataSource};
    use serde_json::json;

    fn registry() -> Arc<SourceRegistry> {
        Arc::new(
            SourceRegistry::new(vec![
                DataSource::new("pg.equipment", "Equipment DB", SourceType::Relational, IntegrationStatus::Real)
                    .authoritative("industrial")
                    .with_table(
                        TableSchema::new("readings")
                            .with_description("Power readings per device")
                            .with_column(ColumnSchema::new("power_kw", "float").with_unit("kW")),
                    ),
                DataSource::new("ts.telemetry", "Telemetry", SourceType::Timeseries, IntegrationStatus::Stub)
                    .authoritative("telemetry")
                    .with_table(TableSchema::new("vibration")),
            ])
            .unwrap(),
        )
    }

    fn stores() -> (MemoryStoreAdapter, MemoryStoreAdapter) {
        let pg = MemoryStoreAdapter::new("pg.equipment")
            .with_table("readings", vec![json!({"device": "pump_1"}), json!({"device": "pump_2"})])
            .with_table("scratch", vec![json!({"x": 1})]);
        let ts = MemoryStoreAdapter::new("ts.telemetry")
            .with_table("vibration", vec![json!({"hz": 50})]);
        (pg, ts)
    }

    fn introspector(pg: &MemoryStoreAdapter, ts: &MemoryStoreAdapter) -> SchemaIntrospector {
        SchemaIntrospector::new(
            registry(),
            vec![Arc::new(pg.clone()), Arc::new(ts.clone())],
            IntrospectionConfig::default(),
        )
    }

    #[test]
    fn test_introspect_all_updates_counts() {
        let (pg, ts) = stores();
        let introspector = introspector(&pg, &ts);

        let report = introspector.introspect_all();
        assert!(!report.is_partial());
        assert_eq!(report.tables_updated(), 2);

        let pg_summary = report.stores[0].summary.as_ref().unwrap();
        assert_eq!(pg_summary.tables_seen, 2);
        assert_eq!(pg_summary.total_rows, 3);
        assert_eq!(pg_summary.unregistered_tables, vec!["scratch"]);

        let described = introspector.describe_table("readings").unwrap();
        assert_eq!(described.table.row_count, 2);
    }

    #[test]
    fn test_failing_store_does_not_abort_others() {
        let (pg, ts) = stores();
        pg.set_failing(true);
        let introspector = introspector(&pg, &ts);

        let report = introspector.introspect_all();
        assert!(report.is_partial());
        assert_eq!(report.failed_stores(), vec!["pg.equipment"]);
        assert!(report.stores[1].summary.is_some());
        assert_eq!(introspector.describe_table("vibration").unwrap().table.row_count, 1);
    }

    #[test]
    fn test_unregistered_adapter_reported() {
        let stray = MemoryStoreAdapter::new("mongo.unknown");
        let introspector = SchemaIntrospector::new(
            registry(),
            vec![Arc::new(stray)],
            IntrospectionConfig::default(),
        );
        let report = introspector.introspect_all();
        assert!(report.stores[0].error.as_deref().unwrap().contains("mongo.unknown"));
    }

    #[test]
    fn test_list_databases() {
        let (pg, ts) = stores();
        let introspector = introspector(&pg, &ts);
        introspector.introspect_all();

        let dbs = introspector.list_databases();
        assert_eq!(dbs.len(), 2);
        assert_eq!(dbs[0].total_rows, 2);
        assert!(!dbs[0].is_demo);
        assert!(dbs[1].is_demo);
    }

    #[test]
    fn test_preview_rows() {
        let (pg, ts) = stores();
        let introspector = introspector(&pg, &ts);

        let preview = introspector.preview_rows("readings", 1);
        assert_eq!(preview.source_id.as_deref(), Some("pg.equipment"));
        assert_eq!(preview.rows.len(), 1);
        assert!(preview.error.is_none());

        let missing = introspector.preview_rows("nope", 1);
        assert!(missing.rows.is_empty());
        assert!(missing.error.is_some());

        pg.set_failing(true);
        let failed = introspector.preview_rows("readings", 1);
        assert!(failed.rows.is_empty());
        assert!(failed.error.unwrap().contains("unreachable"));
    }

    #[test]
    fn test_preview_limit_clamped() {
        let rows: Vec<_> = (0..20).map(|i| json!({"i": i})).collect();
        let pg = MemoryStoreAdapter::new("pg.equipment").with_table("readings", rows);
        let config = IntrospectionConfig {
            preview_limit_max: 5,
            ..Default::default()
        };
        let introspector = SchemaIntrospector::new(registry(), vec![Arc::new(pg)], config);
        assert_eq!(introspector.preview_rows("readings", 50).rows.len(), 5);
    }

    #[test]
    fn test_find_table_for_data() {
        let (pg, ts) = stores();
        let introspector = introspector(&pg, &ts);

        let matches = introspector.find_table_for_data("power usage in kW per device");
        assert_eq!(matches[0].table, "readings");
        assert!(!matches[0].is_demo);
        assert!(introspector.find_table_for_data("invoices").is_empty());
    }
}
