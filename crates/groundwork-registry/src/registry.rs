//! Source registry: the catalog of known data sources.
//!
//! The registry is the only state shared across queries. Reads take a read
//! lock and return owned snapshots; the introspector's row-count refresh takes
//! one write lock per store, so readers see either the old or the new counts
//! of a table, never a mix.

use crate::config::{find_table_clash, RegistryConfig};
use groundwork_domain::{DataSource, IntegrationStatus, TableSchema, TableStat};
use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Registry error
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two sources share an id
    #[error("Duplicate data source id: {0}")]
    DuplicateSource(String),

    /// Source not found
    #[error("Data source not found: {0}")]
    SourceNotFound(String),

    /// Source declaration is invalid
    #[error("Invalid data source: {0}")]
    InvalidSource(String),
}

/// Catalog of registered data sources
pub struct SourceRegistry {
    sources: RwLock<Vec<DataSource>>,
}

impl SourceRegistry {
    /// Create a registry from a fixed list of sources
    ///
    /// Fails if any id is empty or used twice, or if two tables share a name.
    pub fn new(sources: Vec<DataSource>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for source in &sources {
            if source.id.trim().is_empty() {
                return Err(RegistryError::InvalidSource(format!(
                    "source '{}' has an empty id",
                    source.name
                )));
            }
            if !seen.insert(source.id.clone()) {
                return Err(RegistryError::DuplicateSource(source.id.clone()));
            }
        }
        if let Some(clash) = find_table_clash(&sources) {
            return Err(RegistryError::InvalidSource(clash));
        }

        tracing::info!(sources = sources.len(), "Source registry initialized");
        Ok(Self {
            sources: RwLock::new(sources),
        })
    }

    /// Create a registry from configuration
    pub fn from_config(config: RegistryConfig) -> Result<Self, RegistryError> {
        Self::new(config.sources)
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<DataSource>> {
        self.sources.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<DataSource>> {
        self.sources.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of every source, in declaration order
    pub fn get_all_sources(&self) -> Vec<DataSource> {
        self.read().clone()
    }

    /// Snapshot of one source
    pub fn get_source(&self, id: &str) -> Option<DataSource> {
        self.read().iter().find(|s| s.id == id).cloned()
    }

    /// True iff the source exists and is demo or stub
    pub fn is_demo_source(&self, id: &str) -> bool {
        self.read()
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.integration_status.is_demo())
            .unwrap_or(false)
    }

    /// Integration status of a source, `Unknown` if it is not registered
    pub fn integration_status(&self, id: &str) -> IntegrationStatus {
        self.read()
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.integration_status)
            .unwrap_or(IntegrationStatus::Unknown)
    }

    /// Whether a source id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.read().iter().any(|s| s.id == id)
    }

    /// Number of registered sources
    pub fn source_count(&self) -> usize {
        self.read().len()
    }

    /// Sources authoritative for `domain`, highest priority first
    ///
    /// Sources with equal priority keep their declaration order.
    pub fn sources_for_domain(&self, domain: &str) -> Vec<DataSource> {
        let mut matches: Vec<DataSource> = self
            .read()
            .iter()
            .filter(|s| s.is_authoritative_for(domain))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.priority.cmp(&a.priority));
        matches
    }

    /// Find the declared table with this name, with its owner's id
    pub fn find_table(&self, name: &str) -> Option<(String, TableSchema)> {
        self.read().iter().find_map(|s| {
            s.table(name).map(|t| (s.id.clone(), t.clone()))
        })
    }

    /// Push live row counts for one store into its declared tables
    ///
    /// Tables are matched by name; undeclared tables are skipped. Returns the
    /// number of declared tables updated.
    pub fn update_row_counts(
        &self,
        source_id: &str,
        counts: &[TableStat],
    ) -> Result<usize, RegistryError> {
        let mut sources = self.write();
        let source = sources
            .iter_mut()
            .find(|s| s.id == source_id)
            .ok_or_else(|| RegistryError::SourceNotFound(source_id.to_string()))?;

        let mut updated = 0;
        for stat in counts {
            if let Some(table) = source.tables.iter_mut().find(|t| t.name == stat.name) {
                table.row_count = stat.row_count;
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Zero every row count (test isolation)
    pub fn reset_row_counts(&self) {
        let mut sources = self.write();
        for table in sources.iter_mut().flat_map(|s| s.tables.iter_mut()) {
            table.row_count = 0;
        }
    }
}
