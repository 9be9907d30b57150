//! Configuration file parsing for the registry and introspector.
//!
//! Sources are declared once, in TOML, and loaded at startup. There is no
//! runtime add/remove.

use groundwork_domain::DataSource;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Registry configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Two sources share an id
    #[error("Duplicate data source id: {0}")]
    DuplicateSource(String),

    /// A declared value is invalid
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Declarative list of data sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registered sources, in declaration order
    #[serde(default)]
    pub sources: Vec<DataSource>,
}

impl RegistryConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: RegistryConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ids are present and unique, and authoritative domains are served
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "source '{}' has an empty id",
                    source.name
                )));
            }
            if !seen.insert(source.id.as_str()) {
                return Err(ConfigError::DuplicateSource(source.id.clone()));
            }
            if let Some(domain) = source
                .authoritative_for
                .iter()
                .find(|d| !source.domains.contains(d))
            {
                return Err(ConfigError::Invalid(format!(
                    "source '{}' is authoritative for '{}' but does not serve it",
                    source.id, domain
                )));
            }
        }
        if let Some(clash) = find_table_clash(&self.sources) {
            return Err(ConfigError::Invalid(clash));
        }
        Ok(())
    }
}

/// Describe the first table name declared more than once
///
/// Traversal addresses tables by bare name, so a name must belong to exactly
/// one source.
pub(crate) fn find_table_clash(sources: &[DataSource]) -> Option<String> {
    let mut owners: HashMap<&str, &str> = HashMap::new();
    for source in sources {
        for table in &source.tables {
            if let Some(owner) = owners.insert(table.name.as_str(), source.id.as_str()) {
                return Some(format!(
                    "table '{}' is declared by both '{}' and '{}'",
                    table.name, owner, source.id
                ));
            }
        }
    }
    None
}

/// Settings for live-store introspection and probing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectionConfig {
    /// How often the background worker refreshes row counts (in seconds)
    /// Default: 300
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Timeout for each entity probe (in milliseconds)
    /// Default: 1500
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Rows returned per probe
    /// Default: 5
    #[serde(default = "default_probe_limit")]
    pub probe_limit: usize,

    /// Upper bound on `preview_rows` limits
    /// Default: 100
    #[serde(default = "default_preview_limit_max")]
    pub preview_limit_max: usize,
}

fn default_interval_secs() -> u64 {
    300
}

fn default_probe_timeout_ms() -> u64 {
    1500
}

fn default_probe_limit() -> usize {
    5
}

fn default_preview_limit_max() -> usize {
    100
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            probe_timeout_ms: default_probe_timeout_ms(),
            probe_limit: default_probe_limit(),
            preview_limit_max: default_preview_limit_max(),
        }
    }
}

impl IntrospectionConfig {
    /// Refresh interval as Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Probe timeout as Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwork_domain::{IntegrationStatus, SourceType};

    const SAMPLE: &str = r#"
        [[sources]]
        id = "pg.equipment"
        name = "Equipment DB"
        source_type = "relational"
        integration_status = "real"
        domains = ["industrial", "alerts"]
        authoritative_for = ["industrial"]
        priority = 10

        [[sources.tables]]
        name = "equipment_readings"
        description = "Power and temperature readings per device"
        primary_key = "id"

        [[sources.tables.columns]]
        name = "power_kw"
        type = "float"
        unit = "kW"

        [[sources]]
        id = "vec.manuals"
        name = "Manual Store"
        source_type = "vector"
        integration_status = "demo"
        domains = ["documents"]
        authoritative_for = ["documents"]
    "#;

    #[test]
    fn test_parse_toml() {
        let config = RegistryConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.sources.len(), 2);

        let pg = &config.sources[0];
        assert_eq!(pg.source_type, SourceType::Relational);
        assert_eq!(pg.integration_status, IntegrationStatus::Real);
        assert_eq!(pg.priority, 10);
        assert_eq!(pg.tables[0].columns[0].unit.as_deref(), Some("kW"));
        assert_eq!(pg.tables[0].row_count, 0);

        assert_eq!(config.sources[1].integration_status, IntegrationStatus::Demo);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let toml = r#"
            [[sources]]
            id = "a"
            name = "A"
            source_type = "relational"
            integration_status = "real"

            [[sources]]
            id = "a"
            name = "A again"
            source_type = "vector"
            integration_status = "real"
        "#;
        let result = RegistryConfig::from_toml_str(toml);
        assert!(matches!(result, Err(ConfigError::DuplicateSource(id)) if id == "a"));
    }

    #[test]
    fn test_authoritative_must_be_served() {
        let toml = r#"
            [[sources]]
            id = "a"
            name = "A"
            source_type = "timeseries"
            integration_status = "real"
            domains = []
            authoritative_for = ["energy"]
        "#;
        assert!(matches!(
            RegistryConfig::from_toml_str(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_table_declared_twice_rejected() {
        let toml = r#"
            [[sources]]
            id = "pg.equipment"
            name = "Equipment DB"
            source_type = "relational"
            integration_status = "real"

            [[sources.tables]]
            name = "readings"

            [[sources]]
            id = "pg.backup"
            name = "Backup DB"
            source_type = "relational"
            integration_status = "demo"

            [[sources.tables]]
            name = "readings"
        "#;
        let err = RegistryConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(&err, ConfigError::Invalid(msg) if msg.contains("'readings'")));
        assert!(err.to_string().contains("pg.backup"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = RegistryConfig::from_file(&path).unwrap();
        assert_eq!(config.sources.len(), 2);
    }

    #[test]
    fn test_introspection_defaults() {
        let config: IntrospectionConfig = toml::from_str("").unwrap();
        assert_eq!(config.interval(), Duration::from_secs(300));
        assert_eq!(config.probe_timeout(), Duration::from_millis(1500));
        assert_eq!(config.probe_limit, 5);
        assert_eq!(config.preview_limit_max, 100);
    }
}
