//! Unified configuration for a Groundwork deployment
//!
//! One TOML file carries every section:
//!
//! ```toml
//! [gate]
//! refuse_demo_only = false
//!
//! [introspection]
//! interval_secs = 300
//! probe_timeout_ms = 1500
//!
//! [auditor]
//! data_bearing_response_types = ["dashboard"]
//!
//! [pipeline]
//! block_on_no_traversal = false
//! block_on_unverified_origin = false
//!
//! [logging]
//! filter = "info,groundwork_auditor=debug"
//!
//! [[registry.sources]]
//! id = "pg.equipment"
//! name = "Equipment DB"
//! source_type = "relational"
//! integration_status = "real"
//! domains = ["industrial"]
//! authoritative_for = ["industrial"]
//! ```

use groundwork_auditor::AuditorConfig;
use groundwork_gatekeeper::GateConfig;
use groundwork_registry::{ConfigError, IntrospectionConfig, RegistryConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Caller-side policy layered on top of the auditor's defects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Reject data-bearing responses produced without any traversal
    pub block_on_no_traversal: bool,

    /// Reject responses whose claimed origin was never queried
    pub block_on_unverified_origin: bool,
}

impl PipelineConfig {
    /// Block on every grounding defect that has a blocking switch
    pub fn strict() -> Self {
        Self {
            block_on_no_traversal: true,
            block_on_unverified_origin: true,
        }
    }
}

/// Tracing output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    /// Default: "info"
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

/// Every configuration section, as loaded from one file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroundworkConfig {
    /// Declared data sources
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Resolution and refusal policy
    #[serde(default)]
    pub gate: GateConfig,

    /// Live-store introspection and probing
    #[serde(default)]
    pub introspection: IntrospectionConfig,

    /// Audit trail
    #[serde(default)]
    pub auditor: AuditorConfig,

    /// Blocking policy
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Tracing output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GroundworkConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: GroundworkConfig = toml::from_str(contents)?;
        config.registry.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = GroundworkConfig::from_toml_str("").unwrap();
        assert!(config.registry.sources.is_empty());
        assert_eq!(config.gate, GateConfig::default());
        assert_eq!(config.introspection.interval_secs, 300);
        assert_eq!(config.auditor, AuditorConfig::default());
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_sections() {
        let toml = r#"
            [gate]
            refuse_partial = true

            [introspection]
            probe_timeout_ms = 250

            [auditor]
            data_bearing_response_types = ["dashboard", "table"]

            [pipeline]
            block_on_no_traversal = true

            [logging]
            filter = "debug"

            [[registry.sources]]
            id = "pg.equipment"
            name = "Equipment DB"
            source_type = "relational"
            integration_status = "real"
            domains = ["industrial"]
            authoritative_for = ["industrial"]
        "#;

        let config = GroundworkConfig::from_toml_str(toml).unwrap();
        assert!(config.gate.refuse_partial);
        assert!(config.gate.normalize_domains);
        assert_eq!(config.introspection.probe_timeout_ms, 250);
        assert_eq!(config.introspection.probe_limit, 5);
        assert!(config.auditor.is_data_bearing("table"));
        assert!(config.pipeline.block_on_no_traversal);
        assert!(!config.pipeline.block_on_unverified_origin);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.registry.sources[0].id, "pg.equipment");
    }

    #[test]
    fn test_invalid_registry_rejected() {
        let toml = r#"
            [[registry.sources]]
            id = "a"
            name = "A"
            source_type = "relational"
            integration_status = "real"
            authoritative_for = ["industrial"]
        "#;
        assert!(matches!(
            GroundworkConfig::from_toml_str(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_strict_pipeline() {
        let config = PipelineConfig::strict();
        assert!(config.block_on_no_traversal);
        assert!(config.block_on_unverified_origin);
    }
}
