//! Configuration for the grounding auditor

use serde::{Deserialize, Serialize};

/// Configuration for the Auditor
///
/// # Examples
///
/// ```
/// use groundwork_auditor::AuditorConfig;
///
/// let config = AuditorConfig::default();
/// assert!(config.is_data_bearing("dashboard"));
/// assert!(!config.is_data_bearing("greeting"));
///
/// let config = AuditorConfig::default().with_data_bearing("report");
/// assert!(config.is_data_bearing("report"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditorConfig {
    /// Response types that must be backed by at least one traversal step
    /// Default: ["dashboard"]
    #[serde(default = "default_data_bearing_response_types")]
    pub data_bearing_response_types: Vec<String>,

    /// Finalized entries kept in memory for inspection
    /// Aggregate counters are never truncated
    /// Default: 1000
    #[serde(default = "default_retain_entries")]
    pub retain_entries: usize,
}

fn default_data_bearing_response_types() -> Vec<String> {
    vec!["dashboard".to_string()]
}

fn default_retain_entries() -> usize {
    1000
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            data_bearing_response_types: default_data_bearing_response_types(),
            retain_entries: default_retain_entries(),
        }
    }
}

impl AuditorConfig {
    /// Add a response type to the data-bearing set
    pub fn with_data_bearing(mut self, response_type: impl Into<String>) -> Self {
        let response_type = response_type.into();
        if !self.is_data_bearing(&response_type) {
            self.data_bearing_response_types.push(response_type);
        }
        self
    }

    /// Whether `response_type` must be backed by a traversal
    pub fn is_data_bearing(&self, response_type: &str) -> bool {
        self.data_bearing_response_types
            .iter()
            .any(|t| t == response_type)
    }
}
