//! Outcome of mapping a query's domains onto authoritative sources

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Overall result of source resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// Every requested domain has a non-demo authoritative source
    Resolved,

    /// Some, but not all, requested domains resolved
    Unresolved,

    /// No domain identified, or none of them resolvable
    Refused,

    /// Every resolved domain is served by a demo or stub source
    DemoOnly,
}

impl ResolutionOutcome {
    /// Get the outcome name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionOutcome::Resolved => "resolved",
            ResolutionOutcome::Unresolved => "unresolved",
            ResolutionOutcome::Refused => "refused",
            ResolutionOutcome::DemoOnly => "demo_only",
        }
    }
}

impl std::fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-query source resolution
///
/// Built once by the resolver and only read afterwards. `Resolved` always
/// carries a primary source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceResolution {
    /// Overall outcome
    pub outcome: ResolutionOutcome,

    /// Id of the highest-priority resolved source
    pub primary_source: Option<String>,

    /// Ids of the other resolved sources, in resolution order
    pub secondary_sources: Vec<String>,

    /// Domain → id of the source resolved for it
    pub domains_resolved: BTreeMap<String, String>,

    /// Requested domains with no authoritative source
    pub domains_unresolved: Vec<String>,

    /// One message per domain resolved through a demo/stub/hybrid source
    pub demo_warnings: Vec<String>,
}

impl SourceResolution {
    /// A refusal with the given unresolved domains
    pub fn refused(domains_unresolved: Vec<String>) -> Self {
        Self {
            outcome: ResolutionOutcome::Refused,
            primary_source: None,
            secondary_sources: Vec::new(),
            domains_resolved: BTreeMap::new(),
            domains_unresolved,
            demo_warnings: Vec::new(),
        }
    }

    /// Primary source followed by the secondary sources
    pub fn all_sources(&self) -> Vec<String> {
        self.primary_source
            .iter()
            .chain(self.secondary_sources.iter())
            .cloned()
            .collect()
    }

    /// Whether any resolved source was flagged as demo data
    pub fn has_demo_warnings(&self) -> bool {
        !self.demo_warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_sources_order() {
        let resolution = SourceResolution {
            outcome: ResolutionOutcome::Resolved,
            primary_source: Some("a".to_string()),
            secondary_sources: vec!["b".to_string(), "c".to_string()],
            domains_resolved: BTreeMap::new(),
            domains_unresolved: vec![],
            demo_warnings: vec![],
        };
        assert_eq!(resolution.all_sources(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_refused_has_no_sources() {
        let resolution = SourceResolution::refused(vec!["weather".to_string()]);
        assert_eq!(resolution.outcome, ResolutionOutcome::Refused);
        assert!(resolution.all_sources().is_empty());
        assert_eq!(
            serde_json::to_value(resolution.outcome).unwrap(),
            serde_json::json!("refused")
        );
    }
}
