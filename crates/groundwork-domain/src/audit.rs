//! Audit trail types
//!
//! One [`AuditEntry`] is built per query, filled in stages, and becomes
//! immutable once finalized by the auditor.

use crate::resolution::ResolutionOutcome;
use crate::traversal::TraversalStep;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Kind of grounding defect
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectType {
    /// A requested domain has no authoritative source
    UnresolvedDomain,

    /// Resolution went through a demo, stub or hybrid source
    DemoDataUsed,

    /// A data-bearing response was produced without any traversal
    NoTraversal,

    /// The claimed origin of the data was never queried
    UnverifiedDataOrigin,

    /// The response relies on synthesized values
    SyntheticDataUsed,
}

impl DefectType {
    /// Get the defect name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DefectType::UnresolvedDomain => "unresolved_domain",
            DefectType::DemoDataUsed => "demo_data_used",
            DefectType::NoTraversal => "no_traversal",
            DefectType::UnverifiedDataOrigin => "unverified_data_origin",
            DefectType::SyntheticDataUsed => "synthetic_data_used",
        }
    }

    /// Fixed severity for this defect type
    pub fn severity(&self) -> Severity {
        match self {
            DefectType::UnresolvedDomain => Severity::Critical,
            DefectType::DemoDataUsed => Severity::Warning,
            DefectType::NoTraversal => Severity::Critical,
            DefectType::UnverifiedDataOrigin => Severity::Major,
            DefectType::SyntheticDataUsed => Severity::Warning,
        }
    }
}

impl std::fmt::Display for DefectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Defect severity, least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Worth knowing, answer still usable
    Warning,

    /// Answer may be wrong
    Major,

    /// Grounding invariant violated
    Critical,
}

impl Severity {
    /// Get the severity name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }
}

/// A detected grounding violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defect {
    /// Defect kind
    pub defect_type: DefectType,

    /// Human-readable detail
    pub description: String,

    /// Severity (fixed per type)
    pub severity: Severity,

    /// When it was detected (milliseconds since Unix epoch)
    pub timestamp: u64,
}

impl Defect {
    /// Create a defect with the type's fixed severity
    pub fn new(defect_type: DefectType, description: impl Into<String>, timestamp: u64) -> Self {
        Self {
            defect_type,
            description: description.into(),
            severity: defect_type.severity(),
            timestamp,
        }
    }
}

/// Full audit record of one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Caller-assigned query identifier
    pub query_id: String,

    /// When the entry was started (milliseconds since Unix epoch)
    pub timestamp: u64,

    /// Raw query text
    pub transcript: String,

    // Resolution
    /// Resolution outcome, once recorded
    pub resolution_outcome: Option<ResolutionOutcome>,
    /// Primary source id
    pub primary_source: Option<String>,
    /// Domain → resolved source id
    pub domains_resolved: BTreeMap<String, String>,
    /// Domains without an authoritative source
    pub domains_unresolved: Vec<String>,
    /// Demo warnings from resolution
    pub demo_warnings: Vec<String>,

    // Traversal
    /// Copy of the traversal steps
    pub traversal_steps: Vec<TraversalStep>,
    /// Number of traversal steps
    pub traversal_step_count: usize,
    /// Sources inspected during traversal
    pub sources_queried: BTreeSet<String>,
    /// Total traversal time
    pub traversal_duration: Duration,
    /// Whether a traversal has been recorded at all
    pub traversal_recorded: bool,

    // Data origin
    /// Whether the claimed data origin was verified
    pub data_verified: Option<bool>,
    /// Claimed origin source id
    pub data_origin_source: Option<String>,
    /// Whether demo data contributed to the answer
    pub used_demo_data: bool,
    /// Whether synthesized data contributed to the answer
    pub used_synthetic: bool,

    // Response
    /// Response type (e.g. "dashboard", "refusal", "greeting")
    pub response_type: Option<String>,
    /// Number of widgets / results in the response
    pub result_count: usize,
    /// Response confidence, if the builder reported one
    pub confidence: Option<f64>,

    /// Defects in detection order
    pub defects: Vec<Defect>,
}

impl AuditEntry {
    /// Start an empty entry for a query
    pub fn new(query_id: impl Into<String>, transcript: impl Into<String>, timestamp: u64) -> Self {
        Self {
            query_id: query_id.into(),
            timestamp,
            transcript: transcript.into(),
            resolution_outcome: None,
            primary_source: None,
            domains_resolved: BTreeMap::new(),
            domains_unresolved: Vec::new(),
            demo_warnings: Vec::new(),
            traversal_steps: Vec::new(),
            traversal_step_count: 0,
            sources_queried: BTreeSet::new(),
            traversal_duration: Duration::ZERO,
            traversal_recorded: false,
            data_verified: None,
            data_origin_source: None,
            used_demo_data: false,
            used_synthetic: false,
            response_type: None,
            result_count: 0,
            confidence: None,
            defects: Vec::new(),
        }
    }

    /// Whether any defect was recorded
    pub fn is_defective(&self) -> bool {
        !self.defects.is_empty()
    }

    /// Whether a defect of the given type was recorded
    pub fn has_defect(&self, defect_type: DefectType) -> bool {
        self.defects.iter().any(|d| d.defect_type == defect_type)
    }

    /// Most severe defect, if any
    pub fn worst_severity(&self) -> Option<Severity> {
        self.defects.iter().map(|d| d.severity).max()
    }
}
