//! Traversal log types
//!
//! A [`TraversalContext`] is an append-only, per-query record of the
//! inspection actions taken against data sources. Step order is call order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Pseudo source id used for catalog-wide actions such as listing databases
pub const INFRASTRUCTURE_SOURCE: &str = "system.catalog";

/// Kind of inspection action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalAction {
    /// Enumerate every registered source
    ListDatabases,

    /// Read a table's declared schema
    DescribeTable,

    /// Fetch sample rows from a table
    PreviewRows,

    /// Check a claimed origin against the sources actually queried
    VerifyDataOrigin,
}

impl TraversalAction {
    /// Get the action name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TraversalAction::ListDatabases => "list_databases",
            TraversalAction::DescribeTable => "describe_table",
            TraversalAction::PreviewRows => "preview_rows",
            TraversalAction::VerifyDataOrigin => "verify_data_origin",
        }
    }

    /// Whether the action looked at a store or the catalog
    ///
    /// Origin checks only consult the log, so they are not inspections.
    pub fn is_inspection(&self) -> bool {
        !matches!(self, TraversalAction::VerifyDataOrigin)
    }
}

/// One recorded inspection action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraversalStep {
    /// What was done
    pub action: TraversalAction,

    /// Source the action targeted
    pub source_id: String,

    /// Call parameters
    pub params: serde_json::Value,

    /// Condensed result of the call
    pub result: serde_json::Value,

    /// When the action started (milliseconds since Unix epoch)
    pub timestamp: u64,

    /// How long the action took
    pub duration: Duration,
}

/// Ordered traversal log for a single query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraversalContext {
    /// Steps in call order
    pub steps: Vec<TraversalStep>,

    /// Number of steps recorded
    pub step_count: usize,

    /// Every source id an action was run against
    pub sources_queried: BTreeSet<String>,

    /// Sum of step durations
    pub total_duration: Duration,
}

impl TraversalContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step; `queried` controls whether its source counts as inspected
    pub fn record(&mut self, step: TraversalStep, queried: bool) {
        if queried {
            self.sources_queried.insert(step.source_id.clone());
        }
        self.total_duration += step.duration;
        self.steps.push(step);
        self.step_count = self.steps.len();
    }

    /// Whether `source_id` was inspected during this query
    pub fn has_queried(&self, source_id: &str) -> bool {
        self.sources_queried.contains(source_id)
    }

    /// Steps that inspected a store or the catalog
    pub fn inspection_count(&self) -> usize {
        self.steps.iter().filter(|s| s.action.is_inspection()).count()
    }

    /// True when no action has been taken yet
    pub fn is_empty(&self) -> bool {
        self.step_count == 0
    }
}
