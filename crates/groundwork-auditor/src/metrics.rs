//! Aggregate defect statistics across finalized entries

use groundwork_domain::{AuditEntry, DefectType, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Longitudinal defect statistics
///
/// Counts every finalized entry since the auditor was created or last reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefectSummary {
    /// Finalized entries
    pub total_entries: usize,

    /// Entries with at least one defect
    pub defective_entries: usize,

    /// `defective_entries / total_entries`, 0.0 when empty
    pub defect_rate: f64,

    /// Defects raised, per type
    pub by_type: BTreeMap<DefectType, usize>,

    /// Defects raised, per severity
    pub by_severity: BTreeMap<Severity, usize>,
}

impl DefectSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one finalized entry into the counts
    pub fn record_entry(&mut self, entry: &AuditEntry) {
        self.total_entries += 1;
        if entry.is_defective() {
            self.defective_entries += 1;
        }
        for defect in &entry.defects {
            *self.by_type.entry(defect.defect_type).or_insert(0) += 1;
            *self.by_severity.entry(defect.severity).or_insert(0) += 1;
        }
        self.defect_rate = self.defective_entries as f64 / self.total_entries as f64;
    }

    /// Defects of one type
    pub fn count(&self, defect_type: DefectType) -> usize {
        self.by_type.get(&defect_type).copied().unwrap_or(0)
    }

    /// Total defects across all types
    pub fn total_defects(&self) -> usize {
        self.by_type.values().sum()
    }

    /// Reset all counts
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Grounding Audit Summary".to_string(),
            "=======================".to_string(),
            format!("Entries: {}", self.total_entries),
            format!("Defective entries: {}", self.defective_entries),
            format!("Defect rate: {:.1}%", self.defect_rate * 100.0),
            String::new(),
        ];

        if !self.by_type.is_empty() {
            lines.push("Defects by type:".to_string());
            for (defect_type, count) in &self.by_type {
                lines.push(format!("  {}: {}", defect_type, count));
            }
            lines.push(format!("  Total: {}", self.total_defects()));
            lines.push(String::new());
        }

        if !self.by_severity.is_empty() {
            lines.push("Defects by severity:".to_string());
            for (severity, count) in self.by_severity.iter().rev() {
                lines.push(format!("  {}: {}", severity.as_str(), count));
            }
        }

        lines.join("\n")
    }
}
