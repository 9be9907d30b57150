//! Per-query audit state machine and defect detection

use crate::{AuditError, AuditorConfig, DefectSummary};
use groundwork_domain::{
    now_millis, AuditEntry, AuditLog, Defect, DefectType, Severity, SourceResolution,
    TraversalContext,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

const NO_TRAVERSAL_DESCRIPTION: &str =
    "Data-bearing response produced without inspecting any store";

/// Result of finalizing an entry
///
/// The entry is usable even when persistence failed; the failure is carried
/// alongside so the caller can decide what to do with it.
#[derive(Debug)]
pub struct FinalizedEntry {
    /// The immutable entry
    pub entry: Arc<AuditEntry>,

    /// Set when the audit log rejected the write
    pub persist_error: Option<AuditError>,
}

impl FinalizedEntry {
    /// Whether the entry reached the audit log
    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

#[derive(Default)]
struct AuditorState {
    summary: DefectSummary,
    recent: VecDeque<Arc<AuditEntry>>,
}

/// Records one audit entry per query and keeps aggregate defect statistics
///
/// An entry moves through `start_entry`, the `record_*` stages and
/// `finalize_entry`. Until it is finalized it is a plain value owned by the
/// query; dropping it abandons the query and nothing is persisted.
///
/// # Examples
///
/// ```
/// use groundwork_auditor::{AuditorConfig, GroundingAuditor, MemoryAuditLog};
/// use groundwork_domain::{DefectType, TraversalContext};
///
/// let auditor = GroundingAuditor::new(MemoryAuditLog::new(), AuditorConfig::default());
///
/// let mut entry = auditor.start_entry("q-1", "show pump power");
/// auditor.record_response(&mut entry, "dashboard", 1, Some(0.9));
/// auditor.record_traversal(&mut entry, &TraversalContext::new());
/// assert!(entry.has_defect(DefectType::NoTraversal));
///
/// let finalized = auditor.finalize_entry(entry);
/// assert!(finalized.is_persisted());
/// assert_eq!(auditor.get_defect_summary().defective_entries, 1);
/// ```
pub struct GroundingAuditor<L: AuditLog> {
    config: AuditorConfig,
    log: Mutex<L>,
    state: Mutex<AuditorState>,
}

impl<L> GroundingAuditor<L>
where
    L: AuditLog,
    L::Error: Into<AuditError>,
{
    /// Create an auditor writing to `log`
    pub fn new(log: L, config: AuditorConfig) -> Self {
        Self {
            config,
            log: Mutex::new(log),
            state: Mutex::new(AuditorState::default()),
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &AuditorConfig {
        &self.config
    }

    /// Open an entry for a new query
    pub fn start_entry(&self, query_id: impl Into<String>, transcript: impl Into<String>) -> AuditEntry {
        let entry = AuditEntry::new(query_id, transcript, now_millis());
        tracing::debug!(query_id = %entry.query_id, "Audit entry started");
        entry
    }

    /// Copy the resolution into the entry
    ///
    /// Raises `unresolved_domain` per unresolved domain and `demo_data_used`
    /// when the resolution carries demo warnings.
    pub fn record_resolution(&self, entry: &mut AuditEntry, resolution: &SourceResolution) {
        entry.resolution_outcome = Some(resolution.outcome);
        entry.primary_source = resolution.primary_source.clone();
        entry.domains_resolved = resolution.domains_resolved.clone();
        entry.domains_unresolved = resolution.domains_unresolved.clone();
        entry.demo_warnings = resolution.demo_warnings.clone();
        entry.used_demo_data = resolution.has_demo_warnings();

        for domain in &resolution.domains_unresolved {
            raise(
                entry,
                DefectType::UnresolvedDomain,
                format!("No authoritative source for domain '{}'", domain),
            );
        }
        if resolution.has_demo_warnings() {
            raise(entry, DefectType::DemoDataUsed, resolution.demo_warnings.join("; "));
        }
    }

    /// Copy the traversal log into the entry
    pub fn record_traversal(&self, entry: &mut AuditEntry, traversal: &TraversalContext) {
        entry.traversal_steps = traversal.steps.clone();
        entry.traversal_step_count = traversal.step_count;
        entry.sources_queried = traversal.sources_queried.clone();
        entry.traversal_duration = traversal.total_duration;
        entry.traversal_recorded = true;
        self.check_traversal(entry);
    }

    /// Record what kind of response was produced
    pub fn record_response(
        &self,
        entry: &mut AuditEntry,
        response_type: &str,
        result_count: usize,
        confidence: Option<f64>,
    ) {
        entry.response_type = Some(response_type.to_string());
        entry.result_count = result_count;
        entry.confidence = match confidence {
            Some(value) if !value.is_finite() => {
                tracing::warn!(
                    query_id = %entry.query_id,
                    confidence = value,
                    "Dropping non-finite confidence"
                );
                None
            }
            other => other,
        };
        self.check_traversal(entry);
    }

    /// Record whether the claimed data origin was verified
    pub fn record_data_origin(
        &self,
        entry: &mut AuditEntry,
        source_id: &str,
        verified: bool,
        synthetic: bool,
    ) {
        entry.data_verified = Some(verified);
        entry.data_origin_source = Some(source_id.to_string());
        entry.used_synthetic |= synthetic;

        if !verified {
            raise(
                entry,
                DefectType::UnverifiedDataOrigin,
                format!("Claimed source '{}' was not queried during traversal", source_id),
            );
        }
        if entry.used_synthetic {
            raise(
                entry,
                DefectType::SyntheticDataUsed,
                "Response includes synthetic values",
            );
        }
    }

    /// Persist the entry and fold it into the statistics
    ///
    /// The entry becomes immutable. A persistence failure is logged and
    /// returned in [`FinalizedEntry::persist_error`]; it never hides the entry.
    /// An entry rejected as a duplicate is not counted in the statistics.
    pub fn finalize_entry(&self, entry: AuditEntry) -> FinalizedEntry {
        let entry = Arc::new(entry);

        let persist_error = match self.lock_log().append(&entry) {
            Ok(()) => None,
            Err(e) => {
                let e: AuditError = e.into();
                tracing::error!(query_id = %entry.query_id, error = %e, "Failed to persist audit entry");
                Some(e)
            }
        };

        // a duplicate id already has a finalized entry; counting it again
        // would make the statistics disagree with the log
        if !matches!(persist_error, Some(AuditError::Duplicate(_))) {
            let mut state = self.lock_state();
            state.summary.record_entry(&entry);
            state.recent.push_back(Arc::clone(&entry));
            while state.recent.len() > self.config.retain_entries {
                state.recent.pop_front();
            }
        }

        tracing::info!(
            query_id = %entry.query_id,
            defects = entry.defects.len(),
            worst = entry.worst_severity().map(|s| s.as_str()).unwrap_or("none"),
            "Audit entry finalized"
        );

        FinalizedEntry {
            entry,
            persist_error,
        }
    }

    /// Aggregate statistics over every finalized entry
    pub fn get_defect_summary(&self) -> DefectSummary {
        self.lock_state().summary.clone()
    }

    /// Most recently finalized entries, oldest first
    pub fn recent_entries(&self) -> Vec<Arc<AuditEntry>> {
        self.lock_state().recent.iter().cloned().collect()
    }

    /// Load a persisted entry from the log
    pub fn load_entry(&self, query_id: &str) -> Result<Option<AuditEntry>, AuditError> {
        self.lock_log().load(query_id).map_err(Into::into)
    }

    /// Load every persisted entry in append order
    pub fn load_all_entries(&self) -> Result<Vec<AuditEntry>, AuditError> {
        self.lock_log().load_all().map_err(Into::into)
    }

    /// Clear in-memory statistics; the persisted log is untouched
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.summary.reset();
        state.recent.clear();
    }

    fn check_traversal(&self, entry: &mut AuditEntry) {
        let data_bearing = entry
            .response_type
            .as_deref()
            .is_some_and(|t| self.config.is_data_bearing(t));
        // origin checks read the log, they do not count as looking at a store
        let inspected = entry
            .traversal_steps
            .iter()
            .any(|step| step.action.is_inspection());
        if data_bearing && !inspected {
            raise(entry, DefectType::NoTraversal, NO_TRAVERSAL_DESCRIPTION);
        }
    }

    fn lock_log(&self) -> MutexGuard<'_, L> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_state(&self) -> MutexGuard<'_, AuditorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Append a defect unless the same one is already recorded
fn raise(entry: &mut AuditEntry, defect_type: DefectType, description: impl Into<String>) {
    let description = description.into();
    if entry
        .defects
        .iter()
        .any(|d| d.defect_type == defect_type && d.description == description)
    {
        return;
    }

    if defect_type.severity() == Severity::Critical {
        tracing::warn!(query_id = %entry.query_id, defect = %defect_type, "{}", description);
    } else {
        tracing::debug!(query_id = %entry.query_id, defect = %defect_type, "{}", description);
    }
    entry
        .defects
        .push(Defect::new(defect_type, description, now_millis()));
}
