//! Stamping provenance markers onto payloads and responses

use groundwork_domain::provenance::{KEY_SYNTHETIC, UNKNOWN_SOURCE};
use groundwork_domain::{
    IntegrationStatus, Payload, ProvenanceMarker, ResponseProvenance, SourceResolution,
    TraversalContext, INFRASTRUCTURE_SOURCE,
};
use groundwork_registry::SourceRegistry;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Attaches origin markers using the registry's view of each source
pub struct ProvenanceStamper {
    registry: Arc<SourceRegistry>,
}

impl ProvenanceStamper {
    /// Create a stamper over the given registry
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self { registry }
    }

    /// Build the marker for data from `source_id`
    ///
    /// Stub and unregistered sources are unsafe to answer from. Declared
    /// synthetic data is always marked safe, and flagged as synthetic.
    pub fn marker_for(
        &self,
        source_id: &str,
        is_authoritative: bool,
        traversal_id: Option<&str>,
        synthetic: bool,
    ) -> ProvenanceMarker {
        let integration_status = self.registry.integration_status(source_id);
        let safe_to_answer = synthetic
            || !matches!(
                integration_status,
                IntegrationStatus::Stub | IntegrationStatus::Unknown
            );

        if integration_status == IntegrationStatus::Unknown {
            tracing::warn!(source_id = source_id, "Stamping payload from unregistered source");
        }

        ProvenanceMarker {
            data_source: source_id.to_string(),
            integration_status,
            authoritative: is_authoritative,
            traversal_id: traversal_id.map(str::to_string),
            synthetic,
            safe_to_answer,
        }
    }

    /// Return a copy of `data` carrying the six marker fields
    pub fn stamp_payload(
        &self,
        data: &Payload,
        source_id: &str,
        is_authoritative: bool,
        traversal_id: Option<&str>,
        synthetic: bool,
    ) -> Payload {
        let marker = self.marker_for(source_id, is_authoritative, traversal_id, synthetic);
        data.with_provenance(&marker)
    }

    /// Stamp a widget payload from the query's resolution
    ///
    /// The source is the resolution's primary source (`"unknown"` when there
    /// is none) and is authoritative whenever it exists. The synthetic flag is
    /// read from the widget itself or, failing that, from any object one
    /// level down.
    pub fn stamp_widget_payload(
        &self,
        widget: &Payload,
        resolution: &SourceResolution,
        traversal_id: Option<&str>,
    ) -> Payload {
        let (source_id, authoritative) = match resolution.primary_source.as_deref() {
            Some(primary) => (primary, true),
            None => (UNKNOWN_SOURCE, false),
        };
        self.stamp_payload(widget, source_id, authoritative, traversal_id, widget_is_synthetic(widget))
    }

    /// Build the response-level envelope
    ///
    /// `derived_from` lists the primary then the secondary sources.
    /// `data_sources_used` adds every non-infrastructure source the traversal
    /// touched and every source a payload names in `_data_source`, whether or
    /// not the rest of its marker is present.
    pub fn build_response_provenance(
        &self,
        resolution: &SourceResolution,
        traversal: &TraversalContext,
        payloads: &[Payload],
    ) -> ResponseProvenance {
        let derived_from = resolution.all_sources();

        let mut data_sources_used: BTreeSet<String> = derived_from.iter().cloned().collect();
        data_sources_used.extend(
            traversal
                .sources_queried
                .iter()
                .filter(|id| id.as_str() != INFRASTRUCTURE_SOURCE)
                .cloned(),
        );
        data_sources_used.extend(
            payloads
                .iter()
                .filter_map(Payload::data_source)
                .filter(|id| *id != UNKNOWN_SOURCE && *id != INFRASTRUCTURE_SOURCE)
                .map(str::to_string),
        );

        let all_authoritative = data_sources_used.iter().all(|id| {
            let status = self.registry.integration_status(id);
            !status.is_demo() && status != IntegrationStatus::Unknown
        });

        ResponseProvenance {
            safe_to_answer: !derived_from.is_empty(),
            derived_from,
            traversal_log: traversal.steps.clone(),
            resolution_outcome: resolution.outcome,
            demo_warnings: resolution.demo_warnings.clone(),
            data_sources_used,
            all_authoritative,
        }
    }
}

fn widget_is_synthetic(widget: &Payload) -> bool {
    if let Some(flag) = widget.get(KEY_SYNTHETIC).and_then(Value::as_bool) {
        return flag;
    }
    widget.as_map().values().any(|child| {
        child
            .get(KEY_SYNTHETIC)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    })
}
