//! Per-query orchestration: gate, traversal, stamping and audit

use crate::config::{GroundworkConfig, PipelineConfig};
use crate::error::PipelineError;
use groundwork_auditor::{AuditError, FinalizedEntry, GroundingAuditor};
use groundwork_domain::{
    AuditEntry, AuditLog, DefectType, Payload, QueryIntent, ResponseProvenance,
    SourceResolution, StoreAdapter, INFRASTRUCTURE_SOURCE,
};
use groundwork_gatekeeper::{GateDecision, VerificationGate};
use groundwork_provenance::{validate_payload, validate_response, ProvenanceStamper};
use groundwork_registry::{
    IntrospectionReport, IntrospectionWorker, ProbeReport, SchemaIntrospector, SourceRegistry,
};
use groundwork_traversal::{OriginVerification, TraversalEngine};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// The wired-up grounding subsystem
///
/// Holds one of each component and hands out a [`GroundedQuery`] per
/// incoming query. Everything here is shared; the per-query state lives in
/// the session.
pub struct Groundwork<L: AuditLog> {
    registry: Arc<SourceRegistry>,
    introspector: Arc<SchemaIntrospector>,
    gate: VerificationGate,
    stamper: ProvenanceStamper,
    auditor: GroundingAuditor<L>,
    policy: PipelineConfig,
}

impl<L> Groundwork<L>
where
    L: AuditLog,
    L::Error: Into<AuditError>,
{
    /// Build every component from one configuration
    ///
    /// `adapters` are the live stores to introspect and probe; sources
    /// without an adapter keep their declared schema.
    pub fn from_config(
        config: GroundworkConfig,
        adapters: Vec<Arc<dyn StoreAdapter>>,
        audit_log: L,
    ) -> Result<Self, PipelineError> {
        let registry = Arc::new(SourceRegistry::from_config(config.registry)?);
        let introspector = Arc::new(SchemaIntrospector::new(
            Arc::clone(&registry),
            adapters,
            config.introspection,
        ));

        tracing::info!(
            sources = registry.source_count(),
            "Groundwork initialised"
        );

        Ok(Self {
            gate: VerificationGate::new(Arc::clone(&registry), config.gate),
            stamper: ProvenanceStamper::new(Arc::clone(&registry)),
            auditor: GroundingAuditor::new(audit_log, config.auditor),
            registry,
            introspector,
            policy: config.pipeline,
        })
    }

    /// The source registry
    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// The schema introspector
    pub fn introspector(&self) -> &Arc<SchemaIntrospector> {
        &self.introspector
    }

    /// The verification gate
    pub fn gate(&self) -> &VerificationGate {
        &self.gate
    }

    /// The provenance stamper
    pub fn stamper(&self) -> &ProvenanceStamper {
        &self.stamper
    }

    /// The grounding auditor
    pub fn auditor(&self) -> &GroundingAuditor<L> {
        &self.auditor
    }

    /// The blocking policy in force
    pub fn policy(&self) -> &PipelineConfig {
        &self.policy
    }

    /// Run one introspection cycle now
    pub fn introspect(&self) -> IntrospectionReport {
        self.introspector.introspect_all()
    }

    /// A background worker refreshing live schema at the configured interval
    pub fn worker(&self) -> IntrospectionWorker {
        IntrospectionWorker::new(Arc::clone(&self.introspector))
    }

    /// Spawn the introspection worker on the current runtime
    ///
    /// The task ends when `true` is sent on `shutdown` or the sender is
    /// dropped, and yields the worker so its last report can be inspected.
    pub fn spawn_introspection(
        &self,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<IntrospectionWorker> {
        let mut worker = self.worker();
        tokio::spawn(async move {
            worker.run(shutdown).await;
            worker
        })
    }

    /// Gate a query and open its audit entry
    ///
    /// A refused query is finalized here with a `refusal` response. A query
    /// that may proceed returns a session; its entry is finalized by
    /// [`GroundedQuery::complete`].
    pub fn begin_query(&self, query_id: impl Into<String>, intent: &QueryIntent) -> QueryOutcome<'_, L> {
        let query_id = query_id.into();
        let decision = self.gate.verify_or_refuse(intent);

        let mut entry = self.auditor.start_entry(query_id.clone(), intent.raw_text.clone());
        self.auditor.record_resolution(&mut entry, &decision.resolution);

        tracing::debug!(
            query_id = %query_id,
            outcome = %decision.resolution.outcome,
            can_proceed = decision.can_proceed,
            "Query gated"
        );

        if !decision.can_proceed {
            self.auditor.record_response(&mut entry, "refusal", 0, None);
            let audit = self.auditor.finalize_entry(entry);
            return QueryOutcome::Refused(Refusal { decision, audit });
        }

        QueryOutcome::Proceed(GroundedQuery {
            groundwork: self,
            intent: intent.clone(),
            resolution: decision.resolution,
            engine: TraversalEngine::new(Arc::clone(&self.introspector)),
            entry,
            origin_checks: Vec::new(),
        })
    }
}

/// What [`Groundwork::begin_query`] decided
pub enum QueryOutcome<'a, L: AuditLog> {
    /// The gate refused; nothing further may be produced for this query
    Refused(Refusal),
    /// The query may be answered through the session
    Proceed(GroundedQuery<'a, L>),
}

impl<'a, L: AuditLog> QueryOutcome<'a, L> {
    /// True when the gate refused the query
    pub fn is_refused(&self) -> bool {
        matches!(self, QueryOutcome::Refused(_))
    }

    /// The session, if the query may proceed
    pub fn into_query(self) -> Option<GroundedQuery<'a, L>> {
        match self {
            QueryOutcome::Proceed(query) => Some(query),
            QueryOutcome::Refused(_) => None,
        }
    }

    /// The refusal, if the gate refused
    pub fn into_refusal(self) -> Option<Refusal> {
        match self {
            QueryOutcome::Refused(refusal) => Some(refusal),
            QueryOutcome::Proceed(_) => None,
        }
    }
}

/// A refused query and its finalized audit entry
#[derive(Debug)]
pub struct Refusal {
    /// The gate's decision, including the reason
    pub decision: GateDecision,
    /// The entry written for the refusal
    pub audit: FinalizedEntry,
}

impl Refusal {
    /// Human-readable refusal reason
    pub fn reason(&self) -> &str {
        self.decision.refusal_reason.as_deref().unwrap_or_default()
    }
}

/// The response the caller assembled from grounded payloads
#[derive(Debug, Clone, Default)]
pub struct DraftResponse {
    /// Response kind (e.g. "dashboard", "greeting")
    pub response_type: String,
    /// Stamped data payloads
    pub payloads: Vec<Payload>,
    /// Confidence reported by the response builder
    pub confidence: Option<f64>,
}

impl DraftResponse {
    /// Draft with no payloads
    pub fn new(response_type: impl Into<String>) -> Self {
        Self {
            response_type: response_type.into(),
            ..Self::default()
        }
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payloads.push(payload);
        self
    }

    /// Set the confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// A response that passed every provenance check
#[derive(Debug)]
pub struct GroundedResponse {
    /// Response kind
    pub response_type: String,
    /// Stamped payloads, unchanged from the draft
    pub payloads: Vec<Payload>,
    /// Response-level envelope
    pub provenance: ResponseProvenance,
    /// The entry written for this query
    pub audit: FinalizedEntry,
}

/// One query in flight
///
/// Owns the traversal and the open audit entry. Dropping the session without
/// calling [`complete`](Self::complete) leaves the entry unwritten.
pub struct GroundedQuery<'a, L: AuditLog> {
    groundwork: &'a Groundwork<L>,
    intent: QueryIntent,
    resolution: SourceResolution,
    engine: TraversalEngine,
    entry: AuditEntry,
    origin_checks: Vec<OriginVerification>,
}

impl<'a, L> GroundedQuery<'a, L>
where
    L: AuditLog,
    L::Error: Into<AuditError>,
{
    /// Resolution the gate produced
    pub fn resolution(&self) -> &SourceResolution {
        &self.resolution
    }

    /// The intent being answered
    pub fn intent(&self) -> &QueryIntent {
        &self.intent
    }

    /// Traversal actions for this query
    pub fn traversal(&mut self) -> &mut TraversalEngine {
        &mut self.engine
    }

    /// Id of this query's traversal
    pub fn traversal_id(&self) -> &str {
        self.engine.traversal_id()
    }

    /// Stamp data read from `source_id`
    ///
    /// The source counts as authoritative when it resolved one of the
    /// query's domains.
    pub fn stamp_payload(&self, data: &Payload, source_id: &str, synthetic: bool) -> Payload {
        let authoritative = self
            .resolution
            .domains_resolved
            .values()
            .any(|id| id == source_id);
        self.groundwork.stamper.stamp_payload(
            data,
            source_id,
            authoritative,
            Some(self.engine.traversal_id()),
            synthetic,
        )
    }

    /// Stamp a widget payload from the resolution's primary source
    pub fn stamp_widget_payload(&self, widget: &Payload) -> Payload {
        self.groundwork.stamper.stamp_widget_payload(
            widget,
            &self.resolution,
            Some(self.engine.traversal_id()),
        )
    }

    /// Check a data origin claim and keep the result for the audit entry
    pub fn verify_data_origin(&mut self, claimed_data: &Value, claimed_source_id: &str) -> OriginVerification {
        let check = self.engine.verify_data_origin(claimed_data, claimed_source_id);
        self.origin_checks.push(check.clone());
        check
    }

    /// Probe every store for the devices named in the query
    ///
    /// Probe hits are leads, not grounding; preview the matching table to
    /// make a source count as queried.
    pub async fn probe(&self) -> ProbeReport {
        self.groundwork
            .introspector
            .probe(&self.intent.entities.devices)
            .await
    }

    /// Validate the response, record it and finalize the audit entry
    ///
    /// When no origin was checked explicitly, every distinct `_data_source`
    /// named by a payload is checked here, even if the rest of its marker is
    /// missing. These checks do not count as traversal. The entry is
    /// finalized whether or not the response passes.
    pub fn complete(self, draft: DraftResponse) -> Result<GroundedResponse, PipelineError> {
        let GroundedQuery {
            groundwork,
            resolution,
            mut engine,
            mut entry,
            mut origin_checks,
            ..
        } = self;
        let auditor = &groundwork.auditor;

        if origin_checks.is_empty() {
            let mut claimed: Vec<(String, Value)> = Vec::new();
            for payload in &draft.payloads {
                let Some(source_id) = payload.data_source() else {
                    continue;
                };
                if source_id != INFRASTRUCTURE_SOURCE && !claimed.iter().any(|(id, _)| id == source_id) {
                    claimed.push((source_id.to_string(), Value::Object(payload.as_map().clone())));
                }
            }
            for (source_id, data) in &claimed {
                origin_checks.push(engine.verify_data_origin(data, source_id));
            }
        }

        let synthetic = draft.payloads.iter().any(Payload::is_synthetic);

        auditor.record_traversal(&mut entry, engine.context());
        auditor.record_response(
            &mut entry,
            &draft.response_type,
            draft.payloads.len(),
            draft.confidence,
        );

        // unverified checks go last so the entry's origin reflects a failure
        origin_checks.sort_by_key(|check| !check.verified);
        for check in &origin_checks {
            auditor.record_data_origin(&mut entry, &check.claimed_source_id, check.verified, synthetic);
        }
        if origin_checks.is_empty() && synthetic {
            auditor.record_data_origin(&mut entry, INFRASTRUCTURE_SOURCE, true, true);
        }

        let provenance =
            groundwork
                .stamper
                .build_response_provenance(&resolution, engine.context(), &draft.payloads);
        let verdict = check_response(groundwork, &entry, &draft, &provenance);

        let audit = auditor.finalize_entry(entry);
        match verdict {
            Ok(()) => Ok(GroundedResponse {
                response_type: draft.response_type,
                payloads: draft.payloads,
                provenance,
                audit,
            }),
            Err(e) => {
                tracing::warn!(query_id = %audit.entry.query_id, error = %e, "Response withheld");
                Err(e)
            }
        }
    }
}

fn check_response<L>(
    groundwork: &Groundwork<L>,
    entry: &AuditEntry,
    draft: &DraftResponse,
    provenance: &ResponseProvenance,
) -> Result<(), PipelineError>
where
    L: AuditLog,
    L::Error: Into<AuditError>,
{
    for (index, payload) in draft.payloads.iter().enumerate() {
        let check = validate_payload(payload);
        if !check.valid {
            return Err(PipelineError::InvalidPayload {
                index,
                reason: check.reason,
            });
        }
    }

    if groundwork.auditor.config().is_data_bearing(&draft.response_type) {
        let check = validate_response(provenance);
        if !check.valid {
            return Err(PipelineError::InvalidResponse(check.reason));
        }
    }

    let policy = &groundwork.policy;
    if policy.block_on_no_traversal && entry.has_defect(DefectType::NoTraversal) {
        return Err(PipelineError::Blocked(DefectType::NoTraversal));
    }
    if policy.block_on_unverified_origin && entry.has_defect(DefectType::UnverifiedDataOrigin) {
        return Err(PipelineError::Blocked(DefectType::UnverifiedDataOrigin));
    }
    Ok(())
}
