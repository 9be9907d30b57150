//! The refuse/proceed decision in front of every query

use crate::{GateConfig, GateError, SourceResolver};
use groundwork_domain::{QueryIntent, ResolutionOutcome, SourceResolution};
use groundwork_registry::SourceRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of the gate for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    /// Whether the pipeline may go on to answer
    pub can_proceed: bool,

    /// The resolution the decision was based on
    pub resolution: SourceResolution,

    /// Why the query was refused (`None` when proceeding)
    pub refusal_reason: Option<String>,
}

impl GateDecision {
    /// Let the query through
    pub fn proceed(resolution: SourceResolution) -> Self {
        Self {
            can_proceed: true,
            resolution,
            refusal_reason: None,
        }
    }

    /// Refuse the query
    pub fn refused(resolution: SourceResolution, reason: impl Into<String>) -> Self {
        Self {
            can_proceed: false,
            resolution,
            refusal_reason: Some(reason.into()),
        }
    }

    /// Convert into a `Result`, turning a refusal into [`GateError::Refused`]
    pub fn into_result(self) -> Result<SourceResolution, GateError> {
        if self.can_proceed {
            return Ok(self.resolution);
        }
        Err(GateError::Refused {
            reason: self.refusal_reason.unwrap_or_default(),
            resolution: Box::new(self.resolution),
        })
    }
}

/// Wraps the resolver with the refusal policy
///
/// A query naming no domain, or only domains nothing is authoritative for,
/// is always refused. Demo-only and partial resolutions proceed unless the
/// configuration says otherwise.
///
/// # Examples
///
/// ```
/// use groundwork_domain::QueryIntent;
/// use groundwork_gatekeeper::{GateConfig, VerificationGate};
/// use groundwork_registry::SourceRegistry;
/// use std::sync::Arc;
///
/// let registry = Arc::new(SourceRegistry::new(vec![]).unwrap());
/// let gate = VerificationGate::new(registry, GateConfig::default());
///
/// let decision = gate.verify_or_refuse(&QueryIntent::new("query", ["weather"], "Will it rain?"));
/// assert!(!decision.can_proceed);
/// ```
pub struct VerificationGate {
    resolver: SourceResolver,
    config: GateConfig,
}

impl VerificationGate {
    /// Create a gate over the given registry
    pub fn new(registry: Arc<SourceRegistry>, config: GateConfig) -> Self {
        let resolver = SourceResolver::new(registry).normalize_domains(config.normalize_domains);
        Self { resolver, config }
    }

    /// Create a gate with default configuration
    pub fn default_config(registry: Arc<SourceRegistry>) -> Self {
        Self::new(registry, GateConfig::default())
    }

    /// The underlying resolver
    pub fn resolver(&self) -> &SourceResolver {
        &self.resolver
    }

    /// Configuration in use
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Resolve the intent and decide whether the query may proceed
    pub fn verify_or_refuse(&self, intent: &QueryIntent) -> GateDecision {
        let resolution = self.resolver.resolve(intent);

        let refusal = match resolution.outcome {
            ResolutionOutcome::Refused if resolution.domains_unresolved.is_empty() => Some(
                "No data domain could be identified in the query; refusing rather than guessing"
                    .to_string(),
            ),
            ResolutionOutcome::Refused => Some(format!(
                "No registered source is authoritative for: {}",
                resolution.domains_unresolved.join(", ")
            )),
            ResolutionOutcome::Unresolved if self.config.refuse_partial => Some(format!(
                "No registered source is authoritative for: {} (partial answers are disabled)",
                resolution.domains_unresolved.join(", ")
            )),
            ResolutionOutcome::DemoOnly if self.config.refuse_demo_only => Some(format!(
                "Only demo or stub sources are available for: {}",
                resolution
                    .domains_resolved
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            _ => None,
        };

        match refusal {
            Some(reason) => {
                tracing::info!(
                    outcome = %resolution.outcome,
                    intent_type = %intent.intent_type,
                    reason = %reason,
                    "Query refused"
                );
                GateDecision::refused(resolution, reason)
            }
            None => {
                if resolution.has_demo_warnings() {
                    tracing::debug!(
                        warnings = resolution.demo_warnings.len(),
                        "Proceeding with demo warnings"
                    );
                }
                GateDecision::proceed(resolution)
            }
        }
    }
}
