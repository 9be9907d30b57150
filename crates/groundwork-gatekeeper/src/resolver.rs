//! Source resolution: which registered source answers for each domain

use groundwork_domain::{DataSource, QueryIntent, ResolutionOutcome, SourceResolution};
use groundwork_registry::SourceRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Maps a query's domains to authoritative sources
pub struct SourceResolver {
    registry: Arc<SourceRegistry>,
    normalize_domains: bool,
}

impl SourceResolver {
    /// Create a resolver that normalizes domain tags
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self {
            registry,
            normalize_domains: true,
        }
    }

    /// Enable or disable trimming and lower-casing of domain tags
    pub fn normalize_domains(mut self, normalize: bool) -> Self {
        self.normalize_domains = normalize;
        self
    }

    /// The registry resolutions are drawn from
    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// Domains the resolver will look up, deduplicated in request order
    pub fn requested_domains(&self, intent: &QueryIntent) -> Vec<String> {
        let mut domains: Vec<String> = Vec::new();
        for raw in &intent.domains {
            let domain = if self.normalize_domains {
                raw.trim().to_lowercase()
            } else {
                raw.clone()
            };
            if !domain.is_empty() && !domains.contains(&domain) {
                domains.push(domain);
            }
        }
        domains
    }

    /// Resolve every requested domain
    ///
    /// Each domain goes to its highest-priority authoritative source. Demo,
    /// stub and hybrid sources still resolve, with a warning. The primary
    /// source is the highest-priority one picked (first requested domain wins
    /// ties); every other distinct pick is secondary.
    pub fn resolve(&self, intent: &QueryIntent) -> SourceResolution {
        let domains = self.requested_domains(intent);
        if domains.is_empty() {
            return SourceResolution::refused(Vec::new());
        }

        let mut picked: Vec<DataSource> = Vec::new();
        let mut domains_resolved = BTreeMap::new();
        let mut domains_unresolved = Vec::new();
        let mut demo_warnings = Vec::new();

        for domain in &domains {
            let Some(source) = self.registry.sources_for_domain(domain).into_iter().next() else {
                tracing::debug!(domain = %domain, "No authoritative source");
                domains_unresolved.push(domain.clone());
                continue;
            };

            if source.integration_status.needs_warning() {
                demo_warnings.push(format!(
                    "Domain '{}' is served by {} source '{}' ({})",
                    domain, source.integration_status, source.id, source.name
                ));
            }
            domains_resolved.insert(domain.clone(), source.id.clone());
            if !picked.iter().any(|p| p.id == source.id) {
                picked.push(source);
            }
        }

        if picked.is_empty() {
            return SourceResolution::refused(domains_unresolved);
        }

        let outcome = if !domains_unresolved.is_empty() {
            ResolutionOutcome::Unresolved
        } else if picked.iter().all(|s| s.integration_status.is_demo()) {
            ResolutionOutcome::DemoOnly
        } else {
            ResolutionOutcome::Resolved
        };

        let mut primary = 0;
        for (idx, source) in picked.iter().enumerate() {
            if source.priority > picked[primary].priority {
                primary = idx;
            }
        }
        let primary_source = picked[primary].id.clone();
        let secondary_sources = picked
            .iter()
            .filter(|s| s.id != primary_source)
            .map(|s| s.id.clone())
            .collect();

        SourceResolution {
            outcome,
            primary_source: Some(primary_source),
            secondary_sources,
            domains_resolved,
            domains_unresolved,
            demo_warnings,
        }
    }
}
