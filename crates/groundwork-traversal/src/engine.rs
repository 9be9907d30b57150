//! Per-query traversal engine

use groundwork_domain::{
    now_millis, TraversalAction, TraversalContext, TraversalStep, INFRASTRUCTURE_SOURCE,
};
use groundwork_registry::{DatabaseSummary, RowPreview, SchemaIntrospector, TableDescription};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Answer to "did this query actually inspect the claimed source?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginVerification {
    /// True iff the claimed source was queried earlier in this traversal
    pub verified: bool,
    /// Source the data was claimed to come from
    pub claimed_source_id: String,
    /// Sources queried at the time of the check
    pub sources_queried: Vec<String>,
    /// Explanation, empty when verified
    pub reason: String,
}

/// Records every inspection action a query takes
///
/// Each call runs the action against the introspector, then appends one
/// step to the log. The engine never blocks a query; an empty log is only a
/// signal for the auditor.
///
/// # Examples
///
/// ```
/// use groundwork_registry::{IntrospectionConfig, SchemaIntrospector, SourceRegistry};
/// use groundwork_traversal::TraversalEngine;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let registry = Arc::new(SourceRegistry::new(vec![]).unwrap());
/// let introspector = Arc::new(SchemaIntrospector::new(registry, vec![], IntrospectionConfig::default()));
///
/// let mut engine = TraversalEngine::new(introspector);
/// engine.list_databases();
/// assert_eq!(engine.context().step_count, 1);
///
/// let check = engine.verify_data_origin(&json!({"power_kw": 4.2}), "pg.equipment");
/// assert!(!check.verified);
/// ```
pub struct TraversalEngine {
    introspector: Arc<SchemaIntrospector>,
    traversal_id: String,
    context: TraversalContext,
}

impl TraversalEngine {
    /// Start a fresh traversal with a new id
    pub fn new(introspector: Arc<SchemaIntrospector>) -> Self {
        Self {
            introspector,
            traversal_id: uuid::Uuid::now_v7().to_string(),
            context: TraversalContext::new(),
        }
    }

    /// Id stamped into payload markers
    pub fn traversal_id(&self) -> &str {
        &self.traversal_id
    }

    /// Log so far
    pub fn context(&self) -> &TraversalContext {
        &self.context
    }

    /// Give up the engine and keep the log
    pub fn into_context(self) -> TraversalContext {
        self.context
    }

    /// List every registered source
    pub fn list_databases(&mut self) -> Vec<DatabaseSummary> {
        let started = Instant::now();
        let databases = self.introspector.list_databases();

        let ids: Vec<&str> = databases.iter().map(|d| d.id.as_str()).collect();
        let result = json!({ "count": databases.len(), "sources": ids });
        self.record(
            TraversalAction::ListDatabases,
            INFRASTRUCTURE_SOURCE,
            json!({}),
            result,
            started,
            true,
        );
        databases
    }

    /// Describe a declared table
    pub fn describe_table(&mut self, name: &str) -> Option<TableDescription> {
        let started = Instant::now();
        let description = self.introspector.describe_table(name);

        let (source_id, result) = match &description {
            Some(d) => (
                d.source_id.clone(),
                json!({
                    "found": true,
                    "columns": d.table.columns.len(),
                    "row_count": d.table.row_count,
                }),
            ),
            None => (INFRASTRUCTURE_SOURCE.to_string(), json!({ "found": false })),
        };
        self.record(
            TraversalAction::DescribeTable,
            &source_id,
            json!({ "table": name }),
            result,
            started,
            true,
        );
        description
    }

    /// Fetch sample rows from a declared table
    pub fn preview_rows(&mut self, name: &str, limit: usize) -> RowPreview {
        let started = Instant::now();
        let preview = self.introspector.preview_rows(name, limit);

        let source_id = preview
            .source_id
            .clone()
            .unwrap_or_else(|| INFRASTRUCTURE_SOURCE.to_string());
        let result = match &preview.error {
            Some(error) => json!({ "rows": 0, "error": error }),
            None => json!({ "rows": preview.rows.len() }),
        };
        self.record(
            TraversalAction::PreviewRows,
            &source_id,
            json!({ "table": name, "limit": limit }),
            result,
            started,
            true,
        );
        preview
    }

    /// Check a claim that `claimed_data` came from `claimed_source_id`
    ///
    /// Verified only if an earlier action in this traversal targeted that
    /// source. The check is logged but does not itself count as querying the
    /// source, so repeating it never changes the answer.
    pub fn verify_data_origin(
        &mut self,
        claimed_data: &Value,
        claimed_source_id: &str,
    ) -> OriginVerification {
        let started = Instant::now();
        let verified = self.context.has_queried(claimed_source_id);
        let sources_queried: Vec<String> = self.context.sources_queried.iter().cloned().collect();

        let reason = if verified {
            String::new()
        } else {
            format!(
                "Source '{}' was never queried during this traversal (queried: [{}])",
                claimed_source_id,
                sources_queried.join(", ")
            )
        };
        if !verified {
            tracing::warn!(
                traversal_id = %self.traversal_id,
                source_id = claimed_source_id,
                "Unverified data origin"
            );
        }

        let claimed_keys: Vec<&String> = match claimed_data {
            Value::Object(map) => map.keys().collect(),
            _ => Vec::new(),
        };
        self.record(
            TraversalAction::VerifyDataOrigin,
            claimed_source_id,
            json!({ "claimed_source_id": claimed_source_id, "claimed_keys": claimed_keys }),
            json!({ "verified": verified }),
            started,
            false,
        );

        OriginVerification {
            verified,
            claimed_source_id: claimed_source_id.to_string(),
            sources_queried,
            reason,
        }
    }

    fn record(
        &mut self,
        action: TraversalAction,
        source_id: &str,
        params: Value,
        result: Value,
        started: Instant,
        queried: bool,
    ) {
        tracing::debug!(
            traversal_id = %self.traversal_id,
            action = action.as_str(),
            source_id = source_id,
            "Traversal step"
        );
        self.context.record(
            TraversalStep {
                action,
                source_id: source_id.to_string(),
                params,
                result,
                timestamp: now_millis(),
                duration: started.elapsed(),
            },
            queried,
        );
    }
}
