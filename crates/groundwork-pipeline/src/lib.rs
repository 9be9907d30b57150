//! Groundwork Pipeline
//!
//! Wires the grounding components into one per-query flow:
//!
//! 1. **Gate** - resolve the query's domains to authoritative sources, or refuse
//! 2. **Traversal** - inspect the resolved stores before any data is used
//! 3. **Stamping** - mark every payload with where it came from
//! 4. **Validation** - check payloads and the response envelope before sending
//! 5. **Audit** - record the whole query, flag defects, persist the entry
//!
//! A refusal is a normal outcome, not an error. A response that fails its
//! provenance checks is withheld and surfaces as a [`PipelineError`]; its
//! audit entry is written either way.
//!
//! # Usage
//!
//! ```no_run
//! use groundwork_auditor::MemoryAuditLog;
//! use groundwork_domain::{Payload, QueryIntent};
//! use groundwork_pipeline::{
//!     init_tracing, DraftResponse, Groundwork, GroundworkConfig, QueryOutcome,
//! };
//! use serde_json::json;
//!
//! let config = GroundworkConfig::from_file("groundwork.toml")?;
//! init_tracing(&config.logging);
//!
//! let groundwork = Groundwork::from_config(config, Vec::new(), MemoryAuditLog::new())?;
//! let intent = QueryIntent::new("query", ["industrial"], "Show pump 4 power");
//!
//! match groundwork.begin_query("q-1", &intent) {
//!     QueryOutcome::Refused(refusal) => println!("{}", refusal.reason()),
//!     QueryOutcome::Proceed(mut query) => {
//!         query.traversal().preview_rows("equipment", 5);
//!         let widget = Payload::from_value(json!({"power_kw": 41.5}));
//!         let stamped = query.stamp_widget_payload(&widget);
//!         let response = query.complete(DraftResponse::new("dashboard").with_payload(stamped))?;
//!         println!("{:?}", response.provenance.derived_from);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod groundwork;
mod logging;

pub use config::{GroundworkConfig, LoggingConfig, PipelineConfig};
pub use error::PipelineError;
pub use groundwork::{
    DraftResponse, GroundedQuery, GroundedResponse, Groundwork, QueryOutcome, Refusal,
};
pub use logging::init_tracing;
