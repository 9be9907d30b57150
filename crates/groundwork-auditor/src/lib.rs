//! Groundwork Auditor
//!
//! Immutable per-query audit trail with defect detection.
//!
//! # Overview
//!
//! The Auditor is responsible for:
//! - **Audit entries**: One entry per query, filled in stages and finalized once
//! - **Defect detection**: Classifying grounding violations with a fixed severity
//! - **Persistence**: Appending finalized entries to an append-only log
//! - **Statistics**: Defect counts and rate for longitudinal monitoring
//!
//! ## Defect taxonomy
//!
//! | Defect | Trigger | Severity |
//! |--------|---------|----------|
//! | **unresolved_domain** | a requested domain has no authoritative source | critical |
//! | **demo_data_used** | the resolution carries demo warnings | warning |
//! | **no_traversal** | data-bearing response with zero traversal steps | critical |
//! | **unverified_data_origin** | the claimed origin was never queried | major |
//! | **synthetic_data_used** | the response includes synthetic values | warning |
//!
//! # Usage
//!
//! ```no_run
//! use groundwork_auditor::{AuditorConfig, GroundingAuditor, SqliteAuditLog};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let log = SqliteAuditLog::new("audit.db")?;
//! let auditor = GroundingAuditor::new(log, AuditorConfig::default());
//!
//! let entry = auditor.start_entry("q-1", "show pump power");
//! // ... record_resolution / record_traversal / record_response ...
//! let finalized = auditor.finalize_entry(entry);
//! if let Some(e) = finalized.persist_error {
//!     eprintln!("audit trail not persisted: {}", e);
//! }
//!
//! println!("{}", auditor.get_defect_summary().summary());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [auditor]
//! data_bearing_response_types = ["dashboard"]
//! retain_entries = 1000
//! ```

#![warn(missing_docs)]

mod auditor;
mod config;
mod error;
mod metrics;
mod store;

pub use auditor::{FinalizedEntry, GroundingAuditor};
pub use config::AuditorConfig;
pub use error::AuditError;
pub use metrics::DefectSummary;
pub use store::{MemoryAuditLog, SqliteAuditLog};
