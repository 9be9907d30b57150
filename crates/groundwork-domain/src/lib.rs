//! Groundwork Domain Layer
//!
//! Core data model for the data-grounding and source-verification subsystem.
//! It defines the value objects and trait interfaces that every other
//! Groundwork crate depends upon, and contains no I/O.
//!
//! ## Key Concepts
//!
//! - **DataSource**: A registered store with its declared tables and trust status
//! - **SourceResolution**: Which source is authoritative for each queried domain
//! - **TraversalContext**: The ordered log of inspection actions taken for a query
//! - **Provenance**: Origin markers on every payload and on every response
//! - **AuditEntry**: The immutable per-query audit record with its defects
//!
//! ## Architecture
//!
//! - Serialization derives only; no storage or network code
//! - Trait definitions (`StoreAdapter`, `AuditLog`) for all external interactions
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audit;
pub mod intent;
pub mod provenance;
pub mod resolution;
pub mod source;
pub mod traits;
pub mod traversal;

use std::time::{SystemTime, UNIX_EPOCH};

// Re-exports for convenience
pub use audit::{AuditEntry, Defect, DefectType, Severity};
pub use intent::{Entities, QueryIntent};
pub use provenance::{Payload, ProvenanceMarker, ResponseProvenance};
pub use resolution::{ResolutionOutcome, SourceResolution};
pub use source::{ColumnSchema, DataSource, IntegrationStatus, SourceType, TableSchema};
pub use traits::{AdapterError, AuditLog, Row, StoreAdapter, TableStat};
pub use traversal::{TraversalAction, TraversalContext, TraversalStep, INFRASTRUCTURE_SOURCE};

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
