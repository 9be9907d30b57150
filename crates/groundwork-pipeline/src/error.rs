//! Pipeline error types

use groundwork_auditor::AuditError;
use groundwork_domain::DefectType;
use groundwork_registry::{ConfigError, RegistryError};
use thiserror::Error;

/// Errors surfaced by the pipeline
///
/// Refusals and defects are not errors. A response that fails its final
/// provenance checks, or that the blocking policy stops, is; its audit entry
/// is still finalized before the error is returned.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The registry rejected the declared sources
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Audit log could not be opened or read
    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    /// A payload is missing provenance or has an untraceable origin
    #[error("Payload {index} failed provenance check: {reason}")]
    InvalidPayload {
        /// Position of the payload in the response
        index: usize,
        /// Validation failure
        reason: String,
    },

    /// The response envelope failed validation and must not be sent
    #[error("Response failed provenance check: {0}")]
    InvalidResponse(String),

    /// The blocking policy stopped the response
    #[error("Response blocked by policy: {0} defect")]
    Blocked(DefectType),
}
