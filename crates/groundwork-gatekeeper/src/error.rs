//! Gatekeeper error types

use groundwork_domain::SourceResolution;
use thiserror::Error;

/// A refusal turned into an error, for callers that prefer `?`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    /// The gate refused the query
    #[error("Query refused: {reason}")]
    Refused {
        /// Human-readable refusal reason
        reason: String,
        /// Resolution that led to the refusal
        resolution: Box<SourceResolution>,
    },
}
