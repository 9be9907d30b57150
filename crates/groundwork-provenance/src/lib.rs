//! Groundwork Provenance
//!
//! Every data payload carries a marker naming its source, that source's
//! integration status, and whether it is safe to answer from. Every response
//! carries an envelope listing the sources it was derived from. Both are
//! validated before they leave the subsystem; a failing response must not
//! be transmitted.
//!
//! # Examples
//!
//! ```
//! use groundwork_domain::{DataSource, IntegrationStatus, Payload, SourceType};
//! use groundwork_provenance::{validate_payload, ProvenanceStamper};
//! use groundwork_registry::SourceRegistry;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(SourceRegistry::new(vec![
//!     DataSource::new("ts.telemetry", "Telemetry", SourceType::Timeseries, IntegrationStatus::Stub),
//! ]).unwrap());
//! let stamper = ProvenanceStamper::new(registry);
//!
//! let stamped = stamper.stamp_payload(&Payload::new(), "ts.telemetry", true, None, false);
//! assert!(!stamped.marker().unwrap().safe_to_answer);
//! assert!(validate_payload(&stamped).valid);
//! ```

#![warn(missing_docs)]

mod stamper;
mod validator;

pub use stamper::ProvenanceStamper;
pub use validator::{validate_payload, validate_response, ProvenanceCheck, UNKNOWN_SOURCE_REASON};
