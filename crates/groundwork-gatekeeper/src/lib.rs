//! Groundwork Gatekeeper
//!
//! Decides, before any answer is produced, which registered source is
//! authoritative for each domain a query touches, and whether the query may
//! proceed at all.
//!
//! The Gatekeeper provides:
//! - Domain to source resolution with priority tie-breaks
//! - Demo/stub warnings that travel with the resolution
//! - The refuse/proceed decision, with an optional strict policy
//!
//! # Examples
//!
//! ```no_run
//! use groundwork_domain::QueryIntent;
//! use groundwork_gatekeeper::{GateConfig, VerificationGate};
//! use groundwork_registry::{RegistryConfig, SourceRegistry};
//! use std::sync::Arc;
//!
//! let config = RegistryConfig::from_file("sources.toml").unwrap();
//! let registry = Arc::new(SourceRegistry::from_config(config).unwrap());
//! let gate = VerificationGate::new(registry, GateConfig::default());
//!
//! let decision = gate.verify_or_refuse(&QueryIntent::new("query", ["industrial"], "pump power"));
//! if !decision.can_proceed {
//!     println!("{}", decision.refusal_reason.unwrap_or_default());
//! }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod gate;
mod resolver;

pub use config::GateConfig;
pub use error::GateError;
pub use gate::{GateDecision, VerificationGate};
pub use resolver::SourceResolver;
