//! Groundwork Registry
//!
//! The declarative catalog of data sources, and a read-only introspector
//! that checks the catalog against what the live stores actually hold.
//!
//! - [`SourceRegistry`] answers "who owns this domain" from static config.
//! - [`SchemaIntrospector`] lists stores, describes and previews tables,
//!   ranks tables against free text, and refreshes row counts.
//! - [`IntrospectionWorker`] runs the refresh on a schedule.
//! - [`probe_entities`] fans a term search out across stores with
//!   per-probe timeouts.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod introspector;
pub mod probe;
pub mod registry;
pub mod scoring;
pub mod worker;

pub use adapters::MemoryStoreAdapter;
pub use config::{ConfigError, IntrospectionConfig, RegistryConfig};
pub use introspector::{
    DatabaseSummary, IntrospectionError, IntrospectionReport, RowPreview, SchemaIntrospector,
    StoreReport, StoreSummary, TableDescription,
};
pub use probe::{probe_entities, ProbeHit, ProbeReport};
pub use registry::{RegistryError, SourceRegistry};
pub use scoring::{rank_tables, score_table, tokenize, TableMatch, TableScore};
pub use worker::IntrospectionWorker;
