//! Trait definitions for external interactions
//!
//! These traits define the boundaries between grounding logic and the
//! physical stores / audit storage. Implementations live in other crates.

use crate::audit::AuditEntry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// One row / document as returned by a store adapter
pub type Row = Map<String, Value>;

/// Errors raised by store adapters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// Store could not be reached
    #[error("Store unreachable: {0}")]
    Unreachable(String),

    /// Table / collection does not exist in the store
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Query failed inside the store
    #[error("Query failed: {0}")]
    Query(String),
}

/// A table as seen in the live store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStat {
    /// Table / collection name
    pub name: String,

    /// Row / document count
    pub row_count: u64,
}

/// Read-only access to one physical store
///
/// Implemented by the query adapters for each store. Calls are blocking;
/// async callers run them on a blocking thread.
pub trait StoreAdapter: Send + Sync {
    /// Registry id of the source this adapter serves
    fn source_id(&self) -> &str;

    /// Enumerate the tables / collections that actually exist
    fn list_tables(&self) -> Result<Vec<TableStat>, AdapterError>;

    /// Fetch up to `limit` rows from `table`
    fn preview_rows(&self, table: &str, limit: usize) -> Result<Vec<Row>, AdapterError>;

    /// Search the store for rows mentioning `term`
    fn search(&self, term: &str, limit: usize) -> Result<Vec<Row>, AdapterError>;
}

/// Append-only storage for finalized audit entries
///
/// Implemented by the auditor crate (SQLite, in-memory).
pub trait AuditLog: Send {
    /// Error type for log operations
    type Error;

    /// Append a finalized entry; an existing `query_id` must be rejected
    fn append(&mut self, entry: &AuditEntry) -> Result<(), Self::Error>;

    /// Load an entry by query id
    fn load(&self, query_id: &str) -> Result<Option<AuditEntry>, Self::Error>;

    /// Load every entry in append order
    fn load_all(&self) -> Result<Vec<AuditEntry>, Self::Error>;
}
