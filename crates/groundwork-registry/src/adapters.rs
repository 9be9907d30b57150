//! In-memory store adapter
//!
//! Deterministic stand-in for a physical store, used by tests and demos.

use groundwork_domain::{AdapterError, Row, StoreAdapter, TableStat};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

/// In-memory store with named tables of JSON rows
///
/// Clones share state, so a test can keep a handle to flip the adapter into
/// failure mode after handing it to the introspector.
///
/// # Examples
///
/// ```
/// use groundwork_registry::MemoryStoreAdapter;
/// use groundwork_domain::StoreAdapter;
/// use serde_json::json;
///
/// let store = MemoryStoreAdapter::new("pg.equipment")
///     .with_table("readings", vec![json!({"device": "pump_1", "power_kw": 4.2})]);
///
/// assert_eq!(store.list_tables().unwrap()[0].row_count, 1);
/// store.set_failing(true);
/// assert!(store.list_tables().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStoreAdapter {
    source_id: String,
    tables: Arc<RwLock<Vec<(String, Vec<Row>)>>>,
    failing: Arc<AtomicBool>,
    latency: Arc<Mutex<Duration>>,
    call_count: Arc<AtomicUsize>,
}

impl MemoryStoreAdapter {
    /// Create an empty store serving `source_id`
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            tables: Arc::new(RwLock::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
            latency: Arc::new(Mutex::new(Duration::ZERO)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a table; non-object rows are wrapped under `"value"`
    pub fn with_table(self, name: impl Into<String>, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .map(|value| match value {
                Value::Object(map) => map,
                other => {
                    let mut map = Row::new();
                    map.insert("value".to_string(), other);
                    map
                }
            })
            .collect();
        self.tables
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((name.into(), rows));
        self
    }

    /// Make every call fail as unreachable
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    /// Number of calls served (including failed ones)
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), AdapterError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AdapterError::Unreachable(self.source_id.clone()));
        }
        Ok(())
    }
}

impl StoreAdapter for MemoryStoreAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn list_tables(&self) -> Result<Vec<TableStat>, AdapterError> {
        self.enter()?;
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        Ok(tables
            .iter()
            .map(|(name, rows)| TableStat {
                name: name.clone(),
                row_count: rows.len() as u64,
            })
            .collect())
    }

    fn preview_rows(&self, table: &str, limit: usize) -> Result<Vec<Row>, AdapterError> {
        self.enter()?;
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let (_, rows) = tables
            .iter()
            .find(|(name, _)| name == table)
            .ok_or_else(|| AdapterError::TableNotFound(table.to_string()))?;
        Ok(rows.iter().take(limit).cloned().collect())
    }

    fn search(&self, term: &str, limit: usize) -> Result<Vec<Row>, AdapterError> {
        self.enter()?;
        let needle = term.to_lowercase();
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        Ok(tables
            .iter()
            .flat_map(|(_, rows)| rows.iter())
            .filter(|row| {
                row.values().any(|v| match v {
                    Value::String(s) => s.to_lowercase().contains(&needle),
                    other => other.to_string() == needle,
                })
            })
            .take(limit)
            .cloned()
            .collect())
    }
}
