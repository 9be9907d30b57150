//! Audit log backends

use crate::AuditError;
use groundwork_domain::{AuditEntry, AuditLog};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite-backed append-only audit log
///
/// Each entry is stored as JSON text keyed by `query_id`. Triggers abort any
/// UPDATE or DELETE, so the log stays append-only even for other writers of
/// the same file.
///
/// # Examples
///
/// ```no_run
/// use groundwork_auditor::SqliteAuditLog;
///
/// let log = SqliteAuditLog::new("audit.db").unwrap();
/// ```
pub struct SqliteAuditLog {
    conn: Connection,
}

impl SqliteAuditLog {
    /// Open (or create) a log at `path`; `:memory:` works for tests
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, AuditError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    /// Number of stored entries
    pub fn len(&self) -> Result<usize, AuditError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM audit_entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> Result<bool, AuditError> {
        Ok(self.len()? == 0)
    }
}

impl AuditLog for SqliteAuditLog {
    type Error = AuditError;

    fn append(&mut self, entry: &AuditEntry) -> Result<(), Self::Error> {
        let exists: bool = self
            .conn
            .query_row(
                "SELECT 1 FROM audit_entries WHERE query_id = ?1",
                params![&entry.query_id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if exists {
            return Err(AuditError::Duplicate(entry.query_id.clone()));
        }

        let json = serde_json::to_string(entry)?;
        self.conn.execute(
            "INSERT INTO audit_entries (query_id, timestamp, defective, entry_json)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                &entry.query_id,
                entry.timestamp as i64,
                entry.is_defective(),
                &json,
            ],
        )?;

        Ok(())
    }

    fn load(&self, query_id: &str) -> Result<Option<AuditEntry>, Self::Error> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT entry_json FROM audit_entries WHERE query_id = ?1",
                params![query_id],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn load_all(&self) -> Result<Vec<AuditEntry>, Self::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT entry_json FROM audit_entries ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut entries = Vec::new();
        for json in rows {
            entries.push(serde_json::from_str(&json?)?);
        }
        Ok(entries)
    }
}

/// In-memory audit log for tests and embedded use
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Vec<AuditEntry>,
    unwritable: bool,
}

impl MemoryAuditLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// A log that rejects every write, for exercising persistence failures
    pub fn unwritable() -> Self {
        Self {
            entries: Vec::new(),
            unwritable: true,
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AuditLog for MemoryAuditLog {
    type Error = AuditError;

    fn append(&mut self, entry: &AuditEntry) -> Result<(), Self::Error> {
        if self.unwritable {
            return Err(AuditError::Unavailable("log is read-only".to_string()));
        }
        if self.entries.iter().any(|e| e.query_id == entry.query_id) {
            return Err(AuditError::Duplicate(entry.query_id.clone()));
        }
        self.entries.push(entry.clone());
        Ok(())
    }

    fn load(&self, query_id: &str) -> Result<Option<AuditEntry>, Self::Error> {
        Ok(self.entries.iter().find(|e| e.query_id == query_id).cloned())
    }

    fn load_all(&self) -> Result<Vec<AuditEntry>, Self::Error> {
        Ok(self.entries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwork_domain::{Defect, DefectType};

    fn entry(query_id: &str) -> AuditEntry {
        let mut entry = AuditEntry::new(query_id, "pump power", 1_700_000_000_000);
        entry.confidence = Some(0.1 + 0.2);
        entry
            .defects
            .push(Defect::new(DefectType::NoTraversal, "no traversal", 1_700_000_000_001));
        entry
    }

    #[test]
    fn test_sqlite_append_and_load() {
        let mut log = SqliteAuditLog::new(":memory:").unwrap();
        assert!(log.is_empty().unwrap());

        log.append(&entry("q-1")).unwrap();
        log.append(&entry("q-2")).unwrap();

        assert_eq!(log.len().unwrap(), 2);
        assert_eq!(log.load("q-1").unwrap().unwrap(), entry("q-1"));
        assert!(log.load("missing").unwrap().is_none());

        let ids: Vec<String> = log.load_all().unwrap().into_iter().map(|e| e.query_id).collect();
        assert_eq!(ids, vec!["q-1", "q-2"]);
    }

    #[test]
    fn test_sqlite_rejects_duplicates() {
        let mut log = SqliteAuditLog::new(":memory:").unwrap();
        log.append(&entry("q-1")).unwrap();
        assert!(matches!(log.append(&entry("q-1")), Err(AuditError::Duplicate(id)) if id == "q-1"));
    }

    #[test]
    fn test_sqlite_is_append_only() {
        let mut log = SqliteAuditLog::new(":memory:").unwrap();
        log.append(&entry("q-1")).unwrap();

        let update = log
            .conn
            .execute("UPDATE audit_entries SET entry_json = '{}' WHERE query_id = 'q-1'", []);
        assert!(update.is_err());

        let delete = log.conn.execute("DELETE FROM audit_entries", []);
        assert!(delete.is_err());

        assert_eq!(log.load("q-1").unwrap().unwrap(), entry("q-1"));
    }

    #[test]
    fn test_memory_log() {
        let mut log = MemoryAuditLog::new();
        log.append(&entry("q-1")).unwrap();
        assert!(matches!(log.append(&entry("q-1")), Err(AuditError::Duplicate(_))));
        assert_eq!(log.len(), 1);
        assert_eq!(log.load_all().unwrap()[0], entry("q-1"));

        let mut broken = MemoryAuditLog::unwritable();
        assert!(matches!(broken.append(&entry("q-1")), Err(AuditError::Unavailable(_))));
        assert!(broken.is_empty());
    }
}
