//! Data source catalog types
//!
//! A [`DataSource`] is declared once at startup and never removed. Only the
//! `row_count` of its tables changes at runtime, and only through the
//! introspector.

use serde::{Deserialize, Serialize};

/// Kind of physical store behind a data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Relational database (tables with rows)
    Relational,

    /// Vector / document store (collections with documents)
    Vector,

    /// Time-series store
    Timeseries,

    /// Third-party HTTP API
    ExternalApi,
}

impl SourceType {
    /// Get the source type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Relational => "relational",
            SourceType::Vector => "vector",
            SourceType::Timeseries => "timeseries",
            SourceType::ExternalApi => "external_api",
        }
    }

    /// Parse a source type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relational" => Some(SourceType::Relational),
            "vector" => Some(SourceType::Vector),
            "timeseries" => Some(SourceType::Timeseries),
            "external_api" => Some(SourceType::ExternalApi),
            _ => None,
        }
    }
}

/// How real the data behind a source is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    /// Connected to production data
    Real,

    /// Returns demonstration data
    Demo,

    /// Placeholder returning canned values
    Stub,

    /// Mix of real and demonstration data
    Hybrid,

    /// Source is not registered (only ever derived, never declared)
    Unknown,
}

impl IntegrationStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationStatus::Real => "real",
            IntegrationStatus::Demo => "demo",
            IntegrationStatus::Stub => "stub",
            IntegrationStatus::Hybrid => "hybrid",
            IntegrationStatus::Unknown => "unknown",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "real" => Some(IntegrationStatus::Real),
            "demo" => Some(IntegrationStatus::Demo),
            "stub" => Some(IntegrationStatus::Stub),
            "hybrid" => Some(IntegrationStatus::Hybrid),
            "unknown" => Some(IntegrationStatus::Unknown),
            _ => None,
        }
    }

    /// True for demo and stub sources
    pub fn is_demo(&self) -> bool {
        matches!(self, IntegrationStatus::Demo | IntegrationStatus::Stub)
    }

    /// True for any status whose answers must carry a demo warning
    pub fn needs_warning(&self) -> bool {
        matches!(
            self,
            IntegrationStatus::Demo | IntegrationStatus::Stub | IntegrationStatus::Hybrid
        )
    }
}

impl std::fmt::Display for IntegrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column of a registered table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name
    pub name: String,

    /// Declared storage type (e.g. "float", "timestamp")
    #[serde(rename = "type")]
    pub column_type: String,

    /// Whether the column may be null
    #[serde(default)]
    pub nullable: bool,

    /// Whether the column is indexed
    #[serde(default)]
    pub indexed: bool,

    /// Physical unit (e.g. "kW", "°C"), if any
    #[serde(default)]
    pub unit: Option<String>,

    /// Free-text description
    #[serde(default)]
    pub description: String,
}

impl ColumnSchema {
    /// Create a column with the given name and type
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            nullable: false,
            indexed: false,
            unit: None,
            description: String::new(),
        }
    }

    /// Attach a physical unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A table (or collection / measurement) owned by a data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name, as known to the physical store
    pub name: String,

    /// Free-text description
    #[serde(default)]
    pub description: String,

    /// Primary key column, if any
    #[serde(default)]
    pub primary_key: Option<String>,

    /// Last known row / document count (refreshed by introspection)
    #[serde(default)]
    pub row_count: u64,

    /// Declared columns
    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Create an empty table with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            primary_key: None,
            row_count: 0,
            columns: Vec::new(),
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a column
    pub fn with_column(mut self, column: ColumnSchema) -> Self {
        self.columns.push(column);
        self
    }
}

/// A registered data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    /// Globally unique identifier (e.g. "postgres.equipment")
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Kind of store
    pub source_type: SourceType,

    /// Whether the data is real, demo or stub
    pub integration_status: IntegrationStatus,

    /// Domains this source can serve
    #[serde(default)]
    pub domains: Vec<String>,

    /// Domains this source is the trusted ground truth for
    #[serde(default)]
    pub authoritative_for: Vec<String>,

    /// Tie-break between sources authoritative for the same domain
    #[serde(default)]
    pub priority: i32,

    /// Declared tables, in declaration order
    #[serde(default)]
    pub tables: Vec<TableSchema>,
}

impl DataSource {
    /// Create a source with no domains and no tables
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source_type: SourceType,
        integration_status: IntegrationStatus,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_type,
            integration_status,
            domains: Vec::new(),
            authoritative_for: Vec::new(),
            priority: 0,
            tables: Vec::new(),
        }
    }

    /// Declare this source authoritative for a domain (implies it serves it)
    pub fn authoritative(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        if !self.domains.contains(&domain) {
            self.domains.push(domain.clone());
        }
        if !self.authoritative_for.contains(&domain) {
            self.authoritative_for.push(domain);
        }
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Add a table
    pub fn with_table(mut self, table: TableSchema) -> Self {
        self.tables.push(table);
        self
    }

    /// Whether this source is the trusted source for `domain`
    pub fn is_authoritative_for(&self, domain: &str) -> bool {
        self.authoritative_for.iter().any(|d| d == domain)
    }

    /// Look up a declared table by name
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_demo_classification() {
        assert!(IntegrationStatus::Demo.is_demo());
        assert!(IntegrationStatus::Stub.is_demo());
        assert!(!IntegrationStatus::Hybrid.is_demo());
        assert!(!IntegrationStatus::Real.is_demo());

        assert!(IntegrationStatus::Hybrid.needs_warning());
        assert!(!IntegrationStatus::Real.needs_warning());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(IntegrationStatus::parse("STUB"), Some(IntegrationStatus::Stub));
        assert_eq!(IntegrationStatus::parse("nope"), None);
        assert_eq!(SourceType::parse("external_api"), Some(SourceType::ExternalApi));
    }

    #[test]
    fn test_authoritative_builder() {
        let source = DataSource::new(
            "pg.equipment",
            "Equipment DB",
            SourceType::Relational,
            IntegrationStatus::Real,
        )
        .authoritative("industrial")
        .authoritative("industrial");

        assert_eq!(source.domains, vec!["industrial"]);
        assert_eq!(source.authoritative_for, vec!["industrial"]);
        assert!(source.is_authoritative_for("industrial"));
        assert!(!source.is_authoritative_for("alerts"));
    }

    #[test]
    fn test_column_type_serializes_as_type() {
        let column = ColumnSchema::new("power", "float").with_unit("kW");
        let json = serde_json::to_value(&column).unwrap();
        assert_eq!(json["type"], "float");
        assert_eq!(json["unit"], "kW");
    }
}
