//! Integration tests for the registry and introspector

use groundwork_domain::{IntegrationStatus, StoreAdapter};
use groundwork_registry::{
    IntrospectionConfig, IntrospectionWorker, MemoryStoreAdapter, RegistryConfig,
    SchemaIntrospector, SourceRegistry,
};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

const CATALOG: &str = r#"
[[sources]]
id = "pg.equipment"
name = "Equipment DB"
source_type = "relational"
integration_status = "real"
domains = ["industrial", "energy"]
authoritative_for = ["industrial"]
priority = 10

[[sources.tables]]
name = "equipment_readings"
description = "Power and temperature readings per device"
primary_key = "id"

[[sources.tables.columns]]
name = "power_kw"
type = "float"
unit = "kW"

[[sources]]
id = "ts.telemetry"
name = "Telemetry"
source_type = "timeseries"
integration_status = "stub"
domains = ["telemetry"]
authoritative_for = ["telemetry"]

[[sources.tables]]
name = "vibration"
"#;

/// Helper to load the registry from a TOML file on disk
fn load_registry() -> Arc<SourceRegistry> {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CATALOG.as_bytes()).unwrap();

    let config = RegistryConfig::from_file(file.path()).unwrap();
    Arc::new(SourceRegistry::from_config(config).unwrap())
}

fn adapters() -> (MemoryStoreAdapter, MemoryStoreAdapter) {
    let pg = MemoryStoreAdapter::new("pg.equipment").with_table(
        "equipment_readings",
        vec![
            json!({"device": "pump_1", "power_kw": 4.2}),
            json!({"device": "pump_2", "power_kw": 3.1}),
            json!({"device": "fan_7", "power_kw": 0.4}),
        ],
    );
    let ts = MemoryStoreAdapter::new("ts.telemetry")
        .with_table("vibration", vec![json!({"device": "pump_1", "hz": 49.8})]);
    (pg, ts)
}

#[test]
fn test_catalog_from_file() {
    let registry = load_registry();

    assert_eq!(registry.source_count(), 2);
    assert_eq!(
        registry.sources_for_domain("industrial")[0].id,
        "pg.equipment"
    );
    assert!(registry.is_demo_source("ts.telemetry"));
    assert_eq!(
        registry.integration_status("mongo.missing"),
        IntegrationStatus::Unknown
    );

    let (_, table) = registry.find_table("equipment_readings").unwrap();
    assert_eq!(table.columns[0].unit.as_deref(), Some("kW"));
}

#[test]
fn test_introspection_cycle_end_to_end() {
    let registry = load_registry();
    let (pg, ts) = adapters();
    let stores: Vec<Arc<dyn StoreAdapter>> = vec![Arc::new(pg.clone()), Arc::new(ts)];
    let introspector = SchemaIntrospector::new(registry, stores, IntrospectionConfig::default());

    let report = introspector.introspect_all();
    assert!(!report.is_partial());

    let dbs = introspector.list_databases();
    assert_eq!(dbs[0].total_rows, 3);
    assert_eq!(dbs[1].total_rows, 1);

    // a later failure keeps the last known counts
    pg.set_failing(true);
    let report = introspector.introspect_all();
    assert_eq!(report.failed_stores(), vec!["pg.equipment"]);
    assert_eq!(introspector.list_databases()[0].total_rows, 3);

    let ranked = introspector.find_table_for_data("power in kW");
    assert_eq!(ranked[0].table, "equipment_readings");
}

#[tokio::test]
async fn test_probe_and_worker() {
    let registry = load_registry();
    let (pg, ts) = adapters();
    ts.set_latency(Duration::from_millis(400));
    let stores: Vec<Arc<dyn StoreAdapter>> = vec![Arc::new(pg), Arc::new(ts)];
    let config = IntrospectionConfig {
        probe_timeout_ms: 50,
        ..Default::default()
    };
    let introspector = Arc::new(SchemaIntrospector::new(registry, stores, config));

    let probe = introspector.probe(&["pump_1".to_string()]).await;
    assert_eq!(probe.attempted, 2);
    assert_eq!(probe.dropped, 1);
    assert_eq!(probe.sources_hit(), vec!["pg.equipment"]);

    let mut worker = IntrospectionWorker::with_interval(introspector, Duration::from_millis(1));
    worker.run_cycles(1).await;
    assert_eq!(worker.cycles(), 1);
    assert_eq!(worker.last_report().unwrap().tables_updated(), 2);
}
