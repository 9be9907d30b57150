//! Integration tests for groundwork-auditor
//!
//! These tests verify that finalized entries survive a round-trip through an
//! on-disk SQLite log unchanged.

use groundwork_auditor::{AuditorConfig, GroundingAuditor, SqliteAuditLog};
use groundwork_domain::{
    DefectType, ResolutionOutcome, SourceResolution, TraversalAction, TraversalContext,
    TraversalStep,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tempfile::TempDir;

fn resolution() -> SourceResolution {
    SourceResolution {
        outcome: ResolutionOutcome::Unresolved,
        primary_source: Some("pg.equipment".to_string()),
        secondary_sources: vec!["vec.manuals".to_string()],
        domains_resolved: BTreeMap::from([
            ("industrial".to_string(), "pg.equipment".to_string()),
            ("documents".to_string(), "vec.manuals".to_string()),
        ]),
        domains_unresolved: vec!["weather".to_string()],
        demo_warnings: vec!["Domain 'documents' is served by demo source 'vec.manuals'".to_string()],
    }
}

fn traversal() -> TraversalContext {
    let mut context = TraversalContext::new();
    context.record(
        TraversalStep {
            action: TraversalAction::PreviewRows,
            source_id: "vec.manuals".to_string(),
            params: json!({"table": "manuals", "limit": 5}),
            result: json!({"rows": 3, "ratio": 0.1 + 0.2}),
            timestamp: 1_700_000_000_123,
            duration: Duration::new(0, 1_234_567),
        },
        true,
    );
    context.record(
        TraversalStep {
            action: TraversalAction::VerifyDataOrigin,
            source_id: "pg.equipment".to_string(),
            params: json!({"claimed_source_id": "pg.equipment", "claimed_keys": ["power_kw"]}),
            result: json!({"verified": false}),
            timestamp: 1_700_000_000_456,
            duration: Duration::from_nanos(987),
        },
        false,
    );
    context
}

#[test]
fn test_finalized_entry_round_trips_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.db");

    let finalized = {
        let auditor = GroundingAuditor::new(SqliteAuditLog::new(&path).unwrap(), AuditorConfig::default());
        let mut entry = auditor.start_entry("q-42", "Show pump power next to the manual");
        auditor.record_resolution(&mut entry, &resolution());
        auditor.record_traversal(&mut entry, &traversal());
        auditor.record_response(&mut entry, "dashboard", 3, Some(0.1 + 0.7));
        auditor.record_data_origin(&mut entry, "pg.equipment", false, true);

        let finalized = auditor.finalize_entry(entry);
        assert!(finalized.is_persisted());
        finalized
    };

    let entry = &finalized.entry;
    assert!(entry.has_defect(DefectType::UnresolvedDomain));
    assert!(entry.has_defect(DefectType::DemoDataUsed));
    assert!(entry.has_defect(DefectType::UnverifiedDataOrigin));
    assert!(entry.has_defect(DefectType::SyntheticDataUsed));
    assert!(!entry.has_defect(DefectType::NoTraversal));

    // reopen the file with a fresh auditor
    let auditor = GroundingAuditor::new(SqliteAuditLog::new(&path).unwrap(), AuditorConfig::default());
    let reloaded = auditor.load_entry("q-42").unwrap().expect("entry should be persisted");
    assert_eq!(reloaded, **entry);
    assert_eq!(reloaded.confidence, Some(0.1 + 0.7));
    assert_eq!(reloaded.traversal_duration, entry.traversal_duration);
}

#[test]
fn test_log_keeps_entries_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.db");

    {
        let auditor = GroundingAuditor::new(SqliteAuditLog::new(&path).unwrap(), AuditorConfig::default());
        for i in 0..3 {
            let mut entry = auditor.start_entry(format!("q-{}", i), "");
            auditor.record_response(&mut entry, "greeting", 0, None);
            auditor.finalize_entry(entry);
        }
    }

    let auditor = GroundingAuditor::new(SqliteAuditLog::new(&path).unwrap(), AuditorConfig::default());
    let ids: Vec<String> = auditor
        .load_all_entries()
        .unwrap()
        .into_iter()
        .map(|e| e.query_id)
        .collect();
    assert_eq!(ids, vec!["q-0", "q-1", "q-2"]);

    // a second finalize with a known id is rejected by the log
    let duplicate = auditor.finalize_entry(auditor.start_entry("q-1", "again"));
    assert!(!duplicate.is_persisted());
    assert_eq!(auditor.load_entry("q-1").unwrap().unwrap().transcript, "");
    assert_eq!(auditor.get_defect_summary().total_entries, 0);
    assert!(auditor.recent_entries().is_empty());
}

#[test]
fn test_non_finite_confidence_round_trips() {
    let dir = TempDir::new().unwrap();
    let auditor = GroundingAuditor::new(
        SqliteAuditLog::new(dir.path().join("audit.db")).unwrap(),
        AuditorConfig::default(),
    );

    for (id, confidence) in [("q-inf", f64::INFINITY), ("q-nan", f64::NAN)] {
        let mut entry = auditor.start_entry(id, "");
        auditor.record_response(&mut entry, "greeting", 0, Some(confidence));
        let finalized = auditor.finalize_entry(entry);
        assert!(finalized.is_persisted());

        let reloaded = auditor.load_entry(id).unwrap().unwrap();
        assert_eq!(reloaded, *finalized.entry);
        assert_eq!(reloaded.confidence, None);
    }
}
