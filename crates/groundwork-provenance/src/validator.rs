//! Final checks before a payload or response leaves the subsystem

use groundwork_domain::provenance::{
    KEY_DATA_SOURCE, KEY_INTEGRATION_STATUS, MANDATORY_KEYS, UNKNOWN_SOURCE,
};
use groundwork_domain::{IntegrationStatus, Payload, ResponseProvenance};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reason given for payloads whose origin cannot be traced
pub const UNKNOWN_SOURCE_REASON: &str = "Data source is unknown — cannot verify origin";

/// Result of a provenance check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceCheck {
    /// Whether the value may be transmitted
    pub valid: bool,
    /// Why not; empty when valid
    pub reason: String,
}

impl ProvenanceCheck {
    /// A passing check
    pub fn ok() -> Self {
        Self {
            valid: true,
            reason: String::new(),
        }
    }

    /// A failing check
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
        }
    }
}

/// Check a stamped payload
///
/// Fails when a mandatory marker is missing, or when the origin is the
/// unknown placeholder or an unregistered source.
pub fn validate_payload(data: &Payload) -> ProvenanceCheck {
    let missing: Vec<&str> = MANDATORY_KEYS
        .iter()
        .copied()
        .filter(|key| !data.contains_key(key))
        .collect();
    if !missing.is_empty() {
        return ProvenanceCheck::fail(format!(
            "Missing provenance marker(s): {}",
            missing.join(", ")
        ));
    }

    let source = data.get(KEY_DATA_SOURCE).and_then(Value::as_str);
    let status = data.get(KEY_INTEGRATION_STATUS).and_then(Value::as_str);
    if source == Some(UNKNOWN_SOURCE) || status == Some(IntegrationStatus::Unknown.as_str()) {
        return ProvenanceCheck::fail(UNKNOWN_SOURCE_REASON);
    }

    ProvenanceCheck::ok()
}

/// Check a response envelope; a failing response must not be sent
pub fn validate_response(provenance: &ResponseProvenance) -> ProvenanceCheck {
    if provenance.derived_from.is_empty() {
        return ProvenanceCheck::fail("Response has no source in derived_from");
    }
    if !provenance.safe_to_answer {
        return ProvenanceCheck::fail("Response is not safe to answer from its sources");
    }
    ProvenanceCheck::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwork_domain::provenance::KEY_SAFE_TO_ANSWER;
    use groundwork_domain::{ProvenanceMarker, ResolutionOutcome};
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn marker(data_source: &str, status: IntegrationStatus) -> ProvenanceMarker {
        ProvenanceMarker {
            data_source: data_source.to_string(),
            integration_status: status,
            authoritative: true,
            traversal_id: None,
            synthetic: false,
            safe_to_answer: true,
        }
    }

    fn response(derived_from: Vec<String>, safe_to_answer: bool) -> ResponseProvenance {
        ResponseProvenance {
            derived_from,
            traversal_log: Vec::new(),
            resolution_outcome: ResolutionOutcome::Resolved,
            demo_warnings: Vec::new(),
            data_sources_used: BTreeSet::new(),
            all_authoritative: true,
            safe_to_answer,
        }
    }

    #[test]
    fn test_valid_payload() {
        let stamped = Payload::new().with_provenance(&marker("pg.equipment", IntegrationStatus::Real));
        assert_eq!(validate_payload(&stamped), ProvenanceCheck::ok());
    }

    #[test]
    fn test_missing_markers() {
        let check = validate_payload(&Payload::from_value(json!({"device": "pump_1"})));
        assert!(!check.valid);
        assert!(check.reason.contains(KEY_DATA_SOURCE));
        assert!(check.reason.contains(KEY_SAFE_TO_ANSWER));

        let mut map = Payload::new()
            .with_provenance(&marker("pg.equipment", IntegrationStatus::Real))
            .as_map()
            .clone();
        map.remove(KEY_SAFE_TO_ANSWER);
        let check = validate_payload(&Payload::from(map));
        assert_eq!(check.reason, "Missing provenance marker(s): _safe_to_answer");
    }

    #[test]
    fn test_unknown_source_rejected() {
        let placeholder = Payload::new().with_provenance(&marker(UNKNOWN_SOURCE, IntegrationStatus::Unknown));
        assert_eq!(validate_payload(&placeholder), ProvenanceCheck::fail(UNKNOWN_SOURCE_REASON));

        let unregistered = Payload::new().with_provenance(&marker("api.unknown_source", IntegrationStatus::Unknown));
        assert_eq!(validate_payload(&unregistered).reason, UNKNOWN_SOURCE_REASON);
    }

    #[test]
    fn test_validate_response() {
        assert!(!validate_response(&response(vec![], false)).valid);
        assert!(!validate_response(&response(vec!["pg.equipment".into()], false)).valid);
        assert_eq!(
            validate_response(&response(vec!["pg.equipment".into()], true)),
            ProvenanceCheck::ok()
        );
    }

    proptest! {
        #[test]
        fn prop_empty_derived_from_always_invalid(safe: bool) {
            prop_assert!(!validate_response(&response(vec![], safe)).valid);
        }

        #[test]
        fn prop_non_empty_and_safe_is_valid(ids in prop::collection::vec("[a-z]{2,6}\\.[a-z]{2,8}", 1..4)) {
            let check = validate_response(&response(ids, true));
            prop_assert!(check.valid);
            prop_assert_eq!(check.reason, "");
        }
    }
}
