//! Provenance markers for data payloads and responses

use crate::resolution::ResolutionOutcome;
use crate::source::IntegrationStatus;
use crate::traversal::TraversalStep;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Payload key holding the origin source id
pub const KEY_DATA_SOURCE: &str = "_data_source";
/// Payload key holding the origin integration status
pub const KEY_INTEGRATION_STATUS: &str = "_integration_status";
/// Payload key holding the authoritative flag
pub const KEY_AUTHORITATIVE: &str = "_authoritative";
/// Payload key holding the traversal id
pub const KEY_TRAVERSAL_ID: &str = "_traversal_id";
/// Payload key holding the synthetic flag
pub const KEY_SYNTHETIC: &str = "_synthetic";
/// Payload key holding the safe-to-answer flag
pub const KEY_SAFE_TO_ANSWER: &str = "_safe_to_answer";

/// Marker keys every stamped payload must carry
pub const MANDATORY_KEYS: [&str; 3] = [KEY_DATA_SOURCE, KEY_INTEGRATION_STATUS, KEY_SAFE_TO_ANSWER];

/// Source id written for payloads whose origin is not registered
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Origin metadata attached to one data payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceMarker {
    /// Source id the data came from
    pub data_source: String,

    /// Integration status of that source
    pub integration_status: IntegrationStatus,

    /// Whether the source is authoritative for the query's domain
    pub authoritative: bool,

    /// Traversal the data was fetched under, if any
    pub traversal_id: Option<String>,

    /// Whether the values were synthesized rather than read
    pub synthetic: bool,

    /// Whether an answer may be built from this payload
    pub safe_to_answer: bool,
}

/// A JSON object flowing from a store adapter towards a response
///
/// Stamping never mutates a payload in place; [`Payload::with_provenance`]
/// returns a new value so shared payloads cannot alias each other's markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Create an empty payload
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON value; non-object values are stored under `"value"`
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Self(map)
            }
        }
    }

    /// Get a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether a field is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Borrow the underlying object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Return a copy of this payload with the marker fields written in
    ///
    /// Existing non-marker fields are kept untouched.
    pub fn with_provenance(&self, marker: &ProvenanceMarker) -> Self {
        let mut map = self.0.clone();
        map.insert(KEY_DATA_SOURCE.to_string(), Value::from(marker.data_source.clone()));
        map.insert(
            KEY_INTEGRATION_STATUS.to_string(),
            Value::from(marker.integration_status.as_str()),
        );
        map.insert(KEY_AUTHORITATIVE.to_string(), Value::from(marker.authoritative));
        map.insert(
            KEY_TRAVERSAL_ID.to_string(),
            marker.traversal_id.clone().map(Value::from).unwrap_or(Value::Null),
        );
        map.insert(KEY_SYNTHETIC.to_string(), Value::from(marker.synthetic));
        map.insert(KEY_SAFE_TO_ANSWER.to_string(), Value::from(marker.safe_to_answer));
        Self(map)
    }

    /// Source id named by the payload, read from `_data_source` alone
    ///
    /// Unlike [`Payload::marker`] this does not need the other marker fields.
    pub fn data_source(&self) -> Option<&str> {
        self.get(KEY_DATA_SOURCE)?.as_str()
    }

    /// Whether the payload is flagged `_synthetic`
    pub fn is_synthetic(&self) -> bool {
        self.get(KEY_SYNTHETIC).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Read the marker back, if all marker fields are present and well-typed
    pub fn marker(&self) -> Option<ProvenanceMarker> {
        Some(ProvenanceMarker {
            data_source: self.get(KEY_DATA_SOURCE)?.as_str()?.to_string(),
            integration_status: IntegrationStatus::parse(
                self.get(KEY_INTEGRATION_STATUS)?.as_str()?,
            )?,
            authoritative: self.get(KEY_AUTHORITATIVE)?.as_bool()?,
            traversal_id: self.get(KEY_TRAVERSAL_ID)?.as_str().map(str::to_string),
            synthetic: self.get(KEY_SYNTHETIC)?.as_bool()?,
            safe_to_answer: self.get(KEY_SAFE_TO_ANSWER)?.as_bool()?,
        })
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Response-level provenance envelope
///
/// Built once per response and validated before the response leaves the
/// subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseProvenance {
    /// Sources the response content was built from (primary first)
    pub derived_from: Vec<String>,

    /// Copy of the traversal log
    pub traversal_log: Vec<TraversalStep>,

    /// Outcome of source resolution
    pub resolution_outcome: ResolutionOutcome,

    /// Demo warnings carried over from resolution
    pub demo_warnings: Vec<String>,

    /// Every non-infrastructure source touched
    pub data_sources_used: BTreeSet<String>,

    /// True when none of `data_sources_used` is a demo or stub source
    pub all_authoritative: bool,

    /// True when `derived_from` is non-empty
    pub safe_to_answer: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn marker() -> ProvenanceMarker {
        ProvenanceMarker {
            data_source: "pg.equipment".to_string(),
            integration_status: IntegrationStatus::Real,
            authoritative: true,
            traversal_id: Some("t-1".to_string()),
            synthetic: false,
            safe_to_answer: true,
        }
    }

    #[test]
    fn test_with_provenance_keeps_fields_and_original() {
        let original = Payload::from_value(json!({"power": 42.5, "unit": "kW"}));
        let stamped = original.with_provenance(&marker());

        assert_eq!(stamped.get("power"), Some(&json!(42.5)));
        assert_eq!(stamped.get(KEY_DATA_SOURCE), Some(&json!("pg.equipment")));
        assert!(!original.contains_key(KEY_DATA_SOURCE));
        assert_eq!(stamped.marker(), Some(marker()));
    }

    #[test]
    fn test_marker_missing_when_unstamped() {
        assert_eq!(Payload::new().marker(), None);
    }

    #[test]
    fn test_data_source_without_full_marker() {
        let partial = Payload::from_value(json!({
            "_data_source": "ts.telemetry",
            "_integration_status": "stub",
            "_safe_to_answer": false
        }));
        assert_eq!(partial.marker(), None);
        assert_eq!(partial.data_source(), Some("ts.telemetry"));
        assert!(!partial.is_synthetic());
    }

    #[test]
    fn test_non_object_value_is_wrapped() {
        let payload = Payload::from_value(json!([1, 2, 3]));
        assert_eq!(payload.get("value"), Some(&json!([1, 2, 3])));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: stamping never drops or alters pre-existing data fields
        #[test]
        fn test_stamping_preserves_fields(
            fields in proptest::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..8),
            synthetic: bool,
            safe: bool,
        ) {
            let mut map = Map::new();
            for (k, v) in &fields {
                map.insert(k.clone(), Value::from(*v));
            }
            let payload = Payload::from(map);
            let marker = ProvenanceMarker {
                data_source: "ts.telemetry".to_string(),
                integration_status: IntegrationStatus::Hybrid,
                authoritative: false,
                traversal_id: None,
                synthetic,
                safe_to_answer: safe,
            };

            let stamped = payload.with_provenance(&marker);
            for (k, v) in &fields {
                prop_assert_eq!(stamped.get(k), Some(&Value::from(*v)));
            }
            prop_assert_eq!(stamped.marker(), Some(marker));
        }
    }
}
