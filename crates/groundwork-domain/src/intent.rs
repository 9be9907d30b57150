//! Parsed query intent handed over by the intent parser

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entities extracted from the query text
///
/// All fields default to empty; the parser only fills what it found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    /// Device / equipment identifiers mentioned in the query
    #[serde(default)]
    pub devices: Vec<String>,

    /// Time expression (e.g. "last 24 hours"), if any
    #[serde(default)]
    pub time: Option<String>,

    /// Any other parser-specific entity groups
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Entities {
    /// True when the parser extracted nothing
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty() && self.time.is_none() && self.extra.is_empty()
    }
}

/// A parsed natural-language query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    /// Intent classification (e.g. "query", "greeting")
    pub intent_type: String,

    /// Data domains the query touches (e.g. "industrial", "alerts")
    #[serde(default)]
    pub domains: Vec<String>,

    /// Extracted entities
    #[serde(default)]
    pub entities: Entities,

    /// Original query text
    #[serde(default)]
    pub raw_text: String,
}

impl QueryIntent {
    /// Create an intent with no entities
    pub fn new<D, S>(intent_type: impl Into<String>, domains: D, raw_text: impl Into<String>) -> Self
    where
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            intent_type: intent_type.into(),
            domains: domains.into_iter().map(Into::into).collect(),
            entities: Entities::default(),
            raw_text: raw_text.into(),
        }
    }

    /// Attach extracted entities
    pub fn with_entities(mut self, entities: Entities) -> Self {
        self.entities = entities;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let intent: QueryIntent =
            serde_json::from_str(r#"{"intent_type": "greeting"}"#).unwrap();
        assert!(intent.domains.is_empty());
        assert!(intent.entities.is_empty());
        assert_eq!(intent.raw_text, "");
    }

    #[test]
    fn test_extra_entities_flatten() {
        let intent: QueryIntent = serde_json::from_str(
            r#"{
                "intent_type": "query",
                "domains": ["industrial"],
                "entities": {"devices": ["pump_1"], "metric": "power"},
                "raw_text": "power of pump 1"
            }"#,
        )
        .unwrap();
        assert_eq!(intent.entities.devices, vec!["pump_1"]);
        assert_eq!(intent.entities.extra["metric"], "power");
    }
}
