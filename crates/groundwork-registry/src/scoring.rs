//! Keyword scoring of registered tables against a free-text description.
//!
//! Pure functions over the registry snapshot; no store I/O.

use groundwork_domain::{DataSource, TableSchema};
use serde::{Deserialize, Serialize};

/// Points for a token found in the table name
pub const NAME_WEIGHT: u32 = 3;
/// Points for a token found in the table description
pub const DESCRIPTION_WEIGHT: u32 = 2;
/// Points for a token found in a column name
pub const COLUMN_WEIGHT: u32 = 1;
/// Points for a column unit appearing verbatim in the description
pub const UNIT_WEIGHT: u32 = 2;
/// Reasons kept per match
pub const MAX_REASONS: usize = 5;

const MIN_TOKEN_LEN: usize = 2;

/// Tokens shorter than this only match whole words, not substrings
const SUBSTRING_MIN_LEN: usize = 3;

/// A table that matched a description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMatch {
    /// Owning source id
    pub source_id: String,
    /// Owning source name
    pub source_name: String,
    /// Table name
    pub table: String,
    /// Total score
    pub score: u32,
    /// Up to five human-readable reasons
    pub reasons: Vec<String>,
    /// Whether the owning source is demo or stub
    pub is_demo: bool,
}

/// Score and reasons for one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableScore {
    /// Total score
    pub score: u32,
    /// Every reason, in scoring order
    pub reasons: Vec<String>,
}

/// Split text into lower-case search tokens
///
/// Splits on anything but alphanumerics and `_`, drops single characters
/// and repeats, and keeps first-seen order. Two-letter tokens such as unit
/// abbreviations ("kw", "hz") are kept; see [`score_table`] for how they match.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for raw in text
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
    {
        if raw.chars().count() >= MIN_TOKEN_LEN && !tokens.iter().any(|t| t == raw) {
            tokens.push(raw.to_string());
        }
    }
    tokens
}

/// Score one table
///
/// `description` is the untokenized text, used for the literal unit check.
/// Tokens of three or more characters match anywhere in a name or
/// description; shorter ones must equal a whole word, where `power_kw`
/// splits into `power` and `kw`.
pub fn score_table(tokens: &[String], description: &str, table: &TableSchema) -> TableScore {
    let mut result = TableScore::default();
    let name = table.name.to_lowercase();
    let table_description = table.description.to_lowercase();

    for token in tokens {
        if token_matches(&name, token) {
            result.score += NAME_WEIGHT;
            result.reasons.push(format!("table name contains '{}'", token));
        }
        if token_matches(&table_description, token) {
            result.score += DESCRIPTION_WEIGHT;
            result.reasons.push(format!("table description mentions '{}'", token));
        }
    }

    for column in &table.columns {
        let column_name = column.name.to_lowercase();
        for token in tokens {
            if token_matches(&column_name, token) {
                result.score += COLUMN_WEIGHT;
                result
                    .reasons
                    .push(format!("column '{}' matches '{}'", column.name, token));
            }
        }
        if let Some(unit) = column.unit.as_deref().filter(|u| !u.is_empty()) {
            if description.contains(unit) {
                result.score += UNIT_WEIGHT;
                result
                    .reasons
                    .push(format!("column '{}' has unit '{}'", column.name, unit));
            }
        }
    }

    result
}

fn token_matches(haystack: &str, token: &str) -> bool {
    if token.chars().count() >= SUBSTRING_MIN_LEN {
        haystack.contains(token)
    } else {
        haystack
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == token)
    }
}

/// Score every table of every source, best first
///
/// Only tables with a positive score are returned. Equal scores keep
/// declaration order.
pub fn rank_tables(description: &str, sources: &[DataSource]) -> Vec<TableMatch> {
    let tokens = tokenize(description);
    let mut matches: Vec<TableMatch> = sources
        .iter()
        .flat_map(|source| {
            let tokens = &tokens;
            source.tables.iter().filter_map(move |table| {
                let scored = score_table(tokens, description, table);
                (scored.score > 0).then(|| TableMatch {
                    source_id: source.id.clone(),
                    source_name: source.name.clone(),
                    table: table.name.clone(),
                    score: scored.score,
                    reasons: scored.reasons.into_iter().take(MAX_REASONS).collect(),
                    is_demo: source.integration_status.is_demo(),
                })
            })
        })
        .collect();

    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}
