// src/types/mod.rs - Shared types for the spam filter core

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Canonical form -> ordered alternates. The first alternate is the preferred one.
pub type EquivalenceTable = BTreeMap<String, Vec<String>>;

/// Errors returned by pattern and character-map mutations.
///
/// None of these are fatal: the filter state is left untouched whenever one
/// is returned.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Empty or whitespace-only argument
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Alternate already registered for this canonical form
    #[error("'{alternate}' is already mapped to '{canonical}'")]
    DuplicateEntry { canonical: String, alternate: String },

    /// Removal target does not exist
    #[error("not found: {0}")]
    UnknownEntry(String),

    /// Fragment rejected by the regex compiler, alone or combined with the rest
    #[error("malformed pattern '{pattern}': {source}")]
    MalformedPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl FilterError {
    pub fn malformed(pattern: &str, source: regex::Error) -> Self {
        FilterError::MalformedPattern {
            pattern: pattern.to_string(),
            source,
        }
    }
}

/// Forces an ambiguous alternate to resolve to one canonical form by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguityOverride {
    pub alternate: String,
    pub canonical: String,
}

impl AmbiguityOverride {
    pub fn new(alternate: &str, canonical: &str) -> Self {
        Self {
            alternate: alternate.to_string(),
            canonical: canonical.to_string(),
        }
    }
}

/// Point-in-time counters describing the published filter state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterStats {
    pub patterns: usize,
    pub canonical_forms: usize,
    pub alternates: usize,
    pub ambiguous_alternates: usize,
    pub matcher_active: bool,
    pub built_at: chrono::DateTime<chrono::Utc>,
}

/// Result of checking one message, with enough detail for moderators to
/// understand why it was flagged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpamVerdict {
    pub is_spam: bool,
    pub normalized: String,
    pub candidates: Vec<String>,
    pub matched_patterns: Vec<String>,
}
