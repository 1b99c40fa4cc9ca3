use log::{debug, error};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;

use crate::types::FilterError;

/// Compile one fragment the way it will be used inside the combined matcher.
pub fn compile_fragment(pattern: &str) -> Result<Regex, FilterError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| FilterError::malformed(pattern, e))
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    source: String,
    regex: Regex,
}

/// Disjunction of every stored fragment, plus each fragment on its own for
/// diagnostics.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    combined: Regex,
    patterns: Vec<CompiledPattern>,
}

impl PatternMatcher {
    /// `Ok(None)` for an empty pattern set: nothing can match.
    pub fn build<'a, I>(patterns: I) -> Result<Option<Self>, FilterError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut compiled = Vec::new();
        for source in patterns {
            compiled.push(CompiledPattern {
                source: source.clone(),
                regex: compile_fragment(source)?,
            });
        }
        if compiled.is_empty() {
            return Ok(None);
        }

        let combined = match combine(compiled.iter().map(|p| p.source.as_str())) {
            Ok(regex) => regex,
            Err(e) => return Err(Self::blame(&compiled, e)),
        };

        debug!("Compiled combined matcher from {} patterns", compiled.len());
        Ok(Some(Self {
            combined,
            patterns: compiled,
        }))
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.combined.is_match(text)
    }

    /// Every stored pattern that matches `text` on its own
    pub fn matching_patterns(&self, text: &str) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|p| p.regex.is_match(text))
            .map(|p| p.source.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Find the first fragment whose addition breaks the combined regex,
    /// e.g. a capture group name already used by an earlier fragment.
    fn blame(compiled: &[CompiledPattern], fallback: regex::Error) -> FilterError {
        for end in 1..=compiled.len() {
            if let Err(e) = combine(compiled[..end].iter().map(|p| p.source.as_str())) {
                return FilterError::malformed(&compiled[end - 1].source, e);
            }
        }
        let last = compiled.last().map(|p| p.source.as_str()).unwrap_or_default();
        FilterError::malformed(last, fallback)
    }
}

fn combine<'a, I>(sources: I) -> Result<Regex, regex::Error>
where
    I: Iterator<Item = &'a str>,
{
    let combined = sources
        .map(|source| format!("(?:{})", source))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&combined).case_insensitive(true).build()
}

/// Keep every pattern that compiles, alone and together with the ones
/// already kept. Rejected patterns are returned with their errors.
pub fn admit_patterns<'a, I>(candidates: I) -> (BTreeSet<String>, Vec<FilterError>)
where
    I: IntoIterator<Item = &'a String>,
{
    let mut admitted = BTreeSet::new();
    let mut rejected = Vec::new();

    for pattern in candidates {
        match compile_fragment(pattern) {
            Ok(_) => {
                admitted.insert(pattern.clone());
            }
            Err(e) => rejected.push(e),
        }
    }

    if PatternMatcher::build(&admitted).is_ok() {
        return (admitted, rejected);
    }

    // Only reached when fragments conflict with each other
    let mut compatible = BTreeSet::new();
    for pattern in admitted {
        compatible.insert(pattern.clone());
        if let Err(e) = PatternMatcher::build(&compatible) {
            compatible.remove(&pattern);
            rejected.push(e);
        }
    }

    for e in &rejected {
        error!("Dropping pattern: {}", e);
    }
    (compatible, rejected)
}
