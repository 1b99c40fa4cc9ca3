use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

use crate::config::NormalizationSettings;
use crate::filter::char_map::DerivedMaps;

/// Latin sequences that commonly stand for a single Cyrillic letter but are
/// also plausible as the letters they are made of (`bl` is both `ы` and `бл`).
/// They only ever produce extra candidates.
const KNOWN_AMBIGUOUS_SEQUENCES: &[(&str, &[&str])] = &[
    ("b|", &["ы"]),
    ("bi", &["ы", "би"]),
    ("bl", &["ы"]),
];

/// Exhaustive mode tries at most this many combinations per allowed variant
const COMBINATIONS_PER_VARIANT: usize = 4;

/// Rewrites messages into canonical form before pattern matching.
///
/// A normalizer is immutable; a table change builds a new one.
#[derive(Debug, Clone)]
pub struct Normalizer {
    sequences: Vec<(String, Vec<String>)>,
    reverse: BTreeMap<String, String>,
    /// Multi-character alternates, longest first
    multi_reverse: Vec<(String, String)>,
    single_reverse: HashMap<char, String>,
    ambiguity: BTreeMap<String, Vec<String>>,
    /// Every character that occurs in some alternate, kept by `compact`
    alternate_chars: HashSet<char>,
    settings: NormalizationSettings,
}

impl Normalizer {
    pub fn new(maps: DerivedMaps, settings: NormalizationSettings) -> Self {
        let mut multi_reverse = Vec::new();
        let mut single_reverse = HashMap::new();

        for (alternate, canonical) in &maps.reverse {
            let mut chars = alternate.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => {
                    single_reverse.insert(ch, canonical.clone());
                }
                (Some(_), Some(_)) => multi_reverse.push((alternate.clone(), canonical.clone())),
                _ => {}
            }
        }
        // reverse is a BTreeMap, so equal lengths stay in code point order
        multi_reverse.sort_by(|(a, _), (b, _)| b.chars().count().cmp(&a.chars().count()));

        let alternate_chars = maps
            .reverse
            .keys()
            .chain(maps.sequences.iter().flat_map(|(_, alternates)| alternates.iter()))
            .flat_map(|alternate| alternate.chars())
            .chain(KNOWN_AMBIGUOUS_SEQUENCES.iter().flat_map(|(seq, _)| seq.chars()))
            .collect();

        Self {
            sequences: maps.sequences,
            reverse: maps.reverse,
            multi_reverse,
            single_reverse,
            ambiguity: maps.ambiguity,
            alternate_chars,
            settings,
        }
    }

    pub fn ambiguous_alternates(&self) -> usize {
        self.ambiguity.len()
    }

    /// Default normalization of a message.
    pub fn normalize(&self, message: &str) -> String {
        let prepared = self.prepare(message);
        self.substitute_and_strip(&prepared)
    }

    /// Every candidate form of `message`, default first, without duplicates
    /// or empty strings.
    ///
    /// Besides the text as written, the compacted text (separators and
    /// decoration removed before substitution) is explored too, so that
    /// `z h u k` still reaches the `zh` alternate.
    pub fn candidates(&self, message: &str) -> Vec<String> {
        let prepared = self.prepare(message);
        let compacted = self.compact(&prepared);
        let mut set = CandidateSet::new(self.settings.max_variants, self.settings.collapse_repeats);

        set.push(self.substitute_and_strip(&prepared));
        if self.settings.match_unsubstituted {
            set.push(strip(&prepared));
        }

        let mut bases = vec![prepared.as_str()];
        if compacted != prepared {
            set.push(self.substitute_and_strip(&compacted));
            bases.push(compacted.as_str());
        }

        for base in bases {
            let symbols = self.ambiguous_symbols(base);
            if self.settings.exhaustive_ambiguity {
                self.push_combinations(base, &symbols, &mut set);
            } else {
                self.push_readings(base, &symbols, &mut set);
            }
        }

        set.into_vec()
    }

    /// Steps 0 and 1: compatibility folding and lowercasing.
    fn prepare(&self, message: &str) -> String {
        if self.settings.unicode_fold {
            message.nfkc().collect::<String>().to_lowercase()
        } else {
            message.to_lowercase()
        }
    }

    /// Drop whitespace and decoration, keeping anything an alternate is made of.
    fn compact(&self, prepared: &str) -> String {
        prepared
            .chars()
            .filter(|c| !c.is_whitespace())
            .filter(|c| is_retained(*c) || self.alternate_chars.contains(c))
            .collect()
    }

    /// Steps 2 through 6 on already prepared text.
    fn substitute_and_strip(&self, prepared: &str) -> String {
        let mut text = prepared.to_string();

        for (canonical, alternates) in &self.sequences {
            for alternate in alternates {
                if text.contains(alternate.as_str()) {
                    text = text.replace(alternate.as_str(), canonical);
                }
            }
        }

        for (alternate, canonical) in &self.multi_reverse {
            if text.contains(alternate.as_str()) {
                text = text.replace(alternate.as_str(), canonical);
            }
        }

        let mut substituted = String::with_capacity(text.len());
        for ch in text.chars() {
            match self.single_reverse.get(&ch) {
                Some(canonical) => substituted.push_str(canonical),
                None => substituted.push(ch),
            }
        }

        strip(&substituted)
    }

    /// Alternates present in the text that have more than one reading, with
    /// their non-default readings. Bounded by `max_ambiguous_symbols`.
    fn ambiguous_symbols<'a>(&'a self, prepared: &str) -> Vec<(&'a str, Vec<&'a str>)> {
        let mut symbols = Vec::new();

        for (alternate, readings) in &self.ambiguity {
            if !prepared.contains(alternate.as_str()) {
                continue;
            }
            let default = self.reverse.get(alternate).map(String::as_str);
            let others: Vec<&str> = readings
                .iter()
                .map(String::as_str)
                .filter(|reading| Some(*reading) != default)
                .collect();
            if !others.is_empty() {
                symbols.push((alternate.as_str(), others));
            }
        }

        for (sequence, readings) in KNOWN_AMBIGUOUS_SEQUENCES {
            if prepared.contains(sequence) {
                symbols.push((*sequence, readings.to_vec()));
            }
        }

        let limit = self.settings.max_ambiguous_symbols;
        if symbols.len() > limit {
            debug!(
                "Message has {} ambiguous symbols, considering the first {}",
                symbols.len(),
                limit
            );
            symbols.truncate(limit);
        }
        symbols
    }

    /// One variant per non-default reading, other symbols on the default path.
    fn push_readings(&self, prepared: &str, symbols: &[(&str, Vec<&str>)], set: &mut CandidateSet) {
        for (alternate, readings) in symbols {
            for reading in readings {
                if set.is_full() {
                    return;
                }
                let variant = prepared.replace(alternate, reading);
                set.push(self.substitute_and_strip(&variant));
            }
        }
    }

    /// Every combination of readings across `symbols`, except all-default.
    /// Returns how many combinations were run through the pipeline.
    fn push_combinations(&self, prepared: &str, symbols: &[(&str, Vec<&str>)], set: &mut CandidateSet) -> usize {
        let budget = self.settings.max_variants.saturating_mul(COMBINATIONS_PER_VARIANT);
        let mut tried = 0;
        // choice[i] == 0 keeps the default path, k > 0 picks readings[k - 1]
        let mut choice = vec![0usize; symbols.len()];
        loop {
            let mut position = 0;
            loop {
                if position == symbols.len() {
                    return tried;
                }
                choice[position] += 1;
                if choice[position] <= symbols[position].1.len() {
                    break;
                }
                choice[position] = 0;
                position += 1;
            }

            if set.is_full() {
                return tried;
            }
            if tried >= budget {
                debug!("Stopping after {} ambiguity combinations", tried);
                return tried;
            }
            tried += 1;

            let mut variant = prepared.to_string();
            for ((alternate, readings), picked) in symbols.iter().zip(&choice) {
                if *picked > 0 {
                    variant = variant.replace(alternate, readings[*picked - 1]);
                }
            }
            set.push(self.substitute_and_strip(&variant));
        }
    }
}

/// Steps 5 and 6: drop whitespace, then everything outside the retained alphabet.
pub fn strip(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .filter(|c| is_retained(*c))
        .collect()
}

/// Collapse runs of the same character ("ррррубль" -> "рубль").
pub fn collapse_repeats(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_char = None;
    for ch in text.chars() {
        if prev_char != Some(ch) {
            result.push(ch);
        }
        prev_char = Some(ch);
    }
    result
}

/// Cyrillic letters, Latin letters and ASCII digits
fn is_retained(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || (matches!(c, '\u{00C0}'..='\u{024F}' | '\u{0400}'..='\u{04FF}') && c.is_alphabetic())
}

/// Ordered, de-duplicated and bounded candidate accumulator
struct CandidateSet {
    items: Vec<String>,
    limit: usize,
    collapse: bool,
}

impl CandidateSet {
    fn new(limit: usize, collapse: bool) -> Self {
        Self {
            items: Vec::new(),
            limit: limit.max(1),
            collapse,
        }
    }

    fn push(&mut self, candidate: String) {
        if self.collapse {
            let collapsed = collapse_repeats(&candidate);
            self.insert(candidate);
            self.insert(collapsed);
        } else {
            self.insert(candidate);
        }
    }

    fn insert(&mut self, candidate: String) {
        if candidate.is_empty() || self.is_full() || self.items.contains(&candidate) {
            return;
        }
        self.items.push(candidate);
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.limit
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}
