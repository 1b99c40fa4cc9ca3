use log::{debug, warn};
use std::collections::BTreeMap;

use crate::types::{AmbiguityOverride, EquivalenceTable, FilterError};

/// Look-alike and transliteration alternates for Russian/Ukrainian letters.
///
/// Digits are left out on purpose so that prices and counts survive
/// normalization; admins can still register them at runtime.
const BUILTIN_CHAR_MAP: &[(&str, &[&str])] = &[
    ("а", &["a", "@"]),
    ("б", &["b"]),
    ("в", &["b", "v"]),
    ("г", &["g"]),
    ("д", &["d"]),
    ("е", &["e", "ё"]),
    ("ж", &["zh", "}|{", ">|<"]),
    ("з", &["z"]),
    ("и", &["u"]),
    ("й", &["j"]),
    ("к", &["k"]),
    ("л", &["l"]),
    ("м", &["m"]),
    ("н", &["h"]),
    ("о", &["o"]),
    ("п", &["n"]),
    ("р", &["p", "r"]),
    ("с", &["c", "s"]),
    ("т", &["t"]),
    ("у", &["y", "u"]),
    ("ф", &["f"]),
    ("х", &["x", "h"]),
    ("ц", &["ts"]),
    ("ч", &["ch"]),
    ("ш", &["sh", "w"]),
    ("щ", &["shch", "sch"]),
    ("ь", &["b"]),
    ("ю", &["yu"]),
    ("я", &["ya"]),
    ("є", &["ye"]),
    ("і", &["i"]),
    ("ї", &["yi"]),
    ("руб", &["₽"]),
];

/// Maps derived from the equivalence table. Rebuilt wholesale, never edited.
#[derive(Debug, Clone, Default)]
pub struct DerivedMaps {
    /// Multi-character canonical forms with their alternates, longest alternate first
    pub sequences: Vec<(String, Vec<String>)>,
    /// Alternate -> default canonical (single-character canonicals only)
    pub reverse: BTreeMap<String, String>,
    /// Alternate -> every canonical it may stand for, default first
    pub ambiguity: BTreeMap<String, Vec<String>>,
}

/// Canonical <-> alternate character table with deterministic derivation
#[derive(Debug, Clone, Default)]
pub struct CharMap {
    table: EquivalenceTable,
    overrides: Vec<AmbiguityOverride>,
}

impl CharMap {
    /// Build from a loaded table, dropping entries that break the table invariants.
    pub fn new(table: EquivalenceTable, overrides: Vec<AmbiguityOverride>) -> Self {
        Self {
            table: Self::sanitize(table),
            overrides,
        }
    }

    pub fn builtin_table() -> EquivalenceTable {
        BUILTIN_CHAR_MAP
            .iter()
            .map(|(canonical, alternates)| {
                (
                    canonical.to_string(),
                    alternates.iter().map(|a| a.to_string()).collect(),
                )
            })
            .collect()
    }

    pub fn table(&self) -> &EquivalenceTable {
        &self.table
    }

    pub fn alternate_count(&self) -> usize {
        self.table.values().map(Vec::len).sum()
    }

    /// Append `alternate` to the list for `canonical`.
    pub fn add_mapping(&mut self, canonical: &str, alternate: &str) -> Result<(), FilterError> {
        let canonical = canonical.trim().to_lowercase();
        let alternate = alternate.trim().to_lowercase();
        if canonical.is_empty() || alternate.is_empty() {
            return Err(FilterError::InvalidInput(
                "canonical and alternate must both be non-empty".to_string(),
            ));
        }

        let alternates = self.table.entry(canonical.clone()).or_default();
        if alternates.contains(&alternate) {
            return Err(FilterError::DuplicateEntry { canonical, alternate });
        }
        alternates.push(alternate);
        Ok(())
    }

    pub fn remove_mapping(&mut self, canonical: &str, alternate: &str) -> Result<(), FilterError> {
        let canonical = canonical.trim().to_lowercase();
        let alternate = alternate.trim().to_lowercase();

        let alternates = self
            .table
            .get_mut(&canonical)
            .ok_or_else(|| FilterError::UnknownEntry(format!("canonical form '{}'", canonical)))?;
        let position = alternates
            .iter()
            .position(|a| *a == alternate)
            .ok_or_else(|| {
                FilterError::UnknownEntry(format!("alternate '{}' for '{}'", alternate, canonical))
            })?;

        alternates.remove(position);
        if alternates.is_empty() {
            self.table.remove(&canonical);
        }
        Ok(())
    }

    /// Derive the reverse map and the ambiguity set.
    ///
    /// Canonicals are visited in ascending order, so the first canonical to
    /// claim an alternate becomes its default. Overrides run last.
    pub fn derive(&self) -> DerivedMaps {
        let mut maps = DerivedMaps::default();

        for (canonical, alternates) in &self.table {
            if canonical.chars().count() > 1 {
                let mut ordered = alternates.clone();
                // stable: equal lengths keep their preference order
                ordered.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
                maps.sequences.push((canonical.clone(), ordered));
                continue;
            }

            for alternate in alternates {
                match maps.reverse.get(alternate) {
                    None => {
                        maps.reverse.insert(alternate.clone(), canonical.clone());
                    }
                    Some(existing) if existing == canonical => {}
                    Some(existing) => {
                        let readings = maps
                            .ambiguity
                            .entry(alternate.clone())
                            .or_insert_with(|| vec![existing.clone()]);
                        if !readings.contains(canonical) {
                            readings.push(canonical.clone());
                        }
                    }
                }
            }
        }

        for rule in &self.overrides {
            self.apply_override(rule, &mut maps);
        }

        debug!(
            "Derived char maps: {} reverse entries, {} ambiguous, {} sequences",
            maps.reverse.len(),
            maps.ambiguity.len(),
            maps.sequences.len()
        );
        maps
    }

    fn apply_override(&self, rule: &AmbiguityOverride, maps: &mut DerivedMaps) {
        let listed = rule.canonical.chars().count() == 1
            && self
                .table
                .get(&rule.canonical)
                .map_or(false, |alternates| alternates.contains(&rule.alternate));
        if !listed {
            debug!(
                "Skipping override '{}' -> '{}': mapping not present",
                rule.alternate, rule.canonical
            );
            return;
        }

        let previous = maps
            .reverse
            .insert(rule.alternate.clone(), rule.canonical.clone());
        if let Some(previous) = previous {
            if previous != rule.canonical {
                let readings = maps
                    .ambiguity
                    .entry(rule.alternate.clone())
                    .or_insert_with(|| vec![previous]);
                readings.retain(|c| *c != rule.canonical);
                readings.insert(0, rule.canonical.clone());
            }
        }
    }

    fn sanitize(table: EquivalenceTable) -> EquivalenceTable {
        let mut clean = EquivalenceTable::new();
        for (canonical, alternates) in table {
            let key = canonical.trim().to_lowercase();
            if key.is_empty() {
                warn!("Dropping char map entry with empty canonical form");
                continue;
            }
            let entry: &mut Vec<String> = clean.entry(key.clone()).or_default();
            for alternate in alternates {
                let alternate = alternate.trim().to_lowercase();
                if alternate.is_empty() {
                    warn!("Dropping empty alternate for '{}'", key);
                } else if entry.contains(&alternate) {
                    warn!("Dropping duplicate alternate '{}' for '{}'", alternate, key);
                } else {
                    entry.push(alternate);
                }
            }
            if entry.is_empty() {
                clean.remove(&key);
            }
        }
        clean
    }
}
