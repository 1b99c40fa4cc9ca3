// src/filter/mod.rs - Obfuscation-resistant spam filter

pub mod char_map;
pub mod filter_commands;
pub mod normalizer;
pub mod pattern_matching;
pub mod storage;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::config::FilterConfig;
use crate::types::{EquivalenceTable, FilterError, FilterStats, SpamVerdict};
use char_map::CharMap;
use normalizer::Normalizer;
use pattern_matching::PatternMatcher;
use storage::JsonFile;

/// Immutable view used by readers. Writers replace it as a whole.
#[derive(Debug)]
pub struct FilterSnapshot {
    pub normalizer: Normalizer,
    pub matcher: Option<PatternMatcher>,
    pub built_at: DateTime<Utc>,
}

impl FilterSnapshot {
    fn build(char_map: &CharMap, matcher: Option<PatternMatcher>, config: &FilterConfig) -> Self {
        Self {
            normalizer: Normalizer::new(char_map.derive(), config.normalization.clone()),
            matcher,
            built_at: Utc::now(),
        }
    }

    pub fn is_spam(&self, message: &str) -> bool {
        let matcher = match &self.matcher {
            Some(matcher) => matcher,
            None => return false,
        };
        self.normalizer
            .candidates(message)
            .iter()
            .any(|candidate| matcher.is_match(candidate))
    }
}

/// Authoritative state, only touched under the writer lock
struct FilterState {
    patterns: BTreeSet<String>,
    char_map: CharMap,
}

/// Normalizer + matcher over a dynamic pattern set.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct SpamFilter {
    config: FilterConfig,
    state: Mutex<FilterState>,
    snapshot: RwLock<Arc<FilterSnapshot>>,
    patterns_file: Option<JsonFile>,
    char_map_file: Option<JsonFile>,
}

impl SpamFilter {
    /// Load persisted state and build the first snapshot.
    ///
    /// Unreadable files are logged and treated as empty; only an invalid
    /// configuration is an error.
    pub fn new(config: FilterConfig) -> Result<Self> {
        config.validate()?;

        let patterns_file = config.patterns_file.as_ref().map(JsonFile::new);
        let char_map_file = config.char_map_file.as_ref().map(JsonFile::new);

        let mut candidates = Vec::new();
        if let Some(path) = &config.default_patterns_file {
            let seeds = Self::load_or_log::<Vec<String>>(&JsonFile::new(path)).unwrap_or_default();
            info!("Loaded {} default patterns", seeds.len());
            candidates.extend(seeds);
        }
        if let Some(pattern) = &config.initial_pattern {
            candidates.push(pattern.clone());
        }
        if let Some(file) = &patterns_file {
            candidates.extend(Self::load_or_log::<Vec<String>>(file).unwrap_or_default());
        }
        let candidates: Vec<String> = candidates
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let (patterns, rejected) = pattern_matching::admit_patterns(&candidates);
        if !rejected.is_empty() {
            warn!("{} stored patterns were rejected at startup", rejected.len());
        }

        let loaded_table = char_map_file
            .as_ref()
            .and_then(|file| Self::load_or_log::<EquivalenceTable>(file));
        let table = match loaded_table {
            Some(table) => table,
            None if config.use_builtin_char_map => CharMap::builtin_table(),
            None => EquivalenceTable::new(),
        };
        let char_map = CharMap::new(table, config.ambiguity_overrides.clone());

        // admitted patterns always build together
        let matcher = PatternMatcher::build(&patterns)?;
        let snapshot = FilterSnapshot::build(&char_map, matcher, &config);

        info!(
            "Spam filter ready: {} patterns, {} canonical forms",
            patterns.len(),
            char_map.table().len()
        );

        Ok(Self {
            config,
            state: Mutex::new(FilterState { patterns, char_map }),
            snapshot: RwLock::new(Arc::new(snapshot)),
            patterns_file,
            char_map_file,
        })
    }

    /// Filter with the built-in table, no persistence and no patterns
    pub fn in_memory() -> Self {
        let config = FilterConfig::in_memory();
        let char_map = CharMap::new(CharMap::builtin_table(), config.ambiguity_overrides.clone());
        let snapshot = FilterSnapshot::build(&char_map, None, &config);
        Self {
            config,
            state: Mutex::new(FilterState {
                patterns: BTreeSet::new(),
                char_map,
            }),
            snapshot: RwLock::new(Arc::new(snapshot)),
            patterns_file: None,
            char_map_file: None,
        }
    }

    /// Consistent view of the current normalizer and matcher
    pub fn snapshot(&self) -> Arc<FilterSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ------------------------------------------------------------------
    // Matching
    // ------------------------------------------------------------------

    pub fn is_spam(&self, message: &str) -> bool {
        let spam = self.snapshot().is_spam(message);
        if spam {
            debug!("Spam detected: {}", message);
        }
        spam
    }

    /// Patterns matching the default normalization only
    pub fn pattern_matches(&self, message: &str) -> Vec<String> {
        let snapshot = self.snapshot();
        match &snapshot.matcher {
            Some(matcher) => {
                let normalized = snapshot.normalizer.normalize(message);
                if normalized.is_empty() {
                    return Vec::new();
                }
                matcher.matching_patterns(&normalized)
            }
            None => Vec::new(),
        }
    }

    /// Patterns matching any candidate normalization
    pub fn variant_matches(&self, message: &str) -> Vec<String> {
        let snapshot = self.snapshot();
        let matcher = match &snapshot.matcher {
            Some(matcher) => matcher,
            None => return Vec::new(),
        };

        let mut hits = BTreeSet::new();
        for candidate in snapshot.normalizer.candidates(message) {
            hits.extend(matcher.matching_patterns(&candidate));
        }
        hits.into_iter().collect()
    }

    pub fn normalize(&self, message: &str) -> String {
        self.snapshot().normalizer.normalize(message)
    }

    pub fn candidates(&self, message: &str) -> Vec<String> {
        self.snapshot().normalizer.candidates(message)
    }

    /// Full diagnostic for one message, computed on a single snapshot
    pub fn check(&self, message: &str) -> SpamVerdict {
        let snapshot = self.snapshot();
        let candidates = snapshot.normalizer.candidates(message);
        let mut matched = BTreeSet::new();
        if let Some(matcher) = &snapshot.matcher {
            for candidate in &candidates {
                matched.extend(matcher.matching_patterns(candidate));
            }
        }

        SpamVerdict {
            is_spam: !matched.is_empty(),
            normalized: snapshot.normalizer.normalize(message),
            candidates,
            matched_patterns: matched.into_iter().collect(),
        }
    }

    // ------------------------------------------------------------------
    // Pattern store
    // ------------------------------------------------------------------

    /// Add a regex fragment. Re-adding an existing pattern succeeds.
    pub fn add_pattern(&self, pattern: &str) -> Result<(), FilterError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(FilterError::InvalidInput("pattern is empty".to_string()));
        }
        pattern_matching::compile_fragment(pattern)?;

        let mut state = self.lock_state();
        let mut patterns = state.patterns.clone();
        patterns.insert(pattern.to_string());
        let matcher = PatternMatcher::build(&patterns)?;

        state.patterns = patterns;
        self.publish(&state.char_map, matcher);
        self.persist_patterns(&state.patterns);
        info!("Added pattern '{}' ({} total)", pattern, state.patterns.len());
        Ok(())
    }

    pub fn remove_pattern(&self, pattern: &str) -> Result<(), FilterError> {
        let pattern = pattern.trim();
        let mut state = self.lock_state();
        if !state.patterns.contains(pattern) {
            return Err(FilterError::UnknownEntry(format!("pattern '{}'", pattern)));
        }

        let mut patterns = state.patterns.clone();
        patterns.remove(pattern);
        let matcher = PatternMatcher::build(&patterns)?;

        state.patterns = patterns;
        self.publish(&state.char_map, matcher);
        self.persist_patterns(&state.patterns);
        info!("Removed pattern '{}' ({} left)", pattern, state.patterns.len());
        Ok(())
    }

    /// Sorted copy of the pattern set
    pub fn patterns(&self) -> Vec<String> {
        self.lock_state().patterns.iter().cloned().collect()
    }

    // ------------------------------------------------------------------
    // Character equivalence table
    // ------------------------------------------------------------------

    pub fn add_char_mapping(&self, canonical: &str, alternate: &str) -> Result<(), FilterError> {
        let mut state = self.lock_state();
        state.char_map.add_mapping(canonical, alternate)?;
        self.republish(&state);
        self.persist_char_map(state.char_map.table());
        info!("Added char mapping '{}' -> '{}'", alternate.trim(), canonical.trim());
        Ok(())
    }

    pub fn remove_char_mapping(&self, canonical: &str, alternate: &str) -> Result<(), FilterError> {
        let mut state = self.lock_state();
        state.char_map.remove_mapping(canonical, alternate)?;
        self.republish(&state);
        self.persist_char_map(state.char_map.table());
        info!("Removed char mapping '{}' -> '{}'", alternate.trim(), canonical.trim());
        Ok(())
    }

    pub fn char_map(&self) -> EquivalenceTable {
        self.lock_state().char_map.table().clone()
    }

    pub fn stats(&self) -> FilterStats {
        let state = self.lock_state();
        let snapshot = self.snapshot();
        FilterStats {
            patterns: state.patterns.len(),
            canonical_forms: state.char_map.table().len(),
            alternates: state.char_map.alternate_count(),
            ambiguous_alternates: snapshot.normalizer.ambiguous_alternates(),
            matcher_active: snapshot.matcher.is_some(),
            built_at: snapshot.built_at,
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn lock_state(&self) -> MutexGuard<'_, FilterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, char_map: &CharMap, matcher: Option<PatternMatcher>) {
        let snapshot = Arc::new(FilterSnapshot::build(char_map, matcher, &self.config));
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    /// Table changed: keep the current matcher, rebuild the normalizer
    fn republish(&self, state: &FilterState) {
        let matcher = self.snapshot().matcher.clone();
        self.publish(&state.char_map, matcher);
    }

    fn persist_patterns(&self, patterns: &BTreeSet<String>) {
        if let Some(file) = &self.patterns_file {
            if let Err(e) = file.save(patterns) {
                error!("Failed to save patterns: {:#}", e);
            }
        }
    }

    fn persist_char_map(&self, table: &EquivalenceTable) {
        if let Some(file) = &self.char_map_file {
            if let Err(e) = file.save(table) {
                error!("Failed to save char map: {:#}", e);
            }
        }
    }

    fn load_or_log<T: serde::de::DeserializeOwned>(file: &JsonFile) -> Option<T> {
        match file.load() {
            Ok(value) => value,
            Err(e) => {
                error!("Ignoring {}: {:#}", file.path().display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::fs;
    use tempfile::tempdir;

    fn filter_with(patterns: &[&str]) -> SpamFilter {
        let filter = SpamFilter::in_memory();
        for pattern in patterns {
            filter.add_pattern(pattern).unwrap();
        }
        filter
    }

    fn bare_filter(patterns: &[&str]) -> SpamFilter {
        let config = FilterConfig {
            use_builtin_char_map: false,
            ambiguity_overrides: Vec::new(),
            ..FilterConfig::in_memory()
        };
        let filter = SpamFilter::new(config).unwrap();
        for pattern in patterns {
            filter.add_pattern(pattern).unwrap();
        }
        filter
    }

    #[test]
    fn test_literal_scenarios() {
        let filter = bare_filter(&["рубль"]);
        filter.add_char_mapping("р", "p").unwrap();
        filter.add_char_mapping("у", "y").unwrap();
        filter.add_char_mapping("л", "l").unwrap();

        assert!(filter.is_spam("р у б л ь"));
        assert!(filter.is_spam("pyбl ь"));
        assert!(!filter.is_spam("абвгд"));
        assert!(!filter.is_spam(""));

        filter.remove_pattern("рубль").unwrap();
        assert!(!filter.is_spam("рубль"));
    }

    #[test]
    fn test_no_patterns_never_spam() {
        let filter = SpamFilter::in_memory();
        assert!(!filter.is_spam("рубль"));
        assert!(filter.pattern_matches("рубль").is_empty());
        assert!(!filter.stats().matcher_active);
    }

    #[test]
    fn test_pattern_that_matches_empty_text() {
        let filter = filter_with(&["x*"]);
        assert!(!filter.is_spam(""));
        assert!(!filter.is_spam("💰💰"));
    }

    #[test]
    fn test_decoration_and_spacing() {
        let filter = filter_with(&["рубль"]);
        for message in [
            "рубль", "р у б л ь", "р.у.б.л.ь", "р-у-б-л-ь", "рубль!", "_р_у_б_л_ь_",
            "РУБЛЬ", "РуБлЬ", "р*у*б*л*ь", "р/у/б/л/ь", "р👍у👍б👍л👍ь", "р💰у💰б💰л💰ь",
            "р\nу\nб\nл\nь", "р\tу\tб\tл\tь", "Рубль100",
        ] {
            assert!(filter.is_spam(message), "expected spam: {:?}", message);
        }
        assert!(!filter.is_spam("совсем другое сообщение"));
        assert!(!filter.is_spam("абвгдежз"));
    }

    #[test]
    fn test_cyrillic_latin_substitution() {
        let filter = filter_with(&["рубль"]);
        for message in ["pyблb", "рубль", "pyбlь", "руbль", "pуbль", "p у б л ь"] {
            assert!(filter.is_spam(message), "expected spam: {:?}", message);
        }
        assert!(!filter.is_spam("пример"));
        assert!(!filter.is_spam("example"));
    }

    #[test]
    fn test_repeated_characters() {
        let filter = filter_with(&["рубль"]);
        assert!(filter.is_spam("ррррууууббблллььь"));
        assert!(filter.is_spam("рррр    ууу   ббб   лллл   ььь"));
    }

    #[test]
    fn test_latin_patterns_still_match() {
        let filter = filter_with(&["spam"]);
        assert!(filter.is_spam("This is spam message"));
        assert!(filter.is_spam("This is SPAM message"));
        assert!(filter.is_spam("This is sPaM message"));
        assert!(!filter.is_spam("This is a normal message"));
    }

    #[test]
    fn test_default_preference_for_ambiguous_b() {
        let filter = filter_with(&["рувль"]);
        assert!(filter.is_spam("руbль"));
        assert_eq!(filter.pattern_matches("руbль"), vec!["рувль".to_string()]);
    }

    #[test]
    fn test_multi_character_canonical() {
        let filter = filter_with(&["рубить", "рувить"]);
        filter.add_char_mapping("би", "bi").unwrap();
        filter.add_char_mapping("би", "bee").unwrap();

        assert!(filter.is_spam("рубить"));
        assert!(filter.is_spam("руbить"));
        assert!(filter.is_spam("руbiть"));
        assert!(filter.is_spam("руbeeть"));
    }

    #[test]
    fn test_ambiguity_coverage() {
        let filter = bare_filter(&["боб", "вов"]);
        filter.add_char_mapping("б", "b").unwrap();
        filter.add_char_mapping("в", "b").unwrap();
        filter.add_char_mapping("о", "o").unwrap();

        assert!(filter.is_spam("bob"));
        assert_eq!(filter.pattern_matches("bob"), vec!["боб".to_string()]);
        assert_eq!(
            filter.variant_matches("bob"),
            vec!["боб".to_string(), "вов".to_string()]
        );

        filter.remove_pattern("боб").unwrap();
        assert!(filter.is_spam("bob"));
        assert!(filter.pattern_matches("bob").is_empty());
    }

    #[test]
    fn test_spam_implies_a_matching_variant() {
        let filter = filter_with(&["рубль", "казино", r"удал[её]нн"]);
        for message in ["pyблb", "KA3ИHO", "kazuho", "yдaлeннo", "привет", "руbль"] {
            let verdict = filter.check(message);
            assert_eq!(verdict.is_spam, filter.is_spam(message), "{:?}", message);
            if verdict.is_spam {
                assert!(!filter.variant_matches(message).is_empty());
            }
        }
    }

    #[test]
    fn test_case_insensitivity_property() {
        let filter = filter_with(&["рубль", "spam", "удаленно"]);
        let mut rng = StdRng::seed_from_u64(42);
        for message in ["рубль", "pyбl ь", "spam here", "работа yдaлeннo", "обычный текст"] {
            let expected = filter.is_spam(message);
            assert_eq!(filter.is_spam(&message.to_uppercase()), expected, "{:?}", message);
            for _ in 0..20 {
                let random_case: String = message
                    .chars()
                    .map(|c| {
                        if rng.random_bool(0.5) {
                            c.to_uppercase().collect::<String>()
                        } else {
                            c.to_string()
                        }
                    })
                    .collect();
                assert_eq!(filter.is_spam(&random_case), expected, "{:?}", random_case);
            }
        }
    }

    #[test]
    fn test_separator_insertion_property() {
        let filter = filter_with(&["рубль", "удаленно", "жук", "чат"]);
        let separators = [" ", "\t", "\n", "-", ".", "_", "👍", "💰"];
        let mut rng = StdRng::seed_from_u64(7);
        for message in [
            "рубль", "pyбl ь", "удаленно", "yдaлeннo", "привет", "абвгд", "zhuk", "chat", "}|{yk",
        ] {
            let expected = filter.is_spam(message);
            for _ in 0..20 {
                let mut spaced = String::new();
                for c in message.chars() {
                    spaced.push(c);
                    spaced.push_str(separators[rng.random_range(0..separators.len())]);
                }
                assert_eq!(filter.is_spam(&spaced), expected, "{:?}", spaced);
            }
        }
    }

    #[test]
    fn test_spaced_multi_character_alternates() {
        let filter = filter_with(&["жук", "чат"]);
        for message in ["zhuk", "z h u k", "z.h.u.k", "Z_H_U_K", "c h a t", "c-h-a-t", "c👍h👍a👍t", "} | { y k"] {
            assert!(filter.is_spam(message), "expected spam: {:?}", message);
        }
        assert!(filter.candidates("z h u k").contains(&"жук".to_string()));
        assert_eq!(filter.normalize("z h u k"), "знук");
        assert!(!filter.is_spam("z h u"));
    }

    #[test]
    fn test_pattern_lifecycle() {
        let filter = SpamFilter::in_memory();
        assert!(filter.add_pattern("test").is_ok());
        assert!(filter.patterns().contains(&"test".to_string()));

        assert!(filter.add_pattern("test").is_ok());
        assert_eq!(filter.patterns().len(), 1);

        assert!(filter.remove_pattern("test").is_ok());
        assert!(!filter.patterns().contains(&"test".to_string()));

        filter.add_pattern("other").unwrap();
        assert!(matches!(
            filter.remove_pattern("nonexistent"),
            Err(FilterError::UnknownEntry(_))
        ));
        assert_eq!(filter.patterns(), vec!["other".to_string()]);
    }

    #[test]
    fn test_invalid_and_malformed_patterns_rejected() {
        let filter = filter_with(&["рубль"]);
        assert!(matches!(filter.add_pattern("   "), Err(FilterError::InvalidInput(_))));

        let err = filter.add_pattern("руб(ль").unwrap_err();
        assert!(matches!(err, FilterError::MalformedPattern { ref pattern, .. } if pattern == "руб(ль"));
        assert_eq!(filter.patterns(), vec!["рубль".to_string()]);
        assert!(filter.is_spam("рубль"));
    }

    #[test]
    fn test_conflicting_pattern_rejected() {
        let filter = filter_with(&["(?P<sum>\\d+)руб"]);
        let err = filter.add_pattern("(?P<sum>\\d+)грн").unwrap_err();
        assert!(matches!(err, FilterError::MalformedPattern { .. }));
        assert_eq!(filter.patterns().len(), 1);
    }

    #[test]
    fn test_char_mapping_changes_take_effect() {
        let filter = bare_filter(&["кот"]);
        assert!(!filter.is_spam("kot"));

        filter.add_char_mapping("к", "k").unwrap();
        filter.add_char_mapping("о", "o").unwrap();
        filter.add_char_mapping("т", "t").unwrap();
        assert!(filter.is_spam("kot"));
        assert!(matches!(
            filter.add_char_mapping("к", "k"),
            Err(FilterError::DuplicateEntry { .. })
        ));

        filter.remove_char_mapping("т", "t").unwrap();
        assert!(!filter.is_spam("kot"));
        assert!(!filter.char_map().contains_key("т"));
    }

    #[test]
    fn test_snapshot_is_stable_across_writes() {
        let filter = filter_with(&["рубль"]);
        let before = filter.snapshot();
        filter.remove_pattern("рубль").unwrap();

        assert!(before.is_spam("рубль"));
        assert!(!filter.snapshot().is_spam("рубль"));
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let filter = Arc::new(filter_with(&["рубль"]));
        let mut handles = Vec::new();
        for i in 0..4 {
            let filter = filter.clone();
            handles.push(std::thread::spawn(move || {
                for j in 0..50 {
                    let pattern = format!("слово{}x{}", i, j);
                    filter.add_pattern(&pattern).unwrap();
                    assert!(filter.is_spam("р у б л ь"));
                    filter.remove_pattern(&pattern).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(filter.patterns(), vec!["рубль".to_string()]);
    }

    #[test_log::test]
    fn test_state_persisted_and_reloaded() {
        let temp_dir = tempdir().unwrap();
        let config = FilterConfig::with_data_dir(temp_dir.path());

        {
            let filter = SpamFilter::new(config.clone()).unwrap();
            filter.add_pattern("казино").unwrap();
            filter.add_char_mapping("ї", "ji").unwrap();
        }

        let raw = fs::read_to_string(temp_dir.path().join("patterns.json")).unwrap();
        let stored: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, vec!["казино".to_string()]);

        let filter = SpamFilter::new(config).unwrap();
        assert_eq!(filter.patterns(), vec!["казино".to_string()]);
        assert_eq!(
            filter.char_map().get("ї"),
            Some(&vec!["yi".to_string(), "ji".to_string()])
        );
        assert!(filter.is_spam("KA3ИHO kaзинo"));
    }

    #[test_log::test]
    fn test_seed_list_and_initial_pattern_merged() {
        let temp_dir = tempdir().unwrap();
        let mut config = FilterConfig::with_data_dir(temp_dir.path());
        config.initial_pattern = Some("  крипта ".to_string());
        fs::write(
            temp_dir.path().join("filters.json"),
            r#"["рубл", "(broken", "удал[её]нн"]"#,
        )
        .unwrap();

        let filter = SpamFilter::new(config).unwrap();
        assert_eq!(
            filter.patterns(),
            vec!["крипта".to_string(), "рубл".to_string(), "удал[её]нн".to_string()]
        );

        // the seed list is read-only, mutations go to patterns.json
        filter.remove_pattern("рубл").unwrap();
        let seeds = fs::read_to_string(temp_dir.path().join("filters.json")).unwrap();
        assert!(seeds.contains("рубл"));
    }

    #[test_log::test]
    fn test_corrupt_files_do_not_prevent_startup() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("patterns.json"), "not json").unwrap();
        fs::write(temp_dir.path().join("char_map.json"), "[1, 2").unwrap();

        let filter = SpamFilter::new(FilterConfig::with_data_dir(temp_dir.path())).unwrap();
        assert!(filter.patterns().is_empty());
        assert_eq!(filter.char_map(), CharMap::builtin_table());
    }

    #[test_log::test]
    fn test_persistence_failure_keeps_memory_state() {
        let temp_dir = tempdir().unwrap();
        // a directory where the file should be makes every save fail
        let blocked = temp_dir.path().join("patterns.json");
        fs::create_dir_all(blocked.join("inner")).unwrap();

        let config = FilterConfig {
            patterns_file: Some(blocked),
            ..FilterConfig::in_memory()
        };
        let filter = SpamFilter::new(config).unwrap();
        assert!(filter.add_pattern("рубль").is_ok());
        assert!(filter.is_spam("pyбль"));
    }

    #[test]
    fn test_check_reports_details() {
        let filter = filter_with(&["рубль", "рувль"]);
        let verdict = filter.check("руbль");
        assert!(verdict.is_spam);
        assert_eq!(verdict.normalized, "рувль");
        assert_eq!(verdict.candidates[0], "рувль");
        assert_eq!(
            verdict.matched_patterns,
            vec!["рубль".to_string(), "рувль".to_string()]
        );
    }

    #[test]
    fn test_stats() {
        let filter = filter_with(&["рубль"]);
        let stats = filter.stats();
        assert_eq!(stats.patterns, 1);
        assert!(stats.matcher_active);
        assert_eq!(stats.canonical_forms, CharMap::builtin_table().len());
        assert_eq!(stats.ambiguous_alternates, 3);
    }
}
