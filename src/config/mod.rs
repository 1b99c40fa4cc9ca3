// src/config/mod.rs - Filter configuration from files or the environment

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::AmbiguityOverride;

pub const DEFAULT_PATTERNS_FILE: &str = "patterns.json";
pub const DEFAULT_SEED_FILE: &str = "filters.json";
pub const DEFAULT_CHAR_MAP_FILE: &str = "char_map.json";

/// Everything needed to construct a `SpamFilter`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Mutable pattern set, rewritten on every add/remove
    pub patterns_file: Option<PathBuf>,
    /// Read-only seed list merged into the pattern set at startup
    pub default_patterns_file: Option<PathBuf>,
    /// Character equivalence table, rewritten on every mapping change
    pub char_map_file: Option<PathBuf>,
    /// Extra pattern admitted at startup
    pub initial_pattern: Option<String>,
    /// Seed the equivalence table with built-in look-alikes when no table was loaded
    pub use_builtin_char_map: bool,
    /// Fixed at construction; applied after automatic derivation
    pub ambiguity_overrides: Vec<AmbiguityOverride>,
    pub normalization: NormalizationSettings,
}

/// Knobs for candidate generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationSettings {
    /// NFKC folding before lowercasing
    pub unicode_fold: bool,
    /// Add a copy of every candidate with repeated characters collapsed
    pub collapse_repeats: bool,
    /// Add the lowercased, stripped text without any substitution
    pub match_unsubstituted: bool,
    /// Explore combinations of ambiguous readings instead of one symbol at a time
    pub exhaustive_ambiguity: bool,
    pub max_ambiguous_symbols: usize,
    pub max_variants: usize,
}

impl Default for NormalizationSettings {
    fn default() -> Self {
        Self {
            unicode_fold: true,
            collapse_repeats: true,
            match_unsubstituted: true,
            exhaustive_ambiguity: false,
            max_ambiguous_symbols: 8,
            max_variants: 64,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            patterns_file: None,
            default_patterns_file: None,
            char_map_file: None,
            initial_pattern: None,
            use_builtin_char_map: true,
            ambiguity_overrides: default_overrides(),
            normalization: NormalizationSettings::default(),
        }
    }
}

/// `b` is claimed by б, в and ь; `u` by и and у.
fn default_overrides() -> Vec<AmbiguityOverride> {
    vec![
        AmbiguityOverride::new("b", "в"),
        AmbiguityOverride::new("u", "у"),
    ]
}

impl FilterConfig {
    /// Filter with no persistence at all
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Standard file names inside `dir`
    pub fn with_data_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            patterns_file: Some(dir.join(DEFAULT_PATTERNS_FILE)),
            default_patterns_file: Some(dir.join(DEFAULT_SEED_FILE)),
            char_map_file: Some(dir.join(DEFAULT_CHAR_MAP_FILE)),
            ..Self::default()
        }
    }

    /// Build from `SPAMSIEVE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("SPAMSIEVE_DATA_DIR").unwrap_or_else(|| ".".to_string());
        let mut config = Self::with_data_dir(&data_dir);

        if let Some(path) = lookup("SPAMSIEVE_PATTERNS_FILE") {
            config.patterns_file = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("SPAMSIEVE_FILTERS_FILE") {
            config.default_patterns_file = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("SPAMSIEVE_CHAR_MAP_FILE") {
            config.char_map_file = Some(PathBuf::from(path));
        }
        config.initial_pattern = lookup("SPAMSIEVE_INITIAL_PATTERN").filter(|p| !p.trim().is_empty());

        if let Some(value) = lookup("SPAMSIEVE_BUILTIN_CHAR_MAP") {
            config.use_builtin_char_map = parse_flag("SPAMSIEVE_BUILTIN_CHAR_MAP", &value)?;
        }

        let normalization = &mut config.normalization;
        if let Some(value) = lookup("SPAMSIEVE_UNICODE_FOLD") {
            normalization.unicode_fold = parse_flag("SPAMSIEVE_UNICODE_FOLD", &value)?;
        }
        if let Some(value) = lookup("SPAMSIEVE_COLLAPSE_REPEATS") {
            normalization.collapse_repeats = parse_flag("SPAMSIEVE_COLLAPSE_REPEATS", &value)?;
        }
        if let Some(value) = lookup("SPAMSIEVE_MATCH_UNSUBSTITUTED") {
            normalization.match_unsubstituted = parse_flag("SPAMSIEVE_MATCH_UNSUBSTITUTED", &value)?;
        }
        if let Some(value) = lookup("SPAMSIEVE_EXHAUSTIVE_AMBIGUITY") {
            normalization.exhaustive_ambiguity = parse_flag("SPAMSIEVE_EXHAUSTIVE_AMBIGUITY", &value)?;
        }
        if let Some(value) = lookup("SPAMSIEVE_MAX_AMBIGUOUS_SYMBOLS") {
            normalization.max_ambiguous_symbols = value
                .trim()
                .parse()
                .with_context(|| format!("SPAMSIEVE_MAX_AMBIGUOUS_SYMBOLS must be a number, got '{}'", value))?;
        }
        if let Some(value) = lookup("SPAMSIEVE_MAX_VARIANTS") {
            normalization.max_variants = value
                .trim()
                .parse()
                .with_context(|| format!("SPAMSIEVE_MAX_VARIANTS must be a number, got '{}'", value))?;
        }

        config.validate()?;
        info!("Loaded filter config from environment (data dir '{}')", data_dir);
        Ok(config)
    }

    /// Load from a YAML, TOML or JSON file, chosen by extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: FilterConfig = match ConfigFormat::from_path(path) {
            ConfigFormat::Yaml => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config {}", path.display()))?,
            ConfigFormat::Toml => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config {}", path.display()))?,
            ConfigFormat::Json => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config {}", path.display()))?,
        };

        config.validate()?;
        debug!("Loaded filter configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path`, writing a default configuration there first if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        warn!("Config file {} not found, creating default", path.display());
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::with_data_dir(base);
        config.save(path)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match ConfigFormat::from_path(path) {
            ConfigFormat::Yaml => serde_yaml::to_string(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        info!("Wrote filter configuration to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.normalization.max_variants == 0 {
            return Err(anyhow::anyhow!("normalization.max_variants must be at least 1"));
        }

        for rule in &self.ambiguity_overrides {
            if rule.alternate.trim().is_empty() {
                return Err(anyhow::anyhow!("Ambiguity override has an empty alternate"));
            }
            if rule.canonical.chars().count() != 1 {
                return Err(anyhow::anyhow!(
                    "Ambiguity override '{}' must resolve to a single character, got '{}'",
                    rule.alternate,
                    rule.canonical
                ));
            }
            if rule.alternate != rule.alternate.to_lowercase() || rule.canonical != rule.canonical.to_lowercase() {
                return Err(anyhow::anyhow!(
                    "Ambiguity override '{}' -> '{}' must be lowercase",
                    rule.alternate,
                    rule.canonical
                ));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()) {
            Some(ext) if ext == "toml" => ConfigFormat::Toml,
            Some(ext) if ext == "json" => ConfigFormat::Json,
            _ => ConfigFormat::Yaml,
        }
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow::anyhow!("{} must be a boolean, got '{}'", name, other)),
    }
}
