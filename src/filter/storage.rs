use anyhow::{Context, Result};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A JSON document on disk, always rewritten wholesale.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when the file does not exist yet.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        debug!("Loaded {}", self.path.display());
        Ok(Some(value))
    }

    /// Write to a sibling temp file, then rename over the target.
    pub fn save<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, json)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!("Saved {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_loads_none() {
        let temp_dir = tempdir().unwrap();
        let file = JsonFile::new(temp_dir.path().join("patterns.json"));
        let loaded: Option<Vec<String>> = file.load().unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_and_reload_unicode() {
        let temp_dir = tempdir().unwrap();
        let file = JsonFile::new(temp_dir.path().join("nested").join("char_map.json"));

        let mut table = BTreeMap::new();
        table.insert("р".to_string(), vec!["p".to_string(), "r".to_string()]);
        file.save(&table).unwrap();

        let raw = fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains("\"р\""));
        assert!(!temp_dir.path().join("nested").join("char_map.json.tmp").exists());

        let loaded: Option<BTreeMap<String, Vec<String>>> = file.load().unwrap();
        assert_eq!(loaded, Some(table));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("patterns.json");
        fs::write(&path, "{ not json").unwrap();

        let loaded: Result<Option<Vec<String>>> = JsonFile::new(&path).load();
        let err = loaded.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse"));
    }
}
