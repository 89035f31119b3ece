use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Key-value storage port for non-critical UI preferences.
///
/// Writes go through immediately; callers treat failures as non-fatal.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct PreferencesData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// TOML file backed preferences (`preferences.toml` in the data dir)
pub struct FilePreferenceStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FilePreferenceStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            values: HashMap::new(),
        }
    }

    /// Open and load in one go
    pub fn open(path: PathBuf) -> Result<Self> {
        let mut store = Self::new(path);
        store.load()?;
        Ok(store)
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let prefs: PreferencesData = toml::from_str(&content)?;
            self.values = prefs.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let prefs = PreferencesData {
            data: self.values.clone(),
        };
        let content = toml::to_string_pretty(&prefs)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        self.save()
    }
}

/// Process-local preferences, nothing survives the process
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferenceStore {
    values: HashMap<String, String>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}
