use anyhow::Result;
use std::path::{Path, PathBuf};

/// Base directory override, mostly for containers and tests
pub fn base_path_override() -> Option<PathBuf> {
    std::env::var("MEDIATRACKER_BASE_PATH").ok().map(PathBuf::from)
}

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("mediatracker");

        Ok(Self::from_base(base_dir))
    }

    /// Config files at the base level, data and logs in subdirectories
    pub fn from_base(base: PathBuf) -> Self {
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Key-value UI preferences (last active tab)
    pub fn preferences_file(&self) -> PathBuf {
        self.data_dir.join("preferences.toml")
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("mediatracker.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        if let Some(base) = base_path_override() {
            return Self::from_base(base);
        }

        // Platform-specific paths (e.g., ~/.config/mediatracker on Linux)
        Self::new().unwrap_or_else(|_| Self::from_base(PathBuf::from(".mediatracker")))
    }
}
