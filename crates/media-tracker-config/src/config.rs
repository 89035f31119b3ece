use media_tracker_models::StatusCategory;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that overrides the gateway base URL
pub const API_URL_ENV: &str = "MEDIATRACKER_API_URL";

const DEVELOPMENT_API_URL: &str = "http://localhost:5000";
const PRODUCTION_API_URL: &str = "https://movietracker-backend.vercel.app";

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Environment::Development => DEVELOPMENT_API_URL,
            Environment::Production => PRODUCTION_API_URL,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    #[serde(default)]
    pub environment: Environment,

    /// Explicit base URL; wins over the environment default
    #[serde(default)]
    pub base_url: Option<String>,

    /// No timeout unless set. A hung request otherwise stays pending.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            base_url: None,
            request_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UiConfig {
    /// Category selected when a list is first shown
    #[serde(default)]
    pub default_category: StatusCategory,

    #[serde(default = "default_true")]
    pub show_recommendations: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_category: StatusCategory::All,
            show_recommendations: default_true(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("mediatracker/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Missing file means defaults
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let base_url = self.resolved_base_url_from(self.gateway.base_url.clone());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "Gateway base URL must start with http:// or https:// (got '{}')",
                base_url
            ));
        }

        if let Some(0) = self.gateway.request_timeout_secs {
            return Err(anyhow::anyhow!(
                "gateway.request_timeout_secs must be greater than zero; remove it to disable the timeout"
            ));
        }

        Ok(())
    }

    /// Base URL precedence: `MEDIATRACKER_API_URL`, then `gateway.base_url`, then the environment default
    pub fn resolved_base_url(&self) -> String {
        let from_env = std::env::var(API_URL_ENV).ok().filter(|v| !v.trim().is_empty());
        self.resolved_base_url_from(from_env.or_else(|| self.gateway.base_url.clone()))
    }

    fn resolved_base_url_from(&self, explicit: Option<String>) -> String {
        explicit
            .unwrap_or_else(|| self.gateway.environment.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string()
    }
}
