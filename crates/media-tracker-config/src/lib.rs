pub mod config;
pub mod paths;
pub mod preferences;

pub use config::{Config, Environment, GatewayConfig, UiConfig, API_URL_ENV};
pub use paths::{PathManager, base_path_override};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
