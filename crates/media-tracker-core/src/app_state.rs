use media_tracker_config::PreferenceStore;
use media_tracker_models::MediaKind;
use tracing::{debug, warn};

/// Preference key holding the last active tab
pub const ACTIVE_TAB_KEY: &str = "last_active_tab";

/// Process-level UI state that outlives a single view.
///
/// Only the active tab is kept. It is non-critical: an unreadable value
/// falls back to movies and a failed write is logged and ignored.
pub struct AppState {
    active_tab: MediaKind,
    preferences: Box<dyn PreferenceStore>,
}

impl AppState {
    pub fn load(preferences: Box<dyn PreferenceStore>) -> Self {
        let active_tab = match preferences.get(ACTIVE_TAB_KEY) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!(value = %raw, error = %e, "Ignoring unreadable last active tab");
                MediaKind::default()
            }),
            None => MediaKind::default(),
        };
        debug!(tab = %active_tab, "Restored active tab");
        Self { active_tab, preferences }
    }

    pub fn active_tab(&self) -> MediaKind {
        self.active_tab
    }

    pub fn set_active_tab(&mut self, kind: MediaKind) {
        self.active_tab = kind;
        if let Err(e) = self.preferences.set(ACTIVE_TAB_KEY, kind.as_tag()) {
            warn!(tab = %kind, error = %e, "Could not persist active tab");
        }
    }
}
