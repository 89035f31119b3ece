use super::session::open_preferences;
use crate::output::Output;
use color_eyre::Result;
use media_tracker_config::PathManager;
use media_tracker_core::AppState;
use media_tracker_models::MediaKind;
use serde_json::json;

pub fn run_tab(selected: Option<MediaKind>, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let mut app_state = AppState::load(open_preferences(&paths));

    if let Some(kind) = selected {
        app_state.set_active_tab(kind);
    }
    let active = app_state.active_tab();

    if !output.is_human() {
        output.json(&json!({ "type": "tab", "active": active }));
    } else if selected.is_some() {
        output.success(format!("Default list is now {}", active.plural_label()));
    } else {
        output.info(format!("Default list: {}", active.plural_label()));
    }
    Ok(())
}
