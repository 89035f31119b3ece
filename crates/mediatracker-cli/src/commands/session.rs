use crate::output::Output;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use media_tracker_config::{Config, FilePreferenceStore, MemoryPreferenceStore, PathManager, PreferenceStore};
use media_tracker_core::{AppState, CatalogView, CoreError, NoticeLevel, NoticeQueue, NotificationBus};
use media_tracker_gateway::{CatalogGateway, HttpGateway};
use media_tracker_models::MediaKind;
use std::process::ExitCode;
use std::sync::Arc;

/// Everything one command needs: config, the active list's view and the
/// notices it produced
pub struct Session {
    config: Config,
    app_state: AppState,
    kind: MediaKind,
    kind_from_flag: bool,
    notices: NoticeQueue,
    // Kept alive for as long as the view is subscribed to it
    _bus: NotificationBus,
    view: CatalogView,
}

impl Session {
    pub fn open(kind: Option<MediaKind>) -> Result<Self> {
        let paths = PathManager::default();
        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
        config
            .validate()
            .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

        let app_state = AppState::load(open_preferences(&paths));
        let kind_from_flag = kind.is_some();
        let kind = kind.unwrap_or_else(|| app_state.active_tab());

        let gateway: Arc<dyn CatalogGateway> =
            Arc::new(HttpGateway::from_config(&config).wrap_err("Failed to set up the catalog gateway")?);
        let bus = NotificationBus::new();
        let notices = NoticeQueue::new();
        let view = CatalogView::new(kind, gateway, &bus, Arc::new(notices.clone()))
            .with_category(config.ui.default_category);

        tracing::debug!(kind = %kind, from_flag = kind_from_flag, "Session opened");
        Ok(Self {
            config,
            app_state,
            kind,
            kind_from_flag,
            notices,
            _bus: bus,
            view,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn view(&self) -> &CatalogView {
        &self.view
    }

    /// Print queued notices; true when one of them reported a problem
    pub fn flush_notices(&self, output: &Output) -> bool {
        let mut reported = false;
        for notice in self.notices.drain() {
            reported |= notice.level != NoticeLevel::Success;
            output.notice(&notice);
        }
        reported
    }

    /// An explicit `--kind` switches the remembered tab, like clicking it.
    ///
    /// A core failure already shown as a notice ends with a failing exit
    /// code and no second report.
    pub fn finish(mut self, result: Result<()>, output: &Output) -> Result<ExitCode> {
        if self.kind_from_flag && self.app_state.active_tab() != self.kind {
            self.app_state.set_active_tab(self.kind);
        }
        let reported = self.flush_notices(output);
        settle(result, reported)
    }
}

fn settle(result: Result<()>, reported: bool) -> Result<ExitCode> {
    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(report) if reported && report.downcast_ref::<CoreError>().is_some() => {
            tracing::debug!(error = ?report, "Command failed, already reported");
            Ok(ExitCode::FAILURE)
        }
        Err(report) => Err(report),
    }
}

/// File-backed preferences, or an in-memory stand-in when the file is unreadable
pub fn open_preferences(paths: &PathManager) -> Box<dyn PreferenceStore> {
    let path = paths.preferences_file();
    match FilePreferenceStore::open(path.clone()) {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Preferences unreadable, not persisting this run");
            Box::new(MemoryPreferenceStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_tracker_gateway::GatewayError;

    fn submit_failure() -> Result<()> {
        Err(CoreError::Submit {
            kind: MediaKind::Movie,
            source: GatewayError::Simulated("boom".to_string()),
        }
        .into())
    }

    #[test]
    fn test_reported_core_failure_is_not_raised_again() {
        assert!(settle(submit_failure(), true).is_ok());
    }

    #[test]
    fn test_unreported_failures_still_raise() {
        assert!(settle(submit_failure(), false).is_err());
        let other: Result<()> = Err(color_eyre::eyre::eyre!("Failed to read confirmation"));
        assert!(settle(other, true).is_err());
    }

    #[test]
    fn test_success_settles_ok() {
        assert!(settle(Ok(()), false).is_ok());
    }
}
