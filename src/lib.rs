pub mod attention;
pub mod error;
pub mod models;
pub mod replay;
pub mod sensing;
pub mod settings;
pub mod timer;
pub mod utils;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, watch};

pub use attention::{AttentionState, AttentionStatus};
pub use error::SensingError;
pub use models::{goal_progress, productivity_score, SessionSummary};
pub use sensing::{LandmarkDetector, SensingController, VideoSource};
pub use settings::{Settings, SettingsStore};
pub use timer::{TimerCommand, TimerController, TimerEvent, TimerMode, TimerSnapshot, TimerState};

/// Initializes `env_logger` from `RUST_LOG`. The default level is `Info`,
/// lowered to `Debug` when `FOCUSGUARD_DEBUG` is set.
pub fn init_logging() {
    let level = if debug_mode() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

pub(crate) fn debug_mode() -> bool {
    std::env::var("FOCUSGUARD_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// One detection view: the sensing loop feeding a timer.
pub struct FocusGuard {
    settings: Settings,
    sensing: SensingController,
    timer: TimerController,
}

impl FocusGuard {
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let sensing = SensingController::new();
        let timer = TimerController::new(sensing.subscribe(), &settings.timer);
        Ok(Self {
            settings,
            sensing,
            timer,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn timer(&self) -> &TimerController {
        &self.timer
    }

    /// Timer notifications for a sound layer, or `None` when sound is
    /// switched off in settings.
    pub fn sound_cues(&self) -> Option<broadcast::Receiver<TimerEvent>> {
        self.settings
            .sound_enabled
            .then(|| self.timer.subscribe_events())
    }

    pub fn attention(&self) -> watch::Receiver<AttentionState> {
        self.sensing.subscribe()
    }

    pub async fn start_detection(
        &mut self,
        detector: Arc<dyn LandmarkDetector>,
        video: Arc<dyn VideoSource>,
    ) -> Result<()> {
        self.sensing
            .start_sensing(detector, video, &self.settings.sensing)
            .await
    }

    pub async fn stop_detection(&mut self) -> Result<()> {
        self.sensing.stop_sensing().await
    }

    /// Stops sensing and closes the timer session.
    pub async fn shutdown(&mut self) -> Result<SessionSummary> {
        self.stop_detection().await?;
        self.timer.end_session().await
    }

    pub fn daily_goal_progress(&self, focus_secs: u64) -> f64 {
        goal_progress(focus_secs, self.settings.daily_goal_secs)
    }
}
