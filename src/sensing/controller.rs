use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::{info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::attention::{AttentionState, SmoothingFilter};
use crate::error::SensingError;
use crate::settings::SensingSettings;

use super::detector::{LandmarkDetector, VideoSource};
use super::loop_worker::{sensing_loop, LoopTiming};

/// Owns the sampling loop for one detection view. The published attention
/// state outlives individual runs of the loop.
pub struct SensingController {
    handle: Option<JoinHandle<Result<(), SensingError>>>,
    cancel_token: Option<CancellationToken>,
    state_tx: watch::Sender<AttentionState>,
}

impl Default for SensingController {
    fn default() -> Self {
        Self::new()
    }
}

impl SensingController {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(AttentionState::default());
        Self {
            handle: None,
            cancel_token: None,
            state_tx,
        }
    }

    /// Read-only view of the published attention state.
    pub fn subscribe(&self) -> watch::Receiver<AttentionState> {
        self.state_tx.subscribe()
    }

    pub fn current(&self) -> AttentionState {
        *self.state_tx.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn start_sensing(
        &mut self,
        detector: Arc<dyn LandmarkDetector>,
        video: Arc<dyn VideoSource>,
        settings: &SensingSettings,
    ) -> Result<()> {
        if self.is_active() {
            bail!("sensing already active");
        }
        // Reap a loop that ended on its own (model failure) before restarting.
        self.stop_sensing().await?;

        let filter = SmoothingFilter::new(settings.smoothing_window, settings.smoothing_threshold)?;
        let timing = LoopTiming::from(settings);

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sensing_loop(
            detector,
            video,
            filter,
            timing,
            self.state_tx.clone(),
            cancel_token.clone(),
        ));

        info!(
            "sensing started (sample every {:?}, window {} / threshold {})",
            timing.sample_interval, settings.smoothing_window, settings.smoothing_threshold
        );

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancels the loop and waits for it to exit. No detection runs after
    /// this returns.
    pub async fn stop_sensing(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        match handle.await.context("sensing loop task failed to join")? {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("sensing loop had ended before stop: {}", err);
                Ok(())
            }
        }
    }
}
