use tokio::time::{Duration, Instant};

use super::detector::ModelReadiness;
use crate::attention::AttentionStatus;

/// Target spacing between detections (~10 samples per second).
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// What the sampling loop should do on one frame tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickAction {
    /// The model failed to load; sampling must not start.
    Abort(String),
    /// Nothing to sample, but the UI status should read this.
    Report(AttentionStatus),
    /// Too soon after the previous detection.
    Throttled,
    /// Run the detector on the current frame.
    Sample,
}

/// Decides per frame tick whether a detection is due. Frame ticks arrive at
/// display cadence with jitter; detections are spaced by timestamp delta.
#[derive(Debug, Clone)]
pub struct Sampler {
    interval: Duration,
    last_sample: Option<Instant>,
    announced_ready: bool,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_INTERVAL)
    }
}

impl Sampler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sample: None,
            announced_ready: false,
        }
    }

    pub fn plan(&mut self, now: Instant, model: &ModelReadiness, video_live: bool) -> TickAction {
        match model {
            ModelReadiness::Failed(reason) => return TickAction::Abort(reason.clone()),
            ModelReadiness::Loading => return TickAction::Report(AttentionStatus::LoadingModels),
            ModelReadiness::Ready if !self.announced_ready => {
                self.announced_ready = true;
                return TickAction::Report(AttentionStatus::Ready);
            }
            ModelReadiness::Ready => {}
        }

        if !video_live {
            return TickAction::Report(AttentionStatus::WaitingForCamera);
        }

        if let Some(last) = self.last_sample {
            if now.saturating_duration_since(last) < self.interval {
                return TickAction::Throttled;
            }
        }
        self.last_sample = Some(now);
        TickAction::Sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_model_reports_status() {
        let mut sampler = Sampler::default();
        let now = Instant::now();
        assert_eq!(
            sampler.plan(now, &ModelReadiness::Loading, true),
            TickAction::Report(AttentionStatus::LoadingModels)
        );
    }

    #[test]
    fn failed_model_aborts() {
        let mut sampler = Sampler::default();
        assert_eq!(
            sampler.plan(
                Instant::now(),
                &ModelReadiness::Failed("weights missing".into()),
                true
            ),
            TickAction::Abort("weights missing".into())
        );
    }

    #[test]
    fn ready_is_announced_once() {
        let mut sampler = Sampler::default();
        let now = Instant::now();
        assert_eq!(
            sampler.plan(now, &ModelReadiness::Ready, true),
            TickAction::Report(AttentionStatus::Ready)
        );
        assert_eq!(
            sampler.plan(now, &ModelReadiness::Ready, true),
            TickAction::Sample
        );
    }

    #[test]
    fn waits_for_camera() {
        let mut sampler = Sampler::default();
        let now = Instant::now();
        sampler.plan(now, &ModelReadiness::Ready, false);
        assert_eq!(
            sampler.plan(now, &ModelReadiness::Ready, false),
            TickAction::Report(AttentionStatus::WaitingForCamera)
        );
    }

    #[test]
    fn throttles_by_timestamp_delta() {
        let mut sampler = Sampler::new(Duration::from_millis(100));
        let start = Instant::now();
        sampler.plan(start, &ModelReadiness::Ready, true);

        assert_eq!(sampler.plan(start, &ModelReadiness::Ready, true), TickAction::Sample);
        // jittery frame ticks inside the window are skipped
        for ms in [16, 33, 51, 99] {
            assert_eq!(
                sampler.plan(start + Duration::from_millis(ms), &ModelReadiness::Ready, true),
                TickAction::Throttled
            );
        }
        let next = start + Duration::from_millis(117);
        assert_eq!(sampler.plan(next, &ModelReadiness::Ready, true), TickAction::Sample);
        // the window restarts from the late tick, not from the ideal schedule
        assert_eq!(
            sampler.plan(start + Duration::from_millis(200), &ModelReadiness::Ready, true),
            TickAction::Throttled
        );
    }
}
