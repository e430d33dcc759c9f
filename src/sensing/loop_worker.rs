use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::attention::{
    classify, AttentionSample, AttentionState, AttentionStatus, FaceDetection, SmoothingFilter,
};
use crate::error::SensingError;
use crate::settings::SensingSettings;

use super::detector::{Frame, LandmarkDetector, VideoSource};
use super::sampler::{Sampler, TickAction};

// Set to false to silence per-frame logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Timing knobs for one run of the sampling loop.
#[derive(Debug, Clone, Copy)]
pub struct LoopTiming {
    pub frame_interval: Duration,
    pub sample_interval: Duration,
    pub detection_timeout: Duration,
}

impl From<&SensingSettings> for LoopTiming {
    fn from(settings: &SensingSettings) -> Self {
        Self {
            frame_interval: settings.frame_interval(),
            sample_interval: settings.sample_interval(),
            detection_timeout: settings.detection_timeout(),
        }
    }
}

/// Samples the camera until cancelled, publishing the smoothed attention
/// state after every change.
///
/// Detection is awaited inline, so at most one request is ever in flight.
/// Cancellation is raced against both the frame tick and the detection, and
/// an interrupted detection future is dropped. Returns
/// `SensingError::ModelUnavailable` if the model fails to load; no other
/// failure ends the loop.
pub async fn sensing_loop(
    detector: Arc<dyn LandmarkDetector>,
    video: Arc<dyn VideoSource>,
    mut filter: SmoothingFilter,
    timing: LoopTiming,
    publisher: watch::Sender<AttentionState>,
    cancel_token: CancellationToken,
) -> Result<(), SensingError> {
    let mut ticker = tokio::time::interval(timing.frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sampler = Sampler::new(timing.sample_interval);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("sensing loop shutting down");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let frame = video.latest_frame().filter(Frame::is_live);
        let readiness = detector.readiness();

        match sampler.plan(Instant::now(), &readiness, frame.is_some()) {
            TickAction::Abort(reason) => {
                log_error!("landmark model failed to load: {}", reason);
                filter.report_status(AttentionStatus::ModelUnavailable);
                publisher.send_replace(filter.published());
                return Err(SensingError::ModelUnavailable(reason));
            }
            TickAction::Report(status) => {
                if filter.report_status(status) {
                    log_info!("sensing status: {}", status);
                    publisher.send_replace(filter.published());
                }
            }
            TickAction::Throttled => {}
            TickAction::Sample => {
                let Some(frame) = frame else {
                    continue;
                };
                if cancel_token.is_cancelled() {
                    log_info!("sensing loop shutting down");
                    return Ok(());
                }

                let sample = tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => {
                        log_info!("sensing loop cancelled during detection");
                        return Ok(());
                    }
                    sample = sample_frame(detector.as_ref(), &frame, timing.detection_timeout) => sample,
                };

                log_debug!("raw sample: {:?}", sample);
                if filter.ingest(sample) {
                    let published = filter.published();
                    log_info!(
                        "attention -> {} (focused={})",
                        published.status,
                        published.focused
                    );
                    publisher.send_replace(published);
                }
            }
        }
    }
}

/// Runs one detection and classifies it. Failures and timeouts are
/// indistinguishable from an empty frame downstream.
pub async fn sample_frame(
    detector: &dyn LandmarkDetector,
    frame: &Frame,
    timeout: Duration,
) -> AttentionSample {
    match detect_face(detector, frame, timeout).await {
        Ok(Some(face)) => classify(&face.landmarks),
        Ok(None) => AttentionSample::no_face(),
        Err(err) => {
            log_warn!("treating tick as no face: {}", err);
            AttentionSample::no_face()
        }
    }
}

async fn detect_face(
    detector: &dyn LandmarkDetector,
    frame: &Frame,
    timeout: Duration,
) -> Result<Option<FaceDetection>, SensingError> {
    match tokio::time::timeout(timeout, detector.detect(frame)).await {
        Ok(Ok(face)) => Ok(face),
        Ok(Err(err)) => Err(SensingError::Detection(format!("{err:#}"))),
        Err(_) => Err(SensingError::DetectionTimeout(timeout)),
    }
}
