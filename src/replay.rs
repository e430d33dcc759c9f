//! Recorded landmark traces played back through the detector port.
//!
//! A trace is JSON lines, one detector result per line:
//! `{"landmarks": [[x, y], ...]}` for a face, `{"landmarks": null}` for no
//! face and `{"error": "..."}` for a failed detection.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use image::RgbImage;
use serde::Deserialize;
use tokio::sync::Notify;

use crate::attention::{FaceBox, FaceDetection, LandmarkSet, Point};
use crate::sensing::{Frame, LandmarkDetector, ModelReadiness, VideoSource};

#[derive(Debug, Deserialize)]
struct TraceLine {
    #[serde(default)]
    landmarks: Option<Vec<[f32; 2]>>,
    #[serde(default)]
    error: Option<String>,
}

/// Plays back a trace, one line per detection call. Once the trace runs out
/// every call reports no face and `finished` resolves.
pub struct ReplayDetector {
    lines: Mutex<VecDeque<TraceLine>>,
    exhausted: Notify,
}

impl ReplayDetector {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid trace {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let lines = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).with_context(|| format!("line {}", index + 1))
            })
            .collect::<Result<VecDeque<TraceLine>>>()?;

        if lines.is_empty() {
            bail!("trace has no samples");
        }

        Ok(Self {
            lines: Mutex::new(lines),
            exhausted: Notify::new(),
        })
    }

    /// Resolves once a detection has been requested past the end of the trace.
    pub async fn finished(&self) {
        self.exhausted.notified().await;
    }

    fn next_line(&self) -> Result<Option<TraceLine>> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|_| anyhow!("trace lock poisoned"))?;
        Ok(lines.pop_front())
    }
}

#[async_trait]
impl LandmarkDetector for ReplayDetector {
    fn readiness(&self) -> ModelReadiness {
        ModelReadiness::Ready
    }

    async fn detect(&self, _frame: &Frame) -> Result<Option<FaceDetection>> {
        let Some(line) = self.next_line()? else {
            self.exhausted.notify_one();
            return Ok(None);
        };

        if let Some(error) = line.error {
            bail!(error);
        }

        let Some(points) = line.landmarks else {
            return Ok(None);
        };

        let landmarks = LandmarkSet::new(points.into_iter().map(Point::from).collect())?;
        Ok(Some(FaceDetection {
            bounding_box: FaceBox::default(),
            landmarks,
        }))
    }
}

/// A camera that always has the same live frame.
pub struct ReplayVideo {
    frame: Frame,
}

impl Default for ReplayVideo {
    fn default() -> Self {
        Self {
            frame: Frame::new(RgbImage::new(1, 1)),
        }
    }
}

impl VideoSource for ReplayVideo {
    fn latest_frame(&self) -> Option<Frame> {
        Some(self.frame.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attention::landmarks::{fixtures, LANDMARK_COUNT};
    use crate::error::SensingError;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tokio::time::{timeout, Duration};

    fn frame() -> Frame {
        ReplayVideo::default().latest_frame().unwrap()
    }

    fn frontal_line() -> String {
        let face = fixtures::frontal();
        let points: Vec<[f32; 2]> = (0..LANDMARK_COUNT)
            .map(|index| {
                let point = face.point(index);
                [point.x, point.y]
            })
            .collect();
        serde_json::json!({ "landmarks": points }).to_string()
    }

    #[tokio::test]
    async fn plays_each_line_kind_in_order() {
        let trace = format!(
            "{}\n{{\"landmarks\": null}}\n\n{{\"error\": \"inference crashed\"}}\n",
            frontal_line()
        );
        let detector = ReplayDetector::parse(&trace).unwrap();

        let face = detector.detect(&frame()).await.unwrap().unwrap();
        assert_eq!(face.landmarks, fixtures::frontal());
        assert_eq!(detector.detect(&frame()).await.unwrap(), None);
        let err = detector.detect(&frame()).await.unwrap_err();
        assert_eq!(err.to_string(), "inference crashed");
    }

    #[tokio::test]
    async fn short_landmark_lines_are_malformed() {
        let detector = ReplayDetector::parse(r#"{"landmarks": [[1, 2], [3, 4], [5, 6]]}"#).unwrap();

        let err = detector.detect(&frame()).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<SensingError>(),
            Some(&SensingError::MalformedLandmarks {
                expected: LANDMARK_COUNT,
                actual: 3
            })
        );
    }

    #[tokio::test]
    async fn running_past_the_end_signals_finished() {
        let detector = ReplayDetector::parse(r#"{"landmarks": null}"#).unwrap();
        assert_eq!(detector.detect(&frame()).await.unwrap(), None);
        assert!(timeout(Duration::from_millis(10), detector.finished())
            .await
            .is_err());

        assert_eq!(detector.detect(&frame()).await.unwrap(), None);
        timeout(Duration::from_millis(10), detector.finished())
            .await
            .unwrap();
    }

    #[test]
    fn empty_trace_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();
        let err = ReplayDetector::load(file.path()).err().unwrap();
        assert!(format!("{err:#}").contains("trace has no samples"));
    }

    #[test]
    fn bad_json_reports_the_line_number() {
        let err = ReplayDetector::parse("{\"landmarks\": null}\nnot json").err().unwrap();
        assert!(format!("{err:#}").starts_with("line 2"));
    }
}
