//! Ports for the external collaborators the sampling loop depends on: the
//! face-landmark model and the camera.

use anyhow::Result;
use async_trait::async_trait;
use image::RgbImage;

use crate::attention::FaceDetection;

/// Load state of the landmark model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReadiness {
    Loading,
    Ready,
    Failed(String),
}

/// One captured camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// A frame is usable once the camera has negotiated real dimensions.
    pub fn is_live(&self) -> bool {
        self.image.width() > 0 && self.image.height() > 0
    }
}

/// Face-landmark inference. Implementations find at most one face.
#[async_trait]
pub trait LandmarkDetector: Send + Sync {
    fn readiness(&self) -> ModelReadiness;

    /// Returns `Ok(None)` when no face is visible. Errors are transient and
    /// are treated by the caller as a missing face for that tick.
    async fn detect(&self, frame: &Frame) -> Result<Option<FaceDetection>>;
}

/// A camera feed polled once per frame tick.
pub trait VideoSource: Send + Sync {
    /// The newest frame, or `None` while the camera is still starting.
    fn latest_frame(&self) -> Option<Frame>;
}
