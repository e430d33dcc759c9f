//! Test doubles for the detector and camera ports.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use image::RgbImage;

use super::detector::{Frame, LandmarkDetector, ModelReadiness, VideoSource};
use crate::attention::landmarks::fixtures;
use crate::attention::{FaceBox, FaceDetection};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Script {
    Frontal,
    Yaw(f32),
    NoFace,
    Fail,
    Hang,
}

pub struct ScriptedDetector {
    readiness: ModelReadiness,
    script: Mutex<VecDeque<Script>>,
    fallback: Script,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedDetector {
    pub fn repeating(script: Script) -> Arc<Self> {
        Self::sequence(Vec::new(), script)
    }

    /// Plays `steps` in order, then repeats `fallback` forever.
    pub fn sequence(steps: Vec<Script>, fallback: Script) -> Arc<Self> {
        Arc::new(Self {
            readiness: ModelReadiness::Ready,
            script: Mutex::new(steps.into()),
            fallback,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn failing_model(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            readiness: ModelReadiness::Failed(reason.to_string()),
            script: Mutex::new(VecDeque::new()),
            fallback: Script::NoFace,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    fn next_step(&self) -> Script {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LandmarkDetector for ScriptedDetector {
    fn readiness(&self) -> ModelReadiness {
        self.readiness.clone()
    }

    async fn detect(&self, _frame: &Frame) -> Result<Option<FaceDetection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let landmarks = match self.next_step() {
            Script::Frontal => fixtures::frontal(),
            Script::Yaw(ratio) => fixtures::with_yaw(ratio),
            Script::NoFace => return Ok(None),
            Script::Fail => return Err(anyhow!("inference backend error")),
            Script::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending never resolves")
            }
        };

        Ok(Some(FaceDetection {
            bounding_box: FaceBox::default(),
            landmarks,
        }))
    }
}

pub struct StaticVideo {
    frame: Option<Frame>,
}

impl StaticVideo {
    pub fn live() -> Arc<Self> {
        Arc::new(Self {
            frame: Some(Frame::new(RgbImage::new(4, 4))),
        })
    }

    pub fn not_ready() -> Arc<Self> {
        Arc::new(Self { frame: None })
    }
}

impl VideoSource for StaticVideo {
    fn latest_frame(&self) -> Option<Frame> {
        self.frame.clone()
    }
}
