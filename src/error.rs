//! Failure taxonomy for the attention pipeline.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while turning camera frames into attention samples.
///
/// Only `ModelUnavailable` stops sampling; every other variant is recovered
/// inside the loop by treating the tick as a `NoFace` sample.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SensingError {
    #[error("landmark model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("landmark detection failed: {0}")]
    Detection(String),

    #[error("landmark detection timed out after {0:?}")]
    DetectionTimeout(Duration),

    #[error("expected at least {expected} landmarks, detector returned {actual}")]
    MalformedLandmarks { expected: usize, actual: usize },

    #[error("smoothing threshold {threshold} is not a strict majority of window {window}")]
    InvalidSmoothing { window: usize, threshold: usize },
}
