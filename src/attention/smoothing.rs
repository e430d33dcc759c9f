use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::classifier::{AttentionReason, AttentionSample};
use crate::error::SensingError;

pub const DEFAULT_WINDOW: usize = 5;
pub const DEFAULT_THRESHOLD: usize = 3;

/// Everything the pipeline can report to the UI as its current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttentionStatus {
    Initializing,
    LoadingModels,
    Ready,
    ModelUnavailable,
    WaitingForCamera,
    Focused,
    LookingLeft,
    LookingRight,
    LookingDown,
    NoFace,
}

impl AttentionStatus {
    pub fn label(self) -> &'static str {
        match self {
            AttentionStatus::Initializing => "Initializing...",
            AttentionStatus::LoadingModels => "Loading models...",
            AttentionStatus::Ready => "Ready - Look at the camera",
            AttentionStatus::ModelUnavailable => "Error loading models",
            AttentionStatus::WaitingForCamera => "Waiting for camera...",
            AttentionStatus::Focused => AttentionReason::Focused.label(),
            AttentionStatus::LookingLeft => AttentionReason::LookingLeft.label(),
            AttentionStatus::LookingRight => AttentionReason::LookingRight.label(),
            AttentionStatus::LookingDown => AttentionReason::LookingDown.label(),
            AttentionStatus::NoFace => AttentionReason::NoFace.label(),
        }
    }
}

impl From<AttentionReason> for AttentionStatus {
    fn from(reason: AttentionReason) -> Self {
        match reason {
            AttentionReason::Focused => AttentionStatus::Focused,
            AttentionReason::LookingLeft => AttentionStatus::LookingLeft,
            AttentionReason::LookingRight => AttentionStatus::LookingRight,
            AttentionReason::LookingDown => AttentionStatus::LookingDown,
            AttentionReason::NoFace => AttentionStatus::NoFace,
        }
    }
}

impl fmt::Display for AttentionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The smoothed attention signal observed by the timer and the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionState {
    pub focused: bool,
    pub status: AttentionStatus,
}

impl Default for AttentionState {
    fn default() -> Self {
        Self {
            focused: false,
            status: AttentionStatus::Initializing,
        }
    }
}

/// Fixed-capacity FIFO of the most recent raw samples.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<AttentionSample>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, sample: AttentionSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn focused_count(&self) -> usize {
        self.samples.iter().filter(|s| s.focused).count()
    }

    pub fn distracted_count(&self) -> usize {
        self.len() - self.focused_count()
    }

    /// Reason carried by the newest distracted sample, if any.
    pub fn latest_distraction(&self) -> Option<AttentionReason> {
        self.samples
            .iter()
            .rev()
            .find(|s| !s.focused)
            .map(|s| s.reason)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttentionSample> {
        self.samples.iter()
    }
}

/// Returns the state the buffer agrees on, or `None` when neither side has
/// reached `threshold` samples.
pub fn consensus(history: &HistoryBuffer, threshold: usize) -> Option<AttentionState> {
    if history.focused_count() >= threshold {
        return Some(AttentionState {
            focused: true,
            status: AttentionStatus::Focused,
        });
    }
    if history.distracted_count() >= threshold {
        let reason = history
            .latest_distraction()
            .unwrap_or(AttentionReason::NoFace);
        return Some(AttentionState {
            focused: false,
            status: reason.into(),
        });
    }
    None
}

/// Debounces raw samples so the published state only moves on a T-of-W
/// supermajority.
#[derive(Debug, Clone)]
pub struct SmoothingFilter {
    history: HistoryBuffer,
    threshold: usize,
    published: AttentionState,
}

impl Default for SmoothingFilter {
    fn default() -> Self {
        Self {
            history: HistoryBuffer::new(DEFAULT_WINDOW),
            threshold: DEFAULT_THRESHOLD,
            published: AttentionState::default(),
        }
    }
}

impl SmoothingFilter {
    pub fn new(window: usize, threshold: usize) -> Result<Self, SensingError> {
        validate_smoothing(window, threshold)?;
        Ok(Self {
            history: HistoryBuffer::new(window),
            threshold,
            published: AttentionState::default(),
        })
    }

    /// Appends one sample and re-evaluates consensus. Returns true when the
    /// published state changed.
    pub fn ingest(&mut self, sample: AttentionSample) -> bool {
        self.history.push(sample);
        match consensus(&self.history, self.threshold) {
            Some(next) => self.replace(next),
            None => false,
        }
    }

    /// Overrides only the status text, keeping the focused flag. Used for
    /// loader and camera states that carry no attention information.
    pub fn report_status(&mut self, status: AttentionStatus) -> bool {
        self.replace(AttentionState {
            focused: self.published.focused,
            status,
        })
    }

    pub fn published(&self) -> AttentionState {
        self.published
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    fn replace(&mut self, next: AttentionState) -> bool {
        let changed = next != self.published;
        self.published = next;
        changed
    }
}

/// A threshold must be reachable and must not let both sides agree at once.
pub fn validate_smoothing(window: usize, threshold: usize) -> Result<(), SensingError> {
    if threshold == 0 || threshold > window || threshold * 2 <= window {
        return Err(SensingError::InvalidSmoothing { window, threshold });
    }
    Ok(())
}
