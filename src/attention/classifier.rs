use serde::{Deserialize, Serialize};

use super::landmarks::LandmarkSet;

/// Nose further right than this fraction of the jaw width means the head is
/// turned to the user's right.
pub const YAW_RATIO_MIN: f32 = 0.30;
/// Nose further left than this fraction means the head is turned left.
pub const YAW_RATIO_MAX: f32 = 0.70;
/// Nose-to-chin over bridge-to-nose below this means the head is tilted down.
pub const PITCH_RATIO_MIN: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttentionReason {
    Focused,
    LookingLeft,
    LookingRight,
    LookingDown,
    NoFace,
}

impl AttentionReason {
    pub fn label(self) -> &'static str {
        match self {
            AttentionReason::Focused => "Focused",
            AttentionReason::LookingLeft => "Looking Left",
            AttentionReason::LookingRight => "Looking Right",
            AttentionReason::LookingDown => "Looking Down",
            AttentionReason::NoFace => "No face detected",
        }
    }
}

/// Raw per-frame verdict, before smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionSample {
    pub focused: bool,
    pub reason: AttentionReason,
}

impl AttentionSample {
    pub const fn focused() -> Self {
        Self {
            focused: true,
            reason: AttentionReason::Focused,
        }
    }

    pub const fn distracted(reason: AttentionReason) -> Self {
        Self {
            focused: false,
            reason,
        }
    }

    /// Sample injected when the detector finds no face or fails for a tick.
    pub const fn no_face() -> Self {
        Self::distracted(AttentionReason::NoFace)
    }
}

/// Horizontal nose position as a fraction of jaw width. `None` when the jaw
/// width is zero or the geometry is not finite.
pub fn yaw_ratio(landmarks: &LandmarkSet) -> Option<f32> {
    let left = landmarks.left_jaw();
    let face_width = landmarks.right_jaw().x - left.x;
    if face_width == 0.0 || !face_width.is_finite() {
        return None;
    }
    let ratio = (landmarks.nose_tip().x - left.x) / face_width;
    ratio.is_finite().then_some(ratio)
}

/// Nose-to-chin over bridge-to-nose. `None` when the bridge is not above the
/// nose tip, in which case the pitch check is skipped.
pub fn pitch_ratio(landmarks: &LandmarkSet) -> Option<f32> {
    let nose = landmarks.nose_tip();
    let bridge_to_nose = nose.y - landmarks.nose_bridge().y;
    if bridge_to_nose.is_nan() || bridge_to_nose <= 0.0 {
        return None;
    }
    let ratio = (landmarks.chin().y - nose.y) / bridge_to_nose;
    ratio.is_finite().then_some(ratio)
}

/// Classifies one face as looking at the screen or not.
///
/// Yaw is checked first, then pitch. A degenerate jaw width is reported as
/// `NoFace` rather than letting NaN reach the thresholds.
pub fn classify(landmarks: &LandmarkSet) -> AttentionSample {
    let Some(yaw) = yaw_ratio(landmarks) else {
        return AttentionSample::no_face();
    };

    if yaw < YAW_RATIO_MIN {
        return AttentionSample::distracted(AttentionReason::LookingRight);
    }
    if yaw > YAW_RATIO_MAX {
        return AttentionSample::distracted(AttentionReason::LookingLeft);
    }

    if let Some(pitch) = pitch_ratio(landmarks) {
        if pitch < PITCH_RATIO_MIN {
            return AttentionSample::distracted(AttentionReason::LookingDown);
        }
    }

    AttentionSample::focused()
}
