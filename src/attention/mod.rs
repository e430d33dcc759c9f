pub mod classifier;
pub mod landmarks;
pub mod smoothing;

pub use classifier::{classify, AttentionReason, AttentionSample};
pub use landmarks::{FaceBox, FaceDetection, LandmarkSet, Point};
pub use smoothing::{AttentionState, AttentionStatus, HistoryBuffer, SmoothingFilter};
