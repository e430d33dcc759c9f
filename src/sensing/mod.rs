pub mod controller;
pub mod detector;
pub mod loop_worker;
pub mod sampler;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::SensingController;
pub use detector::{Frame, LandmarkDetector, ModelReadiness, VideoSource};
