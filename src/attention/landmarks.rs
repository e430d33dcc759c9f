use serde::{Deserialize, Serialize};

use crate::error::SensingError;

/// Number of points in the standard 68-point face layout.
pub const LANDMARK_COUNT: usize = 68;

pub const LEFT_JAW: usize = 0;
pub const CHIN: usize = 8;
pub const RIGHT_JAW: usize = 16;
pub const NOSE_BRIDGE_TOP: usize = 27;
pub const NOSE_TIP: usize = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

/// Face keypoints for a single video frame, in image pixel coordinates.
///
/// Indices follow the 68-point layout, so index 30 is always the nose tip.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Point>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point>) -> Result<Self, SensingError> {
        if points.len() < LANDMARK_COUNT {
            return Err(SensingError::MalformedLandmarks {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn point(&self, index: usize) -> Point {
        self.points[index]
    }

    pub fn nose_tip(&self) -> Point {
        self.point(NOSE_TIP)
    }

    pub fn left_jaw(&self) -> Point {
        self.point(LEFT_JAW)
    }

    pub fn right_jaw(&self) -> Point {
        self.point(RIGHT_JAW)
    }

    pub fn chin(&self) -> Point {
        self.point(CHIN)
    }

    pub fn nose_bridge(&self) -> Point {
        self.point(NOSE_BRIDGE_TOP)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A single face found by the external detector.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetection {
    pub bounding_box: FaceBox,
    pub landmarks: LandmarkSet,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_layouts() {
        let err = LandmarkSet::new(vec![Point::default(); 5]).unwrap_err();
        assert_eq!(
            err,
            SensingError::MalformedLandmarks {
                expected: LANDMARK_COUNT,
                actual: 5
            }
        );
    }

    #[test]
    fn exposes_named_keypoints() {
        let set = fixtures::frontal();
        assert_eq!(set.nose_tip(), Point::new(50.0, 100.0));
        assert_eq!(set.left_jaw().x, 0.0);
        assert_eq!(set.right_jaw().x, 100.0);
        assert_eq!(set.nose_bridge().y, 60.0);
        assert_eq!(set.chin().y, 160.0);
    }

    #[test]
    fn converts_pairs_into_points() {
        assert_eq!(Point::from([1.5, -2.0]), Point::new(1.5, -2.0));
    }
}
