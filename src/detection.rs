//! Detection types produced by the decoder and consumed downstream.
//!
//! Bounding boxes and keypoints are tagged unions over relative and absolute
//! representations. Within one `Detection` both fields carry the same tag;
//! mixing representations is a programming error, which every consumer
//! surfaces via its `Result` instead of panicking.

use crate::geometry::Point2;

/// Number of facial keypoints per detection, in fixed order:
/// left eye, right eye, nose, left mouth corner, right mouth corner.
///
/// The order is load-bearing for alignment.
pub const NUM_KEYPOINTS: usize = 5;

/// A keypoint in relative or pixel units (`f32`).
pub type RelativeKeypoint = Point2<f32>;
/// A keypoint snapped to integer pixel coordinates.
pub type AbsoluteKeypoint = Point2<i32>;

/// Bounding box in relative or pixel units (`f32`).
///
/// Width and height may be negative only transiently while a box is being
/// built from two corner points; results returned by suppression or rotation
/// always have non-negative dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RelativeBoundingBox {
    /// Left edge.
    pub xmin: f32,
    /// Top edge.
    pub ymin: f32,
    /// Box width.
    pub width: f32,
    /// Box height.
    pub height: f32,
}

/// Bounding box snapped to integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AbsoluteBoundingBox {
    /// Left edge.
    pub xmin: i32,
    /// Top edge.
    pub ymin: i32,
    /// Box width.
    pub width: i32,
    /// Box height.
    pub height: i32,
}

/// Bounding box location in either representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingBox {
    /// Float (relative or pixel) representation.
    Relative(RelativeBoundingBox),
    /// Integer pixel representation.
    Absolute(AbsoluteBoundingBox),
}

/// Keypoint set in either representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Keypoints {
    /// Float (relative or pixel) representation.
    Relative(Vec<RelativeKeypoint>),
    /// Integer pixel representation.
    Absolute(Vec<AbsoluteKeypoint>),
}

/// One detected face: classification label, score, box, and keypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Label id in the classification model output.
    pub label: i32,
    /// Detection score, for this model a probability in [0, 1].
    pub score: f32,
    /// Bounding box location.
    pub bounding_box: BoundingBox,
    /// Facial keypoints, ordered per [`NUM_KEYPOINTS`].
    pub keypoints: Keypoints,
}

impl Detection {
    /// Creates a detection in the relative representation.
    pub fn relative(
        label: i32,
        score: f32,
        bounding_box: RelativeBoundingBox,
        keypoints: Vec<RelativeKeypoint>,
    ) -> Self {
        Self {
            label,
            score,
            bounding_box: BoundingBox::Relative(bounding_box),
            keypoints: Keypoints::Relative(keypoints),
        }
    }

    /// Zero-area placeholder emitted by suppression when
    /// `return_empty_detections` is set and nothing survived.
    pub fn empty() -> Self {
        Self::relative(0, 0.0, RelativeBoundingBox::default(), Vec::new())
    }

    /// Returns the bounding box if this detection uses the relative
    /// representation.
    pub fn relative_bounding_box(&self) -> Option<&RelativeBoundingBox> {
        match &self.bounding_box {
            BoundingBox::Relative(bbox) => Some(bbox),
            BoundingBox::Absolute(_) => None,
        }
    }

    /// Returns the keypoints if this detection uses the relative
    /// representation.
    pub fn relative_keypoints(&self) -> Option<&[RelativeKeypoint]> {
        match &self.keypoints {
            Keypoints::Relative(kps) => Some(kps),
            Keypoints::Absolute(_) => None,
        }
    }
}
