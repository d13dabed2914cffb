//! Coordinate transforms between sensor and upright orientations.
//!
//! Detection runs on a pixel buffer rotated into the upright orientation;
//! these pure mappings carry points, boxes, keypoints, and whole detections
//! between the two frames for the six supported modes. Rotation centers are
//! derived from the actual frame dimensions, so the transforms are correct
//! for non-square frames.
//!
//! `rotate_detection` interprets its frame arguments as the dimensions of the
//! frame the input coordinates live in. `undo_rotate_detection` takes the
//! dimensions of the unrotated frame it maps back into, so that
//! `undo_rotate_detection(rotate_detection(d, mode, w, h), mode, w, h)`
//! round-trips for every mode.

use crate::detection::{Detection, RelativeBoundingBox, RelativeKeypoint};
use crate::util::{FaceKitError, FaceKitResult};

/// Orientation of the sensor buffer relative to the upright scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationMode {
    /// Buffer is already upright.
    Rotate0,
    /// Scene appears rotated 90° clockwise in the buffer.
    Rotate90,
    /// Scene appears rotated 180°.
    Rotate180,
    /// Scene appears rotated 90° counter-clockwise in the buffer.
    Rotate270,
    /// Scene appears mirrored left-right.
    HorizontalFlip,
    /// Scene appears mirrored top-bottom.
    VerticalFlip,
}

impl RotationMode {
    /// Maps a raw wire code to a rotation mode; unknown codes are a
    /// configuration error.
    pub fn from_raw(raw: i32) -> Option<RotationMode> {
        match raw {
            1 => Some(RotationMode::Rotate0),
            6 => Some(RotationMode::Rotate90),
            3 => Some(RotationMode::Rotate180),
            8 => Some(RotationMode::Rotate270),
            2 => Some(RotationMode::HorizontalFlip),
            4 => Some(RotationMode::VerticalFlip),
            _ => None,
        }
    }

    /// True for the quarter-turn modes that swap frame width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, RotationMode::Rotate90 | RotationMode::Rotate270)
    }
}

/// Rotates a point 90° clockwise about `(cx, cy)`.
pub fn rotate_point_90cw(cx: f32, cy: f32, px: f32, py: f32) -> (f32, f32) {
    (-(py - cy) + cx, (px - cx) + cy)
}

/// Rotates a point 90° counter-clockwise about `(cx, cy)`.
pub fn rotate_point_90ccw(cx: f32, cy: f32, px: f32, py: f32) -> (f32, f32) {
    ((py - cy) + cx, -(px - cx) + cy)
}

/// Mirrors a point across the vertical line `x = cx`.
pub fn horizontal_flip(cx: f32, px: f32, py: f32) -> (f32, f32) {
    (cx - (px - cx), py)
}

/// Mirrors a point across the horizontal line `y = cy`.
pub fn vertical_flip(cy: f32, px: f32, py: f32) -> (f32, f32) {
    (px, cy - (py - cy))
}

// Rotation center for a mode, given the dimensions of the frame the input
// coordinates live in. Quarter turns share one scalar center on both axes so
// that the frame maps onto the swapped-dimension frame with its origin at
// the origin.
fn rotation_center(mode: RotationMode, frame_width: f32, frame_height: f32) -> (f32, f32) {
    match mode {
        RotationMode::Rotate90 => (frame_height * 0.5, frame_height * 0.5),
        RotationMode::Rotate270 => (frame_width * 0.5, frame_width * 0.5),
        _ => (frame_width * 0.5, frame_height * 0.5),
    }
}

/// Rotates a bounding box from its current frame into the frame implied by
/// `mode`. Quarter turns swap the box width and height.
pub fn rotate_bounding_box(
    bbox: &RelativeBoundingBox,
    mode: RotationMode,
    frame_width: f32,
    frame_height: f32,
) -> RelativeBoundingBox {
    let left = bbox.xmin;
    let top = bbox.ymin;
    let right = bbox.xmin + bbox.width;
    let bottom = bbox.ymin + bbox.height;
    let (cx, cy) = rotation_center(mode, frame_width, frame_height);

    match mode {
        RotationMode::Rotate0 => *bbox,
        RotationMode::Rotate90 => {
            let (xmin, ymin) = rotate_point_90cw(cx, cy, left, bottom);
            RelativeBoundingBox {
                xmin,
                ymin,
                width: bbox.height,
                height: bbox.width,
            }
        }
        RotationMode::Rotate180 => {
            let (x, y) = rotate_point_90cw(cx, cy, right, bottom);
            let (xmin, ymin) = rotate_point_90cw(cx, cy, x, y);
            RelativeBoundingBox {
                xmin,
                ymin,
                width: bbox.width,
                height: bbox.height,
            }
        }
        RotationMode::Rotate270 => {
            let (xmin, ymin) = rotate_point_90ccw(cx, cy, right, top);
            RelativeBoundingBox {
                xmin,
                ymin,
                width: bbox.height,
                height: bbox.width,
            }
        }
        RotationMode::HorizontalFlip => {
            let (xmin, ymin) = horizontal_flip(cx, right, top);
            RelativeBoundingBox {
                xmin,
                ymin,
                width: bbox.width,
                height: bbox.height,
            }
        }
        RotationMode::VerticalFlip => {
            let (xmin, ymin) = vertical_flip(cy, left, bottom);
            RelativeBoundingBox {
                xmin,
                ymin,
                width: bbox.width,
                height: bbox.height,
            }
        }
    }
}

/// Rotates a single keypoint; same frame conventions as
/// [`rotate_bounding_box`].
pub fn rotate_keypoint(
    keypoint: &RelativeKeypoint,
    mode: RotationMode,
    frame_width: f32,
    frame_height: f32,
) -> RelativeKeypoint {
    let (cx, cy) = rotation_center(mode, frame_width, frame_height);
    let (x, y) = match mode {
        RotationMode::Rotate0 => (keypoint.x, keypoint.y),
        RotationMode::Rotate90 => rotate_point_90cw(cx, cy, keypoint.x, keypoint.y),
        RotationMode::Rotate180 => {
            let (x, y) = rotate_point_90cw(cx, cy, keypoint.x, keypoint.y);
            rotate_point_90cw(cx, cy, x, y)
        }
        RotationMode::Rotate270 => rotate_point_90ccw(cx, cy, keypoint.x, keypoint.y),
        RotationMode::HorizontalFlip => horizontal_flip(cx, keypoint.x, keypoint.y),
        RotationMode::VerticalFlip => vertical_flip(cy, keypoint.x, keypoint.y),
    };
    RelativeKeypoint::new(x, y)
}

/// Rotates every keypoint in a set independently.
pub fn rotate_keypoints(
    keypoints: &[RelativeKeypoint],
    mode: RotationMode,
    frame_width: f32,
    frame_height: f32,
) -> Vec<RelativeKeypoint> {
    keypoints
        .iter()
        .map(|kp| rotate_keypoint(kp, mode, frame_width, frame_height))
        .collect()
}

/// Rotates a detection's box and keypoints as one atomic operation,
/// preserving label and score.
///
/// `frame_width`/`frame_height` are the dimensions of the frame the
/// detection's coordinates are currently expressed in.
pub fn rotate_detection(
    detection: &Detection,
    mode: RotationMode,
    frame_width: f32,
    frame_height: f32,
) -> FaceKitResult<Detection> {
    let bbox = detection
        .relative_bounding_box()
        .ok_or(FaceKitError::InvalidInput(
            "rotation requires the relative representation",
        ))?;
    let keypoints = detection
        .relative_keypoints()
        .ok_or(FaceKitError::InvalidInput(
            "rotation requires the relative representation",
        ))?;

    Ok(Detection::relative(
        detection.label,
        detection.score,
        rotate_bounding_box(bbox, mode, frame_width, frame_height),
        rotate_keypoints(keypoints, mode, frame_width, frame_height),
    ))
}

/// Maps a detection in the upright (rotated) frame back into the unrotated
/// frame it originated from.
///
/// `frame_width`/`frame_height` are the dimensions of the unrotated frame
/// the result is mapped back into.
pub fn undo_rotate_detection(
    detection: &Detection,
    mode: RotationMode,
    frame_width: f32,
    frame_height: f32,
) -> FaceKitResult<Detection> {
    if mode == RotationMode::Rotate0 {
        return Ok(detection.clone());
    }
    let inverse = undo_rotation(mode);
    let (w, h) = if mode.swaps_dimensions() {
        (frame_height, frame_width)
    } else {
        (frame_width, frame_height)
    };
    rotate_detection(detection, inverse, w, h)
}

/// The mode that inverts `mode`: the quarter turns are each other's
/// inverses, everything else is self-inverse.
pub fn undo_rotation(mode: RotationMode) -> RotationMode {
    match mode {
        RotationMode::Rotate90 => RotationMode::Rotate270,
        RotationMode::Rotate270 => RotationMode::Rotate90,
        other => other,
    }
}
