//! Anchor grids and proposal decoding for the multi-scale detector.

use crate::detection::{Detection, RelativeBoundingBox, RelativeKeypoint, NUM_KEYPOINTS};
use crate::detector::ScaleParams;
use crate::inference::StrideMaps;
use crate::util::{FaceKitError, FaceKitResult};

/// A fixed reference box used as the decoding origin for regression offsets
/// at one feature-map location.
///
/// Anchors are regenerated per inference call and never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    /// Horizontal center.
    pub x_center: f32,
    /// Vertical center.
    pub y_center: f32,
    /// Anchor width.
    pub width: f32,
    /// Anchor height.
    pub height: f32,
}

/// Generates the anchor set for one stride: the cross product of aspect
/// ratios and scales at the given base size, centered at the origin.
pub fn generate_anchors(base_size: u32, aspect_ratios: &[f32], scales: &[f32]) -> Vec<Anchor> {
    let mut anchors = Vec::with_capacity(aspect_ratios.len() * scales.len());
    for &ratio in aspect_ratios {
        let width = base_size as f32 * ratio.sqrt();
        let height = base_size as f32 / ratio.sqrt();
        for &scale in scales {
            anchors.push(Anchor {
                x_center: 0.0,
                y_center: 0.0,
                width: width * scale,
                height: height * scale,
            });
        }
    }
    anchors
}

/// Decodes one stride's raw maps into candidate detections, appending every
/// candidate whose score passes `prob_threshold` to `proposals`.
///
/// Anchor centers advance by `stride` across the score map, one tile per
/// spatial cell. Box corners keep the inclusive-corner convention
/// (`width = x2 - x1 + 1`); all coordinates are divided by the preprocessing
/// resize ratio to land in input-image pixel space.
pub fn generate_proposals(
    anchors: &[Anchor],
    stride: u32,
    prob_threshold: f32,
    maps: &StrideMaps,
    scale: &ScaleParams,
    proposals: &mut Vec<Detection>,
) -> FaceKitResult<()> {
    let width = maps.scores.width();
    let height = maps.scores.height();
    let feat_stride = stride as f32;

    for (q, anchor) in anchors.iter().enumerate() {
        let score_plane = maps
            .scores
            .plane(q)
            .ok_or(FaceKitError::InvalidInput("score map has too few channels"))?;
        let mut box_planes: [&[f32]; 4] = [&[]; 4];
        for (c, plane) in box_planes.iter_mut().enumerate() {
            *plane = maps
                .boxes
                .plane(q * 4 + c)
                .ok_or(FaceKitError::InvalidInput("box map has too few channels"))?;
        }
        let mut kps_planes: [&[f32]; NUM_KEYPOINTS * 2] = [&[]; NUM_KEYPOINTS * 2];
        for (c, plane) in kps_planes.iter_mut().enumerate() {
            *plane = maps.keypoints.plane(q * NUM_KEYPOINTS * 2 + c).ok_or(
                FaceKitError::InvalidInput("keypoint map has too few channels"),
            )?;
        }

        let mut cy = anchor.y_center;
        for i in 0..height {
            let mut cx = anchor.x_center;
            for j in 0..width {
                let index = i * width + j;
                let score = score_plane[index];
                if score >= prob_threshold {
                    let dx = box_planes[0][index] * feat_stride;
                    let dy = box_planes[1][index] * feat_stride;
                    let dw = box_planes[2][index] * feat_stride;
                    let dh = box_planes[3][index] * feat_stride;

                    let x1 = (cx - dx) / scale.ratio;
                    let y1 = (cy - dy) / scale.ratio;
                    let x2 = (cx + dw) / scale.ratio;
                    let y2 = (cy + dh) / scale.ratio;

                    let bounding_box = RelativeBoundingBox {
                        xmin: x1,
                        ymin: y1,
                        width: x2 - x1 + 1.0,
                        height: y2 - y1 + 1.0,
                    };

                    let mut keypoints = Vec::with_capacity(NUM_KEYPOINTS);
                    for k in 0..NUM_KEYPOINTS {
                        let kp_x = cx + kps_planes[2 * k][index] * feat_stride;
                        let kp_y = cy + kps_planes[2 * k + 1][index] * feat_stride;
                        keypoints.push(RelativeKeypoint::new(
                            kp_x / scale.ratio,
                            kp_y / scale.ratio,
                        ));
                    }

                    proposals.push(Detection::relative(0, score, bounding_box, keypoints));
                }
                cx += feat_stride;
            }
            cy += feat_stride;
        }
    }

    Ok(())
}
