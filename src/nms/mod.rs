//! Non-maximum suppression over candidate detections.
//!
//! Two algorithms are provided: greedy score-order suppression and weighted
//! box averaging. Both operate on the relative representation only.
//!
//! The weighted algorithm clusters on `min_score_threshold`, not on
//! `min_suppression_threshold`; callers tune the two independently.

use crate::detection::{Detection, RelativeBoundingBox, RelativeKeypoint};
use crate::geometry::Rect;
use crate::util::{FaceKitError, FaceKitResult};

/// Overlap similarity measure between two boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapType {
    /// Intersection over the union bounding rectangle.
    Jaccard,
    /// Intersection over the area of the second box.
    ModifiedJaccard,
    /// Intersection over union.
    IntersectionOverUnion,
}

/// Suppression algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NmsAlgorithm {
    /// Greedy suppression in descending score order.
    Default,
    /// Score-weighted box averaging per overlap cluster.
    ///
    /// Only supports the relative bounding-box representation.
    Weighted,
}

/// Options controlling a suppression pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonMaxSuppressionOptions {
    /// Maximum number of detections to return; `-1` disables the cap.
    pub max_num_detections: i32,
    /// Score below which the candidate walk stops entirely; values `<= 0`
    /// disable the cutoff.
    pub min_score_threshold: f32,
    /// Overlap similarity above which a candidate is suppressed by an
    /// already-accepted detection (default algorithm only).
    pub min_suppression_threshold: f32,
    /// Overlap measure used for suppression decisions.
    pub overlap_type: OverlapType,
    /// When set, an empty result is reported as a single zero-area
    /// placeholder detection instead of an empty list.
    pub return_empty_detections: bool,
    /// Which suppression algorithm to run.
    pub algorithm: NmsAlgorithm,
}

impl Default for NonMaxSuppressionOptions {
    fn default() -> Self {
        Self {
            max_num_detections: -1,
            min_score_threshold: -1.0,
            min_suppression_threshold: 1.0,
            overlap_type: OverlapType::Jaccard,
            return_empty_detections: false,
            algorithm: NmsAlgorithm::Default,
        }
    }
}

/// Computes the overlap similarity between two boxes.
///
/// Returns 0 when the boxes do not intersect or the normalization area is
/// not positive. For [`OverlapType::ModifiedJaccard`] the normalization is
/// the area of `b`.
pub fn overlap_similarity(
    overlap_type: OverlapType,
    a: &RelativeBoundingBox,
    b: &RelativeBoundingBox,
) -> f32 {
    let rect_a = Rect::from_xywh(a.xmin, a.ymin, a.width, a.height);
    let rect_b = Rect::from_xywh(b.xmin, b.ymin, b.width, b.height);
    if !rect_a.intersects(&rect_b) {
        return 0.0;
    }

    let intersection_area = rect_a.intersect(&rect_b).area();
    let normalization = match overlap_type {
        OverlapType::Jaccard => rect_a.union_bounds(&rect_b).area(),
        OverlapType::ModifiedJaccard => rect_b.area(),
        OverlapType::IntersectionOverUnion => rect_a.area() + rect_b.area() - intersection_area,
    };

    if normalization > 0.0 {
        intersection_area / normalization
    } else {
        0.0
    }
}

/// Reduces overlapping candidates to a final accepted set.
pub struct NonMaxSuppressor {
    options: NonMaxSuppressionOptions,
}

impl NonMaxSuppressor {
    /// Creates a suppressor with the given options.
    pub fn new(options: NonMaxSuppressionOptions) -> Self {
        Self { options }
    }

    /// The options this suppressor runs with.
    pub fn options(&self) -> &NonMaxSuppressionOptions {
        &self.options
    }

    /// Runs suppression over `candidates` and returns the accepted
    /// detections.
    ///
    /// Candidates are re-sorted by descending score internally; the input
    /// order does not matter. An empty input is not an error.
    pub fn suppress(&self, candidates: &[Detection]) -> FaceKitResult<Vec<Detection>> {
        let mut indexed_scores: Vec<(usize, f32)> = candidates
            .iter()
            .enumerate()
            .map(|(i, det)| (i, det.score))
            .collect();
        indexed_scores.sort_by(|a, b| b.1.total_cmp(&a.1));

        let max_num_detections = if self.options.max_num_detections > -1 {
            self.options.max_num_detections as usize
        } else {
            indexed_scores.len()
        };

        let mut output = match self.options.algorithm {
            NmsAlgorithm::Default => {
                self.suppress_greedy(&indexed_scores, candidates, max_num_detections)?
            }
            NmsAlgorithm::Weighted => self.suppress_weighted(&indexed_scores, candidates)?,
        };

        if output.is_empty() && self.options.return_empty_detections {
            output.push(Detection::empty());
        }
        Ok(output)
    }

    fn suppress_greedy(
        &self,
        indexed_scores: &[(usize, f32)],
        candidates: &[Detection],
        max_num_detections: usize,
    ) -> FaceKitResult<Vec<Detection>> {
        let mut output: Vec<Detection> = Vec::new();
        let mut retained: Vec<RelativeBoundingBox> = Vec::new();

        for &(index, _) in indexed_scores {
            let detection = &candidates[index];
            if self.options.min_score_threshold > 0.0
                && detection.score < self.options.min_score_threshold
            {
                break;
            }

            let bbox = relative_box(detection)?;
            let suppressed = retained.iter().any(|kept| {
                overlap_similarity(self.options.overlap_type, kept, bbox)
                    > self.options.min_suppression_threshold
            });

            if !suppressed {
                output.push(detection.clone());
                retained.push(*bbox);
            }
            if output.len() >= max_num_detections {
                break;
            }
        }

        Ok(output)
    }

    fn suppress_weighted(
        &self,
        indexed_scores: &[(usize, f32)],
        candidates: &[Detection],
    ) -> FaceKitResult<Vec<Detection>> {
        let mut remaining: Vec<(usize, f32)> = indexed_scores.to_vec();
        let mut output: Vec<Detection> = Vec::new();

        while !remaining.is_empty() {
            let original_size = remaining.len();
            let seed = &candidates[remaining[0].0];
            if self.options.min_score_threshold > 0.0
                && seed.score < self.options.min_score_threshold
            {
                break;
            }

            let seed_box = relative_box(seed)?;
            let mut cluster: Vec<(usize, f32)> = Vec::new();
            let mut rest: Vec<(usize, f32)> = Vec::new();
            for &(index, score) in &remaining {
                let bbox = relative_box(&candidates[index])?;
                // Clustering cutoff is min_score_threshold, not
                // min_suppression_threshold.
                let similarity = overlap_similarity(self.options.overlap_type, bbox, seed_box);
                if similarity > self.options.min_score_threshold {
                    cluster.push((index, score));
                } else {
                    rest.push((index, score));
                }
            }

            let mut weighted = seed.clone();
            if !cluster.is_empty() {
                let num_keypoints = seed
                    .relative_keypoints()
                    .ok_or(FaceKitError::InvalidInput(
                        "weighted suppression requires the relative representation",
                    ))?
                    .len();
                let mut keypoint_sums = vec![0.0f32; num_keypoints * 2];
                let mut weighted_xmin = 0.0f32;
                let mut weighted_ymin = 0.0f32;
                let mut weighted_xmax = 0.0f32;
                let mut weighted_ymax = 0.0f32;
                let mut total_score = 0.0f32;

                for &(index, score) in &cluster {
                    total_score += score;
                    let bbox = relative_box(&candidates[index])?;
                    weighted_xmin += bbox.xmin * score;
                    weighted_ymin += bbox.ymin * score;
                    weighted_xmax += (bbox.xmin + bbox.width) * score;
                    weighted_ymax += (bbox.ymin + bbox.height) * score;

                    let keypoints = candidates[index].relative_keypoints().ok_or(
                        FaceKitError::InvalidInput(
                            "weighted suppression requires the relative representation",
                        ),
                    )?;
                    for (i, kp) in keypoints.iter().enumerate().take(num_keypoints) {
                        keypoint_sums[i * 2] += kp.x * score;
                        keypoint_sums[i * 2 + 1] += kp.y * score;
                    }
                }

                let xmin = weighted_xmin / total_score;
                let ymin = weighted_ymin / total_score;
                weighted.bounding_box =
                    crate::detection::BoundingBox::Relative(RelativeBoundingBox {
                        xmin,
                        ymin,
                        width: weighted_xmax / total_score - xmin,
                        height: weighted_ymax / total_score - ymin,
                    });
                weighted.keypoints = crate::detection::Keypoints::Relative(
                    (0..num_keypoints)
                        .map(|i| {
                            RelativeKeypoint::new(
                                keypoint_sums[i * 2] / total_score,
                                keypoint_sums[i * 2 + 1] / total_score,
                            )
                        })
                        .collect(),
                );
            }

            output.push(weighted);
            // Cycle breaker: stop if an iteration failed to shrink the
            // remaining set.
            if original_size == rest.len() {
                break;
            }
            remaining = rest;
        }

        Ok(output)
    }
}

fn relative_box(detection: &Detection) -> FaceKitResult<&RelativeBoundingBox> {
    detection
        .relative_bounding_box()
        .ok_or(FaceKitError::InvalidInput(
            "suppression requires the relative representation",
        ))
}
