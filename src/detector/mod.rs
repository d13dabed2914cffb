//! Multi-scale single-shot face detection pipeline.
//!
//! `FaceDetector` drives the external runtime over one upright frame, decodes
//! the per-stride proposal maps, and reduces the candidates with IoU
//! suppression. Decoding runs per-stride in parallel when the `rayon`
//! feature is enabled.

use crate::detection::Detection;
use crate::frame::RgbFrame;
use crate::inference::{DetectorRuntime, StrideMaps};
use crate::nms::{NmsAlgorithm, NonMaxSuppressionOptions, NonMaxSuppressor, OverlapType};
use crate::trace::{trace_event, trace_span};
use crate::util::FaceKitResult;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

pub mod anchors;

pub use anchors::{generate_anchors, generate_proposals, Anchor};

/// Target size of the longer input side after the preprocessing resize.
pub const DETECT_TARGET_SIZE: u32 = 256;
/// Padded input dimensions are rounded up to a multiple of this.
pub const PAD_MULTIPLE: u32 = 32;

/// Aspect ratios shared by every stride of this model.
const ASPECT_RATIOS: [f32; 1] = [1.0];
/// Anchor scales shared by every stride of this model.
const ANCHOR_SCALES: [f32; 2] = [1.0, 2.0];

/// Feature stride paired with its anchor base size.
#[derive(Debug, Clone, Copy)]
struct StrideSpec {
    stride: u32,
    base_size: u32,
}

const STRIDE_SPECS: [StrideSpec; 3] = [
    StrideSpec {
        stride: 8,
        base_size: 16,
    },
    StrideSpec {
        stride: 16,
        base_size: 64,
    },
    StrideSpec {
        stride: 32,
        base_size: 256,
    },
];

/// Geometry of the preprocessing resize, threaded into proposal decoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
    /// Resize ratio from input pixels to network pixels.
    pub ratio: f32,
    /// Network input width after right-padding to [`PAD_MULTIPLE`].
    pub padded_width: u32,
    /// Network input height after bottom-padding to [`PAD_MULTIPLE`].
    pub padded_height: u32,
}

/// Computes the resize and padding geometry for an input frame: the longer
/// side is scaled to [`DETECT_TARGET_SIZE`], the shorter side follows with
/// integer truncation, and both are padded up to a multiple of
/// [`PAD_MULTIPLE`].
pub fn preprocess_scale(width: u32, height: u32) -> ScaleParams {
    let (resized_w, resized_h, ratio) = if width > height {
        let ratio = DETECT_TARGET_SIZE as f32 / width as f32;
        (
            DETECT_TARGET_SIZE,
            (height as f32 * ratio) as u32,
            ratio,
        )
    } else {
        let ratio = DETECT_TARGET_SIZE as f32 / height as f32;
        ((width as f32 * ratio) as u32, DETECT_TARGET_SIZE, ratio)
    };

    ScaleParams {
        ratio,
        padded_width: resized_w.div_ceil(PAD_MULTIPLE) * PAD_MULTIPLE,
        padded_height: resized_h.div_ceil(PAD_MULTIPLE) * PAD_MULTIPLE,
    }
}

/// Decode-and-suppress pipeline around an external detection runtime.
pub struct FaceDetector {
    runtime: Box<dyn DetectorRuntime>,
}

impl FaceDetector {
    /// Wraps a loaded runtime handle.
    pub fn new(runtime: Box<dyn DetectorRuntime>) -> Self {
        Self { runtime }
    }

    /// Detects faces in one upright frame.
    ///
    /// Candidates below `prob_threshold` are dropped at decode time; the
    /// survivors are reduced with IoU suppression at `nms_threshold`.
    pub fn detect(
        &self,
        frame: &RgbFrame,
        prob_threshold: f32,
        nms_threshold: f32,
    ) -> FaceKitResult<Vec<Detection>> {
        let _span = trace_span!(
            "detect",
            width = frame.width(),
            height = frame.height()
        )
        .entered();

        let scale = preprocess_scale(frame.width() as u32, frame.height() as u32);
        let maps = self.runtime.infer(frame, &scale)?;
        let per_stride: [(&StrideMaps, StrideSpec); 3] = [
            (&maps.stride8, STRIDE_SPECS[0]),
            (&maps.stride16, STRIDE_SPECS[1]),
            (&maps.stride32, STRIDE_SPECS[2]),
        ];

        let mut proposals = decode_strides(&per_stride, prob_threshold, &scale)?;
        trace_event!("proposals", count = proposals.len());

        // Ascending presort; suppression re-sorts descending internally.
        proposals.sort_by(|a, b| a.score.total_cmp(&b.score));

        let suppressor = NonMaxSuppressor::new(NonMaxSuppressionOptions {
            min_suppression_threshold: nms_threshold,
            overlap_type: OverlapType::IntersectionOverUnion,
            return_empty_detections: true,
            algorithm: NmsAlgorithm::Default,
            ..Default::default()
        });
        let detections = suppressor.suppress(&proposals)?;
        trace_event!("detections", count = detections.len());
        Ok(detections)
    }
}

#[cfg(not(feature = "rayon"))]
fn decode_strides(
    per_stride: &[(&StrideMaps, StrideSpec); 3],
    prob_threshold: f32,
    scale: &ScaleParams,
) -> FaceKitResult<Vec<Detection>> {
    let mut proposals = Vec::new();
    for &(maps, spec) in per_stride {
        let anchors = generate_anchors(spec.base_size, &ASPECT_RATIOS, &ANCHOR_SCALES);
        generate_proposals(
            &anchors,
            spec.stride,
            prob_threshold,
            maps,
            scale,
            &mut proposals,
        )?;
    }
    Ok(proposals)
}

#[cfg(feature = "rayon")]
fn decode_strides(
    per_stride: &[(&StrideMaps, StrideSpec); 3],
    prob_threshold: f32,
    scale: &ScaleParams,
) -> FaceKitResult<Vec<Detection>> {
    let decoded: Vec<FaceKitResult<Vec<Detection>>> = per_stride
        .par_iter()
        .map(|&(maps, spec)| {
            let anchors = generate_anchors(spec.base_size, &ASPECT_RATIOS, &ANCHOR_SCALES);
            let mut proposals = Vec::new();
            generate_proposals(
                &anchors,
                spec.stride,
                prob_threshold,
                maps,
                scale,
                &mut proposals,
            )?;
            Ok(proposals)
        })
        .collect();

    let mut proposals = Vec::new();
    for result in decoded {
        proposals.extend(result?);
    }
    Ok(proposals)
}

#[cfg(test)]
mod tests {
    use super::preprocess_scale;

    #[test]
    fn landscape_frame_scales_by_width() {
        let scale = preprocess_scale(512, 256);
        assert!((scale.ratio - 0.5).abs() < 1e-6);
        assert_eq!(scale.padded_width, 256);
        assert_eq!(scale.padded_height, 128);
    }

    #[test]
    fn portrait_frame_scales_by_height_and_pads_width() {
        let scale = preprocess_scale(100, 200);
        assert!((scale.ratio - 1.28).abs() < 1e-6);
        assert_eq!(scale.padded_width, 128);
        assert_eq!(scale.padded_height, 256);
    }

    #[test]
    fn truncated_short_side_rounds_up_to_pad_multiple() {
        let scale = preprocess_scale(150, 99);
        // 99 * (256 / 150) = 168.96, truncated to 168, padded to 192.
        assert_eq!(scale.padded_width, 256);
        assert_eq!(scale.padded_height, 192);
    }

    #[test]
    fn square_frame_uses_height_branch() {
        let scale = preprocess_scale(256, 256);
        assert!((scale.ratio - 1.0).abs() < 1e-6);
        assert_eq!(scale.padded_width, 256);
        assert_eq!(scale.padded_height, 256);
    }
}
