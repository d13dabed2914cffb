use facekit::detector::{generate_anchors, generate_proposals, Anchor};
use facekit::{
    preprocess_scale, DetectionMaps, DetectorRuntime, FaceDetector, FaceKitResult, RgbFrame,
    ScaleParams, StrideMaps, Tensor,
};

/// Plays the inference runtime: returns zeroed maps of the correct shapes,
/// with one planted stride-8 proposal.
struct PlantedRuntime {
    score: f32,
}

fn zero_maps(stride: u32, scale: &ScaleParams) -> StrideMaps {
    let w = (scale.padded_width / stride) as usize;
    let h = (scale.padded_height / stride) as usize;
    StrideMaps {
        scores: Tensor::zeros(2, h, w).unwrap(),
        boxes: Tensor::zeros(8, h, w).unwrap(),
        keypoints: Tensor::zeros(20, h, w).unwrap(),
    }
}

impl DetectorRuntime for PlantedRuntime {
    fn infer(&self, _frame: &RgbFrame, scale: &ScaleParams) -> FaceKitResult<DetectionMaps> {
        let mut stride8 = zero_maps(8, scale);
        let width = stride8.scores.width();
        // Anchor 0, cell (2, 2): centers at 16 feature pixels.
        let index = 2 * width + 2;
        stride8.scores.plane_mut(0).unwrap()[index] = self.score;
        stride8.boxes.plane_mut(0).unwrap()[index] = 1.0; // dx
        stride8.boxes.plane_mut(1).unwrap()[index] = 1.0; // dy
        stride8.boxes.plane_mut(2).unwrap()[index] = 2.0; // dw
        stride8.boxes.plane_mut(3).unwrap()[index] = 2.0; // dh

        Ok(DetectionMaps {
            stride8,
            stride16: zero_maps(16, scale),
            stride32: zero_maps(32, scale),
        })
    }
}

#[test]
fn planted_proposal_decodes_into_input_pixel_space() {
    let frame = RgbFrame::zeroed(512, 256).unwrap();
    let detector = FaceDetector::new(Box::new(PlantedRuntime { score: 0.9 }));
    let detections = detector.detect(&frame, 0.6, 0.45).unwrap();
    assert_eq!(detections.len(), 1);

    let det = &detections[0];
    assert_eq!(det.score, 0.9);
    let bbox = det.relative_bounding_box().unwrap();
    // ratio = 0.5; cx = cy = 16; dx = dy = 8; dw = dh = 16.
    // x1 = (16 - 8) / 0.5 = 16, x2 = (16 + 16) / 0.5 = 64.
    assert!((bbox.xmin - 16.0).abs() < 1e-3);
    assert!((bbox.ymin - 16.0).abs() < 1e-3);
    assert!((bbox.width - 49.0).abs() < 1e-3);
    assert!((bbox.height - 49.0).abs() < 1e-3);

    // Untouched keypoint regressions land on the cell center.
    let kps = det.relative_keypoints().unwrap();
    assert_eq!(kps.len(), 5);
    assert!((kps[0].x - 32.0).abs() < 1e-3);
    assert!((kps[0].y - 32.0).abs() < 1e-3);
}

#[test]
fn below_threshold_plant_yields_placeholder_only() {
    let frame = RgbFrame::zeroed(512, 256).unwrap();
    let detector = FaceDetector::new(Box::new(PlantedRuntime { score: 0.4 }));
    let detections = detector.detect(&frame, 0.6, 0.45).unwrap();
    // The detector requests a placeholder for empty results.
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].score, 0.0);
    assert_eq!(detections[0].relative_bounding_box().unwrap().width, 0.0);
}

#[test]
fn stride_specs_tile_the_feature_grid() {
    // Two anchors per stride, six total across the three strides.
    let scale = preprocess_scale(256, 256);
    assert_eq!(scale.padded_width, 256);
    let per_stride: Vec<Vec<Anchor>> = [16u32, 64, 256]
        .iter()
        .map(|&base| generate_anchors(base, &[1.0], &[1.0, 2.0]))
        .collect();
    assert!(per_stride.iter().all(|anchors| anchors.len() == 2));

    // A full-grid decode visits width * height cells per anchor.
    let maps = StrideMaps {
        scores: Tensor::new(vec![1.0; 2 * 4 * 4], 2, 4, 4).unwrap(),
        boxes: Tensor::zeros(8, 4, 4).unwrap(),
        keypoints: Tensor::zeros(20, 4, 4).unwrap(),
    };
    let mut proposals = Vec::new();
    generate_proposals(
        &per_stride[0],
        8,
        0.5,
        &maps,
        &ScaleParams {
            ratio: 1.0,
            padded_width: 32,
            padded_height: 32,
        },
        &mut proposals,
    )
    .unwrap();
    assert_eq!(proposals.len(), 2 * 4 * 4);
}

#[test]
fn candidates_reach_suppression_sorted_by_score() {
    // Two overlapping plants at different scores across anchors; the higher
    // one must win suppression regardless of decode order.
    struct TwoPlants;
    impl DetectorRuntime for TwoPlants {
        fn infer(&self, _frame: &RgbFrame, scale: &ScaleParams) -> FaceKitResult<DetectionMaps> {
            let mut stride8 = zero_maps(8, scale);
            let width = stride8.scores.width();
            let index = 2 * width + 2;
            // Anchor 0 fires weakly, anchor 1 fires strongly at the same cell.
            stride8.scores.plane_mut(0).unwrap()[index] = 0.7;
            stride8.scores.plane_mut(1).unwrap()[index] = 0.95;
            Ok(DetectionMaps {
                stride8,
                stride16: zero_maps(16, scale),
                stride32: zero_maps(32, scale),
            })
        }
    }

    let frame = RgbFrame::zeroed(512, 256).unwrap();
    let detector = FaceDetector::new(Box::new(TwoPlants));
    let detections = detector.detect(&frame, 0.6, 0.45).unwrap();
    // Identical zero regressions decode to identical boxes: IoU 1, so only
    // the stronger candidate survives.
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].score, 0.95);
}
