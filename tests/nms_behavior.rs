use facekit::{
    overlap_similarity, Detection, NmsAlgorithm, NonMaxSuppressionOptions, NonMaxSuppressor,
    OverlapType, RelativeBoundingBox, RelativeKeypoint,
};

fn det(score: f32, xmin: f32, ymin: f32, width: f32, height: f32) -> Detection {
    Detection::relative(
        0,
        score,
        RelativeBoundingBox {
            xmin,
            ymin,
            width,
            height,
        },
        vec![RelativeKeypoint::new(xmin + width / 2.0, ymin + height / 2.0); 5],
    )
}

fn iou(a: &Detection, b: &Detection) -> f32 {
    overlap_similarity(
        OverlapType::IntersectionOverUnion,
        a.relative_bounding_box().unwrap(),
        b.relative_bounding_box().unwrap(),
    )
}

#[test]
fn default_nms_keeps_expected_pair_from_three_overlapping_boxes() {
    // Three 10x10 boxes on one row, shifted so that IoU(b0, b1) is about 0.7
    // and IoU(b0, b2) about 0.05.
    let b0 = det(0.9, 0.0, 0.0, 10.0, 10.0);
    let b1 = det(0.85, 1.7647, 0.0, 10.0, 10.0);
    let b2 = det(0.3, 9.0476, 0.0, 10.0, 10.0);
    assert!((iou(&b0, &b1) - 0.7).abs() < 0.01);
    assert!((iou(&b0, &b2) - 0.05).abs() < 0.01);

    let candidates = vec![b0.clone(), b1, b2.clone()];
    let nms = NonMaxSuppressor::new(NonMaxSuppressionOptions {
        min_suppression_threshold: 0.5,
        overlap_type: OverlapType::IntersectionOverUnion,
        ..Default::default()
    });
    let accepted = nms.suppress(&candidates).unwrap();
    assert_eq!(accepted.len(), 2);
    assert_eq!(accepted[0], b0);
    assert_eq!(accepted[1], b2);
}

#[test]
fn accepted_detections_are_pairwise_below_the_suppression_threshold() {
    let mut candidates = Vec::new();
    for i in 0..12 {
        let offset = i as f32 * 2.5;
        candidates.push(det(0.9 - i as f32 * 0.05, offset, 0.0, 10.0, 10.0));
    }
    let threshold = 0.4;
    let nms = NonMaxSuppressor::new(NonMaxSuppressionOptions {
        min_suppression_threshold: threshold,
        overlap_type: OverlapType::IntersectionOverUnion,
        ..Default::default()
    });
    let accepted = nms.suppress(&candidates).unwrap();
    assert!(!accepted.is_empty());
    for (i, a) in accepted.iter().enumerate() {
        for b in accepted.iter().skip(i + 1) {
            assert!(iou(a, b) < threshold);
        }
    }
}

#[test]
fn max_num_detections_caps_the_output() {
    let candidates: Vec<Detection> = (0..10)
        .map(|i| det(0.9 - i as f32 * 0.01, i as f32 * 20.0, 0.0, 10.0, 10.0))
        .collect();
    let nms = NonMaxSuppressor::new(NonMaxSuppressionOptions {
        max_num_detections: 3,
        min_suppression_threshold: 0.5,
        overlap_type: OverlapType::IntersectionOverUnion,
        ..Default::default()
    });
    let accepted = nms.suppress(&candidates).unwrap();
    assert_eq!(accepted.len(), 3);
    assert_eq!(accepted[0].score, 0.9);
}

#[test]
fn weighted_nms_assigns_each_candidate_to_one_cluster() {
    // Two well-separated groups; every candidate must contribute to exactly
    // one weighted output.
    let group_a = [
        det(0.9, 0.0, 0.0, 10.0, 10.0),
        det(0.6, 1.0, 0.0, 10.0, 10.0),
    ];
    let group_b = [
        det(0.8, 100.0, 0.0, 10.0, 10.0),
        det(0.4, 101.0, 0.0, 10.0, 10.0),
    ];
    let candidates: Vec<Detection> = group_a.iter().chain(group_b.iter()).cloned().collect();

    let nms = NonMaxSuppressor::new(NonMaxSuppressionOptions {
        min_score_threshold: 0.3,
        overlap_type: OverlapType::IntersectionOverUnion,
        algorithm: NmsAlgorithm::Weighted,
        ..Default::default()
    });
    let outputs = nms.suppress(&candidates).unwrap();
    assert_eq!(outputs.len(), 2);

    // Cluster A: xmin = (0.9*0 + 0.6*1) / 1.5 = 0.4.
    let bbox_a = outputs[0].relative_bounding_box().unwrap();
    assert!((bbox_a.xmin - 0.4).abs() < 1e-4);
    assert_eq!(outputs[0].score, 0.9);

    // Cluster B: xmin = (0.8*100 + 0.4*101) / 1.2 = 100.333...
    let bbox_b = outputs[1].relative_bounding_box().unwrap();
    assert!((bbox_b.xmin - 100.0 - 1.0 / 3.0).abs() < 1e-3);
    assert_eq!(outputs[1].score, 0.8);
}

#[test]
fn weighted_nms_terminates_when_nothing_clusters() {
    // A clustering cutoff of 1.0 is never exceeded (self-similarity is
    // exactly 1.0), so the first iteration fails to shrink the remaining set
    // and the cycle breaker stops the run after emitting the seed. Scores sit
    // exactly at the threshold so the score cutoff does not trip first.
    let candidates = vec![
        det(1.0, 0.0, 0.0, 10.0, 10.0),
        det(1.0, 0.5, 0.0, 10.0, 10.0),
    ];
    let nms = NonMaxSuppressor::new(NonMaxSuppressionOptions {
        min_score_threshold: 1.0,
        overlap_type: OverlapType::IntersectionOverUnion,
        algorithm: NmsAlgorithm::Weighted,
        ..Default::default()
    });
    let outputs = nms.suppress(&candidates).unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0], candidates[0]);
}

#[test]
fn disabled_min_score_threshold_considers_every_candidate() {
    let candidates = vec![
        det(0.9, 0.0, 0.0, 10.0, 10.0),
        det(0.01, 50.0, 0.0, 10.0, 10.0),
    ];
    let nms = NonMaxSuppressor::new(NonMaxSuppressionOptions {
        min_score_threshold: -1.0,
        min_suppression_threshold: 0.5,
        overlap_type: OverlapType::IntersectionOverUnion,
        ..Default::default()
    });
    let accepted = nms.suppress(&candidates).unwrap();
    assert_eq!(accepted.len(), 2);
}
