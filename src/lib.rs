//! FaceKit is a face detection and recognition post-processing library.
//!
//! It sits between a neural inference runtime and an application: raw
//! per-anchor score/box/keypoint tensors come in, and stable,
//! rotation-aware face detections and comparable identity features come
//! out. The neural executor itself stays behind the traits in
//! [`inference`]; this crate owns anchor decoding, non-maximum suppression,
//! five-point similarity alignment, orientation transforms, and versioned
//! feature packing.

pub mod align;
pub mod detection;
pub mod detector;
pub mod engine;
pub mod feature;
pub mod frame;
pub mod geometry;
pub mod inference;
pub mod nms;
pub mod rotation;
pub mod tensor;
pub(crate) mod trace;
pub mod util;

pub use align::{norm_crop, similarity_matrix, warp_affine, ALIGNED_FACE_SIZE};
pub use detection::{
    BoundingBox, Detection, Keypoints, RelativeBoundingBox, RelativeKeypoint, NUM_KEYPOINTS,
};
pub use detector::{preprocess_scale, FaceDetector, ScaleParams};
pub use engine::{FaceEngine, FaceEngineConfig};
pub use feature::{
    cosine_similarity, FaceFeaturePacked, FeatureVersion, CURRENT_FEATURE_VERSION, FEATURE_SIZE,
    PACKED_FEATURE_BYTES,
};
pub use frame::{rotate::rotate_rgb, to_rgb, FrameView, ImageFormat, RgbFrame};
pub use inference::{DetectionMaps, DetectorRuntime, EmbedderRuntime, ModelProvider, StrideMaps};
pub use nms::{
    overlap_similarity, NmsAlgorithm, NonMaxSuppressionOptions, NonMaxSuppressor, OverlapType,
};
pub use rotation::{rotate_detection, undo_rotate_detection, undo_rotation, RotationMode};
pub use tensor::Tensor;
pub use util::{FaceKitError, FaceKitResult, ModelKind};
