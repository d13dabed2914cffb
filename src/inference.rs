//! Boundary traits to the external neural inference runtime.
//!
//! The runtime owns weight loading, tensor execution, pixel resampling, and
//! normalization; this crate hands it an upright RGB frame plus the resize
//! geometry it must honor, and gets back row-major channel-planar float
//! tensors.

use crate::detector::ScaleParams;
use crate::frame::RgbFrame;
use crate::tensor::Tensor;
use crate::util::FaceKitResult;

/// Score, box-regression, and keypoint-regression maps for one feature
/// stride.
///
/// With `A` anchors per spatial cell, `scores` has `A` channels, `boxes`
/// `4 * A`, and `keypoints` `10 * A`; all three share the spatial size of
/// the stride's feature grid.
#[derive(Debug, Clone)]
pub struct StrideMaps {
    /// Per-anchor classification scores.
    pub scores: Tensor,
    /// Per-anchor `(dx, dy, dw, dh)` box regressions.
    pub boxes: Tensor,
    /// Per-anchor keypoint regressions, five `(x, y)` pairs.
    pub keypoints: Tensor,
}

/// Detection network output: one map set per stride (8, 16, 32).
#[derive(Debug, Clone)]
pub struct DetectionMaps {
    /// Stride-8 maps.
    pub stride8: StrideMaps,
    /// Stride-16 maps.
    pub stride16: StrideMaps,
    /// Stride-32 maps.
    pub stride32: StrideMaps,
}

/// External detection network executor.
///
/// Implementations resize `frame` so its longer side matches the target in
/// `scale`, pad right/bottom to the padded dimensions, normalize with mean
/// 127.5 and scale 1/128, and run the detector. The handle must be safe for
/// concurrent read-only inference.
pub trait DetectorRuntime: Send + Sync {
    /// Runs detection over one upright RGB frame.
    fn infer(&self, frame: &RgbFrame, scale: &ScaleParams) -> FaceKitResult<DetectionMaps>;
}

/// External embedding network executor.
///
/// Implementations normalize the aligned crop with mean 127.5 and scale
/// 1/128 and return the raw embedding vector.
pub trait EmbedderRuntime: Send + Sync {
    /// Embeds one aligned face crop.
    fn embed(&self, face: &RgbFrame) -> FaceKitResult<Vec<f32>>;
}

/// Loads runtime handles during engine initialization.
///
/// Each loader is called at most once per engine; a failure aborts
/// initialization atomically.
pub trait ModelProvider {
    /// Loads the detection network.
    fn load_detector(&self) -> FaceKitResult<Box<dyn DetectorRuntime>>;
    /// Loads the embedding network.
    fn load_embedder(&self) -> FaceKitResult<Box<dyn EmbedderRuntime>>;
}
