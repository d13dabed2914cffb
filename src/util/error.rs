//! Error types for facekit.

use thiserror::Error;

use crate::feature::FeatureVersion;

/// Result alias for facekit operations.
pub type FaceKitResult<T> = std::result::Result<T, FaceKitError>;

/// Identifies which of the two engine models an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// The face detection network.
    Detector,
    /// The face recognition (embedding) network.
    Recognizer,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Detector => write!(f, "detector"),
            ModelKind::Recognizer => write!(f, "recognizer"),
        }
    }
}

/// Errors that can occur when running facekit operations.
#[derive(Debug, Error, PartialEq)]
pub enum FaceKitError {
    /// An engine operation was attempted before a successful `initialize`.
    #[error("engine is not initialized")]
    NotInitialized,
    /// The requested operation needs a model the engine was not asked to load.
    #[error("{which} model is not loaded")]
    ModelNotLoaded {
        /// The missing model.
        which: ModelKind,
    },
    /// Model loading failed during initialization.
    #[error("failed to load {which} model")]
    ModelLoadFailed {
        /// The model that failed to load.
        which: ModelKind,
    },
    /// The input image is smaller than the minimum face crop size.
    #[error("invalid image: {width}x{height} is below the minimum crop size")]
    InvalidImage {
        /// Image width in pixels.
        width: usize,
        /// Image height in pixels.
        height: usize,
    },
    /// A buffer or tensor was constructed with zero-sized dimensions.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },
    /// A backing buffer is too small for the requested dimensions.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall {
        /// Minimum number of elements required.
        needed: usize,
        /// Number of elements provided.
        got: usize,
    },
    /// Two packed feature records have different sizes.
    #[error("feature size mismatch: expected {expected} bytes, got {got}")]
    FeatureSizeMismatch {
        /// Expected byte size of the record.
        expected: usize,
        /// Actual byte size.
        got: usize,
    },
    /// Two packed feature records have incompatible format versions.
    #[error("feature version mismatch: {left} vs {right}")]
    FeatureVersionMismatch {
        /// Version of the first record.
        left: FeatureVersion,
        /// Version of the second record.
        right: FeatureVersion,
    },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The external inference runtime reported a failure.
    #[error("inference failed: {0}")]
    Inference(String),
    /// An image could not be read from disk.
    #[cfg(feature = "image-io")]
    #[error("image io failed: {reason}")]
    ImageIo {
        /// Decoder error message.
        reason: String,
    },
}
