//! Engine orchestration: configuration, model lifecycle, and the public
//! detect / extract / compare operations.
//!
//! The engine is a thin state machine: `Uninitialized -> Ready` on a
//! successful model load, one-way. Model handles live behind a single
//! reader-writer lock; initialization takes the write lock once, every
//! subsequent operation shares the read lock, so concurrent detect/extract
//! calls never block each other.

use std::sync::RwLock;

use crate::align::{norm_crop, ALIGNED_FACE_SIZE};
use crate::detection::Detection;
use crate::detector::FaceDetector;
use crate::feature::{FaceFeaturePacked, CURRENT_FEATURE_VERSION};
use crate::frame::{rotate::rotate_rgb, to_rgb, FrameView};
use crate::inference::{EmbedderRuntime, ModelProvider};
use crate::rotation::{rotate_detection, undo_rotate_detection, RotationMode};
use crate::trace::{trace_event, trace_span};
use crate::util::{FaceKitError, FaceKitResult, ModelKind};

/// Process-wide engine tunables.
///
/// The enable flags decide which models `initialize` loads; that decision is
/// made once and never revisited. The remaining fields may be updated later
/// through the engine's setters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceEngineConfig {
    /// Load the detection model at initialization.
    pub enable_detection: bool,
    /// Load the recognition model at initialization.
    pub enable_recognition: bool,
    /// Relative-size gate: detections with `box width * this < frame width`
    /// are dropped.
    pub detect_face_scale: i32,
    /// Maximum number of detections returned by `detect_face`.
    pub detect_face_max_num: usize,
    /// Decode-time score admission threshold.
    pub prob_threshold: f32,
    /// IoU threshold for suppression.
    pub nms_threshold: f32,
    /// Orientation of incoming pixel buffers.
    pub rotation: RotationMode,
}

impl Default for FaceEngineConfig {
    fn default() -> Self {
        Self {
            enable_detection: false,
            enable_recognition: false,
            detect_face_scale: 11,
            detect_face_max_num: 20,
            prob_threshold: 0.6,
            nms_threshold: 0.45,
            rotation: RotationMode::Rotate0,
        }
    }
}

struct EngineState {
    initialized: bool,
    config: FaceEngineConfig,
    detector: Option<FaceDetector>,
    embedder: Option<Box<dyn EmbedderRuntime>>,
}

/// Face detection and recognition engine.
pub struct FaceEngine {
    state: RwLock<EngineState>,
}

impl FaceEngine {
    /// Creates an uninitialized engine.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(EngineState {
                initialized: false,
                config: FaceEngineConfig::default(),
                detector: None,
                embedder: None,
            }),
        }
    }

    /// Loads the requested models and transitions the engine to ready.
    ///
    /// Idempotent: initializing an already-ready engine is a no-op success.
    /// A model load failure aborts atomically; the engine stays
    /// uninitialized and the error names the failing model.
    pub fn initialize(
        &self,
        provider: &dyn ModelProvider,
        config: FaceEngineConfig,
    ) -> FaceKitResult<()> {
        let _span = trace_span!("initialize").entered();
        let mut state = self.state.write().expect("engine lock poisoned");
        if state.initialized {
            return Ok(());
        }

        let detector = if config.enable_detection {
            let runtime = provider
                .load_detector()
                .map_err(|_| FaceKitError::ModelLoadFailed {
                    which: ModelKind::Detector,
                })?;
            Some(FaceDetector::new(runtime))
        } else {
            None
        };
        let embedder = if config.enable_recognition {
            Some(
                provider
                    .load_embedder()
                    .map_err(|_| FaceKitError::ModelLoadFailed {
                        which: ModelKind::Recognizer,
                    })?,
            )
        } else {
            None
        };

        state.detector = detector;
        state.embedder = embedder;
        state.config = config;
        state.initialized = true;
        trace_event!(
            "engine_ready",
            detection = config.enable_detection,
            recognition = config.enable_recognition
        );
        Ok(())
    }

    /// Detects faces in a caller-oriented pixel buffer.
    ///
    /// When a rotation is configured, the buffer is rotated upright before
    /// inference and every surviving detection is mapped back into the
    /// caller's coordinate frame.
    pub fn detect_face(&self, frame: &FrameView<'_>) -> FaceKitResult<Vec<Detection>> {
        let state = self.state.read().expect("engine lock poisoned");
        if !state.initialized {
            return Err(FaceKitError::NotInitialized);
        }
        let detector = state.detector.as_ref().ok_or(FaceKitError::ModelNotLoaded {
            which: ModelKind::Detector,
        })?;
        check_image(frame)?;

        let _span = trace_span!(
            "detect_face",
            width = frame.width(),
            height = frame.height()
        )
        .entered();

        let config = state.config;
        let rgb = to_rgb(frame);
        let upright = if config.rotation != RotationMode::Rotate0 {
            rotate_rgb(&rgb, config.rotation)
        } else {
            rgb
        };
        let upright_width = upright.width() as f32;

        let result = detector.detect(&upright, config.prob_threshold, config.nms_threshold)?;

        let mut detections = Vec::new();
        for det in &result {
            if detections.len() >= config.detect_face_max_num {
                break;
            }
            let bbox = det
                .relative_bounding_box()
                .ok_or(FaceKitError::InvalidInput(
                    "detector produced a non-relative detection",
                ))?;
            // Relevance gate, distinct from the score threshold.
            if bbox.width * (config.detect_face_scale as f32) < upright_width {
                continue;
            }
            let mapped = if config.rotation != RotationMode::Rotate0 {
                undo_rotate_detection(
                    det,
                    config.rotation,
                    frame.width() as f32,
                    frame.height() as f32,
                )?
            } else {
                det.clone()
            };
            detections.push(mapped);
        }
        trace_event!("accepted", count = detections.len());
        Ok(detections)
    }

    /// Aligns, embeds, and packs the face described by `detection`.
    ///
    /// The detection is expected in the caller's original coordinate frame;
    /// it is mapped onto the upright buffer before alignment.
    pub fn extract_feature(
        &self,
        frame: &FrameView<'_>,
        detection: &Detection,
    ) -> FaceKitResult<FaceFeaturePacked> {
        let state = self.state.read().expect("engine lock poisoned");
        if !state.initialized {
            return Err(FaceKitError::NotInitialized);
        }
        let embedder = state.embedder.as_ref().ok_or(FaceKitError::ModelNotLoaded {
            which: ModelKind::Recognizer,
        })?;
        check_image(frame)?;

        let _span = trace_span!(
            "extract_feature",
            width = frame.width(),
            height = frame.height()
        )
        .entered();

        let config = state.config;
        let rgb = to_rgb(frame);
        let (upright, upright_detection) = if config.rotation != RotationMode::Rotate0 {
            let upright = rotate_rgb(&rgb, config.rotation);
            let mapped = rotate_detection(
                detection,
                config.rotation,
                frame.width() as f32,
                frame.height() as f32,
            )?;
            (upright, mapped)
        } else {
            (rgb, detection.clone())
        };

        let aligned = norm_crop(
            &upright,
            &upright_detection,
            ALIGNED_FACE_SIZE,
            ALIGNED_FACE_SIZE,
        )?;
        let embedding = embedder.embed(&aligned)?;
        FaceFeaturePacked::pack(&embedding, CURRENT_FEATURE_VERSION)
    }

    /// Compares two packed features; see [`FaceFeaturePacked::compare`].
    pub fn compare_feature(a: &FaceFeaturePacked, b: &FaceFeaturePacked) -> FaceKitResult<f32> {
        a.compare(b)
    }

    /// A snapshot of the current configuration.
    pub fn config(&self) -> FaceEngineConfig {
        self.state.read().expect("engine lock poisoned").config
    }

    /// Updates the decode-time score threshold.
    pub fn set_prob_threshold(&self, value: f32) {
        self.state.write().expect("engine lock poisoned").config.prob_threshold = value;
    }

    /// Updates the suppression IoU threshold.
    pub fn set_nms_threshold(&self, value: f32) {
        self.state.write().expect("engine lock poisoned").config.nms_threshold = value;
    }

    /// Updates the relative-size gate factor.
    pub fn set_detect_face_scale(&self, value: i32) {
        self.state
            .write()
            .expect("engine lock poisoned")
            .config
            .detect_face_scale = value;
    }

    /// Updates the detection count cap.
    pub fn set_detect_face_max_num(&self, value: usize) {
        self.state
            .write()
            .expect("engine lock poisoned")
            .config
            .detect_face_max_num = value;
    }

    /// Updates the configured buffer orientation.
    pub fn set_rotation(&self, value: RotationMode) {
        self.state.write().expect("engine lock poisoned").config.rotation = value;
    }
}

impl Default for FaceEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn check_image(frame: &FrameView<'_>) -> FaceKitResult<()> {
    if frame.width() < ALIGNED_FACE_SIZE || frame.height() < ALIGNED_FACE_SIZE {
        return Err(FaceKitError::InvalidImage {
            width: frame.width(),
            height: frame.height(),
        });
    }
    Ok(())
}
