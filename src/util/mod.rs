//! Shared utility helpers.

pub mod error;

pub use error::{FaceKitError, FaceKitResult, ModelKind};
