//! Convenience helpers for loading frames via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use std::path::Path;

use crate::frame::RgbFrame;
use crate::util::{FaceKitError, FaceKitResult};

/// Creates an owned RGB frame from a decoded RGB image buffer.
pub fn frame_from_rgb_image(img: &image::RgbImage) -> FaceKitResult<RgbFrame> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    RgbFrame::new(img.as_raw().clone(), width, height)
}

/// Loads an image from disk and converts it to an RGB24 frame.
pub fn load_rgb_frame<P: AsRef<Path>>(path: P) -> FaceKitResult<RgbFrame> {
    let img = image::open(path).map_err(|err| FaceKitError::ImageIo {
        reason: err.to_string(),
    })?;
    frame_from_rgb_image(&img.to_rgb8())
}
