//! Channel-planar float tensors exchanged with the inference runtime.
//!
//! Layout is row-major within a channel and channels are stored as contiguous
//! planes, matching the runtime boundary contract. Construction validates the
//! buffer length so plane access never goes out of bounds.

use crate::util::{FaceKitError, FaceKitResult};

/// Owned channel-planar `f32` tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    channels: usize,
    height: usize,
    width: usize,
}

impl Tensor {
    /// Creates a tensor from a planar buffer of `channels * height * width`
    /// elements.
    pub fn new(data: Vec<f32>, channels: usize, height: usize, width: usize) -> FaceKitResult<Self> {
        if channels == 0 || height == 0 || width == 0 {
            return Err(FaceKitError::InvalidDimensions { width, height });
        }
        let needed = channels
            .checked_mul(height)
            .and_then(|v| v.checked_mul(width))
            .ok_or(FaceKitError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(FaceKitError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(FaceKitError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            channels,
            height,
            width,
        })
    }

    /// Creates a zero-filled tensor.
    pub fn zeros(channels: usize, height: usize, width: usize) -> FaceKitResult<Self> {
        if channels == 0 || height == 0 || width == 0 {
            return Err(FaceKitError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data: vec![0.0; channels * height * width],
            channels,
            height,
            width,
        })
    }

    /// Number of channel planes.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Spatial height of each plane.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Spatial width of each plane.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the row-major plane for channel `c`, if in range.
    pub fn plane(&self, c: usize) -> Option<&[f32]> {
        if c >= self.channels {
            return None;
        }
        let size = self.height * self.width;
        let start = c * size;
        self.data.get(start..start + size)
    }

    /// Returns the mutable row-major plane for channel `c`, if in range.
    pub fn plane_mut(&mut self, c: usize) -> Option<&mut [f32]> {
        if c >= self.channels {
            return None;
        }
        let size = self.height * self.width;
        let start = c * size;
        self.data.get_mut(start..start + size)
    }

    /// The full backing buffer, planes concatenated.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
