//! Pixel frame views and format conversion.
//!
//! `FrameView` is a borrowed, format-tagged view into a caller-owned pixel
//! buffer; `RgbFrame` is the owned interleaved RGB24 working format every
//! in-crate pixel operation runs on. Conversion from the other supported
//! formats happens once at the engine boundary.

use crate::util::{FaceKitError, FaceKitResult};

pub mod rotate;

#[cfg(feature = "image-io")]
pub mod io;

/// Supported pixel formats for caller-provided buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Interleaved 8-bit RGB.
    Rgb,
    /// Interleaved 8-bit BGR.
    Bgr,
    /// Interleaved 8-bit RGBA.
    Rgba,
    /// Interleaved 8-bit BGRA.
    Bgra,
    /// Single-channel 8-bit grayscale.
    Gray,
}

impl ImageFormat {
    /// Bytes per pixel for this format.
    pub fn channels(self) -> usize {
        match self {
            ImageFormat::Rgb | ImageFormat::Bgr => 3,
            ImageFormat::Rgba | ImageFormat::Bgra => 4,
            ImageFormat::Gray => 1,
        }
    }

    /// Maps a raw wire code to a format.
    ///
    /// Unknown codes fall back to [`ImageFormat::Rgb`].
    pub fn from_raw(raw: i32) -> ImageFormat {
        match raw {
            1 => ImageFormat::Rgb,
            2 => ImageFormat::Rgba,
            3 => ImageFormat::Gray,
            11 => ImageFormat::Bgra,
            13 => ImageFormat::Bgr,
            _ => ImageFormat::Rgb,
        }
    }
}

/// Borrowed view of a caller-owned pixel buffer.
#[derive(Clone, Copy)]
pub struct FrameView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    format: ImageFormat,
}

impl<'a> FrameView<'a> {
    /// Creates a view, validating the buffer length against
    /// `width * height * channels`.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        format: ImageFormat,
    ) -> FaceKitResult<Self> {
        if width == 0 || height == 0 {
            return Err(FaceKitError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(format.channels()))
            .ok_or(FaceKitError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(FaceKitError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel format of the backing buffer.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// The backing pixel buffer.
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }
}

/// Owned interleaved RGB24 frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbFrame {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl RgbFrame {
    /// Creates a frame from an interleaved RGB24 buffer of exactly
    /// `width * height * 3` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> FaceKitResult<Self> {
        if width == 0 || height == 0 {
            return Err(FaceKitError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(3))
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
            width,
            height,
        })
    }

    /// Creates a zero-filled (black) frame.
    pub fn zeroed(width: usize, height: usize) -> FaceKitResult<Self> {
        if width == 0 || height == 0 {
            return Err(FaceKitError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data: vec![0u8; width * height * 3],
            width,
            height,
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The interleaved RGB24 buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Converts a frame in any supported format to interleaved RGB24.
pub fn to_rgb(frame: &FrameView<'_>) -> RgbFrame {
    let width = frame.width();
    let height = frame.height();
    let src = frame.as_slice();
    let mut out = vec![0u8; width * height * 3];

    match frame.format() {
        ImageFormat::Rgb => {
            out.copy_from_slice(&src[..width * height * 3]);
        }
        ImageFormat::Bgr => {
            for (dst, px) in out.chunks_exact_mut(3).zip(src.chunks_exact(3)) {
                dst[0] = px[2];
                dst[1] = px[1];
                dst[2] = px[0];
            }
        }
        ImageFormat::Rgba => {
            for (dst, px) in out.chunks_exact_mut(3).zip(src.chunks_exact(4)) {
                dst.copy_from_slice(&px[..3]);
            }
        }
        ImageFormat::Bgra => {
            for (dst, px) in out.chunks_exact_mut(3).zip(src.chunks_exact(4)) {
                dst[0] = px[2];
                dst[1] = px[1];
                dst[2] = px[0];
            }
        }
        ImageFormat::Gray => {
            for (dst, &v) in out.chunks_exact_mut(3).zip(src.iter()) {
                dst[0] = v;
                dst[1] = v;
                dst[2] = v;
            }
        }
    }

    RgbFrame {
        data: out,
        width,
        height,
    }
}
