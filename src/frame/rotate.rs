//! Pixel-buffer rotation for interleaved RGB24 frames.
//!
//! Rotations are exact pixel permutations (no resampling). 90° and 270°
//! outputs swap the frame dimensions; flips and 180° keep them.

use crate::frame::RgbFrame;
use crate::rotation::RotationMode;

/// Rotates or flips an RGB24 frame into the upright orientation for `mode`.
pub fn rotate_rgb(src: &RgbFrame, mode: RotationMode) -> RgbFrame {
    if mode == RotationMode::Rotate0 {
        return src.clone();
    }

    let sw = src.width();
    let sh = src.height();
    let (dw, dh) = if mode.swaps_dimensions() {
        (sh, sw)
    } else {
        (sw, sh)
    };

    let mut out = RgbFrame {
        data: vec![0u8; dw * dh * 3],
        width: dw,
        height: dh,
    };
    let src_data = src.data();
    let dst_data = out.data_mut();

    for dy in 0..dh {
        for dx in 0..dw {
            let (sx, sy) = match mode {
                RotationMode::Rotate90 => (dy, sh - 1 - dx),
                RotationMode::Rotate180 => (sw - 1 - dx, sh - 1 - dy),
                RotationMode::Rotate270 => (sw - 1 - dy, dx),
                RotationMode::HorizontalFlip => (sw - 1 - dx, dy),
                RotationMode::VerticalFlip => (dx, sh - 1 - dy),
                RotationMode::Rotate0 => unreachable!("handled above"),
            };
            let s = (sy * sw + sx) * 3;
            let d = (dy * dw + dx) * 3;
            dst_data[d..d + 3].copy_from_slice(&src_data[s..s + 3]);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::rotate_rgb;
    use crate::frame::RgbFrame;
    use crate::rotation::RotationMode;

    // 2x3 frame with pixel value = (index, index, index) for easy tracking.
    fn frame_2x3() -> RgbFrame {
        let mut data = Vec::new();
        for i in 0u8..6 {
            data.extend_from_slice(&[i, i, i]);
        }
        RgbFrame::new(data, 2, 3).unwrap()
    }

    fn pixel(frame: &RgbFrame, x: usize, y: usize) -> u8 {
        frame.data()[(y * frame.width() + x) * 3]
    }

    #[test]
    fn rotate_90_cw_moves_top_left_to_top_right() {
        let src = frame_2x3();
        let dst = rotate_rgb(&src, RotationMode::Rotate90);
        assert_eq!(dst.width(), 3);
        assert_eq!(dst.height(), 2);
        // src (0,0) lands at (h-1, 0) = (2, 0)
        assert_eq!(pixel(&dst, 2, 0), pixel(&src, 0, 0));
        // src (1,2) lands at (0, 1)
        assert_eq!(pixel(&dst, 0, 1), pixel(&src, 1, 2));
    }

    #[test]
    fn rotate_180_reverses_both_axes() {
        let src = frame_2x3();
        let dst = rotate_rgb(&src, RotationMode::Rotate180);
        assert_eq!(pixel(&dst, 0, 0), pixel(&src, 1, 2));
        assert_eq!(pixel(&dst, 1, 2), pixel(&src, 0, 0));
    }

    #[test]
    fn flips_mirror_one_axis() {
        let src = frame_2x3();
        let h = rotate_rgb(&src, RotationMode::HorizontalFlip);
        assert_eq!(pixel(&h, 0, 1), pixel(&src, 1, 1));
        let v = rotate_rgb(&src, RotationMode::VerticalFlip);
        assert_eq!(pixel(&v, 1, 0), pixel(&src, 1, 2));
    }

    #[test]
    fn rotate_90_then_270_is_identity() {
        let src = frame_2x3();
        let back = rotate_rgb(&rotate_rgb(&src, RotationMode::Rotate90), RotationMode::Rotate270);
        assert_eq!(back, src);
    }
}
