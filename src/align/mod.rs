//! Five-point similarity alignment and face cropping.
//!
//! `similarity_matrix` estimates a rotation + uniform scale + translation
//! mapping the detected keypoints onto the canonical template via an
//! iterative least-squares refinement. `warp_affine` inverts the matrix in
//! closed form and resamples with fixed-point bilinear interpolation, so
//! identical inputs always produce identical crops; the embedding network is
//! sensitive to crop alignment.

use crate::detection::{Detection, NUM_KEYPOINTS};
use crate::frame::RgbFrame;
use crate::util::{FaceKitError, FaceKitResult};

/// Side length of the canonical aligned face crop.
pub const ALIGNED_FACE_SIZE: usize = 112;

/// Canonical 5-point template in 112x112 output pixel coordinates:
/// x values for left eye, right eye, nose, left mouth, right mouth,
/// followed by the matching y values.
pub const CANONICAL_TEMPLATE: [f32; 10] = [
    38.2946, 73.5318, 56.0252, 41.5493, 70.7299, //
    51.6963, 51.5014, 71.7366, 92.3655, 92.2041,
];

// Determinant magnitude below which the similarity matrix is treated as
// singular and the crop comes back all zero.
const DEGENERATE_DETERMINANT: f32 = 1e-12;

const MAX_REFINE_ITERATIONS: usize = 200;
const RESIDUAL_TOLERANCE: f32 = 1e-2;

// Fixed-point bilinear weights: 2048 steps, two weight products per sample.
const WEIGHT_ONE: i32 = 2048;
const WEIGHT_SHIFT: u32 = 22;

/// Estimates the 2x3 similarity matrix `[m0 m1 m2; m3 m4 m5]` mapping `src`
/// onto `dst`.
///
/// Both arguments hold five x coordinates followed by five y coordinates.
/// Point sets are centered on the source centroid, an initial angle and
/// scale are derived from the eye- and mouth-midpoint vectors, and up to 200
/// refinement iterations re-estimate rotation and scale until the summed
/// squared residual stops improving.
pub fn similarity_matrix(mut src: [f32; 10], mut dst: [f32; 10]) -> [f32; 6] {
    let mut centroid = [0.0f32; 2];
    for i in 0..5 {
        centroid[0] += src[i];
        centroid[1] += src[5 + i];
    }
    centroid[0] /= 5.0;
    centroid[1] /= 5.0;
    for i in 0..5 {
        src[i] -= centroid[0];
        src[5 + i] -= centroid[1];
        dst[i] -= centroid[0];
        dst[5 + i] -= centroid[1];
    }

    // Vectors from eye midpoint to mouth midpoint seed the angle and scale.
    let dst_x = (dst[3] + dst[4] - dst[0] - dst[1]) / 2.0;
    let dst_y = (dst[8] + dst[9] - dst[5] - dst[6]) / 2.0;
    let src_x = (src[3] + src[4] - src[0] - src[1]) / 2.0;
    let src_y = (src[8] + src[9] - src[5] - src[6]) / 2.0;
    let theta = dst_x.atan2(dst_y) - src_x.atan2(src_y);
    let mut scale =
        (dst_x * dst_x + dst_y * dst_y).sqrt() / (src_x * src_x + src_y * src_y).sqrt();

    let mut sin_t = theta.sin();
    let mut cos_t = theta.cos();
    let mut projected = [0.0f32; 10];
    let mut translation = [0.0f32; 2];
    for i in 0..5 {
        projected[i] = scale * (src[i] * cos_t + src[i + 5] * sin_t);
        projected[i + 5] = scale * (-src[i] * sin_t + src[i + 5] * cos_t);
        translation[0] += dst[i] - projected[i];
        translation[1] += dst[i + 5] - projected[i + 5];
    }
    translation[0] /= 5.0;
    translation[1] /= 5.0;

    let mut sqloss = 0.0f32;
    for i in 0..5 {
        sqloss += (translation[0] + projected[i] - dst[i]).powi(2)
            + (translation[1] + projected[i + 5] - dst[i + 5]).powi(2);
    }

    let mut square_sum = 0.0f32;
    for v in src.iter() {
        square_sum += v * v;
    }

    for _ in 0..MAX_REFINE_ITERATIONS {
        // Closed-form normal-equation solve for the rotation.
        sin_t = 0.0;
        cos_t = 0.0;
        for i in 0..5 {
            sin_t += (translation[0] - dst[i]) * src[i + 5] - (translation[1] - dst[i + 5]) * src[i];
            cos_t += (translation[0] - dst[i]) * src[i] + (translation[1] - dst[i + 5]) * src[i + 5];
        }
        if cos_t < 0.0 {
            cos_t = -cos_t;
            sin_t = -sin_t;
        }
        let norm = (sin_t * sin_t + cos_t * cos_t).sqrt();
        cos_t /= norm;
        sin_t /= norm;
        for i in 0..5 {
            projected[i] = scale * (src[i] * cos_t + src[i + 5] * sin_t);
            projected[i + 5] = scale * (-src[i] * sin_t + src[i + 5] * cos_t);
        }

        // Scale by projection onto the rotated source.
        let mut new_scale = 0.0f32;
        for i in 0..5 {
            new_scale += (dst[i] - translation[0]) * projected[i]
                + (dst[i + 5] - translation[1]) * projected[i + 5];
        }
        new_scale /= square_sum * scale;
        for v in projected.iter_mut() {
            *v *= new_scale / scale;
        }
        scale = new_scale;

        translation = [0.0, 0.0];
        for i in 0..5 {
            translation[0] += dst[i] - projected[i];
            translation[1] += dst[i + 5] - projected[i + 5];
        }
        translation[0] /= 5.0;
        translation[1] /= 5.0;

        let mut new_sqloss = 0.0f32;
        for i in 0..5 {
            new_sqloss += (translation[0] + projected[i] - dst[i]).powi(2)
                + (translation[1] + projected[i + 5] - dst[i + 5]).powi(2);
        }
        if (new_sqloss - sqloss).abs() < RESIDUAL_TOLERANCE {
            break;
        }
        sqloss = new_sqloss;
    }

    [
        cos_t * scale,
        sin_t * scale,
        translation[0] + centroid[0] - scale * (centroid[0] * cos_t + centroid[1] * sin_t),
        -sin_t * scale,
        cos_t * scale,
        translation[1] + centroid[1] - scale * (-centroid[0] * sin_t + centroid[1] * cos_t),
    ]
}

/// Resamples `src` through the inverse of `matrix` into a `dst_width` x
/// `dst_height` RGB frame.
///
/// Destination pixels whose source sample falls outside the image stay
/// black; a singular matrix yields an all-zero frame.
pub fn warp_affine(
    src: &RgbFrame,
    matrix: [f32; 6],
    dst_width: usize,
    dst_height: usize,
) -> FaceKitResult<RgbFrame> {
    let mut dst = RgbFrame::zeroed(dst_width, dst_height)?;

    let det = matrix[0] * matrix[4] - matrix[1] * matrix[3];
    if !det.is_finite() || det.abs() < DEGENERATE_DETERMINANT {
        return Ok(dst);
    }

    // Closed-form inverse of the 2x3 similarity matrix.
    let inv_det = 1.0 / det;
    let mut m = matrix;
    let a11 = m[4] * inv_det;
    let a22 = m[0] * inv_det;
    m[0] = a11;
    m[1] *= -inv_det;
    m[3] *= -inv_det;
    m[4] = a22;
    m[2] = -m[0] * matrix[2] - m[1] * matrix[5];
    m[5] = -m[3] * matrix[2] - m[4] * matrix[5];

    let src_width = src.width();
    let src_height = src.height();
    let src_data = src.data();
    let dst_data = dst.data_mut();

    for y in 0..dst_height {
        for x in 0..dst_width {
            let mut fx = m[0] * x as f32 + m[1] * y as f32 + m[2];
            let mut fy = m[3] * x as f32 + m[4] * y as f32 + m[5];

            let sy = fy.floor() as i32;
            fy -= sy as f32;
            if sy < 0 || sy >= src_height as i32 {
                continue;
            }
            let wy0 = ((1.0 - fy) * WEIGHT_ONE as f32) as i32;
            let wy1 = WEIGHT_ONE - wy0;

            let sx = fx.floor() as i32;
            fx -= sx as f32;
            if sx < 0 || sx >= src_width as i32 {
                continue;
            }
            let wx0 = ((1.0 - fx) * WEIGHT_ONE as f32) as i32;
            let wx1 = WEIGHT_ONE - wx0;

            if sy == src_height as i32 - 1 || sx == src_width as i32 - 1 {
                continue;
            }

            let sx = sx as usize;
            let sy = sy as usize;
            let row0 = (sy * src_width + sx) * 3;
            let row1 = ((sy + 1) * src_width + sx) * 3;
            let out = (y * dst_width + x) * 3;
            for c in 0..3 {
                let value = src_data[row0 + c] as i32 * wx0 * wy0
                    + src_data[row1 + c] as i32 * wx0 * wy1
                    + src_data[row0 + 3 + c] as i32 * wx1 * wy0
                    + src_data[row1 + 3 + c] as i32 * wx1 * wy1;
                dst_data[out + c] = (value >> WEIGHT_SHIFT) as u8;
            }
        }
    }

    Ok(dst)
}

/// Aligns the detected face to the canonical template and crops it to
/// `out_width` x `out_height`.
pub fn norm_crop(
    image: &RgbFrame,
    detection: &Detection,
    out_width: usize,
    out_height: usize,
) -> FaceKitResult<RgbFrame> {
    let keypoints = detection
        .relative_keypoints()
        .ok_or(FaceKitError::InvalidInput(
            "alignment requires the relative representation",
        ))?;
    if keypoints.len() < NUM_KEYPOINTS {
        return Err(FaceKitError::InvalidInput(
            "alignment requires five keypoints",
        ));
    }

    let mut src_pts = [0.0f32; 10];
    for i in 0..NUM_KEYPOINTS {
        src_pts[i] = keypoints[i].x;
        src_pts[i + 5] = keypoints[i].y;
    }

    let matrix = similarity_matrix(src_pts, CANONICAL_TEMPLATE);
    warp_affine(image, matrix, out_width, out_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{Detection, RelativeBoundingBox, RelativeKeypoint};

    fn template_keypoints() -> Vec<RelativeKeypoint> {
        (0..5)
            .map(|i| RelativeKeypoint::new(CANONICAL_TEMPLATE[i], CANONICAL_TEMPLATE[i + 5]))
            .collect()
    }

    #[test]
    fn canonical_points_produce_identity_matrix() {
        let m = similarity_matrix(CANONICAL_TEMPLATE, CANONICAL_TEMPLATE);
        assert!((m[0] - 1.0).abs() < 1e-4);
        assert!(m[1].abs() < 1e-4);
        assert!(m[2].abs() < 1e-3);
        assert!(m[3].abs() < 1e-4);
        assert!((m[4] - 1.0).abs() < 1e-4);
        assert!(m[5].abs() < 1e-3);
    }

    #[test]
    fn translated_points_recover_the_offset() {
        let mut src = CANONICAL_TEMPLATE;
        for v in src[..5].iter_mut() {
            *v -= 10.0;
        }
        for v in src[5..].iter_mut() {
            *v -= 4.0;
        }
        let m = similarity_matrix(src, CANONICAL_TEMPLATE);
        assert!((m[0] - 1.0).abs() < 1e-3);
        assert!(m[1].abs() < 1e-3);
        assert!((m[2] - 10.0).abs() < 1e-2);
        assert!((m[5] - 4.0).abs() < 1e-2);
    }

    #[test]
    fn aligning_a_canonical_crop_is_identity() {
        let size = ALIGNED_FACE_SIZE;
        let mut data = Vec::with_capacity(size * size * 3);
        for y in 0..size {
            for x in 0..size {
                let v = ((x * 31) ^ (y * 17)) as u8;
                data.extend_from_slice(&[v, v.wrapping_add(1), v.wrapping_add(2)]);
            }
        }
        let image = RgbFrame::new(data, size, size).unwrap();
        let detection = Detection::relative(
            0,
            1.0,
            RelativeBoundingBox {
                xmin: 0.0,
                ymin: 0.0,
                width: size as f32,
                height: size as f32,
            },
            template_keypoints(),
        );

        let aligned = norm_crop(&image, &detection, size, size).unwrap();
        // Interior pixels are untouched; the last row and column are
        // intentionally left black by the interpolation guard.
        for y in 1..size - 1 {
            for x in 1..size - 1 {
                let idx = (y * size + x) * 3;
                assert_eq!(aligned.data()[idx], image.data()[idx], "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn degenerate_matrix_yields_black_crop() {
        let image = RgbFrame::new(vec![200u8; 4 * 4 * 3], 4, 4).unwrap();
        let out = warp_affine(&image, [0.0; 6], 4, 4).unwrap();
        assert!(out.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn norm_crop_rejects_missing_keypoints() {
        let image = RgbFrame::zeroed(16, 16).unwrap();
        let detection = Detection::relative(
            0,
            1.0,
            RelativeBoundingBox::default(),
            vec![RelativeKeypoint::new(0.0, 0.0); 3],
        );
        let err = norm_crop(&image, &detection, 16, 16).err().unwrap();
        assert_eq!(
            err,
            FaceKitError::InvalidInput("alignment requires five keypoints")
        );
    }
}
