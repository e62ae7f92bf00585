//! # Color Model
//!
//! HSV to RGB conversion used by every shader-style field. Inputs are in `[0, 1]`;
//! hue wraps, saturation and value are taken as given.
//!
//! The per-frame cost of the shader fields is dominated by [`convert_planes`], which
//! walks full-resolution hue/saturation/value planes and writes packed RGB8 rows in
//! parallel.

use rayon::prelude::*;

use crate::error::SynthesisError;

/// Six-sector HSV to RGB, returning channels in `[0, 1]` (unclamped)
#[inline]
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let scaled = h * 6.0;
    let floor = scaled.floor();
    let f = scaled - floor;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);

    match (floor as i64).rem_euclid(6) {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

/// Scale a `[0, 1]` channel to a byte: clamp first, then truncate
#[inline]
pub fn channel_u8(x: f32) -> u8 {
    (x * 255.0).clamp(0.0, 255.0) as u8
}

/// HSV to a clamped and truncated RGB8 triple
#[inline]
pub fn hsv_to_rgb8(h: f32, s: f32, v: f32) -> [u8; 3] {
    let [r, g, b] = hsv_to_rgb(h, s, v);
    [channel_u8(r), channel_u8(g), channel_u8(b)]
}

/// Convert equal-length HSV planes into a packed RGB8 buffer
///
/// `rgb` must hold exactly three bytes per plane element. `row_len` is the number of
/// pixels per row and only controls how the work is split across threads.
pub fn convert_planes(
    hue: &[f32],
    saturation: &[f32],
    value: &[f32],
    rgb: &mut [u8],
    row_len: usize,
) -> Result<(), SynthesisError> {
    let len = hue.len();
    if saturation.len() != len || value.len() != len || rgb.len() != len * 3 {
        return Err(SynthesisError::PlaneMismatch {
            hue: len,
            saturation: saturation.len(),
            value: value.len(),
            output: rgb.len(),
        });
    }
    let row_len = row_len.max(1);

    rgb.par_chunks_mut(row_len * 3)
        .zip(hue.par_chunks(row_len))
        .zip(saturation.par_chunks(row_len))
        .zip(value.par_chunks(row_len))
        .for_each(|(((out, h), s), v)| {
            for (i, px) in out.chunks_exact_mut(3).enumerate() {
                px.copy_from_slice(&hsv_to_rgb8(h[i], s[i], v[i]));
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [u8; 3], b: [u8; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (*x as i16 - *y as i16).abs() <= 1)
    }

    #[test]
    fn test_primary_hues() {
        assert_eq!(hsv_to_rgb8(0.0, 1.0, 1.0), [255, 0, 0]);
        assert!(close(hsv_to_rgb8(1.0 / 3.0, 1.0, 1.0), [0, 255, 0]));
        assert!(close(hsv_to_rgb8(2.0 / 3.0, 1.0, 1.0), [0, 0, 255]));
    }

    #[test]
    fn test_hue_wraps() {
        assert_eq!(hsv_to_rgb8(1.0, 1.0, 1.0), hsv_to_rgb8(0.0, 1.0, 1.0));
        assert_eq!(hsv_to_rgb8(-0.5, 1.0, 1.0), hsv_to_rgb8(0.5, 1.0, 1.0));
    }

    #[test]
    fn test_greys_ignore_hue() {
        for h in [0.0, 0.2, 0.55, 0.9] {
            assert_eq!(hsv_to_rgb8(h, 0.0, 0.5), [127, 127, 127]);
        }
        assert_eq!(hsv_to_rgb8(0.3, 0.7, 0.0), [0, 0, 0]);
    }

    #[test]
    fn test_channel_clamps_before_truncating() {
        assert_eq!(channel_u8(1.7), 255);
        assert_eq!(channel_u8(-0.2), 0);
        assert_eq!(channel_u8(0.999), 254);
    }

    #[test]
    fn test_convert_planes_matches_scalar() {
        let hue = [0.0, 0.25, 0.5, 0.75, 0.1, 0.9];
        let sat = [1.0, 0.5, 0.8, 1.0, 0.0, 0.3];
        let val = [1.0, 0.6, 0.4, 0.9, 0.5, 1.0];
        let mut rgb = vec![0u8; 18];

        convert_planes(&hue, &sat, &val, &mut rgb, 3).unwrap();

        for i in 0..6 {
            assert_eq!(&rgb[i * 3..i * 3 + 3], &hsv_to_rgb8(hue[i], sat[i], val[i]));
        }
    }

    #[test]
    fn test_convert_planes_rejects_mismatch() {
        let mut rgb = vec![0u8; 6];
        let result = convert_planes(&[0.0, 0.1], &[1.0], &[1.0, 1.0], &mut rgb, 2);
        assert!(matches!(result, Err(SynthesisError::PlaneMismatch { .. })));
    }
}
