//! Coordinate planes shared by the shader-style fields.

use rayon::prelude::*;

use crate::{color::convert_planes, error::Result, video::Frame};

/// `n` evenly spaced samples from `start` to `end` inclusive
pub fn linspace(start: f32, end: f32, n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f32;
            (0..n).map(|i| start + step * i as f32).collect()
        }
    }
}

/// Per-pixel polar coordinates of an aspect-corrected `[-1, 1]` grid
///
/// `x` is stretched by `width / height` so circles stay round; `radius` carries a
/// small offset so it is never zero.
#[derive(Debug, Clone)]
pub struct PolarGrid {
    pub width: usize,
    pub height: usize,
    pub aspect: f32,
    pub radius: Vec<f32>,
    pub theta: Vec<f32>,
}

impl PolarGrid {
    pub fn new(width: u32, height: u32) -> Self {
        let (w, h) = (width as usize, height as usize);
        let aspect = width as f32 / height as f32;
        let xs: Vec<f32> = linspace(-1.0, 1.0, w).into_iter().map(|x| x * aspect).collect();
        let ys = linspace(-1.0, 1.0, h);

        let mut radius = Vec::with_capacity(w * h);
        let mut theta = Vec::with_capacity(w * h);
        for &y in &ys {
            for &x in &xs {
                radius.push((x * x + y * y).sqrt() + 1e-6);
                theta.push(y.atan2(x));
            }
        }

        Self {
            width: w,
            height: h,
            aspect,
            radius,
            theta,
        }
    }

    pub fn len(&self) -> usize {
        self.radius.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radius.is_empty()
    }
}

/// Reusable hue/saturation/value scratch planes, sized once per run
#[derive(Debug, Clone)]
pub struct HsvPlanes {
    pub hue: Vec<f32>,
    pub saturation: Vec<f32>,
    pub value: Vec<f32>,
}

impl HsvPlanes {
    pub fn new(len: usize) -> Self {
        Self {
            hue: vec![0.0; len],
            saturation: vec![0.0; len],
            value: vec![0.0; len],
        }
    }

    /// Fill every pixel from `shade(radius, theta) -> (h, s, v)`, rows in parallel
    pub fn shade<F>(&mut self, grid: &PolarGrid, shade: F)
    where
        F: Fn(f32, f32) -> (f32, f32, f32) + Sync,
    {
        let row = grid.width.max(1);
        self.hue
            .par_chunks_mut(row)
            .zip(self.saturation.par_chunks_mut(row))
            .zip(self.value.par_chunks_mut(row))
            .zip(grid.radius.par_chunks(row))
            .zip(grid.theta.par_chunks(row))
            .for_each(|((((h, s), v), radius), theta)| {
                for i in 0..h.len() {
                    let (hh, ss, vv) = shade(radius[i], theta[i]);
                    h[i] = hh;
                    s[i] = ss;
                    v[i] = vv;
                }
            });
    }

    /// Convert the planes into a clamp-truncated RGB frame
    pub fn to_frame(&self, width: u32, height: u32) -> Result<Frame> {
        let mut frame = Frame::new_black(width, height);
        convert_planes(
            &self.hue,
            &self.saturation,
            &self.value,
            frame.as_bytes_mut(),
            width as usize,
        )?;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_endpoints() {
        assert_eq!(linspace(-1.0, 1.0, 5), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(linspace(-1.0, 1.0, 1), vec![-1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_polar_grid_is_aspect_corrected() {
        let grid = PolarGrid::new(4, 2);
        assert_eq!(grid.len(), 8);
        assert_eq!(grid.aspect, 2.0);

        // Top-left corner sits at (-2, -1)
        let expected = (4.0f32 + 1.0).sqrt() + 1e-6;
        assert!((grid.radius[0] - expected).abs() < 1e-5);
        assert!(grid.radius.iter().all(|r| *r > 0.0));
    }

    #[test]
    fn test_shade_writes_every_pixel() {
        let grid = PolarGrid::new(8, 6);
        let mut planes = HsvPlanes::new(grid.len());
        planes.shade(&grid, |r, _| (0.0, 1.0, r.min(1.0)));

        assert!(planes.saturation.iter().all(|s| *s == 1.0));
        let frame = planes.to_frame(8, 6).unwrap();
        assert_eq!(frame.as_bytes().len(), 8 * 6 * 3);
    }
}
