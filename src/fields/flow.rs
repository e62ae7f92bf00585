use std::f32::consts::TAU;

use rand::{rngs::SmallRng, Rng};
use rayon::prelude::*;

use crate::{
    color::{channel_u8, hsv_to_rgb},
    error::Result,
    fields::{grid::linspace, FieldKind, FieldMetadata, FieldSynthesizer, SamplePolicy},
    video::Frame,
};

/// `(scale, speed)` of each travelling wave layer
const LAYERS: [(f32, f32); 3] = [(1.4, 0.35), (2.3, 0.6), (3.7, 0.9)];

#[derive(Debug, Clone, Copy)]
struct WaveLayer {
    dx: f32,
    dy: f32,
    scale: f32,
    speed: f32,
    hue0: f32,
    hue_rate: f32,
}

impl WaveLayer {
    /// Float RGB in `[0, 1]` of this layer at normalized `(x, y)` and time `t`
    #[inline]
    fn sample(&self, x: f32, y: f32, t: f32) -> [f32; 3] {
        let phase = (x * self.dx + y * self.dy) * self.scale;
        let wave = ((TAU * (phase + t * self.speed)).sin() + 1.0) * 0.5;
        let hue = (self.hue0 + self.hue_rate * t + 0.15 * wave).rem_euclid(1.0);
        let sat = (0.6 + 0.4 * wave).clamp(0.0, 1.0);
        let val = (0.35 + 0.65 * wave).clamp(0.0, 1.0);
        hsv_to_rgb(hue, sat, val)
    }
}

/// Layered flow field
///
/// Several independent sine waves with a random direction per run, each hue-mapped
/// and averaged. Frames are a pure function of time, so nothing is integrated.
pub struct FlowField {
    width: u32,
    height: u32,
    xs: Vec<f32>,
    ys: Vec<f32>,
    layers: Vec<WaveLayer>,
}

impl FlowField {
    pub fn new(width: u32, height: u32, mut rng: SmallRng) -> Self {
        let layers = LAYERS
            .iter()
            .map(|&(scale, speed)| {
                let angle = rng.gen_range(0.0..TAU);
                WaveLayer {
                    dx: angle.cos(),
                    dy: angle.sin(),
                    scale,
                    speed,
                    hue0: rng.gen::<f32>(),
                    hue_rate: rng.gen_range(0.05..0.25),
                }
            })
            .collect();

        Self {
            width,
            height,
            xs: linspace(-1.0, 1.0, width as usize),
            ys: linspace(-1.0, 1.0, height as usize),
            layers,
        }
    }
}

impl FieldSynthesizer for FlowField {
    fn kind(&self) -> FieldKind {
        FieldKind::Flow
    }

    fn step(&mut self, logical_time: f64) -> Result<Frame> {
        let t = logical_time as f32;
        let mut frame = Frame::new_black(self.width, self.height);
        let stride = self.width as usize * 3;
        let layers = &self.layers;
        let xs = &self.xs;
        let count = layers.len() as f32;

        frame
            .as_bytes_mut()
            .par_chunks_mut(stride)
            .zip(self.ys.par_iter())
            .for_each(|(row, &y)| {
                for (px, &x) in row.chunks_exact_mut(3).zip(xs) {
                    let mut acc = [0.0f32; 3];
                    for layer in layers {
                        let rgb = layer.sample(x, y, t);
                        acc[0] += rgb[0];
                        acc[1] += rgb[1];
                        acc[2] += rgb[2];
                    }
                    px[0] = channel_u8(acc[0] / count);
                    px[1] = channel_u8(acc[1] / count);
                    px[2] = channel_u8(acc[2] / count);
                }
            });

        Ok(frame)
    }

    fn metadata(&self) -> FieldMetadata {
        FieldMetadata {
            sample_policy: SamplePolicy::ClampTruncate,
            stateful: false,
            parameters: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_flow_is_a_function_of_time() {
        let mut field = FlowField::new(32, 18, SmallRng::seed_from_u64(3));
        let a = field.step(1.5).unwrap();
        let _ = field.step(2.0).unwrap();
        let b = field.step(1.5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_flow_animates() {
        let mut field = FlowField::new(32, 18, SmallRng::seed_from_u64(3));
        let a = field.step(0.0).unwrap();
        let b = field.step(0.5).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.as_bytes().len(), 32 * 18 * 3);
    }

    #[test]
    fn test_same_seed_same_frames() {
        let mut a = FlowField::new(16, 16, SmallRng::seed_from_u64(11));
        let mut b = FlowField::new(16, 16, SmallRng::seed_from_u64(11));
        assert_eq!(a.step(0.25).unwrap(), b.step(0.25).unwrap());
    }
}
