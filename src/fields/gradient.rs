use std::f32::consts::{FRAC_PI_2, PI};

use rand::{rngs::SmallRng, seq::SliceRandom, Rng};
use tracing::debug;

use crate::{
    error::{Result, SynthesisError},
    fields::{grid::linspace, FieldKind, FieldMetadata, FieldSynthesizer, GradientParams, SamplePolicy},
    video::Frame,
};

/// Up, down, left or right
const CARDINALS: [f32; 4] = [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2];

/// Additive gradient field
///
/// At the start of every segment a black-to-color gradient in a random cardinal
/// direction is added onto a running accumulator. Output samples keep only the low
/// eight bits of the accumulator, so overflowing channels wrap around and flash.
///
/// Segments are whole frames long: `segment_seconds * fps` rounded down, and never
/// shorter than one frame.
pub struct AdditiveGradient {
    width: u32,
    height: u32,
    fps: f64,
    segment_frames: u64,
    xs: Vec<f32>,
    ys: Vec<f32>,
    accumulator: Vec<u16>,
    segments_applied: u64,
    rng: SmallRng,
}

impl AdditiveGradient {
    pub fn new(width: u32, height: u32, fps: f64, params: &GradientParams, rng: SmallRng) -> Self {
        Self {
            width,
            height,
            fps,
            segment_frames: ((params.segment_seconds * fps) as u64).max(1),
            xs: linspace(-0.5, 0.5, width as usize),
            ys: linspace(-0.5, 0.5, height as usize),
            accumulator: vec![0; width as usize * height as usize * 3],
            segments_applied: 0,
            rng,
        }
    }

    /// Number of gradients added so far
    pub fn segments_applied(&self) -> u64 {
        self.segments_applied
    }

    /// Frames per segment
    pub fn segment_frames(&self) -> u64 {
        self.segment_frames
    }

    /// Add one gradient toward `color` along `direction` (radians)
    fn add_gradient(&mut self, direction: f32, color: [u8; 3]) {
        let (dx, dy) = (direction.cos(), direction.sin());
        let max_r = 0.5f32.sqrt();
        let mut idx = 0;

        for &y in &self.ys {
            for &x in &self.xs {
                let proj = ((x * dx + y * dy + max_r) / (2.0 * max_r + 1e-6)).clamp(0.0, 1.0);
                for channel in color {
                    // Gradient samples are truncated to integers before accumulating
                    let add = (proj * f32::from(channel)) as u16;
                    self.accumulator[idx] = self.accumulator[idx].wrapping_add(add);
                    idx += 1;
                }
            }
        }
    }

    fn render(&self) -> Result<Frame> {
        let bytes = self.accumulator.iter().map(|v| (v & 0xFF) as u8).collect();
        Frame::from_rgb_bytes(self.width, self.height, bytes).ok_or_else(|| {
            SynthesisError::StepFailed {
                field: FieldKind::Gradient,
                reason: format!(
                    "accumulator holds {} samples, a {}x{} frame needs {}",
                    self.accumulator.len(),
                    self.width,
                    self.height,
                    self.width as usize * self.height as usize * 3
                ),
            }
            .into()
        })
    }
}

impl FieldSynthesizer for AdditiveGradient {
    fn kind(&self) -> FieldKind {
        FieldKind::Gradient
    }

    fn step(&mut self, logical_time: f64) -> Result<Frame> {
        let frame_index = (logical_time * self.fps).round().max(0.0) as u64;
        let segment = frame_index / self.segment_frames;

        // Every boundary crossed adds once, even when a step skips past several
        while self.segments_applied <= segment {
            let color = [self.rng.gen(), self.rng.gen(), self.rng.gen()];
            let direction = *CARDINALS.choose(&mut self.rng).unwrap_or(&0.0);
            debug!(
                "gradient segment {} at {:.2}s: direction {:.2} rad, color {:?}",
                self.segments_applied, logical_time, direction, color
            );
            self.add_gradient(direction, color);
            self.segments_applied += 1;
        }

        self.render()
    }

    fn metadata(&self) -> FieldMetadata {
        FieldMetadata {
            sample_policy: SamplePolicy::Wrap256,
            stateful: true,
            parameters: vec![(
                "segment_seconds".to_string(),
                "Seconds between gradient additions (default 4.0)".to_string(),
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn gradient(segment_seconds: f64) -> AdditiveGradient {
        AdditiveGradient::new(16, 8, 10.0, &GradientParams { segment_seconds }, SmallRng::seed_from_u64(13))
    }

    #[test]
    fn test_output_wraps_instead_of_clamping() {
        let mut field = gradient(4.0);
        field.add_gradient(0.0, [255, 255, 255]);
        field.add_gradient(0.0, [255, 255, 255]);

        // Rightmost column projects to ~0.85 in both passes: 217 + 217 wraps to 178
        let max_r = 0.5f32.sqrt();
        let proj = ((field.xs[15] + max_r) / (2.0 * max_r + 1e-6)).clamp(0.0, 1.0);
        let single = (proj * 255.0) as u16;
        assert!(single * 2 > 255);

        let frame = field.render().unwrap();
        let right = frame.get_pixel(15, 4);
        assert_eq!(u16::from(right[0]), (single * 2) & 0xFF);
        assert!(u16::from(right[0]) < single);
    }

    #[test]
    fn test_one_addition_per_segment() {
        let mut field = gradient(1.0);
        let fps = 10.0;

        let first = field.step(0.0).unwrap();
        assert_eq!(field.segments_applied(), 1);

        // Constant within a segment
        for i in 1..10 {
            assert_eq!(field.step(i as f64 / fps).unwrap(), first);
        }
        assert_eq!(field.segments_applied(), 1);

        field.step(1.0).unwrap();
        assert_eq!(field.segments_applied(), 2);
    }

    #[test]
    fn test_skipped_boundaries_still_add() {
        let mut field = gradient(1.0);
        field.step(0.0).unwrap();
        field.step(3.5).unwrap();
        assert_eq!(field.segments_applied(), 4);
    }

    #[test]
    fn test_accumulator_size_is_fixed() {
        let mut field = gradient(0.5);
        for i in 0..40 {
            field.step(i as f64 * 0.25).unwrap();
            assert_eq!(field.accumulator.len(), 16 * 8 * 3);
        }
    }

    #[test]
    fn test_segments_shorter_than_a_frame_add_once_per_step() {
        let mut field = gradient(1e-6);
        assert_eq!(field.segment_frames(), 1);

        for i in 0..5 {
            field.step(i as f64 / 10.0).unwrap();
            assert_eq!(field.segments_applied(), i + 1);
        }
    }

    #[test]
    fn test_segment_length_rounds_down_to_frames() {
        // 0.25s at 10 fps is 2.5 frames, so a new segment starts every 2 frames
        let mut field = gradient(0.25);
        assert_eq!(field.segment_frames(), 2);

        for i in 0..6 {
            field.step(i as f64 / 10.0).unwrap();
        }
        assert_eq!(field.segments_applied(), 3);
    }

    #[test]
    fn test_corrupt_accumulator_is_reported() {
        let mut field = gradient(1.0);
        field.step(0.0).unwrap();
        field.accumulator.truncate(10);

        // Still inside the first segment, so only the render runs
        assert!(matches!(
            field.step(0.1),
            Err(crate::error::FramesmithError::SynthesisFault(SynthesisError::StepFailed {
                field: FieldKind::Gradient,
                ..
            }))
        ));
    }
}
