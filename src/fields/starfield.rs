use rand::{rngs::SmallRng, Rng};
use tracing::trace;

use crate::{
    color::hsv_to_rgb8,
    error::Result,
    fields::{FieldKind, FieldMetadata, FieldSynthesizer, SamplePolicy, StarfieldParams},
    video::Frame,
};

/// Stars may overshoot the left edge by this much before respawning
const TRAILING_MARGIN: f32 = 3.0;

/// Horizontal starfield with depth
///
/// Nearer stars move faster and shine brighter. A star that leaves the left edge is
/// respawned just past the right edge with a freshly drawn depth, color and size.
/// All per-star arrays are allocated once and keep their length for the whole run.
pub struct Starfield {
    width: u32,
    height: u32,
    dt: f32,
    rng: SmallRng,
    x: Vec<f32>,
    y: Vec<f32>,
    depth: Vec<f32>,
    speed: Vec<f32>,
    hue: Vec<f32>,
    sat: Vec<f32>,
    val: Vec<f32>,
    size: Vec<u8>,
    respawned: u64,
}

impl Starfield {
    pub fn new(width: u32, height: u32, fps: f64, params: &StarfieldParams, mut rng: SmallRng) -> Self {
        let n = params.stars;
        let (w, h) = (width as f32, height as f32);

        let x = (0..n).map(|_| rng.gen_range(0.0..w)).collect();
        let y = (0..n).map(|_| rng.gen_range(0.0..h)).collect();
        let depth: Vec<f32> = (0..n).map(|_| rng.gen_range(0.2..1.0)).collect();
        let speed = depth.iter().map(|d| speed_for(*d)).collect();
        let hue = (0..n).map(|_| rng.gen::<f32>() * 0.15).collect();
        let sat = (0..n).map(|_| rng.gen_range(0.0..0.25)).collect();
        let val = depth.iter().map(|d| value_for(*d)).collect();
        let size = (0..n).map(|_| rng.gen_range(1..3)).collect();

        Self {
            width,
            height,
            dt: (1.0 / fps) as f32,
            rng,
            x,
            y,
            depth,
            speed,
            hue,
            sat,
            val,
            size,
            respawned: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Total respawns since the run began
    pub fn respawned(&self) -> u64 {
        self.respawned
    }

    /// Move every star one fixed timestep and respawn those past the trailing edge
    fn advance(&mut self) {
        let (w, h) = (self.width as f32, self.height as f32);
        let mut tint = None;

        for i in 0..self.x.len() {
            self.x[i] -= self.speed[i] * self.dt;
            if self.x[i] >= -TRAILING_MARGIN {
                continue;
            }

            // One shared tint offset per step for everything respawning together
            let offset = *tint.get_or_insert_with(|| self.rng.gen_range(0.0..0.2f32));
            let depth = self.rng.gen_range(0.2..1.0);
            self.x[i] = w + self.rng.gen_range(0.0..5.0);
            self.y[i] = self.rng.gen_range(0.0..h);
            self.depth[i] = depth;
            self.speed[i] = speed_for(depth);
            self.hue[i] = self.rng.gen::<f32>() * 0.15 + offset;
            self.sat[i] = self.rng.gen_range(0.0..0.25);
            self.val[i] = value_for(depth);
            self.size[i] = self.rng.gen_range(1..3);
            self.respawned += 1;
        }
    }

    fn draw(&self) -> Frame {
        let mut frame = Frame::new_black(self.width, self.height);
        let (w, h) = (self.width as i64, self.height as i64);

        for i in 0..self.x.len() {
            // Truncation toward zero, so slightly negative x still lands in column 0
            let col = self.x[i] as i64;
            let row = self.y[i] as i64;
            if col < 0 || col >= w || row < 0 || row >= h {
                continue;
            }
            let color = hsv_to_rgb8(self.hue[i], self.sat[i], self.val[i]);
            frame.fill_square(col, row, i64::from(self.size[i]), color);
        }

        frame
    }
}

fn speed_for(depth: f32) -> f32 {
    60.0 + 340.0 * depth
}

fn value_for(depth: f32) -> f32 {
    0.4 + 0.6 * depth
}

impl FieldSynthesizer for Starfield {
    fn kind(&self) -> FieldKind {
        FieldKind::Starfield
    }

    fn step(&mut self, logical_time: f64) -> Result<Frame> {
        self.advance();
        trace!("starfield t={:.3}s respawned={}", logical_time, self.respawned);
        Ok(self.draw())
    }

    fn metadata(&self) -> FieldMetadata {
        FieldMetadata {
            sample_policy: SamplePolicy::ClampTruncate,
            stateful: true,
            parameters: vec![("stars".to_string(), "Number of stars (default 500)".to_string())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn starfield(stars: usize, seed: u64) -> Starfield {
        Starfield::new(160, 90, 30.0, &StarfieldParams { stars }, SmallRng::seed_from_u64(seed))
    }

    #[test]
    fn test_arrays_keep_their_length() {
        let mut field = starfield(64, 1);
        for i in 0..300 {
            field.step(i as f64 / 30.0).unwrap();
            assert_eq!(field.len(), 64);
            assert_eq!(field.size.len(), 64);
            assert_eq!(field.hue.len(), 64);
        }
        // At >= 60 px/s a 160px wide field is crossed well within 10 seconds
        assert!(field.respawned() > 0);
    }

    #[test]
    fn test_stars_move_left_at_depth_speed() {
        let mut field = starfield(8, 2);
        let before = field.x.clone();
        field.advance();

        for i in 0..8 {
            if field.x[i] < before[i] {
                let moved = before[i] - field.x[i];
                assert!((moved - field.speed[i] / 30.0).abs() < 1e-3);
                assert!(field.speed[i] >= 60.0 && field.speed[i] <= 400.0);
            }
        }
    }

    #[test]
    fn test_respawn_lands_past_leading_edge() {
        let mut field = starfield(4, 3);
        field.x[0] = -TRAILING_MARGIN - 0.5;
        field.speed[0] = 0.0;
        field.advance();

        assert!(field.x[0] >= 160.0 && field.x[0] < 165.0);
        assert!(field.depth[0] >= 0.2 && field.depth[0] < 1.0);
        assert_eq!(field.speed[0], speed_for(field.depth[0]));
        assert!(field.respawned() >= 1);
    }

    #[test]
    fn test_draws_visible_stars() {
        let mut field = starfield(200, 4);
        let frame = field.step(0.0).unwrap();
        assert!(frame.as_bytes().iter().any(|b| *b > 0));
    }
}
