use std::f64::consts::TAU;

use rand::{rngs::SmallRng, Rng};
use tracing::trace;

use crate::{
    error::Result,
    fields::{BallParams, FieldKind, FieldMetadata, FieldSynthesizer, SamplePolicy},
    video::Frame,
};

/// Ball-physics field
///
/// Position integrates velocity at a fixed `1 / fps` timestep. Crossing a wall clamps
/// the position onto that wall, reflects the crossed velocity component and fires
/// one recolor for the step, however many walls were hit.
pub struct BouncingBall {
    width: f64,
    height: f64,
    radius: f64,
    dt: f64,
    position: [f64; 2],
    velocity: [f64; 2],
    color: [u8; 3],
    recolors: u64,
    disc: Vec<(i64, i64)>,
    rng: SmallRng,
}

impl BouncingBall {
    pub fn new(width: u32, height: u32, fps: f64, params: &BallParams, mut rng: SmallRng) -> Self {
        let radius = f64::from(params.radius);
        let (w, h) = (f64::from(width), f64::from(height));
        let position = [
            rng.gen_range(radius..=w - radius),
            rng.gen_range(radius..=h - radius),
        ];
        let angle = rng.gen_range(0.0..TAU);
        let speed = f64::from(params.speed);
        let velocity = [angle.cos() * speed, angle.sin() * speed];
        let color = random_color(&mut rng);

        Self::from_parts(width, height, params.radius, fps, position, velocity, color, rng)
    }

    /// Build a ball in an explicit state
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        width: u32,
        height: u32,
        radius: u32,
        fps: f64,
        position: [f64; 2],
        velocity: [f64; 2],
        color: [u8; 3],
        rng: SmallRng,
    ) -> Self {
        let r = i64::from(radius);
        let disc = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
            .collect();

        Self {
            width: f64::from(width),
            height: f64::from(height),
            radius: f64::from(radius),
            dt: 1.0 / fps,
            position,
            velocity,
            color,
            recolors: 0,
            disc,
            rng,
        }
    }

    pub fn position(&self) -> [f64; 2] {
        self.position
    }

    pub fn velocity(&self) -> [f64; 2] {
        self.velocity
    }

    pub fn color(&self) -> [u8; 3] {
        self.color
    }

    /// Number of bounce recolors so far
    pub fn recolors(&self) -> u64 {
        self.recolors
    }

    /// Integrate one timestep; returns whether any wall was hit
    pub fn advance(&mut self) -> bool {
        let extents = [self.width, self.height];
        let mut bounced = false;

        for axis in 0..2 {
            self.position[axis] += self.velocity[axis] * self.dt;

            let low = self.radius;
            let high = extents[axis] - self.radius;
            if self.position[axis] < low {
                self.position[axis] = low;
                self.velocity[axis] = self.velocity[axis].abs();
                bounced = true;
            } else if self.position[axis] > high {
                self.position[axis] = high;
                self.velocity[axis] = -self.velocity[axis].abs();
                bounced = true;
            }
        }

        if bounced {
            self.color = random_color(&mut self.rng);
            self.recolors += 1;
            trace!("bounce at ({:.1}, {:.1})", self.position[0], self.position[1]);
        }

        bounced
    }

    fn draw(&self) -> Frame {
        let (width, height) = (self.width as u32, self.height as u32);
        let mut frame = Frame::new_black(width, height);
        let cx = self.position[0].round() as i64;
        let cy = self.position[1].round() as i64;
        let stride = width as usize * 3;
        let bytes = frame.as_bytes_mut();

        for &(dx, dy) in &self.disc {
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
                continue;
            }
            let idx = y as usize * stride + x as usize * 3;
            bytes[idx..idx + 3].copy_from_slice(&self.color);
        }

        frame
    }
}

fn random_color(rng: &mut SmallRng) -> [u8; 3] {
    [rng.gen_range(60..=255), rng.gen_range(60..=255), rng.gen_range(60..=255)]
}

impl FieldSynthesizer for BouncingBall {
    fn kind(&self) -> FieldKind {
        FieldKind::Ball
    }

    fn step(&mut self, _logical_time: f64) -> Result<Frame> {
        self.advance();
        Ok(self.draw())
    }

    fn metadata(&self) -> FieldMetadata {
        FieldMetadata {
            sample_policy: SamplePolicy::ClampTruncate,
            stateful: true,
            parameters: vec![
                ("radius".to_string(), "Ball radius in pixels (default 40)".to_string()),
                ("speed".to_string(), "Speed in pixels per second (default 450)".to_string()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn ball_at(position: [f64; 2], velocity: [f64; 2]) -> BouncingBall {
        BouncingBall::from_parts(200, 100, 10, 30.0, position, velocity, [100, 100, 100], SmallRng::seed_from_u64(5))
    }

    #[test]
    fn test_left_wall_bounce_clamps_and_reflects() {
        let mut ball = ball_at([10.0, 50.0], [-300.0, 0.0]);

        assert!(ball.advance());
        assert_eq!(ball.position()[0], 10.0);
        assert_eq!(ball.velocity()[0], 300.0);
        assert_eq!(ball.recolors(), 1);

        // Moving away: no further bounce
        assert!(!ball.advance());
        assert_eq!(ball.recolors(), 1);
        assert!(ball.position()[0] > 10.0);
    }

    #[test]
    fn test_corner_hit_recolors_once() {
        let mut ball = ball_at([189.0, 89.0], [300.0, 300.0]);

        assert!(ball.advance());
        assert_eq!(ball.position(), [190.0, 90.0]);
        assert_eq!(ball.velocity(), [-300.0, -300.0]);
        assert_eq!(ball.recolors(), 1);
    }

    #[test]
    fn test_free_flight_integrates_velocity() {
        let mut ball = ball_at([100.0, 50.0], [30.0, -60.0]);
        assert!(!ball.advance());
        assert!((ball.position()[0] - 101.0).abs() < 1e-9);
        assert!((ball.position()[1] - 48.0).abs() < 1e-9);
    }

    #[test]
    fn test_ball_stays_inside_over_a_long_run() {
        let params = BallParams { radius: 12, speed: 900.0 };
        let mut ball = BouncingBall::new(160, 90, 30.0, &params, SmallRng::seed_from_u64(9));
        for i in 0..600 {
            ball.step(i as f64 / 30.0).unwrap();
            let [x, y] = ball.position();
            assert!((12.0..=148.0).contains(&x));
            assert!((12.0..=78.0).contains(&y));
        }
        assert!(ball.recolors() > 0);
    }

    #[test]
    fn test_draws_ball_in_its_color() {
        let mut ball = ball_at([100.0, 50.0], [0.0, 0.0]);
        let frame = ball.step(0.0).unwrap();
        assert_eq!(frame.get_pixel(100, 50), ball.color());
        assert_eq!(frame.get_pixel(0, 0), [0, 0, 0]);
    }
}
