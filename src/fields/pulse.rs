use std::f32::consts::TAU;

use crate::{
    error::Result,
    fields::{
        grid::{HsvPlanes, PolarGrid},
        FieldKind, FieldSynthesizer,
    },
    video::Frame,
};

const SWIRL_RATE: f32 = 0.7;
const SWIRL_STRENGTH: f32 = 2.5;
const ZOOM_RATE: f32 = 0.18;
const HUE_SPEED: f32 = 0.22;
/// Brightness pulsation frequency in Hz
const PULSATE: f32 = 3.0;

/// Pulsating vortex zooming into a bright core; stateless apart from its buffers
pub struct PulseVortex {
    width: u32,
    height: u32,
    grid: PolarGrid,
    planes: HsvPlanes,
}

impl PulseVortex {
    pub fn new(width: u32, height: u32) -> Self {
        let grid = PolarGrid::new(width, height);
        let planes = HsvPlanes::new(grid.len());
        Self {
            width,
            height,
            grid,
            planes,
        }
    }
}

fn shade(r: f32, theta: f32, t: f32) -> (f32, f32, f32) {
    let angle = theta - SWIRL_RATE * t - SWIRL_STRENGTH / (1.5 + r);
    let r_scaled = r * (-ZOOM_RATE * t).exp();

    let hue = (HUE_SPEED * t + angle / TAU).rem_euclid(1.0);
    let hue = (hue + (5.0 * r_scaled + t * 0.5).sin() * 0.03).rem_euclid(1.0);
    let sat = (0.7 + 0.3 * (3.0 * r + t).sin()).clamp(0.0, 1.0);
    let pulse = 0.5 + 0.5 * (TAU * PULSATE * t - 6.0 * r).sin();
    let val = (-2.5 * r_scaled).exp() * (0.7 + 0.3 * pulse);

    (hue, sat, val)
}

impl FieldSynthesizer for PulseVortex {
    fn kind(&self) -> FieldKind {
        FieldKind::Pulse
    }

    fn step(&mut self, logical_time: f64) -> Result<Frame> {
        let t = logical_time as f32;
        self.planes.shade(&self.grid, |r, theta| shade(r, theta, t));
        self.planes.to_frame(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_is_brighter_than_corners() {
        let mut field = PulseVortex::new(48, 48);
        let frame = field.step(0.0).unwrap();

        let luma = |p: [u8; 3]| p.iter().map(|c| u32::from(*c)).sum::<u32>();
        assert!(luma(frame.get_pixel(24, 24)) > luma(frame.get_pixel(0, 0)));
    }

    #[test]
    fn test_zoom_brightens_over_time() {
        // As the sampling radius shrinks the whole disc brightens
        let (_, _, early) = shade(0.8, 0.0, 0.0);
        let (_, _, late) = shade(0.8, 0.0, 10.0);
        assert!(late > early);
    }
}
