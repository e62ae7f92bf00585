use crate::{
    color::hsv_to_rgb8,
    error::Result,
    fields::{FieldKind, FieldSynthesizer},
    video::Frame,
};

/// Solid full-frame hue cycle
///
/// One hue revolution per second, drifting by a further full revolution over the
/// whole run so the cycle never lines up with itself.
pub struct ColorCycle {
    width: u32,
    height: u32,
    total_seconds: f64,
}

impl ColorCycle {
    pub fn new(width: u32, height: u32, total_seconds: f64) -> Self {
        Self {
            width,
            height,
            total_seconds,
        }
    }

    pub fn hue_at(&self, t: f64) -> f32 {
        ((t.fract() + t / self.total_seconds).rem_euclid(1.0)) as f32
    }
}

impl FieldSynthesizer for ColorCycle {
    fn kind(&self) -> FieldKind {
        FieldKind::ColorCycle
    }

    fn step(&mut self, logical_time: f64) -> Result<Frame> {
        let color = hsv_to_rgb8(self.hue_at(logical_time), 1.0, 1.0);
        Ok(Frame::new_filled(self.width, self.height, color))
    }
}
