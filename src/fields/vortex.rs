use std::f32::consts::{PI, TAU};

use rand::{rngs::SmallRng, Rng};

use crate::{
    error::Result,
    fields::{
        grid::{HsvPlanes, PolarGrid},
        FieldKind, FieldMetadata, FieldSynthesizer, SamplePolicy, VortexParams,
    },
    video::Frame,
};

/// Event horizon radius in normalized units
const HORIZON: f32 = 0.28;
const FADE_WIDTH: f32 = 0.08;
/// Global angular speed (rad/s)
const SWIRL_RATE: f32 = 1.2;
/// Extra twist toward the center
const SWIRL_SHEAR: f32 = 3.0;
/// Perceived inward flow; only shifts sampling, the hole never grows
const FLOW_SPEED: f32 = 0.35;
const JITTER: f32 = 0.04;
const STRETCH_POWER: f32 = 1.6;

const OBJECT_MAX_RADIUS: f32 = 0.9;
const OBJECT_SPEED: (f32, f32) = (0.12, 0.35);

/// Shader parameters drawn once per run
#[derive(Debug, Clone, Copy)]
struct Palette {
    base_hue: f32,
    hue_speed: f32,
}

impl Palette {
    /// Hue, saturation and value of the disc at radius `r`, angle `theta`, time `t`
    #[inline]
    fn shade(&self, r: f32, theta: f32, t: f32) -> (f32, f32, f32) {
        let angle = theta - SWIRL_RATE * t - SWIRL_SHEAR / (1.2 + r) - FLOW_SPEED * r * t;
        let stretch = 1.0 + (-(r / HORIZON).powf(STRETCH_POWER)).exp() * 3.0;
        let stretched = angle * stretch;

        let hue = (self.base_hue + self.hue_speed * t + stretched / TAU - FLOW_SPEED * r * t).rem_euclid(1.0);
        let hue = (hue + (7.0 * r + t).sin() * JITTER).rem_euclid(1.0);

        let (sat, val) = if r < HORIZON {
            let inside = r / HORIZON;
            (0.2 * inside, (-2.0 * r).exp() * 0.9 * inside)
        } else {
            let sat = (1.0 - (-((r - HORIZON) / FADE_WIDTH)).exp()).clamp(0.0, 1.0);
            (sat, (-2.0 * r).exp() * 0.9)
        };

        (hue, sat, val)
    }
}

/// Point objects falling toward the horizon, in polar coordinates
struct Infall {
    radius: Vec<f32>,
    theta: Vec<f32>,
    speed: Vec<f32>,
    color: Vec<[u8; 3]>,
    size: Vec<u8>,
}

impl Infall {
    fn new(count: usize, rng: &mut SmallRng) -> Self {
        let mut infall = Self {
            radius: vec![0.0; count],
            theta: vec![0.0; count],
            speed: vec![0.0; count],
            color: vec![[0; 3]; count],
            size: vec![1; count],
        };
        for i in 0..count {
            infall.respawn(i, 0.02, rng);
        }
        infall
    }

    fn respawn(&mut self, i: usize, min_radius: f32, rng: &mut SmallRng) {
        self.radius[i] = rng.gen_range(min_radius..OBJECT_MAX_RADIUS);
        self.theta[i] = rng.gen_range(-PI..PI);
        self.speed[i] = rng.gen_range(OBJECT_SPEED.0..OBJECT_SPEED.1);
        self.color[i] = [0; 3].map(|_| (rng.gen_range(0.6f32..1.0) * 255.0) as u8);
        self.size[i] = rng.gen_range(1..=3);
    }

    /// Drift inward one timestep and respawn anything that crossed the horizon
    fn advance(&mut self, dt: f32, rng: &mut SmallRng) -> usize {
        let mut respawned = 0;
        for i in 0..self.radius.len() {
            self.radius[i] -= self.speed[i] * dt;
            self.theta[i] += SWIRL_RATE * dt;
            if self.radius[i] < HORIZON {
                self.respawn(i, OBJECT_MAX_RADIUS * 0.6, rng);
                respawned += 1;
            }
        }
        respawned
    }

    fn splat(&self, frame: &mut Frame, aspect: f32) {
        let (w, h) = (frame.width() as f32, frame.height() as f32);
        for i in 0..self.radius.len() {
            let x = self.radius[i] * self.theta[i].cos();
            let y = self.radius[i] * self.theta[i].sin();
            let col = (((x / aspect + 1.0) * 0.5 * (w - 1.0)) as i64).clamp(0, w as i64 - 1);
            let row = (((y + 1.0) * 0.5 * (h - 1.0)) as i64).clamp(0, h as i64 - 1);
            frame.add_square_saturating(col, row, i64::from(self.size[i]), self.color[i]);
        }
    }
}

/// Black-hole spiral
///
/// Angle and radius are pure functions of the normalized pixel position and elapsed
/// time: material swirls in, stretches tangentially near the horizon, desaturates and
/// fades to black inside it. Infalling objects, when enabled, are the only state.
pub struct Vortex {
    width: u32,
    height: u32,
    dt: f32,
    grid: PolarGrid,
    planes: HsvPlanes,
    palette: Palette,
    infall: Option<Infall>,
    rng: SmallRng,
}

impl Vortex {
    pub fn new(width: u32, height: u32, fps: f64, params: &VortexParams, mut rng: SmallRng) -> Self {
        let grid = PolarGrid::new(width, height);
        let planes = HsvPlanes::new(grid.len());
        let palette = Palette {
            hue_speed: rng.gen_range(0.15..0.45),
            base_hue: rng.gen(),
        };
        let infall = params
            .infalling_objects
            .then(|| Infall::new(params.object_count, &mut rng));

        Self {
            width,
            height,
            dt: (1.0 / fps) as f32,
            grid,
            planes,
            palette,
            infall,
            rng,
        }
    }

    pub fn object_count(&self) -> usize {
        self.infall.as_ref().map_or(0, |infall| infall.radius.len())
    }
}

impl FieldSynthesizer for Vortex {
    fn kind(&self) -> FieldKind {
        FieldKind::Vortex
    }

    fn step(&mut self, logical_time: f64) -> Result<Frame> {
        let t = logical_time as f32;
        let palette = self.palette;
        self.planes.shade(&self.grid, |r, theta| palette.shade(r, theta, t));
        let mut frame = self.planes.to_frame(self.width, self.height)?;

        if let Some(infall) = self.infall.as_mut() {
            infall.advance(self.dt, &mut self.rng);
            infall.splat(&mut frame, self.grid.aspect);
        }

        Ok(frame)
    }

    fn metadata(&self) -> FieldMetadata {
        FieldMetadata {
            sample_policy: SamplePolicy::ClampTruncate,
            stateful: self.infall.is_some(),
            parameters: vec![
                ("infalling_objects".to_string(), "Draw objects falling into the horizon".to_string()),
                ("object_count".to_string(), "Number of infalling objects (default 40)".to_string()),
            ],
        }
    }
}
