//! # Procedural Fields
//!
//! Each field is a frame synthesizer: created once per run from a validated session,
//! then stepped through logical time to produce one frame per step.
//!
//! ## Built-in Fields
//!
//! - **Flow**: layered travelling sine waves mapped through hue
//! - **Starfield**: depth-layered stars drifting left
//! - **Ball**: a bouncing ball that recolors on impact
//! - **Vortex**: a black-hole spiral with optional infalling objects
//! - **Pulse**: a pulsating vortex zooming into a bright core
//! - **Gradient**: stacked directional gradients with 8-bit wraparound
//! - **ColorCycle**: solid full-frame hue cycle
//!
//! ## Usage
//!
//! ```rust,no_run
//! use framesmith::fields::{FieldSynthesizer, Synthesizer};
//! use framesmith::session::{SessionRequest, SessionValidator};
//!
//! let session = SessionValidator::new().validate(&SessionRequest::default()).unwrap();
//! let mut field = Synthesizer::init(&session);
//! let frame = field.step(0.0).unwrap();
//! assert_eq!(frame.width(), session.width());
//! ```

pub mod grid;
pub mod params;
pub mod traits;

pub mod ball;
pub mod color_cycle;
pub mod flow;
pub mod gradient;
pub mod pulse;
pub mod starfield;
pub mod vortex;

pub use params::{BallParams, FieldKind, FieldParams, GradientParams, StarfieldParams, VortexParams};
pub use traits::{FieldMetadata, FieldSynthesizer, SamplePolicy};

pub use ball::BouncingBall;
pub use color_cycle::ColorCycle;
pub use flow::FlowField;
pub use gradient::AdditiveGradient;
pub use pulse::PulseVortex;
pub use starfield::Starfield;
pub use vortex::Vortex;

use rand::{rngs::SmallRng, SeedableRng};
use tracing::debug;

use crate::{
    error::Result,
    session::{SessionRequest, SessionValidator, ValidatedSession},
    video::Frame,
};

/// The field chosen for a run, holding that field's state
pub enum Synthesizer {
    Flow(FlowField),
    Starfield(Starfield),
    Ball(BouncingBall),
    Vortex(Vortex),
    Pulse(PulseVortex),
    Gradient(AdditiveGradient),
    ColorCycle(ColorCycle),
}

impl Synthesizer {
    /// Build the session's field, seeded from the session seed
    pub fn init(session: &ValidatedSession) -> Self {
        Self::with_seed(session, session.seed())
    }

    /// Build the session's field with an explicit seed
    pub fn with_seed(session: &ValidatedSession, seed: u64) -> Self {
        let (width, height, fps) = (session.width(), session.height(), session.fps());
        let rng = SmallRng::seed_from_u64(seed);

        let synthesizer = match session.field() {
            FieldParams::Flow => Synthesizer::Flow(FlowField::new(width, height, rng)),
            FieldParams::Starfield(params) => {
                Synthesizer::Starfield(Starfield::new(width, height, fps, params, rng))
            }
            FieldParams::Ball(params) => Synthesizer::Ball(BouncingBall::new(width, height, fps, params, rng)),
            FieldParams::Vortex(params) => Synthesizer::Vortex(Vortex::new(width, height, fps, params, rng)),
            FieldParams::Pulse => Synthesizer::Pulse(PulseVortex::new(width, height)),
            FieldParams::Gradient(params) => {
                Synthesizer::Gradient(AdditiveGradient::new(width, height, fps, params, rng))
            }
            FieldParams::ColorCycle => {
                Synthesizer::ColorCycle(ColorCycle::new(width, height, session.total_seconds()))
            }
        };

        debug!("Initialized {} field at {}x{} (seed {})", synthesizer.name(), width, height, seed);
        synthesizer
    }

    /// Metadata of a field built with its default parameters
    ///
    /// Used for listings; the field is built on a small throwaway session.
    pub fn describe(kind: FieldKind) -> Result<FieldMetadata> {
        let request = SessionRequest {
            width: 160,
            height: 90,
            seconds: 1.0,
            seed: Some(0),
            field: FieldParams::defaults_for(kind),
            ..SessionRequest::default()
        };
        let session = SessionValidator::new().validate(&request)?;
        Ok(Synthesizer::init(&session).metadata())
    }

    fn inner(&self) -> &dyn FieldSynthesizer {
        match self {
            Synthesizer::Flow(f) => f,
            Synthesizer::Starfield(f) => f,
            Synthesizer::Ball(f) => f,
            Synthesizer::Vortex(f) => f,
            Synthesizer::Pulse(f) => f,
            Synthesizer::Gradient(f) => f,
            Synthesizer::ColorCycle(f) => f,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn FieldSynthesizer {
        match self {
            Synthesizer::Flow(f) => f,
            Synthesizer::Starfield(f) => f,
            Synthesizer::Ball(f) => f,
            Synthesizer::Vortex(f) => f,
            Synthesizer::Pulse(f) => f,
            Synthesizer::Gradient(f) => f,
            Synthesizer::ColorCycle(f) => f,
        }
    }
}

impl FieldSynthesizer for Synthesizer {
    fn kind(&self) -> FieldKind {
        self.inner().kind()
    }

    fn step(&mut self, logical_time: f64) -> Result<Frame> {
        self.inner_mut().step(logical_time)
    }

    fn metadata(&self) -> FieldMetadata {
        self.inner().metadata()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{
        fields::FieldParams,
        session::{SessionRequest, SessionValidator, ValidatedSession},
    };

    /// A small session that validates for every field kind
    pub fn session(field: FieldParams, seconds: f64, fps: f64, dup: u32) -> ValidatedSession {
        let request = SessionRequest {
            width: 96,
            height: 54,
            seconds,
            fps,
            duplication_factor: dup,
            seed: Some(42),
            field,
            ..SessionRequest::default()
        };
        SessionValidator::new().validate(&request).unwrap()
    }
}
