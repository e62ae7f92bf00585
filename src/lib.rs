//! # framesmith
//!
//! Procedural video synthesis streamed straight into an encoder.
//!
//! Frames are computed from per-run field state (flow fields, starfields, a
//! bouncing ball, vortex shaders, additive gradients) and written as raw RGB into
//! an external encoder process, which produces the final compressed video.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use framesmith::{
//!     composition::{CancelToken, RenderEngine},
//!     config::Config,
//!     fields::{FieldParams, StarfieldParams},
//!     session::{SessionRequest, SessionValidator},
//! };
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let request = SessionRequest {
//!     output: "stars.mp4".into(),
//!     seconds: 20.0,
//!     field: FieldParams::Starfield(StarfieldParams { stars: 800 }),
//!     ..SessionRequest::default()
//! };
//!
//! let session = SessionValidator::new().validate(&request)?;
//! let engine = RenderEngine::new(session, config.encoder, config.render);
//! let summary = engine.run(None, &CancelToken::new())?;
//! println!("wrote {} frames", summary.frames_written);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`session`] - Validation and the time-to-frame schedule
//! - [`fields`] - The procedural field variants
//! - [`color`] - HSV to RGB conversion
//! - [`video`] - Frame rasters and the encoder pipe
//! - [`composition`] - Render engine, progress and cancellation
//! - [`config`] - Configuration management
//!
//! ## Custom fields
//!
//! Anything implementing [`FieldSynthesizer`](fields::FieldSynthesizer) can be
//! stepped through time:
//!
//! ```rust,no_run
//! use framesmith::fields::{FieldKind, FieldSynthesizer};
//! use framesmith::video::Frame;
//! use framesmith::Result;
//!
//! struct Black;
//!
//! impl FieldSynthesizer for Black {
//!     fn kind(&self) -> FieldKind {
//!         FieldKind::ColorCycle
//!     }
//!
//!     fn name(&self) -> &str {
//!         "black"
//!     }
//!
//!     fn step(&mut self, _logical_time: f64) -> Result<Frame> {
//!         Ok(Frame::new_black(64, 64))
//!     }
//! }
//! ```

pub mod color;
pub mod composition;
pub mod config;
pub mod error;
pub mod fields;
pub mod session;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    composition::{RenderEngine, RunSummary},
    config::Config,
    error::{FramesmithError, Result},
    fields::{FieldKind, FieldParams, FieldSynthesizer, Synthesizer},
    session::{SessionRequest, SessionValidator, ValidatedSession},
};
