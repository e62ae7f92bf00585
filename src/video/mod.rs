//! # Video Output Module
//!
//! Frame rasters and the raw-pixel pipe into the external encoder.

pub mod encoder;
pub mod frame;
pub mod sink;

pub use encoder::{EncoderPipe, EncoderSettings};
pub use frame::Frame;
pub use sink::FrameSink;
