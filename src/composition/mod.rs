//! # Render Engine
//!
//! The render engine drives a validated session through the frame schedule, the
//! chosen field and the encoder pipe, reporting progress along the way.

pub mod engine;
pub mod progress;

// Re-exports for convenience
pub use engine::{RenderEngine, RunSummary};
pub use progress::{CancelToken, ProgressEvent, ProgressReceiver, ProgressReporter, RunHandle};
