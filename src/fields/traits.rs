use crate::{error::Result, fields::FieldKind, video::Frame};

/// Core trait that all procedural fields implement
///
/// A synthesizer is created once per run with its state sized for that run. Each
/// call to [`step`](FieldSynthesizer::step) advances the state to `logical_time` and
/// returns a freshly allocated frame. Calls arrive in increasing time order, one per
/// logical step; duplicated output frames never call `step` again.
pub trait FieldSynthesizer: Send {
    /// Returns the discriminant of this field
    fn kind(&self) -> FieldKind;

    /// Returns the unique name of this field
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    /// Advance to `logical_time` (seconds) and render one frame
    fn step(&mut self, logical_time: f64) -> Result<Frame>;

    /// Describes the field's output policy and tunables
    fn metadata(&self) -> FieldMetadata {
        FieldMetadata::default()
    }
}

/// How a field turns floating point photometry into bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplePolicy {
    /// Clamp to `[0, 255]`, then truncate
    #[default]
    ClampTruncate,
    /// Keep the low 8 bits of an integer accumulator
    Wrap256,
}

/// Metadata about a field's characteristics
#[derive(Debug, Clone, Default)]
pub struct FieldMetadata {
    pub sample_policy: SamplePolicy,

    /// Whether frames depend on state integrated from earlier steps
    pub stateful: bool,

    /// List of optional parameters with descriptions
    pub parameters: Vec<(String, String)>,
}
