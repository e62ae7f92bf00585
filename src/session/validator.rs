use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::SessionError, fields::FieldParams, session::FrameSchedule};

/// Largest accepted output width
pub const MAX_WIDTH: u32 = 3840;

/// Largest accepted output height
pub const MAX_HEIGHT: u32 = 2160;

/// A session as the caller describes it, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRequest {
    /// Output video file; `.mp4` is appended when there is no extension
    pub output: PathBuf,

    /// Source file the run must never overwrite, if the caller has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,

    pub minutes: f64,
    pub seconds: f64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,

    /// Identical output frames emitted per computed frame
    pub duplication_factor: u32,

    /// Random seed; drawn fresh at validation when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    pub field: FieldParams,
}

impl Default for SessionRequest {
    fn default() -> Self {
        Self {
            output: PathBuf::from("framesmith.mp4"),
            input: None,
            minutes: 0.0,
            seconds: 10.0,
            width: 1920,
            height: 1080,
            fps: 30.0,
            duplication_factor: 1,
            seed: None,
            field: FieldParams::default(),
        }
    }
}

impl SessionRequest {
    pub fn total_seconds(&self) -> f64 {
        self.minutes * 60.0 + self.seconds
    }
}

/// An accepted session; immutable for the lifetime of a run
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSession {
    output: PathBuf,
    total_seconds: f64,
    width: u32,
    height: u32,
    fps: f64,
    duplication_factor: u32,
    target_frames: u64,
    seed: u64,
    field: FieldParams,
}

impl ValidatedSession {
    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn total_seconds(&self) -> f64 {
        self.total_seconds
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn duplication_factor(&self) -> u32 {
        self.duplication_factor
    }

    /// `ceil(total_seconds * fps)`
    pub fn target_frames(&self) -> u64 {
        self.target_frames
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn field(&self) -> &FieldParams {
        &self.field
    }

    /// Bytes in one raw RGB frame
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// A fresh schedule for one run
    pub fn schedule(&self) -> FrameSchedule {
        FrameSchedule::new(self.target_frames, self.fps, self.duplication_factor)
    }
}

/// Checks a [`SessionRequest`] once, before anything is scheduled or spawned
#[derive(Debug, Clone)]
pub struct SessionValidator {
    max_width: u32,
    max_height: u32,
}

impl Default for SessionValidator {
    fn default() -> Self {
        Self {
            max_width: MAX_WIDTH,
            max_height: MAX_HEIGHT,
        }
    }
}

impl SessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator with a lower resolution ceiling; never raises it above 3840x2160
    pub fn with_ceiling(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width: max_width.min(MAX_WIDTH),
            max_height: max_height.min(MAX_HEIGHT),
        }
    }

    pub fn validate(&self, request: &SessionRequest) -> Result<ValidatedSession, SessionError> {
        let (width, height) = (request.width, request.height);
        if width == 0 || height == 0 {
            return Err(SessionError::EmptyResolution { width, height });
        }
        if width > self.max_width || height > self.max_height {
            return Err(SessionError::ResolutionTooLarge {
                width,
                height,
                max_width: self.max_width,
                max_height: self.max_height,
            });
        }

        let total_seconds = request.total_seconds();
        if !total_seconds.is_finite() || total_seconds <= 0.0 {
            return Err(SessionError::NonPositiveDuration { seconds: total_seconds });
        }

        if !request.fps.is_finite() || request.fps <= 0.0 {
            return Err(SessionError::InvalidFps { fps: request.fps });
        }

        if request.duplication_factor < 1 {
            return Err(SessionError::InvalidDuplicationFactor {
                factor: request.duplication_factor,
            });
        }

        let output = normalize_output(&request.output)?;
        if let Some(input) = &request.input {
            if same_file(&output, input) {
                return Err(SessionError::OutputCollidesWithInput {
                    path: output.display().to_string(),
                });
            }
        }

        request.field.validate(width, height)?;

        let target_frames = (total_seconds * request.fps).ceil() as u64;
        let seed = request.seed.unwrap_or_else(rand::random);

        debug!(
            "Validated session: {}x{} @ {} fps, {:.2}s -> {} frames (dup {}), field {}, seed {}",
            width,
            height,
            request.fps,
            total_seconds,
            target_frames,
            request.duplication_factor,
            request.field.kind(),
            seed
        );

        Ok(ValidatedSession {
            output,
            total_seconds,
            width,
            height,
            fps: request.fps,
            duplication_factor: request.duplication_factor,
            target_frames,
            seed,
            field: request.field.clone(),
        })
    }
}

fn normalize_output(output: &Path) -> Result<PathBuf, SessionError> {
    if output.as_os_str().is_empty() {
        return Err(SessionError::EmptyOutput);
    }
    let mut output = output.to_path_buf();
    if output.extension().is_none() {
        output.set_extension("mp4");
    }
    Ok(output)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
