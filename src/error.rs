use thiserror::Error;

use crate::fields::FieldKind;

/// Main error type for the framesmith library
#[derive(Error, Debug)]
pub enum FramesmithError {
    #[error("Invalid session: {0}")]
    InvalidSession(#[from] SessionError),

    #[error("Encoder executable not found: {program}")]
    EncoderUnavailable { program: String },

    #[error("Encoder exited with {}: {stderr}", describe_status(.status))]
    EncodingFailed { status: Option<i32>, stderr: String },

    #[error("Synthesis fault: {0}")]
    SynthesisFault(#[from] SynthesisError),

    #[error("Encoder pipe error: {0}")]
    Encoder(#[from] EncoderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Run cancelled after {frames_written} frames")]
    Cancelled { frames_written: u64 },

    #[error("Generic error: {0}")]
    Generic(String),
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Reasons a session request is rejected before anything is spawned
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("resolution {width}x{height} exceeds the {max_width}x{max_height} ceiling")]
    ResolutionTooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    #[error("width and height must be positive (got {width}x{height})")]
    EmptyResolution { width: u32, height: u32 },

    #[error("duration must be greater than zero (got {seconds}s)")]
    NonPositiveDuration { seconds: f64 },

    #[error("fps must be a positive number (got {fps})")]
    InvalidFps { fps: f64 },

    #[error("duplication factor must be at least 1 (got {factor})")]
    InvalidDuplicationFactor { factor: u32 },

    #[error("output path is empty")]
    EmptyOutput,

    #[error("output '{path}' would overwrite the input")]
    OutputCollidesWithInput { path: String },

    #[error("invalid {field} parameter {name}: {reason}")]
    InvalidParameter {
        field: FieldKind,
        name: &'static str,
        reason: String,
    },
}

/// Faults raised inside a field variant's step function
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("{field} step failed: {reason}")]
    StepFailed { field: FieldKind, reason: String },

    #[error("plane length mismatch: hue {hue}, saturation {saturation}, value {value}, output {output}")]
    PlaneMismatch {
        hue: usize,
        saturation: usize,
        value: usize,
        output: usize,
    },

    #[error("render thread pool unavailable: {reason}")]
    ThreadPool { reason: String },
}

/// Failures of the raw-frame pipe itself (as opposed to the encoder's verdict)
#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("failed to spawn encoder: {reason}")]
    SpawnFailed { reason: String },

    #[error("frame is {actual} bytes, the stream expects {expected}")]
    FrameSizeMismatch { expected: usize, actual: usize },

    #[error("stream already carries all {expected} frames")]
    Overrun { expected: u64 },

    #[error("stream closed after {written} of {expected} frames")]
    IncompleteStream { written: u64, expected: u64 },

    #[error("failed to write frame {frame} to encoder: {reason}")]
    WriteFailed { frame: u64, reason: String },

    #[error("encoder input is already closed")]
    InputClosed,

    #[error("failed to wait for encoder: {reason}")]
    WaitFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using FramesmithError
pub type Result<T> = std::result::Result<T, FramesmithError>;

impl FramesmithError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Whether the caller can fix the input and try again without side effects
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Nothing was spawned and nothing was written
            Self::InvalidSession(_) | Self::Config(_) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::EncoderUnavailable { program } => {
                format!(
                    "Could not find '{}'. Install FFmpeg or point --encoder at the executable.",
                    program
                )
            }
            Self::EncodingFailed { status, .. } => {
                format!(
                    "The encoder failed ({}). A partial output file may remain.",
                    describe_status(status)
                )
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_errors_are_recoverable() {
        let err: FramesmithError = SessionError::EmptyOutput.into();
        assert!(err.is_recoverable());

        let err = FramesmithError::EncodingFailed { status: Some(1), stderr: String::new() };
        assert!(!err.is_recoverable());

        // A missing encoder ends the run like any other encoder failure
        let err = FramesmithError::EncoderUnavailable { program: "ffmpeg".to_string() };
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_encoding_failed_message_carries_status() {
        let err = FramesmithError::EncodingFailed {
            status: Some(1),
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Encoder exited with status 1: boom");

        let err = FramesmithError::EncodingFailed { status: None, stderr: String::new() };
        assert!(err.user_message().contains("signal"));
    }
}
