use std::{
    ffi::OsString,
    io::{self, Read, Write},
    path::Path,
    process::{Child, ChildStdin, Command, ExitStatus, Stdio},
    thread::JoinHandle,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::{ConfigError, EncoderError, FramesmithError, Result},
    session::ValidatedSession,
    video::Frame,
};

/// Bytes of encoder stderr attached to a failure
const STDERR_TAIL: usize = 4096;

/// How the encoder subprocess is invoked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Executable name or path
    pub program: String,
    pub codec: String,
    /// Constant rate factor passed to the codec
    pub crf: u8,
    /// Pixel format of the encoded stream
    pub pixel_format: String,
    pub overwrite: bool,
    pub loglevel: String,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            codec: "libx264".to_string(),
            crf: 18,
            pixel_format: "yuv420p".to_string(),
            overwrite: true,
            loglevel: "error".to_string(),
        }
    }
}

impl EncoderSettings {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.program.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "encoder.program".to_string(),
                value: self.program.clone(),
            });
        }
        if self.codec.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "encoder.codec".to_string(),
                value: self.codec.clone(),
            });
        }
        if self.crf > 51 {
            return Err(ConfigError::InvalidValue {
                key: "encoder.crf".to_string(),
                value: self.crf.to_string(),
            });
        }
        Ok(())
    }

    /// Full argument list for a session: raw RGB on stdin, one video file out
    pub fn args(&self, session: &ValidatedSession) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(24);
        args.push(if self.overwrite { "-y" } else { "-n" }.into());
        for arg in [
            "-loglevel".to_string(),
            self.loglevel.clone(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgb24".to_string(),
            "-s".to_string(),
            format!("{}x{}", session.width(), session.height()),
            "-r".to_string(),
            session.fps().to_string(),
            "-i".to_string(),
            "-".to_string(),
            "-an".to_string(),
            "-c:v".to_string(),
            self.codec.clone(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
        ] {
            args.push(arg.into());
        }
        args.push(session.output().as_os_str().to_os_string());
        args
    }
}

/// A running encoder subprocess fed with raw frames on its stdin
///
/// Frames are written back to back with no header, each exactly
/// `width * height * 3` bytes. A full pipe blocks the writer, which is the only
/// flow control the stream has. Dropping the pipe closes stdin and reaps the child
/// even when [`finish`](EncoderPipe::finish) was never reached.
pub struct EncoderPipe {
    program: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<Vec<u8>>>,
    frame_bytes: usize,
    expected_frames: u64,
    frames_written: u64,
    status: Option<ExitStatus>,
}

impl EncoderPipe {
    /// Launch the configured encoder for a validated session
    pub fn start(session: &ValidatedSession, settings: &EncoderSettings) -> Result<Self> {
        ensure_parent_dir(session.output())?;

        let mut command = Command::new(&settings.program);
        command.args(settings.args(session));
        info!(
            "Starting encoder: {} {}x{} @ {} fps -> {}",
            settings.program,
            session.width(),
            session.height(),
            session.fps(),
            session.output().display()
        );
        debug!("Encoder command: {:?}", command);

        Self::spawn(command, session.frame_bytes(), session.target_frames())
    }

    /// Spawn an arbitrary command as the frame consumer
    pub fn spawn(mut command: Command, frame_bytes: usize, expected_frames: u64) -> Result<Self> {
        let program = command.get_program().to_string_lossy().into_owned();
        command.stdin(Stdio::piped()).stdout(Stdio::null()).stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FramesmithError::EncoderUnavailable { program: program.clone() },
            _ => EncoderError::SpawnFailed { reason: e.to_string() }.into(),
        })?;

        let stdin = child.stdin.take();
        let stderr = child.stderr.take().and_then(|mut pipe| {
            std::thread::Builder::new()
                .name("encoder-stderr".to_string())
                .spawn(move || {
                    let mut buf = Vec::new();
                    let _ = pipe.read_to_end(&mut buf);
                    buf
                })
                .ok()
        });

        let mut pipe = Self {
            program,
            child,
            stdin,
            stderr,
            frame_bytes,
            expected_frames,
            frames_written: 0,
            status: None,
        };

        if pipe.stdin.is_none() {
            // Still reaped by Drop
            pipe.close_input();
            return Err(EncoderError::SpawnFailed {
                reason: "encoder stdin was not captured".to_string(),
            }
            .into());
        }

        debug!("Encoder {} started (pid {})", pipe.program, pipe.child.id());
        Ok(pipe)
    }

    /// Push exactly one frame of raw bytes
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() != self.frame_bytes {
            return Err(EncoderError::FrameSizeMismatch {
                expected: self.frame_bytes,
                actual: bytes.len(),
            }
            .into());
        }
        if self.frames_written >= self.expected_frames {
            return Err(EncoderError::Overrun {
                expected: self.expected_frames,
            }
            .into());
        }

        let frame = self.frames_written;
        let stdin = self.stdin.as_mut().ok_or(EncoderError::InputClosed)?;
        stdin.write_all(bytes).map_err(|e| EncoderError::WriteFailed {
            frame,
            reason: e.to_string(),
        })?;

        self.frames_written += 1;
        Ok(())
    }

    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.write(frame.as_bytes())
    }

    /// Close the encoder's input; returns whether this call closed it
    pub fn close_input(&mut self) -> bool {
        match self.stdin.take() {
            Some(mut stdin) => {
                let _ = stdin.flush();
                true
            }
            None => false,
        }
    }

    /// Close the input, wait for the encoder and judge the result
    pub fn finish(&mut self) -> Result<ExitStatus> {
        self.close_input();
        let status = self.wait()?;
        let stderr = self.stderr_tail();

        if !status.success() {
            warn!("Encoder {} exited with {}", self.program, status);
            return Err(FramesmithError::EncodingFailed {
                status: status.code(),
                stderr,
            });
        }

        if self.frames_written < self.expected_frames {
            return Err(EncoderError::IncompleteStream {
                written: self.frames_written,
                expected: self.expected_frames,
            }
            .into());
        }

        info!("Encoder finished after {} frames", self.frames_written);
        Ok(status)
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn expected_frames(&self) -> u64 {
        self.expected_frames
    }

    fn wait(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.status {
            return Ok(status);
        }
        let status = self
            .child
            .wait()
            .map_err(|e| EncoderError::WaitFailed { reason: e.to_string() })?;
        self.status = Some(status);
        Ok(status)
    }

    fn stderr_tail(&mut self) -> String {
        let Some(handle) = self.stderr.take() else {
            return String::new();
        };
        let bytes = handle.join().unwrap_or_default();
        let start = bytes.len().saturating_sub(STDERR_TAIL);
        String::from_utf8_lossy(&bytes[start..]).trim().to_string()
    }
}

impl Drop for EncoderPipe {
    fn drop(&mut self) {
        if self.status.is_some() {
            return;
        }
        if self.close_input() || self.frames_written < self.expected_frames {
            warn!(
                "Shutting down encoder {} after {} of {} frames",
                self.program, self.frames_written, self.expected_frames
            );
        }
        if let Err(e) = self.wait() {
            warn!("Could not reap encoder {}: {}", self.program, e);
        }
        let _ = self.stderr_tail();
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
