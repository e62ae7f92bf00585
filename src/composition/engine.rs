use std::{
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{
    composition::progress::{self, CancelToken, ProgressEvent, ProgressReporter, RunHandle},
    config::RenderConfig,
    error::{FramesmithError, Result, SynthesisError},
    fields::{FieldKind, FieldSynthesizer, Synthesizer},
    session::ValidatedSession,
    video::{EncoderPipe, EncoderSettings, Frame, FrameSink},
};

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub field: FieldKind,
    pub output: PathBuf,
    pub frames_written: u64,
    pub logical_steps: u64,
    pub elapsed: Duration,
}

/// Drives one validated session from the first logical step to a closed stream
///
/// The pipeline is strictly sequential per run:
/// 1. Schedule - logical time and repeat count for the next step
/// 2. Synthesis - the field advances and renders one frame
/// 3. Output - the frame is written `repeat` times into the sink
/// 4. Progress - a snapshot is offered to the progress channel
///
/// Row work inside a single frame runs on a dedicated rayon pool; frames never
/// overlap or reorder.
pub struct RenderEngine {
    session: ValidatedSession,
    encoder: EncoderSettings,
    render: RenderConfig,
}

impl RenderEngine {
    pub fn new(session: ValidatedSession, encoder: EncoderSettings, render: RenderConfig) -> Self {
        Self {
            session,
            encoder,
            render,
        }
    }

    pub fn session(&self) -> &ValidatedSession {
        &self.session
    }

    /// Render the whole session into the configured encoder
    ///
    /// The encoder is always closed and reaped before this returns, whatever the
    /// outcome.
    pub fn run(&self, reporter: Option<&ProgressReporter>, cancel: &CancelToken) -> Result<RunSummary> {
        let mut pipe = EncoderPipe::start(&self.session, &self.encoder)?;
        self.render_into(&mut pipe, reporter, cancel)
    }

    /// Run on a blocking worker thread; must be called from inside a tokio runtime
    pub fn spawn(self) -> RunHandle {
        let (reporter, receiver) = progress::channel(self.render.progress_capacity);
        let cancel = CancelToken::new();
        let token = cancel.clone();

        let join = tokio::task::spawn_blocking(move || self.run(Some(&reporter), &token));

        RunHandle {
            join,
            progress: receiver,
            cancel,
        }
    }

    /// Render the whole session into any frame sink
    pub fn render_into<S>(
        &self,
        sink: &mut S,
        reporter: Option<&ProgressReporter>,
        cancel: &CancelToken,
    ) -> Result<RunSummary>
    where
        S: FrameSink + Send,
    {
        let pool = self.thread_pool()?;
        pool.install(|| self.drive(sink, reporter, cancel))
    }

    /// Render the frame shown at `logical_time` without starting an encoder
    ///
    /// Stateful fields are integrated through every earlier logical step first, so
    /// the preview matches what a full run would show.
    pub fn preview(&self, logical_time: f64) -> Result<Frame> {
        let pool = self.thread_pool()?;
        pool.install(|| {
            let mut field = Synthesizer::init(&self.session);
            let mut frame = None;
            for step in self.session.schedule() {
                if frame.is_some() && step.logical_time > logical_time {
                    break;
                }
                frame = Some(step_guarded(&mut field, step.logical_time)?);
            }
            frame.ok_or_else(|| FramesmithError::generic("session has no frames to preview"))
        })
    }

    /// Render a preview frame and save it as PNG
    pub fn save_preview<P: AsRef<Path>>(&self, logical_time: f64, path: P) -> Result<Frame> {
        let path = path.as_ref();
        let frame = self.preview(logical_time)?;
        frame
            .save_png(path)
            .map_err(|e| FramesmithError::generic(format!("failed to write preview {}: {}", path.display(), e)))?;
        info!("🖼️  Preview at {:.2}s saved to {:?}", logical_time, path);
        Ok(frame)
    }

    fn drive<S: FrameSink>(
        &self,
        sink: &mut S,
        reporter: Option<&ProgressReporter>,
        cancel: &CancelToken,
    ) -> Result<RunSummary> {
        let mut field = Synthesizer::init(&self.session);
        self.drive_with(&mut field, sink, reporter, cancel)
    }

    /// Step `field` through the session schedule into `sink`
    ///
    /// On any error the sink is left unfinished; an encoder sink shuts its child
    /// down when dropped.
    fn drive_with<S: FrameSink>(
        &self,
        field: &mut dyn FieldSynthesizer,
        sink: &mut S,
        reporter: Option<&ProgressReporter>,
        cancel: &CancelToken,
    ) -> Result<RunSummary> {
        let started = Instant::now();
        let session = &self.session;
        let schedule = session.schedule();
        let target_frames = schedule.target_frames();
        let logical_steps = schedule.logical_steps();
        let log_every = (logical_steps / 10).max(1);

        let kind = field.kind();

        info!("🎬 Rendering {} field", kind);
        info!("   Output: {:?}", session.output());
        info!(
            "   {}x{} @ {} fps, {:.2}s, {} frames ({} computed, dup {})",
            session.width(),
            session.height(),
            session.fps(),
            session.total_seconds(),
            target_frames,
            logical_steps,
            session.duplication_factor()
        );

        let mut frames_written = 0u64;

        for step in schedule {
            if cancel.is_cancelled() {
                warn!("Render cancelled after {} of {} frames", frames_written, target_frames);
                return Err(FramesmithError::Cancelled { frames_written });
            }

            let frame = step_guarded(field, step.logical_time)?;
            if frame.width() != session.width() || frame.height() != session.height() {
                return Err(SynthesisError::StepFailed {
                    field: kind,
                    reason: format!(
                        "rendered {}x{} into a {}x{} session",
                        frame.width(),
                        frame.height(),
                        session.width(),
                        session.height()
                    ),
                }
                .into());
            }

            // Duplicates are copies of the computed buffer, never re-simulated
            for _ in 0..step.repeat {
                sink.write_frame(&frame)?;
                frames_written += 1;
            }

            if let Some(reporter) = reporter {
                reporter.report(ProgressEvent {
                    frames_written,
                    target_frames,
                    logical_step: step.index + 1,
                    logical_time: step.logical_time,
                    elapsed: started.elapsed(),
                });
            }

            if step.index % log_every == 0 {
                debug!(
                    "step {}/{} t={:.3}s frames {}/{}",
                    step.index + 1,
                    logical_steps,
                    step.logical_time,
                    frames_written,
                    target_frames
                );
            }
        }

        sink.finish()?;

        let elapsed = started.elapsed();
        info!(
            "✅ Rendered {} frames in {:.1}s ({:.1} fps)",
            frames_written,
            elapsed.as_secs_f64(),
            frames_written as f64 / elapsed.as_secs_f64().max(1e-9)
        );

        Ok(RunSummary {
            field: kind,
            output: session.output().to_path_buf(),
            frames_written,
            logical_steps,
            elapsed,
        })
    }

    fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.render.threads)
            .thread_name(|i| format!("framesmith-render-{}", i))
            .build()
            .map_err(|e| SynthesisError::ThreadPool { reason: e.to_string() }.into())
    }
}

/// Step a field, turning a panic inside it into a synthesis fault
fn step_guarded(field: &mut dyn FieldSynthesizer, logical_time: f64) -> Result<Frame> {
    let kind = field.kind();
    match panic::catch_unwind(AssertUnwindSafe(|| field.step(logical_time))) {
        Ok(result) => result,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic in step".to_string());
            Err(SynthesisError::StepFailed { field: kind, reason }.into())
        }
    }
}
