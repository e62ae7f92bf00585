use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{
    sync::broadcast::{self, error::RecvError, error::TryRecvError},
    task::JoinHandle,
};
use tracing::debug;

use crate::{
    composition::engine::RunSummary,
    config::MAX_PROGRESS_CAPACITY,
    error::{FramesmithError, Result},
};

/// Snapshot of a run's progress, sent after every logical step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub frames_written: u64,
    pub target_frames: u64,
    pub logical_step: u64,
    pub logical_time: f64,
    pub elapsed: Duration,
}

impl ProgressEvent {
    /// Completed share of the run in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        if self.target_frames == 0 {
            return 1.0;
        }
        self.frames_written as f64 / self.target_frames as f64
    }

    /// Output frames per wall-clock second so far
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames_written as f64 / secs
        } else {
            0.0
        }
    }
}

/// Sending half of the progress channel; never blocks the render loop
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressReporter {
    pub fn report(&self, event: ProgressEvent) {
        // No receiver is not an error; the run does not care who listens
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> ProgressReceiver {
        ProgressReceiver {
            inner: self.sender.subscribe(),
        }
    }
}

/// Receiving half of the progress channel
///
/// The channel holds at most `capacity` events. When the receiver falls behind the
/// oldest events are discarded and the receiver skips ahead.
#[derive(Debug)]
pub struct ProgressReceiver {
    inner: broadcast::Receiver<ProgressEvent>,
}

impl ProgressReceiver {
    /// Newest queued event, without waiting
    pub fn try_latest(&mut self) -> Option<ProgressEvent> {
        let mut latest = None;
        loop {
            match self.inner.try_recv() {
                Ok(event) => latest = Some(event),
                Err(TryRecvError::Lagged(skipped)) => debug!("progress receiver skipped {} events", skipped),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return latest,
            }
        }
    }

    /// Wait for the next event; `None` once the run has finished
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        loop {
            match self.inner.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Bounded progress channel holding at most `capacity` undelivered events
///
/// `capacity` is clamped to `1..=MAX_PROGRESS_CAPACITY`.
pub fn channel(capacity: usize) -> (ProgressReporter, ProgressReceiver) {
    let (sender, receiver) = broadcast::channel(capacity.clamp(1, MAX_PROGRESS_CAPACITY));
    (ProgressReporter { sender }, ProgressReceiver { inner: receiver })
}

/// Cooperative cancellation flag shared between a run and its controller
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A run executing on a blocking worker thread
pub struct RunHandle {
    pub(crate) join: JoinHandle<Result<RunSummary>>,
    pub(crate) progress: ProgressReceiver,
    pub(crate) cancel: CancelToken,
}

impl RunHandle {
    /// Newest progress event, if any arrived since the last poll
    pub fn try_progress(&mut self) -> Option<ProgressEvent> {
        self.progress.try_latest()
    }

    /// Wait for the next progress event; `None` once the run is over
    pub async fn next_progress(&mut self) -> Option<ProgressEvent> {
        self.progress.recv().await
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the run to end and return its outcome
    pub async fn wait(self) -> Result<RunSummary> {
        self.join
            .await
            .map_err(|e| FramesmithError::generic(format!("render worker failed: {}", e)))?
    }
}
