//! Lifecycle controller for one stitch job.
//!
//! ```text
//! Idle ──start──> Running ──progress 100──> Succeeded
//!                    └──────engine error──> Failed
//! ```
//!
//! State, last progress and last error live behind one mutex. Engine events
//! transition the state and notify the condvar while holding that mutex;
//! waiters re-check the state after every wakeup, so a notification that
//! lands before `wait_for_completion` is called is never lost. The progress
//! observer runs after the mutex is released.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::engine::{EngineEvent, EngineFailure, StitchEngine};
use crate::error::{StitchError, StitchResult};
use crate::jobs::StitchJobConfig;
use crate::models::JobState;

/// Callback receiving each new progress value.
///
/// Runs on the engine's thread after the state change is visible. Calls are
/// serialized in delivery order. It may read the controller but must not
/// report progress through the same [`EventSink`] or wait for completion.
pub type ProgressObserver = Box<dyn Fn(u32) + Send + Sync>;

#[derive(Default)]
struct Inner {
    state: JobState,
    progress: u32,
    last_error: Option<EngineFailure>,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    observer: Option<Arc<dyn Fn(u32) + Send + Sync>>,
}

impl Inner {
    fn elapsed(&self) -> Duration {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => end.duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    fn outcome(&self) -> JobOutcome {
        JobOutcome {
            state: self.state,
            progress: self.progress,
            error: self.last_error.clone(),
            elapsed: self.elapsed(),
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    changed: Condvar,
    /// Held across a progress update and its observer call. Always taken
    /// before `inner`.
    observing: Mutex<()>,
}

impl Shared {
    fn handle(&self, event: EngineEvent) {
        match event {
            EngineEvent::Progress { percent, code } => self.handle_progress(percent, code),
            EngineEvent::Error { code, message } => self.handle_error(code, message),
        }
    }

    fn handle_progress(&self, percent: u32, code: i32) {
        let _observing = self.observing.lock();
        let mut inner = self.inner.lock();

        if inner.state != JobState::Running {
            tracing::debug!("Ignoring progress {}% in state {}", percent, inner.state);
            return;
        }

        let percent = percent.min(100);
        if percent == inner.progress {
            return;
        }
        inner.progress = percent;
        tracing::trace!("Stitch progress {}% (code {})", percent, code);

        if percent == 100 {
            inner.state = JobState::Succeeded;
            inner.finished_at = Some(Instant::now());
            self.changed.notify_all();
        }

        let observer = inner.observer.clone();
        drop(inner);

        if let Some(observer) = observer {
            observer(percent);
        }
    }

    fn handle_error(&self, code: i32, message: String) {
        let mut inner = self.inner.lock();

        if inner.state != JobState::Running {
            tracing::debug!("Ignoring engine error {} in state {}: {}", code, inner.state, message);
            return;
        }

        tracing::error!("Stitch engine error {}: {}", code, message);
        inner.state = JobState::Failed;
        inner.last_error = Some(EngineFailure { code, message });
        inner.finished_at = Some(Instant::now());
        self.changed.notify_all();
    }

    /// Block until an observer call in flight has returned.
    fn settle_observer(&self) {
        drop(self.observing.lock());
    }
}

/// Handle through which an engine reports progress and errors.
///
/// Cheap to clone and safe to use from any thread.
#[derive(Clone)]
pub struct EventSink {
    shared: Arc<Shared>,
}

impl EventSink {
    /// Deliver one engine event.
    pub fn send(&self, event: EngineEvent) {
        self.shared.handle(event);
    }

    /// Report a progress percentage.
    pub fn progress(&self, percent: u32, code: i32) {
        self.send(EngineEvent::Progress { percent, code });
    }

    /// Report a fatal error.
    pub fn error(&self, code: i32, message: impl Into<String>) {
        self.send(EngineEvent::Error {
            code,
            message: message.into(),
        });
    }
}

/// Terminal result of a stitch job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// `Succeeded` or `Failed`.
    pub state: JobState,
    /// Last reported progress.
    pub progress: u32,
    /// Engine error, set only when the job failed.
    pub error: Option<EngineFailure>,
    /// Wall-clock time from start to the terminal event.
    pub elapsed: Duration,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == JobState::Succeeded
    }

    /// Turn a failed outcome into [`StitchError::EngineReportedError`].
    pub fn into_result(self) -> StitchResult<Self> {
        match (&self.state, &self.error) {
            (JobState::Failed, Some(failure)) => Err(StitchError::EngineReportedError {
                code: failure.code,
                message: failure.message.clone(),
            }),
            _ => Ok(self),
        }
    }
}

/// Owns one stitch engine and drives one job through its lifecycle.
pub struct JobController {
    engine: Box<dyn StitchEngine>,
    shared: Arc<Shared>,
}

impl JobController {
    /// Create an idle controller around `engine`.
    pub fn new(engine: Box<dyn StitchEngine>) -> Self {
        Self {
            engine,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::default()),
                changed: Condvar::new(),
                observing: Mutex::new(()),
            }),
        }
    }

    /// Register the progress observer (builder pattern).
    pub fn with_progress_observer(self, observer: ProgressObserver) -> Self {
        self.shared.inner.lock().observer = Some(Arc::from(observer));
        self
    }

    /// Start the job. Only valid once, from `Idle`.
    ///
    /// The controller is `Running` before the engine is launched, so events
    /// the engine delivers from inside `start` are accepted. If the engine
    /// cannot launch, the job ends `Failed` and the error is returned.
    pub fn start(&mut self, config: &StitchJobConfig) -> StitchResult<()> {
        {
            let mut inner = self.shared.inner.lock();
            if inner.state != JobState::Idle {
                return Err(StitchError::AlreadyStarted { state: inner.state });
            }
            inner.state = JobState::Running;
            inner.started_at = Some(Instant::now());
        }

        tracing::info!(
            "Starting stitch job with engine '{}': {} + {}",
            self.engine.name(),
            config.inputs().primary.display(),
            config.inputs().secondary.display()
        );

        let sink = EventSink {
            shared: Arc::clone(&self.shared),
        };

        if let Err(e) = self.engine.start(config, sink) {
            let mut inner = self.shared.inner.lock();
            if inner.state == JobState::Running {
                inner.state = JobState::Failed;
                inner.last_error = Some(EngineFailure {
                    code: -1,
                    message: e.to_string(),
                });
                inner.finished_at = Some(Instant::now());
                self.shared.changed.notify_all();
            }
            return Err(e);
        }

        Ok(())
    }

    /// Block until the job reaches a terminal state.
    ///
    /// Returns immediately if it already has. The observer has seen the final
    /// progress value by the time this returns, so it must not wait itself.
    pub fn wait_for_completion(&self) -> StitchResult<JobOutcome> {
        let mut inner = self.shared.inner.lock();
        if inner.state == JobState::Idle {
            return Err(StitchError::NotStarted);
        }

        while !inner.state.is_terminal() {
            self.shared.changed.wait(&mut inner);
            tracing::trace!("Woke in state {} at {}%", inner.state, inner.progress);
        }

        let outcome = inner.outcome();
        drop(inner);
        self.shared.settle_observer();

        tracing::debug!("Engine reports {}% at completion", self.engine.progress());
        Ok(outcome)
    }

    /// Like [`wait_for_completion`](Self::wait_for_completion) with a deadline.
    ///
    /// Returns `Ok(None)` if the job is still running when `timeout` expires.
    pub fn wait_for_completion_timeout(&self, timeout: Duration) -> StitchResult<Option<JobOutcome>> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.shared.inner.lock();
        if inner.state == JobState::Idle {
            return Err(StitchError::NotStarted);
        }

        while !inner.state.is_terminal() {
            if self.shared.changed.wait_until(&mut inner, deadline).timed_out() {
                break;
            }
        }

        if !inner.state.is_terminal() {
            return Ok(None);
        }
        let outcome = inner.outcome();
        drop(inner);
        self.shared.settle_observer();
        Ok(Some(outcome))
    }

    /// Last reported progress percentage.
    pub fn progress(&self) -> u32 {
        self.shared.inner.lock().progress
    }

    /// Current lifecycle state.
    pub fn state(&self) -> JobState {
        self.shared.inner.lock().state
    }

    /// Time since `start`, frozen once the job is terminal.
    pub fn elapsed(&self) -> Duration {
        self.shared.inner.lock().elapsed()
    }

    /// Name of the wrapped engine.
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }
}
