//! Stitch engine seam.
//!
//! The engine does the actual stitching on its own worker thread. It reports
//! back only through the [`EventSink`] it receives in [`StitchEngine::start`].

use serde::Serialize;

use super::controller::EventSink;
use crate::error::StitchResult;
use crate::jobs::StitchJobConfig;

/// Notification sent by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Progress percentage (0-100) plus an engine-specific status code.
    Progress { percent: u32, code: i32 },
    /// Fatal engine error.
    Error { code: i32, message: String },
}

/// Error payload reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineFailure {
    pub code: i32,
    pub message: String,
}

/// Trait for stitch engines.
///
/// `start` must return promptly; the work runs on a thread the engine owns
/// and is reported through `events`. An engine may deliver events from
/// inside `start` as well. `progress` can be called from any thread while
/// the job runs.
pub trait StitchEngine: Send + Sync {
    /// Engine name for logging and error context.
    fn name(&self) -> &str;

    /// Launch the job described by `config`.
    ///
    /// Return `Err` only when the job could not be launched at all; failures
    /// after launch go through [`EventSink::error`].
    fn start(&mut self, config: &StitchJobConfig, events: EventSink) -> StitchResult<()>;

    /// Engine-side progress percentage, readable at any time.
    fn progress(&self) -> u32;
}
