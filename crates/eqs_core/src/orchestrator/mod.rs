//! Stitch job orchestration.
//!
//! A [`JobController`] owns one [`StitchEngine`] and drives a single job
//! through `Idle → Running → Succeeded | Failed`. Engines report back on
//! their own threads through an [`EventSink`]; callers block in
//! [`JobController::wait_for_completion`] until the first terminal event.
//!
//! [`CommandEngine`] is the production engine: it runs the configured
//! stitcher executable and follows its output.

mod command_engine;
mod controller;
mod engine;

pub use command_engine::{parse_progress, CommandEngine};
pub use controller::{EventSink, JobController, JobOutcome, ProgressObserver};
pub use engine::{EngineEvent, EngineFailure, StitchEngine};
