//! EQS Core - Backend logic for the equirect stitcher
//!
//! This crate contains the orchestration around one dual-lens stitch job:
//! lens-file naming and pairing, recording discovery, job configuration and
//! the lifecycle controller that drives an external stitch engine.
//! It has zero UI dependencies and can be used by the CLI or any other front end.

pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod naming;
pub mod orchestrator;

pub use error::{StitchError, StitchResult};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
