//! Job discovery and configuration.
//!
//! This module provides:
//! - `discovery`: list recordings in a raw-footage directory, one entry per recording
//! - `StitchOptions`: raw option values from the command line
//! - `StitchJobConfig`: the validated, immutable configuration handed to the engine

mod config;
mod discovery;
mod options;

pub use config::{FeatureSet, OutputTarget, StitchJobConfig};
pub use discovery::{
    discover_recordings, parse_selection, pick_recording, CandidateFile, DiscoveryRules,
};
pub use options::{parse_frame_indices, OutputSize, StitchOptions};
