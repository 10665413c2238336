//! Data models shared across the crate.
//!
//! - Enums for stitch algorithm, image format, codec and job state

mod enums;

pub use enums::{ImageFormat, JobState, StitchAlgorithm, VideoCodec};
