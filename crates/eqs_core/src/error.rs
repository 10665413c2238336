//! Error types for the stitch orchestration.
//!
//! Every failure a run can hit maps to one variant with its own message and
//! process exit code. Nothing is retried internally.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::models::JobState;

/// Top-level error for pairing, discovery, configuration and job lifecycle.
#[derive(Error, Debug)]
pub enum StitchError {
    /// No input file given and none picked interactively.
    #[error("No input file was given or selected")]
    NoInput,

    /// More than one pair was requested.
    #[error("Expected a single pair of lens files, got {count} inputs (batch stitching is not supported)")]
    TooManyInputs { count: usize },

    /// The input carries no lens marker, so no partner can be derived.
    #[error("Failed to find the paired lens file for '{name}': no lens marker in the name")]
    NoPairFound { name: String },

    /// The two inputs do not satisfy the pairing invariant.
    #[error("'{first}' and '{second}' are not from the same recording; check the lens markers")]
    InvalidPairMismatch { first: String, second: String },

    /// The output location could not be derived from the input path.
    #[error("Failed to build the output path from '{}'", path.display())]
    OutputPathUnconstructible { path: PathBuf },

    /// Interactive selection was not a listed number.
    #[error("Invalid selection '{input}': expected a number between 1 and {max}")]
    InvalidSelection { input: String, max: usize },

    /// The discovery directory is missing or unreadable.
    #[error("Source directory unavailable: {}: {source}", path.display())]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The discovery directory holds no matching recordings.
    #[error("No recordings found in {}", path.display())]
    NoRecordingsFound { path: PathBuf },

    /// Job options violate a configuration invariant.
    #[error("Invalid job options: {0}")]
    InvalidOptions(String),

    /// `start` called on a controller that already left `Idle`.
    #[error("Cannot start stitch job: controller is already {state}")]
    AlreadyStarted { state: JobState },

    /// Waiting on a controller that was never started.
    #[error("Stitch job was never started")]
    NotStarted,

    /// The engine refused or failed to launch the job.
    #[error("Stitch engine '{engine}' failed to start: {message}")]
    EngineStart { engine: String, message: String },

    /// The engine reported an error while running.
    #[error("Stitch engine error {code}: {message}")]
    EngineReportedError { code: i32, message: String },

    /// Terminal or file I/O failed outside discovery.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Settings file could not be loaded or saved.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl StitchError {
    /// Create an invalid pair error.
    pub fn pair_mismatch(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self::InvalidPairMismatch {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create an invalid options error.
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions(message.into())
    }

    /// Create a directory unavailable error.
    pub fn directory_unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::DirectoryUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Create an I/O error with context.
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create an engine start error.
    pub fn engine_start(engine: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EngineStart {
            engine: engine.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error. Success is always 0.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NoInput | Self::TooManyInputs { .. } | Self::InvalidOptions(_) => 2,
            Self::NoPairFound { .. } => 3,
            Self::InvalidPairMismatch { .. } => 4,
            Self::OutputPathUnconstructible { .. } => 5,
            Self::InvalidSelection { .. } => 6,
            Self::DirectoryUnavailable { .. } | Self::NoRecordingsFound { .. } => 7,
            Self::EngineStart { .. } => 8,
            Self::EngineReportedError { .. } => 9,
            Self::AlreadyStarted { .. } | Self::NotStarted => 10,
            Self::Config(_) => 11,
            Self::Io { .. } => 12,
        }
    }
}

/// Result type for stitch operations.
pub type StitchResult<T> = Result<T, StitchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_displays_code_and_message() {
        let err = StitchError::EngineReportedError {
            code: -3,
            message: "decoder init failed".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("-3"));
        assert!(msg.contains("decoder init failed"));
    }

    #[test]
    fn failure_classes_have_distinct_nonzero_exit_codes() {
        let errors = [
            StitchError::NoPairFound {
                name: "a.insv".to_string(),
            },
            StitchError::pair_mismatch("a", "b"),
            StitchError::OutputPathUnconstructible {
                path: PathBuf::from("a.insv"),
            },
            StitchError::InvalidSelection {
                input: "x".to_string(),
                max: 2,
            },
            StitchError::directory_unavailable("missing", io::Error::from(io::ErrorKind::NotFound)),
            StitchError::EngineReportedError {
                code: 1,
                message: "boom".to_string(),
            },
        ];

        let mut codes: Vec<u8> = errors.iter().map(StitchError::exit_code).collect();
        assert!(codes.iter().all(|c| *c != 0));
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
