//! Core enums used throughout the application.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stitching strategy handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StitchAlgorithm {
    /// Fixed calibration template, fastest.
    Template,
    /// Optical-flow seam blending.
    #[default]
    #[serde(rename = "optflow")]
    OpticalFlow,
    /// Per-frame dynamic seam search.
    #[serde(rename = "dynamicstitch")]
    Dynamic,
    /// Model-driven stitching, requires a model file.
    #[serde(rename = "aistitch")]
    Ai,
}

impl StitchAlgorithm {
    /// Name used on the command line and in engine arguments.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::OpticalFlow => "optflow",
            Self::Dynamic => "dynamicstitch",
            Self::Ai => "aistitch",
        }
    }

    /// Get all available algorithms.
    pub fn all() -> &'static [StitchAlgorithm] {
        &[Self::Template, Self::OpticalFlow, Self::Dynamic, Self::Ai]
    }
}

impl fmt::Display for StitchAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for StitchAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|a| a.name() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| {
                let names: Vec<_> = Self::all().iter().map(|a| a.name()).collect();
                format!("unknown stitch type '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// Image format for image-sequence export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
}

impl ImageFormat {
    /// File extension / command-line name.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            other => Err(format!("unknown image type '{}' (expected jpg or png)", other)),
        }
    }
}

/// Video encoder used for file output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    #[default]
    H264,
    H265,
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::H264 => write!(f, "h264"),
            Self::H265 => write!(f, "h265"),
        }
    }
}

/// Lifecycle state of one stitch job.
///
/// `Succeeded` and `Failed` are terminal; once either is reached the job
/// never changes state again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    /// Whether this state is a sink.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
