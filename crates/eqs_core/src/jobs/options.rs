//! External option values for one stitch job.
//!
//! `StitchOptions` is a plain record of what the user asked for. It is not
//! validated; [`super::StitchJobConfig::from_options`] turns it into the
//! immutable job configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{ImageFormat, StitchAlgorithm};

/// Raw stitch options as collected from the command line or a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchOptions {
    pub stitch_type: StitchAlgorithm,
    pub ai_stitching_model: Option<PathBuf>,
    pub output_size: OutputSize,
    /// Output bitrate in bits per second; 0 keeps the input bitrate.
    pub bitrate: u64,
    /// Explicit output file, overriding the derived one.
    pub output_file: Option<PathBuf>,
    pub image_sequence_dir: Option<PathBuf>,
    pub image_format: ImageFormat,
    /// Dash-delimited frame numbers, e.g. `20-50-30`.
    pub export_frame_index: Option<String>,
    pub enable_flowstate: bool,
    pub enable_directionlock: bool,
    pub enable_stitchfusion: bool,
    pub enable_cuda: bool,
    pub enable_soft_encode: bool,
    pub enable_soft_decode: bool,
    pub enable_h265_encoder: bool,
    pub enable_denoise: bool,
    pub denoise_model: Option<PathBuf>,
    pub enable_colorplus: bool,
    pub colorplus_model: Option<PathBuf>,
    pub enable_deflicker: bool,
    pub deflicker_model: Option<PathBuf>,
    pub camera_accessory_type: i32,
}

impl Default for StitchOptions {
    fn default() -> Self {
        Self {
            stitch_type: StitchAlgorithm::default(),
            ai_stitching_model: None,
            output_size: OutputSize::default(),
            bitrate: 0,
            output_file: None,
            image_sequence_dir: None,
            image_format: ImageFormat::default(),
            export_frame_index: None,
            enable_flowstate: false,
            enable_directionlock: false,
            enable_stitchfusion: true,
            enable_cuda: true,
            enable_soft_encode: false,
            enable_soft_decode: false,
            enable_h265_encoder: false,
            enable_denoise: false,
            denoise_model: None,
            enable_colorplus: false,
            colorplus_model: None,
            enable_deflicker: false,
            deflicker_model: None,
            camera_accessory_type: 0,
        }
    }
}

/// Treat `Some("")` like `None`.
pub(crate) fn non_empty(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}

/// Output resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl Default for OutputSize {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 960,
        }
    }
}

impl fmt::Display for OutputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for OutputSize {
    type Err = String;

    /// Parse `WIDTHxHEIGHT`, e.g. `3840x1920`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid output size '{}' (expected WIDTHxHEIGHT, e.g. 1920x960)", s);

        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }

        Ok(Self { width, height })
    }
}

/// Parse a dash-delimited frame-index list leniently.
///
/// Each token yields its leading decimal digits; a token without digits
/// yields 0. Malformed tokens are logged, never fatal. An empty list string
/// yields no indices.
pub fn parse_frame_indices(list: &str) -> Vec<u64> {
    if list.trim().is_empty() {
        return Vec::new();
    }

    list.split('-').map(lenient_index).collect()
}

fn lenient_index(token: &str) -> u64 {
    let trimmed = token.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let digits = &trimmed[..digits_end];

    // Leading digits only; overflow saturates.
    let value = match digits {
        "" => 0,
        d => d.parse::<u64>().unwrap_or(u64::MAX),
    };

    if digits_end != trimmed.len() || digits.is_empty() {
        tracing::warn!("Malformed frame index '{}', using {}", token, value);
    }

    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_camera_tool() {
        let opts = StitchOptions::default();
        assert_eq!(opts.stitch_type, StitchAlgorithm::OpticalFlow);
        assert_eq!(opts.output_size, OutputSize { width: 1920, height: 960 });
        assert_eq!(opts.bitrate, 0);
        assert!(opts.enable_stitchfusion);
        assert!(opts.enable_cuda);
        assert!(!opts.enable_colorplus);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: StitchOptions =
            serde_json::from_str(r#"{"stitch_type":"aistitch","bitrate":40000000}"#).unwrap();
        assert_eq!(opts.stitch_type, StitchAlgorithm::Ai);
        assert_eq!(opts.bitrate, 40_000_000);
        assert!(opts.enable_cuda);
    }

    #[test]
    fn output_size_parses() {
        assert_eq!(
            "3840x1920".parse::<OutputSize>().unwrap(),
            OutputSize { width: 3840, height: 1920 }
        );
        assert_eq!("1920X960".parse::<OutputSize>().unwrap().to_string(), "1920x960");
    }

    #[test]
    fn output_size_rejects_garbage() {
        for input in ["1920", "x960", "1920x", "0x960", "axb", "1920x960x2"] {
            assert!(input.parse::<OutputSize>().is_err(), "{input}");
        }
    }

    #[test]
    fn frame_indices_in_order() {
        assert_eq!(parse_frame_indices("20-50-30"), vec![20, 50, 30]);
        assert_eq!(parse_frame_indices("7"), vec![7]);
    }

    #[test]
    fn frame_indices_are_lenient() {
        assert_eq!(parse_frame_indices("20-abc-30"), vec![20, 0, 30]);
        assert_eq!(parse_frame_indices("12x-5"), vec![12, 5]);
        assert_eq!(parse_frame_indices("1--2"), vec![1, 0, 2]);
    }

    #[test]
    fn empty_frame_list_yields_nothing() {
        assert!(parse_frame_indices("").is_empty());
        assert!(parse_frame_indices("  ").is_empty());
    }
}
