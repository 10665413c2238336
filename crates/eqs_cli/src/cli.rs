//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use eqs_core::jobs::{OutputSize, StitchOptions};
use eqs_core::models::{ImageFormat, StitchAlgorithm};

/// Default settings file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/stitch.toml";

#[derive(Parser, Debug)]
#[command(
    name = "eqs-stitch",
    version,
    about = "Stitch a dual-lens 360° recording into one equirectangular video"
)]
pub struct Cli {
    /// Lens files of one recording. With one file the other lens is found by
    /// name; with none, recordings in the sources directory are listed.
    #[arg(long, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Stitching algorithm: template, optflow, dynamicstitch or aistitch.
    #[arg(long, default_value_t = StitchAlgorithm::default())]
    pub stitch_type: StitchAlgorithm,

    /// Model file for aistitch.
    #[arg(long)]
    pub ai_stitching_model: Option<PathBuf>,

    /// Output bitrate in bits per second (0 keeps the input bitrate).
    #[arg(long, default_value_t = 0)]
    pub bitrate: u64,

    /// Output resolution as WIDTHxHEIGHT.
    #[arg(long, default_value_t = OutputSize::default())]
    pub output_size: OutputSize,

    /// Output file. Derived from the primary input when omitted.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub enable_flowstate: bool,

    #[arg(long)]
    pub enable_directionlock: bool,

    #[arg(long)]
    pub disable_stitchfusion: bool,

    #[arg(long)]
    pub disable_cuda: bool,

    #[arg(long)]
    pub enable_soft_encode: bool,

    #[arg(long)]
    pub enable_soft_decode: bool,

    #[arg(long)]
    pub enable_h265_encoder: bool,

    #[arg(long)]
    pub enable_denoise: bool,

    #[arg(long)]
    pub image_denoise_model: Option<PathBuf>,

    #[arg(long)]
    pub enable_colorplus: bool,

    #[arg(long)]
    pub colorplus_model: Option<PathBuf>,

    #[arg(long)]
    pub enable_deflicker: bool,

    #[arg(long)]
    pub deflicker_model: Option<PathBuf>,

    /// Export frames as images into this directory instead of a video.
    #[arg(long)]
    pub image_sequence_dir: Option<PathBuf>,

    /// Image format for --image-sequence-dir: jpg or png.
    #[arg(long, default_value_t = ImageFormat::default())]
    pub image_type: ImageFormat,

    /// Camera accessory (lens guard) type, 0 for none.
    #[arg(long, default_value_t = 0)]
    pub camera_accessory_type: i32,

    /// Frames to export, dash-delimited (e.g. 20-50-30).
    #[arg(long)]
    pub export_frame_index: Option<String>,

    /// Settings file; created with defaults if missing.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Directory listed when no inputs are given. Overrides the settings file.
    #[arg(long)]
    pub sources_dir: Option<PathBuf>,

    /// Resolve the job and print the engine command line without running it.
    #[arg(long)]
    pub dry_run: bool,

    /// More log output; repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Raw stitch options for the job.
    pub fn stitch_options(&self) -> StitchOptions {
        StitchOptions {
            stitch_type: self.stitch_type,
            ai_stitching_model: self.ai_stitching_model.clone(),
            output_size: self.output_size,
            bitrate: self.bitrate,
            output_file: self.output.clone(),
            image_sequence_dir: self.image_sequence_dir.clone(),
            image_format: self.image_type,
            export_frame_index: self.export_frame_index.clone(),
            enable_flowstate: self.enable_flowstate,
            enable_directionlock: self.enable_directionlock,
            enable_stitchfusion: !self.disable_stitchfusion,
            enable_cuda: !self.disable_cuda,
            enable_soft_encode: self.enable_soft_encode,
            enable_soft_decode: self.enable_soft_decode,
            enable_h265_encoder: self.enable_h265_encoder,
            enable_denoise: self.enable_denoise,
            denoise_model: self.image_denoise_model.clone(),
            enable_colorplus: self.enable_colorplus,
            colorplus_model: self.colorplus_model.clone(),
            enable_deflicker: self.enable_deflicker,
            deflicker_model: self.deflicker_model.clone(),
            camera_accessory_type: self.camera_accessory_type,
        }
    }
}
