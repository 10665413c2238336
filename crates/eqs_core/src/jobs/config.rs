//! Immutable configuration of one stitch job.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::options::{non_empty, parse_frame_indices, OutputSize, StitchOptions};
use crate::error::{StitchError, StitchResult};
use crate::models::{ImageFormat, StitchAlgorithm, VideoCodec};
use crate::naming::{LensPair, OutputLayout};

/// Where the engine writes its result. Exactly one mode per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum OutputTarget {
    /// One encoded video file.
    File { path: PathBuf },
    /// One image per frame in a directory.
    ImageSequence {
        dir: PathBuf,
        format: ImageFormat,
        /// Frames to export; empty means every frame.
        frame_indices: Vec<u64>,
    },
}

/// Engine feature switches.
///
/// Model-backed features are `Some(model)` when enabled; a feature without a
/// model cannot be enabled.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FeatureSet {
    pub flowstate: bool,
    pub direction_lock: bool,
    pub stitch_fusion: bool,
    pub cuda: bool,
    pub soft_encode: bool,
    pub soft_decode: bool,
    pub color_plus: Option<PathBuf>,
    pub denoise: Option<PathBuf>,
    pub deflicker: Option<PathBuf>,
    pub camera_accessory_type: i32,
}

/// Validated, immutable stitch job configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StitchJobConfig {
    inputs: LensPair,
    output: OutputTarget,
    algorithm: StitchAlgorithm,
    ai_model: Option<PathBuf>,
    output_size: OutputSize,
    bitrate: u64,
    codec: VideoCodec,
    features: FeatureSet,
}

impl StitchJobConfig {
    /// Build the job configuration for `inputs` from raw options.
    ///
    /// The output file defaults to `layout` applied to the primary input.
    /// An explicit output file together with an image-sequence directory is
    /// rejected. Model-backed features whose model path is empty are
    /// switched off; AI stitching without a model falls back to the default
    /// algorithm.
    pub fn from_options(
        inputs: LensPair,
        options: &StitchOptions,
        layout: &OutputLayout,
    ) -> StitchResult<Self> {
        let output = match (
            non_empty(&options.output_file),
            non_empty(&options.image_sequence_dir),
        ) {
            (Some(file), Some(dir)) => {
                return Err(StitchError::invalid_options(format!(
                    "output file '{}' and image sequence directory '{}' are mutually exclusive",
                    file.display(),
                    dir.display()
                )))
            }
            (_, Some(dir)) => OutputTarget::ImageSequence {
                dir: dir.to_path_buf(),
                format: options.image_format,
                frame_indices: options
                    .export_frame_index
                    .as_deref()
                    .map(parse_frame_indices)
                    .unwrap_or_default(),
            },
            (Some(file), None) => OutputTarget::File {
                path: file.to_path_buf(),
            },
            (None, None) => OutputTarget::File {
                path: layout.resolve(&inputs.primary)?,
            },
        };

        if matches!(output, OutputTarget::File { .. })
            && options.export_frame_index.as_deref().is_some_and(|s| !s.trim().is_empty())
        {
            tracing::warn!("Frame index list ignored: only used with an image sequence directory");
        }

        let (algorithm, ai_model) = match options.stitch_type {
            StitchAlgorithm::Ai => match non_empty(&options.ai_stitching_model) {
                Some(model) => (StitchAlgorithm::Ai, Some(model.to_path_buf())),
                None => {
                    tracing::warn!(
                        "AI stitching requested without a model file, falling back to {}",
                        StitchAlgorithm::default()
                    );
                    (StitchAlgorithm::default(), None)
                }
            },
            other => (other, None),
        };

        let features = FeatureSet {
            flowstate: options.enable_flowstate,
            direction_lock: options.enable_directionlock,
            stitch_fusion: options.enable_stitchfusion,
            cuda: options.enable_cuda,
            soft_encode: options.enable_soft_encode,
            soft_decode: options.enable_soft_decode,
            color_plus: model_feature("color plus", options.enable_colorplus, &options.colorplus_model),
            denoise: model_feature("denoise", options.enable_denoise, &options.denoise_model),
            deflicker: model_feature("deflicker", options.enable_deflicker, &options.deflicker_model),
            camera_accessory_type: options.camera_accessory_type,
        };

        Ok(Self {
            inputs,
            output,
            algorithm,
            ai_model,
            output_size: options.output_size,
            bitrate: options.bitrate,
            codec: if options.enable_h265_encoder {
                VideoCodec::H265
            } else {
                VideoCodec::H264
            },
            features,
        })
    }

    pub fn inputs(&self) -> &LensPair {
        &self.inputs
    }

    pub fn output(&self) -> &OutputTarget {
        &self.output
    }

    pub fn algorithm(&self) -> StitchAlgorithm {
        self.algorithm
    }

    /// Model file, set only for AI stitching.
    pub fn ai_model(&self) -> Option<&Path> {
        self.ai_model.as_deref()
    }

    pub fn output_size(&self) -> OutputSize {
        self.output_size
    }

    /// Output bitrate; 0 keeps the input bitrate.
    pub fn bitrate(&self) -> u64 {
        self.bitrate
    }

    pub fn codec(&self) -> VideoCodec {
        self.codec
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Render the configuration as stitcher command-line arguments.
    pub fn to_engine_args(&self) -> Vec<String> {
        let mut args = vec!["-inputs".to_string()];
        args.extend(self.inputs.paths().iter().map(|p| p.display().to_string()));

        match &self.output {
            OutputTarget::File { path } => {
                args.push("-output".to_string());
                args.push(path.display().to_string());
            }
            OutputTarget::ImageSequence {
                dir,
                format,
                frame_indices,
            } => {
                args.push("-image_sequence_dir".to_string());
                args.push(dir.display().to_string());
                args.push("-image_type".to_string());
                args.push(format.extension().to_string());
                if !frame_indices.is_empty() {
                    let list: Vec<String> = frame_indices.iter().map(u64::to_string).collect();
                    args.push("-export_frame_index".to_string());
                    args.push(list.join("-"));
                }
            }
        }

        args.push("-stitch_type".to_string());
        args.push(self.algorithm.name().to_string());
        if let Some(model) = &self.ai_model {
            args.push("-ai_stitching_model".to_string());
            args.push(model.display().to_string());
        }

        args.push("-output_size".to_string());
        args.push(self.output_size.to_string());
        if self.bitrate > 0 {
            args.push("-bitrate".to_string());
            args.push(self.bitrate.to_string());
        }
        if self.codec == VideoCodec::H265 {
            args.push("-enable_h265_encoder".to_string());
        }

        let f = &self.features;
        let flags = [
            (f.flowstate, "-enable_flowstate"),
            (f.direction_lock, "-enable_directionlock"),
            (f.stitch_fusion, "-enable_stitchfusion"),
            (!f.cuda, "-disable_cuda"),
            (f.soft_encode, "-enable_soft_encode"),
            (f.soft_decode, "-enable_soft_decode"),
        ];
        args.extend(flags.iter().filter(|(on, _)| *on).map(|(_, flag)| flag.to_string()));

        let models = [
            (&f.denoise, "-enable_denoise", "-image_denoise_model"),
            (&f.color_plus, "-enable_colorplus", "-colorplus_model"),
            (&f.deflicker, "-enable_deflicker", "-deflicker_model"),
        ];
        for (model, enable, model_flag) in models {
            if let Some(model) = model {
                args.push(enable.to_string());
                args.push(model_flag.to_string());
                args.push(model.display().to_string());
            }
        }

        if f.camera_accessory_type != 0 {
            args.push("-camera_accessory_type".to_string());
            args.push(f.camera_accessory_type.to_string());
        }

        args
    }
}

fn model_feature(name: &str, requested: bool, model: &Option<PathBuf>) -> Option<PathBuf> {
    if !requested {
        return None;
    }
    match non_empty(model) {
        Some(path) => Some(path.to_path_buf()),
        None => {
            tracing::warn!("{} requested without a model file, disabling it", name);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> LensPair {
        LensPair {
            primary: PathBuf::from("root/sources/rawFootage/VID_20240101_001_00_01.insv"),
            secondary: PathBuf::from("root/sources/rawFootage/VID_20240101_001_10_01.insv"),
        }
    }

    fn build(options: &StitchOptions) -> StitchResult<StitchJobConfig> {
        StitchJobConfig::from_options(pair(), options, &OutputLayout::default())
    }

    #[test]
    fn default_output_is_derived_file() {
        let config = build(&StitchOptions::default()).unwrap();
        assert_eq!(
            config.output(),
            &OutputTarget::File {
                path: PathBuf::from("root/convertedFootage/VID_20240101_001_00_01.mp4")
            }
        );
        assert_eq!(config.algorithm(), StitchAlgorithm::OpticalFlow);
        assert_eq!(config.codec(), VideoCodec::H264);
    }

    #[test]
    fn explicit_output_file_wins_over_derived() {
        let options = StitchOptions {
            output_file: Some(PathBuf::from("out/custom.mp4")),
            ..Default::default()
        };
        let config = build(&options).unwrap();
        assert_eq!(
            config.output(),
            &OutputTarget::File {
                path: PathBuf::from("out/custom.mp4")
            }
        );
    }

    #[test]
    fn image_sequence_replaces_file_output() {
        let options = StitchOptions {
            image_sequence_dir: Some(PathBuf::from("frames")),
            image_format: ImageFormat::Png,
            export_frame_index: Some("20-50-30".to_string()),
            ..Default::default()
        };
        let config = build(&options).unwrap();
        assert_eq!(
            config.output(),
            &OutputTarget::ImageSequence {
                dir: PathBuf::from("frames"),
                format: ImageFormat::Png,
                frame_indices: vec![20, 50, 30],
            }
        );
    }

    #[test]
    fn image_sequence_does_not_need_an_output_path() {
        let inputs = LensPair {
            primary: PathBuf::from("VID_1_2_00_3.insv"),
            secondary: PathBuf::from("VID_1_2_10_3.insv"),
        };
        let options = StitchOptions {
            image_sequence_dir: Some(PathBuf::from("frames")),
            ..Default::default()
        };
        assert!(StitchJobConfig::from_options(inputs.clone(), &options, &OutputLayout::default()).is_ok());

        let err = StitchJobConfig::from_options(inputs, &StitchOptions::default(), &OutputLayout::default())
            .unwrap_err();
        assert!(matches!(err, StitchError::OutputPathUnconstructible { .. }));
    }

    #[test]
    fn output_modes_are_mutually_exclusive() {
        let options = StitchOptions {
            output_file: Some(PathBuf::from("a.mp4")),
            image_sequence_dir: Some(PathBuf::from("frames")),
            ..Default::default()
        };
        assert!(matches!(build(&options), Err(StitchError::InvalidOptions(_))));
    }

    #[test]
    fn empty_paths_count_as_unset() {
        let options = StitchOptions {
            output_file: Some(PathBuf::new()),
            image_sequence_dir: Some(PathBuf::new()),
            ..Default::default()
        };
        let config = build(&options).unwrap();
        assert!(matches!(config.output(), OutputTarget::File { .. }));
    }

    #[test]
    fn model_features_need_a_model() {
        let options = StitchOptions {
            enable_colorplus: true,
            colorplus_model: Some(PathBuf::new()),
            enable_denoise: true,
            denoise_model: None,
            enable_deflicker: true,
            deflicker_model: Some(PathBuf::from("models/deflicker.ins")),
            ..Default::default()
        };
        let config = build(&options).unwrap();
        assert_eq!(config.features().color_plus, None);
        assert_eq!(config.features().denoise, None);
        assert_eq!(
            config.features().deflicker,
            Some(PathBuf::from("models/deflicker.ins"))
        );
    }

    #[test]
    fn model_without_toggle_stays_disabled() {
        let options = StitchOptions {
            colorplus_model: Some(PathBuf::from("models/colorplus.ins")),
            ..Default::default()
        };
        assert_eq!(build(&options).unwrap().features().color_plus, None);
    }

    #[test]
    fn ai_stitch_without_model_falls_back() {
        let options = StitchOptions {
            stitch_type: StitchAlgorithm::Ai,
            ..Default::default()
        };
        let config = build(&options).unwrap();
        assert_eq!(config.algorithm(), StitchAlgorithm::OpticalFlow);
        assert_eq!(config.ai_model(), None);

        let options = StitchOptions {
            stitch_type: StitchAlgorithm::Ai,
            ai_stitching_model: Some(PathBuf::from("models/ai.ins")),
            ..Default::default()
        };
        let config = build(&options).unwrap();
        assert_eq!(config.algorithm(), StitchAlgorithm::Ai);
        assert_eq!(config.ai_model(), Some(Path::new("models/ai.ins")));
    }

    #[test]
    fn engine_args_cover_configuration() {
        let options = StitchOptions {
            stitch_type: StitchAlgorithm::Dynamic,
            bitrate: 50_000_000,
            enable_h265_encoder: true,
            enable_cuda: false,
            enable_colorplus: true,
            colorplus_model: Some(PathBuf::from("cp.ins")),
            camera_accessory_type: 3,
            ..Default::default()
        };
        let args = build(&options).unwrap().to_engine_args();
        let joined = args.join(" ");

        assert!(joined.starts_with(
            "-inputs root/sources/rawFootage/VID_20240101_001_00_01.insv root/sources/rawFootage/VID_20240101_001_10_01.insv -output root/convertedFootage/VID_20240101_001_00_01.mp4"
        ));
        assert!(joined.contains("-stitch_type dynamicstitch"));
        assert!(joined.contains("-output_size 1920x960"));
        assert!(joined.contains("-bitrate 50000000"));
        assert!(joined.contains("-enable_h265_encoder"));
        assert!(joined.contains("-enable_stitchfusion"));
        assert!(joined.contains("-disable_cuda"));
        assert!(joined.contains("-enable_colorplus -colorplus_model cp.ins"));
        assert!(joined.contains("-camera_accessory_type 3"));
        assert!(!joined.contains("-enable_denoise"));
    }

    #[test]
    fn engine_args_for_image_sequence() {
        let options = StitchOptions {
            image_sequence_dir: Some(PathBuf::from("frames")),
            export_frame_index: Some("1-2".to_string()),
            ..Default::default()
        };
        let joined = build(&options).unwrap().to_engine_args().join(" ");
        assert!(joined.contains("-image_sequence_dir frames -image_type jpg -export_frame_index 1-2"));
        assert!(!joined.contains("-output "));
        assert!(!joined.contains("-bitrate"));
    }
}
