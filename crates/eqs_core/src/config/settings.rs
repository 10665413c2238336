//! Settings struct with TOML-based sections.
//!
//! Each section maps to one TOML table and can be rewritten on its own.

use serde::{Deserialize, Serialize};

use crate::error::{StitchError, StitchResult};
use crate::jobs::DiscoveryRules;
use crate::logging::LogLevel;
use crate::naming::{LensNaming, OutputLayout};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Source and output locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// Lens markers and recording file naming.
    #[serde(default)]
    pub naming: NamingSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// External stitcher.
    #[serde(default)]
    pub engine: EngineSettings,
}

impl Settings {
    /// Lens naming from the `[naming]` markers.
    pub fn lens_naming(&self) -> StitchResult<LensNaming> {
        LensNaming::new(
            &self.naming.primary_marker,
            &self.naming.secondary_marker,
            &self.naming.placeholder,
        )
    }

    /// Discovery rules from the `[naming]` section.
    pub fn discovery_rules(&self) -> StitchResult<DiscoveryRules> {
        let mut chars = self.naming.delimiter.chars();
        let delimiter = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(StitchError::invalid_options(format!(
                    "naming.delimiter must be a single character, got '{}'",
                    self.naming.delimiter
                )))
            }
        };

        Ok(DiscoveryRules {
            prefix: self.naming.file_prefix.clone(),
            extension: self.naming.file_extension.clone(),
            delimiter,
            recording_id_token: self.naming.recording_id_token,
            naming: self.lens_naming()?,
        })
    }

    /// Output layout from `[paths]` and `[naming]`.
    pub fn output_layout(&self) -> OutputLayout {
        OutputLayout::new(
            self.paths.converted_dir_name.clone(),
            self.naming.output_extension.clone(),
        )
    }
}

/// Source and output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory scanned for recordings when no input is given.
    #[serde(default = "default_sources_dir")]
    pub sources_dir: String,

    /// Directory name for stitched output, created beside `sources`.
    #[serde(default = "default_converted_dir_name")]
    pub converted_dir_name: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_sources_dir() -> String {
    "./sources/rawFootage".to_string()
}

fn default_converted_dir_name() -> String {
    "convertedFootage".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            sources_dir: default_sources_dir(),
            converted_dir_name: default_converted_dir_name(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Recording file naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamingSettings {
    #[serde(default = "default_primary_marker")]
    pub primary_marker: String,

    #[serde(default = "default_secondary_marker")]
    pub secondary_marker: String,

    /// Stands in for either marker in a recording key.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Extension including the dot.
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Delimiter token index holding the recording id.
    #[serde(default = "default_recording_id_token")]
    pub recording_id_token: usize,

    /// Extension of the stitched output file, without the dot.
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
}

fn default_primary_marker() -> String {
    crate::naming::DEFAULT_PRIMARY_MARKER.to_string()
}

fn default_secondary_marker() -> String {
    crate::naming::DEFAULT_SECONDARY_MARKER.to_string()
}

fn default_placeholder() -> String {
    crate::naming::DEFAULT_PLACEHOLDER.to_string()
}

fn default_file_prefix() -> String {
    "VID".to_string()
}

fn default_file_extension() -> String {
    ".insv".to_string()
}

fn default_delimiter() -> String {
    "_".to_string()
}

fn default_recording_id_token() -> usize {
    2
}

fn default_output_extension() -> String {
    "mp4".to_string()
}

impl Default for NamingSettings {
    fn default() -> Self {
        Self {
            primary_marker: default_primary_marker(),
            secondary_marker: default_secondary_marker(),
            placeholder: default_placeholder(),
            file_prefix: default_file_prefix(),
            file_extension: default_file_extension(),
            delimiter: default_delimiter(),
            recording_id_token: default_recording_id_token(),
            output_extension: default_output_extension(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Console level; `RUST_LOG` overrides it.
    #[serde(default)]
    pub level: LogLevel,

    /// Also write a daily log file under `paths.logs_folder`.
    #[serde(default = "default_true")]
    pub file_log: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file_log: true,
        }
    }
}

/// External stitcher executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the job arguments.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_program() -> String {
    "MediaSDKTest".to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            extra_args: Vec::new(),
        }
    }
}

/// Config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Naming,
    Logging,
    Engine,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 4] = [
        ConfigSection::Paths,
        ConfigSection::Naming,
        ConfigSection::Logging,
        ConfigSection::Engine,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Naming => "naming",
            ConfigSection::Logging => "logging",
            ConfigSection::Engine => "engine",
        }
    }

    /// Comment written above the table in a generated file.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Source, output and log directories",
            ConfigSection::Naming => "Lens markers and recording file names",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Engine => "External stitcher executable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::LensTag;

    #[test]
    fn default_settings_serializes() {
        let toml = toml::to_string_pretty(&Settings::default()).unwrap();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[naming]"));
        assert!(toml.contains("primary_marker = \"_00_\""));
        assert!(toml.contains("program = \"MediaSDKTest\""));
    }

    #[test]
    fn settings_round_trip() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[paths]\nsources_dir = \"/footage\"\n[logging]\nlevel = \"debug\"";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.paths.sources_dir, "/footage");
        assert_eq!(parsed.paths.converted_dir_name, "convertedFootage");
        assert_eq!(parsed.logging.level, LogLevel::Debug);
        assert!(parsed.logging.file_log);
        assert_eq!(parsed.naming.recording_id_token, 2);
    }

    #[test]
    fn naming_settings_build_lens_naming() {
        let mut settings = Settings::default();
        settings.naming.primary_marker = "-AA-".to_string();
        settings.naming.secondary_marker = "-BB-".to_string();
        settings.naming.placeholder = "-??-".to_string();

        let naming = settings.lens_naming().unwrap();
        assert_eq!(naming.marker(LensTag::Secondary), "-BB-");
        assert_eq!(
            naming.complementary_name("x-AA-y").as_deref(),
            Some("x-BB-y")
        );
    }

    #[test]
    fn bad_markers_are_rejected() {
        let mut settings = Settings::default();
        settings.naming.secondary_marker = "_100_".to_string();
        assert!(settings.lens_naming().is_err());
    }

    #[test]
    fn delimiter_must_be_one_character() {
        let mut settings = Settings::default();
        assert_eq!(settings.discovery_rules().unwrap().delimiter, '_');

        settings.naming.delimiter = "__".to_string();
        assert!(matches!(
            settings.discovery_rules(),
            Err(StitchError::InvalidOptions(_))
        ));
        settings.naming.delimiter = String::new();
        assert!(settings.discovery_rules().is_err());
    }

    #[test]
    fn output_layout_uses_configured_names() {
        let mut settings = Settings::default();
        settings.paths.converted_dir_name = "stitched".to_string();
        settings.naming.output_extension = "mov".to_string();

        let path = settings
            .output_layout()
            .resolve(std::path::Path::new("a/sources/raw/VID_1_2_00_3.insv"))
            .unwrap();
        assert_eq!(path, std::path::PathBuf::from("a/stitched/VID_1_2_00_3.mov"));
    }
}
