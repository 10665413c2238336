//! Input pair resolution and output path derivation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{LensNaming, LensTag};
use crate::error::{StitchError, StitchResult};

/// The two lens files of one recording, primary first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LensPair {
    pub primary: PathBuf,
    pub secondary: PathBuf,
}

impl LensPair {
    /// Both inputs in engine order.
    pub fn paths(&self) -> [&Path; 2] {
        [&self.primary, &self.secondary]
    }
}

/// Resolve the input list into a validated, ordered pair.
///
/// - no input: [`StitchError::NoInput`]; the caller falls back to discovery
/// - one input: the partner is derived by swapping the lens marker
/// - two inputs: checked against the pairing invariant
/// - more: [`StitchError::TooManyInputs`]
///
/// The partner file is not required to exist; the engine reports missing
/// inputs itself.
pub fn resolve_pair(naming: &LensNaming, inputs: &[PathBuf]) -> StitchResult<LensPair> {
    let (first, second) = match inputs {
        [] => return Err(StitchError::NoInput),
        [single] => {
            let name = path_str(single)?;
            let partner = naming
                .complementary_name(name)
                .ok_or_else(|| StitchError::NoPairFound {
                    name: name.to_string(),
                })?;
            tracing::debug!("Derived paired lens file {}", partner);
            (name.to_string(), partner)
        }
        [a, b] => (path_str(a)?.to_string(), path_str(b)?.to_string()),
        _ => {
            return Err(StitchError::TooManyInputs {
                count: inputs.len(),
            })
        }
    };

    if !naming.are_pair(&first, &second) {
        return Err(StitchError::pair_mismatch(first, second));
    }

    let pair = match naming.lens_of(&first) {
        Some((LensTag::Primary, _)) => LensPair {
            primary: first.into(),
            secondary: second.into(),
        },
        _ => LensPair {
            primary: second.into(),
            secondary: first.into(),
        },
    };

    Ok(pair)
}

fn path_str(path: &Path) -> StitchResult<&str> {
    path.to_str().ok_or_else(|| StitchError::NoPairFound {
        name: path.display().to_string(),
    })
}

pub const DEFAULT_CONVERTED_DIR: &str = "convertedFootage";
pub const DEFAULT_OUTPUT_EXTENSION: &str = "mp4";

/// Where converted output lands relative to the raw footage tree.
///
/// ```text
/// root/sources/rawFootage/VID_..._00_01.insv
/// root/convertedFootage/VID_..._00_01.mp4
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub converted_dir_name: String,
    pub extension: String,
}

impl OutputLayout {
    pub fn new(converted_dir_name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            converted_dir_name: converted_dir_name.into(),
            extension: extension.into(),
        }
    }

    /// Output file for a primary input.
    ///
    /// Takes the grandparent of the directory holding `input`, descends into
    /// the converted directory and reuses the input stem (marker included)
    /// with the output extension. Pure path algebra; the filesystem is not
    /// touched.
    pub fn resolve(&self, input: &Path) -> StitchResult<PathBuf> {
        let unconstructible = || StitchError::OutputPathUnconstructible {
            path: input.to_path_buf(),
        };

        let stem = input
            .file_stem()
            .filter(|stem| !stem.is_empty())
            .ok_or_else(unconstructible)?;

        let root = input
            .parent()
            .and_then(Path::parent)
            .and_then(Path::parent)
            .ok_or_else(unconstructible)?;

        let mut file_name = stem.to_os_string();
        file_name.push(".");
        file_name.push(self.extension.trim_start_matches('.'));

        Ok(root.join(&self.converted_dir_name).join(file_name))
    }
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERTED_DIR, DEFAULT_OUTPUT_EXTENSION)
    }
}

/// [`OutputLayout::resolve`] with the default layout.
pub fn resolve_output_path(input: &Path) -> StitchResult<PathBuf> {
    OutputLayout::default().resolve(input)
}
