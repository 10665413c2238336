//! Recording discovery from a raw-footage directory.
//!
//! Camera files are named `VID_{date}_{id}_{lens}_{n}.insv`. Each recording
//! exists twice on disk (one file per lens); discovery lists it once, always
//! under its primary-lens name, so the user picks a recording rather than a
//! lens file.

use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::{StitchError, StitchResult};
use crate::naming::{LensNaming, LensTag};

pub const DEFAULT_FILE_PREFIX: &str = "VID";
pub const DEFAULT_FILE_EXTENSION: &str = ".insv";
pub const DEFAULT_DELIMITER: char = '_';
pub const DEFAULT_RECORDING_ID_TOKEN: usize = 2;

/// Filename convention used to filter and group camera files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRules {
    /// Literal prefix a camera file starts with.
    pub prefix: String,
    /// Literal suffix (extension including the dot).
    pub extension: String,
    /// Token delimiter inside the file name.
    pub delimiter: char,
    /// Index of the recording-id token after splitting on `delimiter`.
    pub recording_id_token: usize,
    /// Lens marker convention.
    pub naming: LensNaming,
}

impl DiscoveryRules {
    fn matches(&self, file_name: &str) -> bool {
        file_name.starts_with(&self.prefix) && file_name.ends_with(&self.extension)
    }

    fn recording_id<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name.split(self.delimiter).nth(self.recording_id_token)
    }
}

impl Default for DiscoveryRules {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_FILE_PREFIX.to_string(),
            extension: DEFAULT_FILE_EXTENSION.to_string(),
            delimiter: DEFAULT_DELIMITER,
            recording_id_token: DEFAULT_RECORDING_ID_TOKEN,
            naming: LensNaming::default(),
        }
    }
}

/// One recording found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Path of the file that was actually found.
    pub path: PathBuf,
    /// Its file name.
    pub file_name: String,
    /// Recording id token used for deduplication.
    pub recording_id: String,
    /// Primary-lens form of the name shown to the user.
    pub display_name: String,
}

impl CandidateFile {
    /// Path of the primary-lens file, which is what gets stitched.
    pub fn primary_path(&self) -> PathBuf {
        self.path.with_file_name(&self.display_name)
    }
}

/// Scan `dir` (non-recursively) for camera recordings.
///
/// Files are visited in name order; the first file of each recording id is
/// kept and the other lens file of that recording is dropped. Names with too
/// few tokens to carry a recording id are skipped.
pub fn discover_recordings(dir: &Path, rules: &DiscoveryRules) -> StitchResult<Vec<CandidateFile>> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(StitchError::directory_unavailable(
                dir,
                io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            ))
        }
        Err(e) => return Err(StitchError::directory_unavailable(dir, e)),
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| StitchError::directory_unavailable(dir, e))? {
        let entry = entry.map_err(|e| StitchError::directory_unavailable(dir, e))?;
        let is_file = entry
            .file_type()
            .map_err(|e| StitchError::directory_unavailable(dir, e))?
            .is_file();
        if !is_file {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if rules.matches(&name) => names.push(name),
            Ok(_) => {}
            Err(name) => tracing::debug!("Skipping non UTF-8 file name {:?}", name),
        }
    }
    names.sort();

    let mut seen = HashSet::new();
    let mut recordings = Vec::new();

    for file_name in names {
        let Some(recording_id) = rules.recording_id(&file_name) else {
            tracing::warn!(
                "Skipping '{}': expected at least {} '{}'-separated tokens",
                file_name,
                rules.recording_id_token + 1,
                rules.delimiter
            );
            continue;
        };

        if !seen.insert(recording_id.to_string()) {
            tracing::trace!("Recording {} already listed, dropping {}", recording_id, file_name);
            continue;
        }

        let display_name = rules
            .naming
            .with_lens(&file_name, LensTag::Primary)
            .unwrap_or_else(|| file_name.clone());

        recordings.push(CandidateFile {
            path: dir.join(&file_name),
            recording_id: recording_id.to_string(),
            display_name,
            file_name,
        });
    }

    if recordings.is_empty() {
        return Err(StitchError::NoRecordingsFound {
            path: dir.to_path_buf(),
        });
    }

    tracing::info!("Discovered {} recording(s) in {}", recordings.len(), dir.display());
    Ok(recordings)
}

/// Parse a 1-based selection into a 0-based index.
pub fn parse_selection(input: &str, count: usize) -> StitchResult<usize> {
    let trimmed = input.trim();
    match trimmed.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Ok(n - 1),
        _ => Err(StitchError::InvalidSelection {
            input: trimmed.to_string(),
            max: count,
        }),
    }
}

/// List the recordings in `dir` on `output` and read one selection from `input`.
///
/// Returns the primary-lens path of the chosen recording. There is no retry:
/// an invalid answer is an error.
pub fn pick_recording<R: BufRead, W: Write>(
    dir: &Path,
    rules: &DiscoveryRules,
    input: &mut R,
    output: &mut W,
) -> StitchResult<PathBuf> {
    let recordings = discover_recordings(dir, rules)?;
    let write_err = |e: io::Error| StitchError::io("writing recording list", e);

    writeln!(output, "Recordings in {}:", dir.display()).map_err(write_err)?;
    for (i, recording) in recordings.iter().enumerate() {
        writeln!(output, "{}. {}", i + 1, recording.display_name).map_err(write_err)?;
    }
    write!(
        output,
        "Enter the number of the recording to stitch (1-{}): ",
        recordings.len()
    )
    .map_err(write_err)?;
    output.flush().map_err(write_err)?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| StitchError::io("reading selection", e))?;

    let index = parse_selection(&line, recordings.len())?;
    Ok(recordings[index].primary_path())
}
