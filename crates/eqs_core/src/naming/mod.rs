//! Lens-file naming and pairing.
//!
//! A dual-lens camera writes one file per lens for every recording. The two
//! names are identical except for a fixed-width lens marker (`_00_` for the
//! primary lens, `_10_` for the secondary one by default):
//!
//! ```text
//! VID_20240101_001_00_01.insv   primary
//! VID_20240101_001_10_01.insv   secondary
//! ```
//!
//! [`LensNaming`] holds the marker strings and implements the pure name
//! operations; [`pairing`] builds on it to validate and order an input pair.
//!
//! A name is expected to contain at most one marker. Names with more than one
//! occurrence (for example a marker inside a directory component) are outside
//! the contract and resolve against the first primary marker found.

mod pairing;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StitchError, StitchResult};

pub use pairing::{resolve_output_path, resolve_pair, LensPair, OutputLayout};

/// Which physical lens produced a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensTag {
    Primary,
    Secondary,
}

impl LensTag {
    /// The opposite lens.
    pub fn other(&self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }
}

impl fmt::Display for LensTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

pub const DEFAULT_PRIMARY_MARKER: &str = "_00_";
pub const DEFAULT_SECONDARY_MARKER: &str = "_10_";
pub const DEFAULT_PLACEHOLDER: &str = "_XX_";

/// Lens marker convention used to canonicalize and pair file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LensNaming {
    primary: String,
    secondary: String,
    placeholder: String,
}

impl LensNaming {
    /// Create a naming convention from explicit markers.
    ///
    /// All three strings must be non-empty and of identical byte length,
    /// and the two lens markers must differ.
    pub fn new(
        primary: impl Into<String>,
        secondary: impl Into<String>,
        placeholder: impl Into<String>,
    ) -> StitchResult<Self> {
        let naming = Self {
            primary: primary.into(),
            secondary: secondary.into(),
            placeholder: placeholder.into(),
        };

        let len = naming.primary.len();
        if len == 0 {
            return Err(StitchError::invalid_options("lens markers must not be empty"));
        }
        if naming.secondary.len() != len || naming.placeholder.len() != len {
            return Err(StitchError::invalid_options(format!(
                "lens markers '{}', '{}' and placeholder '{}' must have the same length",
                naming.primary, naming.secondary, naming.placeholder
            )));
        }
        if naming.primary == naming.secondary {
            return Err(StitchError::invalid_options(format!(
                "primary and secondary lens markers are both '{}'",
                naming.primary
            )));
        }

        Ok(naming)
    }

    /// Marker string for a lens.
    pub fn marker(&self, lens: LensTag) -> &str {
        match lens {
            LensTag::Primary => &self.primary,
            LensTag::Secondary => &self.secondary,
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Byte length shared by both markers and the placeholder.
    pub fn marker_len(&self) -> usize {
        self.primary.len()
    }

    /// Locate the lens marker in `name`.
    ///
    /// The primary marker is searched first; the secondary marker only when
    /// no primary marker exists. Returns the lens and the byte offset.
    pub fn lens_of(&self, name: &str) -> Option<(LensTag, usize)> {
        name.find(&self.primary)
            .map(|pos| (LensTag::Primary, pos))
            .or_else(|| name.find(&self.secondary).map(|pos| (LensTag::Secondary, pos)))
    }

    /// Name of the file recorded by the other lens.
    ///
    /// Only the marker is swapped; directory, session id, counters and
    /// extension stay as they are. `None` when `name` has no marker.
    pub fn complementary_name(&self, name: &str) -> Option<String> {
        let (lens, pos) = self.lens_of(name)?;
        Some(self.splice(name, pos, self.marker(lens.other())))
    }

    /// `name` rewritten to carry the marker of `lens`.
    pub fn with_lens(&self, name: &str, lens: LensTag) -> Option<String> {
        let (_, pos) = self.lens_of(name)?;
        Some(self.splice(name, pos, self.marker(lens)))
    }

    /// Lens-agnostic key of `name`, for equality comparisons only.
    pub fn canonical_key(&self, name: &str) -> Option<String> {
        let (_, pos) = self.lens_of(name)?;
        Some(self.splice(name, pos, &self.placeholder))
    }

    /// Whether `a` and `b` are the two lens files of one recording.
    ///
    /// The marker is located in `a` only; `b` is inspected at the same
    /// offset. Names whose markers sit at different offsets never pair.
    pub fn are_pair(&self, a: &str, b: &str) -> bool {
        if a.len() != b.len() {
            return false;
        }

        let Some((lens_a, pos)) = self.lens_of(a) else {
            return false;
        };

        let end = pos + self.marker_len();
        match b.get(pos..end) {
            Some(marker_b) if marker_b == self.marker(lens_a.other()) => {}
            _ => return false,
        }

        self.splice(a, pos, &self.placeholder) == self.splice(b, pos, &self.placeholder)
    }

    fn splice(&self, name: &str, pos: usize, replacement: &str) -> String {
        let mut out = name.to_string();
        out.replace_range(pos..pos + self.marker_len(), replacement);
        out
    }
}

impl Default for LensNaming {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY_MARKER.to_string(),
            secondary: DEFAULT_SECONDARY_MARKER.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIMARY: &str = "VID_20240101_001_00_01.insv";
    const SECONDARY: &str = "VID_20240101_001_10_01.insv";

    fn naming() -> LensNaming {
        LensNaming::default()
    }

    #[test]
    fn complementary_name_swaps_marker() {
        assert_eq!(naming().complementary_name(PRIMARY).as_deref(), Some(SECONDARY));
        assert_eq!(naming().complementary_name(SECONDARY).as_deref(), Some(PRIMARY));
    }

    #[test]
    fn complementary_name_is_an_involution() {
        let names = [
            PRIMARY,
            "sources/rawFootage/VID_20231224_117_00_003.insv",
            "./VID_1_2_00_9.insv",
        ];
        for name in names {
            let once = naming().complementary_name(name).unwrap();
            assert_ne!(once, name);
            assert_eq!(naming().complementary_name(&once).as_deref(), Some(name));
        }
    }

    #[test]
    fn complementary_name_keeps_directory_and_extension() {
        let name = "footage/day1/VID_20240101_001_00_01.insv";
        assert_eq!(
            naming().complementary_name(name).as_deref(),
            Some("footage/day1/VID_20240101_001_10_01.insv")
        );
    }

    #[test]
    fn names_without_marker_have_no_complement() {
        for name in ["VID_20240101_001_01.insv", "", "_0_", "IMG_20240101_001_20_01.insp"] {
            assert_eq!(naming().complementary_name(name), None);
            assert_eq!(naming().canonical_key(name), None);
        }
    }

    #[test]
    fn canonical_key_is_lens_agnostic() {
        let key = naming().canonical_key(PRIMARY).unwrap();
        assert_eq!(key, "VID_20240101_001_XX_01.insv");
        assert_eq!(key.len(), PRIMARY.len());
        assert_eq!(naming().canonical_key(SECONDARY).unwrap(), key);
    }

    #[test]
    fn with_lens_forces_variant() {
        assert_eq!(naming().with_lens(SECONDARY, LensTag::Primary).as_deref(), Some(PRIMARY));
        assert_eq!(naming().with_lens(PRIMARY, LensTag::Primary).as_deref(), Some(PRIMARY));
    }

    #[test]
    fn lens_of_prefers_primary_marker() {
        assert_eq!(naming().lens_of(PRIMARY), Some((LensTag::Primary, 16)));
        assert_eq!(naming().lens_of(SECONDARY), Some((LensTag::Secondary, 16)));
        assert_eq!(naming().lens_of("VID.insv"), None);
    }

    #[test]
    fn are_pair_accepts_same_recording() {
        assert!(naming().are_pair(PRIMARY, SECONDARY));
    }

    #[test]
    fn are_pair_rejects_different_session() {
        assert!(!naming().are_pair(PRIMARY, "VID_20240101_002_10_01.insv"));
    }

    #[test]
    fn are_pair_is_symmetric() {
        let cases = [
            (PRIMARY, SECONDARY),
            (PRIMARY, "VID_20240101_002_10_01.insv"),
            (PRIMARY, PRIMARY),
            (SECONDARY, SECONDARY),
            (PRIMARY, "VID_20240101_001_10_01.mp4"),
            ("a_00_b", "a_10_b"),
            ("a_00_b", "ab_10_"),
            ("no marker", "no marker"),
        ];
        for (a, b) in cases {
            assert_eq!(naming().are_pair(a, b), naming().are_pair(b, a), "{a} / {b}");
        }
    }

    #[test]
    fn a_file_is_never_its_own_pair() {
        assert!(!naming().are_pair(PRIMARY, PRIMARY));
        assert!(!naming().are_pair(SECONDARY, SECONDARY));
    }

    #[test]
    fn are_pair_rejects_unequal_lengths() {
        assert!(!naming().are_pair(PRIMARY, "VID_20240101_001_10_001.insv"));
    }

    #[test]
    fn are_pair_ignores_markers_at_different_offsets() {
        // Same length, both markers present, but not aligned.
        assert!(!naming().are_pair("x_00_yz", "xy_10_z"));
    }

    #[test]
    fn are_pair_handles_non_ascii_neighbour() {
        // Offset in `a` lands inside a multi-byte char of `b`.
        assert!(!naming().are_pair("ab_00_", "aé_10"));
    }

    #[test]
    fn custom_markers_are_injected() {
        let naming = LensNaming::new("-L-", "-R-", "-?-").unwrap();
        assert!(naming.are_pair("clip-L-1.mov", "clip-R-1.mov"));
        assert_eq!(
            naming.complementary_name("clip-R-1.mov").as_deref(),
            Some("clip-L-1.mov")
        );
        assert_eq!(naming.complementary_name(PRIMARY), None);
    }

    #[test]
    fn invalid_marker_sets_are_rejected() {
        assert!(LensNaming::new("", "", "").is_err());
        assert!(LensNaming::new("_00_", "_1_", "_XX_").is_err());
        assert!(LensNaming::new("_00_", "_10_", "_X_").is_err());
        assert!(LensNaming::new("_00_", "_00_", "_XX_").is_err());
    }
}
