//! On-disk artifact layout
//!
//! Artifacts for a target live in one directory and are named
//! `{stem}_{index}.jpg`, where `stem` is the target name with spaces turned
//! into underscores and `index` is a zero-based decimal without padding.
//! The next index is always one past the highest suffix already present, so
//! gaps are never refilled and existing files are never overwritten.

use crate::ArtifactError;
use image::{DynamicImage, ImageFormat};
use std::io;
use std::path::{Path, PathBuf};

/// File extension used for every artifact, whatever the source format
pub const ARTIFACT_EXTENSION: &str = "jpg";

/// Converts a target name into the stem used for its files and directory
pub fn sanitize_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Builds the file name for the artifact at `index`
pub fn artifact_file_name(stem: &str, index: usize) -> String {
    format!("{}_{}.{}", stem, index, ARTIFACT_EXTENSION)
}

/// Extracts the numeric suffix from an artifact file name
///
/// Accepts any `*.jpg` name whose part after the last `_` (up to the first
/// `.`) is all ASCII digits.
pub fn parse_index(file_name: &str) -> Option<usize> {
    if !file_name.ends_with(".jpg") {
        return None;
    }

    let suffix = file_name.rsplit('_').next()?;
    let digits = suffix.split('.').next()?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}

/// Scans `dir` and returns the next free artifact index
///
/// A missing directory counts as empty. A file whose suffix is `usize::MAX`
/// has no successor index and is ignored.
pub fn scan_next_index(dir: &Path) -> io::Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut next = 0;
    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(index) = file_name.to_str().and_then(parse_index) else {
            continue;
        };

        match index.checked_add(1) {
            Some(candidate) => next = next.max(candidate),
            None => tracing::warn!(
                "Ignoring {}: index has no successor",
                entry.path().display()
            ),
        }
    }

    Ok(next)
}

/// Destination directory for one target's artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    stem: String,
}

impl ArtifactStore {
    /// Opens (creating if needed) the directory for a target's artifacts
    pub fn open(dir: impl Into<PathBuf>, target_name: &str) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            stem: sanitize_name(target_name),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the next free index by rescanning the directory
    pub fn next_index(&self) -> io::Result<usize> {
        scan_next_index(&self.dir)
    }

    /// Full path of the artifact at `index`
    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(artifact_file_name(&self.stem, index))
    }

    /// Writes `image` as a JPEG at `index`
    ///
    /// The image is flattened to RGB first; JPEG has no alpha channel.
    pub fn save(&self, image: &DynamicImage, index: usize) -> Result<PathBuf, ArtifactError> {
        let path = self.path_for(index);
        image
            .to_rgb8()
            .save_with_format(&path, ImageFormat::Jpeg)
            .map_err(|error| ArtifactError::Save {
                path: path.clone(),
                error,
            })?;
        Ok(path)
    }
}
