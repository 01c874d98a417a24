//! File and directory collaborators. The core never walks or deletes
//! directories; it only asks these handles where things live and for
//! idempotent creation of the clip/work directories.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RedubResult;

/// Thin handle over a source media file: path, base name, extension,
/// existence. No content access.
#[derive(Debug, Clone)]
pub struct MediaFile {
    path: PathBuf,
}

impl MediaFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// File name without the final extension.
    #[must_use]
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Final extension, lowercased, without the dot; empty when absent.
    #[must_use]
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

/// Per-video working directory: rendered clips live in a `subtitles/`
/// subdirectory, the exported video next to them.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace rooted at `<base_dir>/<video stem>`.
    #[must_use]
    pub fn for_video(base_dir: &Path, video: &MediaFile) -> Self {
        Self::new(base_dir.join(video.stem()))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn clip_dir(&self) -> PathBuf {
        self.root.join("subtitles")
    }

    /// Deterministic clip location for a segment index.
    #[must_use]
    pub fn clip_path(&self, index: usize, extension: &str) -> PathBuf {
        self.clip_dir().join(format!("seq-{index}.{extension}"))
    }

    /// Default export location, templated from the video's base name.
    #[must_use]
    pub fn output_path(&self, video: &MediaFile) -> PathBuf {
        self.root.join(format!("Output {}.mp4", video.stem()))
    }

    /// Create the workspace and clip directories; succeeds when they
    /// already exist.
    pub fn create(&self) -> RedubResult<()> {
        fs::create_dir_all(self.clip_dir())?;
        Ok(())
    }
}
