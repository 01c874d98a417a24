use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::calibrate::DEFAULT_PASSES;
use crate::error::{RedubError, RedubResult};
use crate::model::{BackendKind, DubRequest};

#[derive(Debug, Parser)]
#[command(name = "redub")]
#[command(about = "Re-dub a video from its subtitle track with per-cue speech-rate calibration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline: parse, synthesize, calibrate, assemble.
    Dub(DubArgs),
    /// Parse a subtitle file and print the segment table as JSON.
    Parse(ParseArgs),
    /// Report speech backend availability and capabilities as JSON.
    Backends,
}

#[derive(Debug, Clone, Args)]
pub struct DubArgs {
    /// Path to the source video file.
    #[arg(long)]
    pub video: PathBuf,

    /// Path to the subtitle file (.vtt or .srt).
    #[arg(long)]
    pub subtitles: PathBuf,

    /// Speech backend.
    #[arg(long, value_enum, default_value_t = BackendKind::Espeak)]
    pub backend: BackendKind,

    /// Language tag forwarded to the backend (e.g. en, es).
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Calibration passes (>= 1); fixed-rate backends always use one.
    #[arg(long, default_value_t = DEFAULT_PASSES)]
    pub passes: u32,

    /// Time-stretch each clip to exactly fill its slot before placement.
    #[arg(long)]
    pub correct_speed: bool,

    /// Base directory for the per-video workspace.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Explicit export path (defaults to `Output <video>.mp4` in the workspace).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Print the full JSON run report instead of a summary line.
    #[arg(long)]
    pub json: bool,
}

impl DubArgs {
    pub fn to_request(&self) -> RedubResult<DubRequest> {
        if self.passes == 0 {
            return Err(RedubError::Precondition(
                "--passes must be at least 1".to_owned(),
            ));
        }
        if self.language.trim().is_empty() {
            return Err(RedubError::Precondition(
                "--language must not be empty".to_owned(),
            ));
        }
        Ok(DubRequest {
            video: self.video.clone(),
            subtitles: self.subtitles.clone(),
            backend: self.backend,
            language: self.language.trim().to_owned(),
            passes: self.passes,
            correct_speed: self.correct_speed,
            out_dir: self.out_dir.clone(),
            output: self.output.clone(),
        })
    }
}

#[derive(Debug, Clone, Args)]
pub struct ParseArgs {
    /// Path to the subtitle file (.vtt or .srt).
    #[arg(long)]
    pub subtitles: PathBuf,

    /// Language tag stored on the parsed table.
    #[arg(long, default_value = "en")]
    pub language: String,
}
