//! Core data model: the segment table built from a subtitle file, the
//! request/report pair for a full dubbing run, and the shared enums.
//!
//! A [`Segment`] is an immutable-core / mutable-annotation record: index,
//! time slot and text never change after parse; rate, recorded duration
//! and ratio are rewritten by the calibration passes. The table is an
//! ordered map keyed by index, so source order and index gaps survive.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Cue text starting with this prefix (after leading whitespace) is kept
/// in the table for bookkeeping but never voiced in the assembled track.
pub const COMMENT_PREFIX: &str = "#";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleFormat {
    Vtt,
    Srt,
}

impl SubtitleFormat {
    /// Map a lowercase file extension (no dot) onto a supported format.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "vtt" => Some(Self::Vtt),
            "srt" => Some(Self::Srt),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vtt => "vtt",
            Self::Srt => "srt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Local offline engine (espeak-ng); honors a words-per-minute rate.
    Espeak,
    /// Network engine (Google Translate TTS); fixed natural rate.
    Gtts,
}

impl BackendKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Espeak => "espeak",
            Self::Gtts => "gtts",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineCapabilities {
    /// Whether the engine honors a numeric speech-rate parameter. When
    /// false the calibration loop collapses to a single render pass.
    pub supports_rate_control: bool,
}

/// One timed subtitle line with its slot and synthesis state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Stable identifier, assigned at parse time and never reassigned.
    pub index: usize,
    /// Slot start offset on the video timeline, seconds.
    pub start_sec: f64,
    /// Slot end offset, seconds.
    pub end_sec: f64,
    /// NFC-normalized spoken line; never empty once stored.
    pub text: String,
    /// Whitespace-delimited token count; derived in a batch pass.
    pub word_count: usize,
    /// Backend speech-rate parameter; meaningful once calibration starts.
    pub rate: f64,
    /// Wall-clock length of the most recent rendered clip, seconds.
    pub recorded_sec: Option<f64>,
    /// `recorded_sec / duration`; the steering signal for rate updates.
    pub ratio: Option<f64>,
}

impl Segment {
    #[must_use]
    pub fn new(index: usize, start_sec: f64, end_sec: f64, text: String) -> Self {
        Self {
            index,
            start_sec,
            end_sec,
            text,
            word_count: 0,
            rate: 0.0,
            recorded_sec: None,
            ratio: None,
        }
    }

    /// Slot duration: the target length a rendered clip should occupy.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end_sec - self.start_sec
    }

    /// Bookkeeping-only cue, excluded from the assembled track.
    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.text.trim_start().starts_with(COMMENT_PREFIX)
    }

    /// Whether this segment produces audible output in the assembled
    /// track: a clip was measured for it and it is not comment-marked.
    #[must_use]
    pub fn produces_audio(&self) -> bool {
        self.recorded_sec.map(|sec| sec > 0.0).unwrap_or(false) && !self.is_comment()
    }
}

/// Ordered collection of segments keyed by index, built once by the
/// parser, annotated in place by the calibrator, read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentTable {
    segments: BTreeMap<usize, Segment>,
    /// Language tag forwarded to the speech backend (e.g. "en").
    pub language: String,
    /// Set by the calibration engine once every segment has a rendered
    /// clip; assembly refuses to run while this is false.
    pub generated: bool,
}

impl SegmentTable {
    #[must_use]
    pub fn new(language: &str) -> Self {
        Self {
            segments: BTreeMap::new(),
            language: language.to_owned(),
            generated: false,
        }
    }

    /// Insert a segment. Returns false (and leaves the table unchanged)
    /// when the index is already occupied.
    pub fn insert(&mut self, segment: Segment) -> bool {
        if self.segments.contains_key(&segment.index) {
            return false;
        }
        self.segments.insert(segment.index, segment);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Segment> {
        self.segments.values_mut()
    }

    /// Batch derive pass run once after all blocks are consumed: word
    /// counts for every segment. Slot durations stay computed on demand
    /// since start/end never change after parse.
    pub fn derive_fields(&mut self) {
        for segment in self.segments.values_mut() {
            segment.word_count = segment.text.split_whitespace().count();
        }
    }

    /// Segments in source order as a plain vector (JSON-friendly view).
    #[must_use]
    pub fn to_rows(&self) -> Vec<Segment> {
        self.segments.values().cloned().collect()
    }
}

/// Parameters for one full dubbing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DubRequest {
    pub video: PathBuf,
    pub subtitles: PathBuf,
    pub backend: BackendKind,
    pub language: String,
    /// Calibration pass count; >= 1. Ignored (collapsed to one pass) by
    /// fixed-rate backends.
    pub passes: u32,
    /// Time-stretch every clip to exactly fill its slot before placement.
    pub correct_speed: bool,
    /// Base directory the per-video workspace is created under.
    pub out_dir: Option<PathBuf>,
    /// Explicit export path; defaults to the workspace output template.
    pub output: Option<PathBuf>,
}

/// Per-segment row of the final run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentReport {
    pub index: usize,
    pub start_sec: f64,
    pub end_sec: f64,
    pub slot_sec: f64,
    pub text: String,
    pub rate: f64,
    pub recorded_sec: Option<f64>,
    pub ratio: Option<f64>,
    /// Whether the segment's clip was placed on the assembled track.
    pub included: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DubReport {
    pub run_id: String,
    pub started_at_rfc3339: String,
    pub finished_at_rfc3339: String,
    pub video_path: String,
    pub subtitle_path: String,
    pub backend: BackendKind,
    pub language: String,
    pub passes: u32,
    pub source_duration_sec: Option<f64>,
    pub output_path: String,
    pub segments: Vec<SegmentReport>,
}
