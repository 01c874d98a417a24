//! Timed-text parsing: VTT and SRT files into a [`SegmentTable`].
//!
//! Both formats are blank-line-separated blocks around a
//! `start --> end` timestamp line. VTT leads with a header block that is
//! skipped and gets sequential indices assigned from 0 in encounter
//! order; SRT blocks declare their own integer index, used verbatim
//! (gaps are legal and preserved). Individual malformed blocks are
//! dropped and logged, never fatal; a file that yields no segments at
//! all is a format error.

use std::fs;
use std::path::Path;

use unicode_normalization::UnicodeNormalization;

use crate::error::{RedubError, RedubResult};
use crate::model::{Segment, SegmentTable, SubtitleFormat};
use crate::workspace::MediaFile;

/// Read and parse a subtitle file. Existence and extension are checked
/// before any parsing starts.
pub fn read_segments(file: &MediaFile, language: &str) -> RedubResult<SegmentTable> {
    if !file.exists() {
        return Err(RedubError::SourceMissing {
            path: file.path().to_path_buf(),
        });
    }
    let extension = file.extension();
    let format = SubtitleFormat::from_extension(&extension).ok_or_else(|| RedubError::Format {
        path: file.path().to_path_buf(),
        detail: format!("unknown subtitle extension `.{extension}`"),
    })?;

    let raw = fs::read_to_string(file.path())?;
    parse_str(&raw, format, file.path(), language)
}

/// Parse raw subtitle content in the given format.
pub fn parse_str(
    raw: &str,
    format: SubtitleFormat,
    path: &Path,
    language: &str,
) -> RedubResult<SegmentTable> {
    // Files written with utf-8-sig carry a BOM; strip it before block
    // splitting so the header line matches.
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let raw = raw.replace("\r\n", "\n");

    let mut table = SegmentTable::new(language);
    match format {
        SubtitleFormat::Vtt => parse_vtt(&raw, path, &mut table),
        SubtitleFormat::Srt => parse_srt(&raw, path, &mut table),
    }

    if table.is_empty() {
        return Err(RedubError::Format {
            path: path.to_path_buf(),
            detail: format!("no parseable {} cues found", format.as_str()),
        });
    }

    table.derive_fields();
    Ok(table)
}

fn parse_vtt(raw: &str, path: &Path, table: &mut SegmentTable) {
    // First block is the WEBVTT header; cue indices count from the block
    // after it, so dropped blocks leave a visible gap.
    for (index, block) in cue_blocks(raw).skip(1).enumerate() {
        match parse_block(block) {
            Some((start_sec, end_sec, text)) => {
                if !table.insert(Segment::new(index, start_sec, end_sec, text)) {
                    tracing::warn!(path = %path.display(), index, "duplicate cue index, dropped");
                }
            }
            None => {
                tracing::warn!(path = %path.display(), index, "malformed vtt block, dropped");
            }
        }
    }
}

fn parse_srt(raw: &str, path: &Path, table: &mut SegmentTable) {
    for (position, block) in cue_blocks(raw).enumerate() {
        let mut lines = block.lines();
        let index = lines.next().and_then(|line| line.trim().parse::<usize>().ok());
        let Some(index) = index else {
            tracing::warn!(path = %path.display(), position, "srt block without index line, dropped");
            continue;
        };

        let rest = lines.collect::<Vec<_>>().join("\n");
        match parse_block(&rest) {
            Some((start_sec, end_sec, text)) => {
                if !table.insert(Segment::new(index, start_sec, end_sec, text)) {
                    tracing::warn!(path = %path.display(), index, "duplicate cue index, dropped");
                }
            }
            None => {
                tracing::warn!(path = %path.display(), index, "malformed srt block, dropped");
            }
        }
    }
}

fn cue_blocks(raw: &str) -> impl Iterator<Item = &str> {
    raw.split("\n\n").filter(|block| !block.trim().is_empty())
}

/// Parse one cue body: a `start --> end` line (an optional identifier
/// line before it is ignored) followed by text lines joined with a
/// single space. Returns None when the time range or the text comes out
/// empty or inverted; the caller drops such blocks.
fn parse_block(block: &str) -> Option<(f64, f64, String)> {
    let mut lines = block.lines();
    let timing_line = lines.find(|line| line.contains("-->"))?;

    let (raw_start, raw_end) = timing_line.split_once("-->")?;
    let start_sec = parse_timestamp(raw_start)?;
    // Cue settings may trail the end timestamp; keep the first token.
    let raw_end = raw_end.trim().split_whitespace().next()?;
    let end_sec = parse_timestamp(raw_end)?;
    if end_sec <= start_sec {
        return None;
    }

    let text: String = lines.collect::<Vec<_>>().join(" ").nfc().collect();
    let text = text.trim().to_owned();
    if text.is_empty() {
        return None;
    }

    Some((start_sec, end_sec, text))
}

/// `HH:MM:SS.mmm` or `MM:SS.mmm` into seconds; comma decimal separators
/// are normalized to periods first.
fn parse_timestamp(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?, s.parse::<f64>().ok()?),
        [m, s] => (0, m.parse::<u32>().ok()?, s.parse::<f64>().ok()?),
        _ => return None,
    };
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    Some(f64::from(hours) * 3600.0 + f64::from(minutes) * 60.0 + seconds)
}
