//! Pipeline orchestration: existence checks, parse, calibrate,
//! assemble, report. Each stage either completes for the whole table or
//! fails the run; nothing is retried here. Retry is caller policy.

use chrono::Utc;
use uuid::Uuid;

use crate::assemble::{Assembler, AssemblyOptions};
use crate::audio;
use crate::backend;
use crate::calibrate::{CalibrationConfig, Calibrator};
use crate::error::{RedubError, RedubResult};
use crate::model::{DubReport, DubRequest, SegmentReport, SegmentTable};
use crate::subtitle;
use crate::workspace::{MediaFile, Workspace};

#[derive(Debug, Default)]
pub struct RedubEngine;

impl RedubEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run the full dubbing pipeline for one request.
    pub fn dub(&self, request: DubRequest) -> RedubResult<DubReport> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        tracing::info!(run_id = %run_id, video = %request.video.display(), "dub run started");

        let video = MediaFile::new(&request.video);
        if !video.exists() {
            return Err(RedubError::SourceMissing {
                path: request.video.clone(),
            });
        }

        let subtitle_file = MediaFile::new(&request.subtitles);
        let mut table = subtitle::read_segments(&subtitle_file, &request.language)?;
        tracing::info!(segments = table.len(), "subtitle table built");

        let engine = backend::engine_for(request.backend);
        if !engine.is_available() {
            return Err(RedubError::Backend(format!(
                "speech backend `{}` is not available on this system",
                engine.name()
            )));
        }

        let base_dir = request
            .out_dir
            .clone()
            .unwrap_or_else(|| std::path::PathBuf::from("."));
        let workspace = Workspace::for_video(&base_dir, &video);
        workspace.create()?;

        let calibrator = Calibrator::new(
            engine.as_ref(),
            &workspace,
            CalibrationConfig {
                passes: request.passes,
            },
        );
        calibrator.run(&mut table)?;

        let output = request
            .output
            .clone()
            .unwrap_or_else(|| workspace.output_path(&video));
        let assembler = Assembler::new(
            &workspace,
            AssemblyOptions {
                correct_speed: request.correct_speed,
            },
        );
        assembler.assemble(&table, video.path(), engine.clip_extension(), &output)?;

        let report = DubReport {
            run_id,
            started_at_rfc3339: started_at.to_rfc3339(),
            finished_at_rfc3339: Utc::now().to_rfc3339(),
            video_path: request.video.display().to_string(),
            subtitle_path: request.subtitles.display().to_string(),
            backend: request.backend,
            language: request.language.clone(),
            passes: request.passes,
            source_duration_sec: audio::probe_duration_seconds(video.path()),
            output_path: output.display().to_string(),
            segments: segment_rows(&table),
        };
        tracing::info!(run_id = %report.run_id, output = %report.output_path, "dub run finished");
        Ok(report)
    }
}

fn segment_rows(table: &SegmentTable) -> Vec<SegmentReport> {
    table
        .iter()
        .map(|segment| SegmentReport {
            index: segment.index,
            start_sec: segment.start_sec,
            end_sec: segment.end_sec,
            slot_sec: segment.duration(),
            text: segment.text.clone(),
            rate: segment.rate,
            recorded_sec: segment.recorded_sec,
            ratio: segment.ratio,
            included: segment.produces_audio(),
        })
        .collect()
}
