//! Audio assembly: place every eligible rendered clip at its segment's
//! start offset on a shared timeline, mix them into one track, attach
//! the track to the source video (its own audio is discarded, never
//! mixed) and export. One ffmpeg invocation does the composition; the
//! argument construction is pure and unit-testable without running it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::ffmpeg_timeout;
use crate::error::{RedubError, RedubResult};
use crate::model::{Segment, SegmentTable};
use crate::process::run_command_with_timeout;
use crate::workspace::Workspace;

#[derive(Debug, Clone, Default)]
pub struct AssemblyOptions {
    /// Time-stretch every clip by `recorded / slot` before placement so
    /// it exactly fills its slot regardless of residual calibration
    /// error. Audibly changes the clip; strictly opt-in.
    pub correct_speed: bool,
}

/// One clip scheduled for the shared timeline.
#[derive(Debug, Clone)]
pub(crate) struct ClipPlacement {
    pub path: PathBuf,
    pub start_sec: f64,
    /// Tempo factor to apply before placement; None when speed
    /// correction is off or the clip already fits.
    pub stretch: Option<f64>,
}

pub struct Assembler<'a> {
    workspace: &'a Workspace,
    options: AssemblyOptions,
}

impl<'a> Assembler<'a> {
    #[must_use]
    pub fn new(workspace: &'a Workspace, options: AssemblyOptions) -> Self {
        Self { workspace, options }
    }

    /// Compose the final track and export the re-dubbed video to
    /// `output`. The export is written to a temporary sibling first and
    /// renamed into place only on full success, so no partial file is
    /// ever left at the destination; an existing file there is
    /// overwritten by the rename.
    pub fn assemble(
        &self,
        table: &SegmentTable,
        video_path: &Path,
        clip_extension: &str,
        output: &Path,
    ) -> RedubResult<()> {
        if table.is_empty() {
            return Err(RedubError::Precondition(
                "segment table is empty; nothing to assemble".to_owned(),
            ));
        }
        if !table.generated {
            return Err(RedubError::Precondition(
                "segment table has no rendered clips; run speech calibration before assembly"
                    .to_owned(),
            ));
        }
        if !video_path.is_file() {
            return Err(RedubError::SourceMissing {
                path: video_path.to_path_buf(),
            });
        }

        let placements = self.collect_placements(table, clip_extension)?;
        if placements.is_empty() {
            return Err(RedubError::Precondition(
                "no segments eligible for assembly (all comment-marked or unmeasured)".to_owned(),
            ));
        }

        let tmp = output.with_extension("tmp.mp4");
        let args = build_mux_args(video_path, &placements, &tmp);
        tracing::info!(
            clips = placements.len(),
            output = %output.display(),
            "assembling composite track"
        );
        if let Err(error) = run_command_with_timeout("ffmpeg", &args, None, Some(ffmpeg_timeout()))
        {
            let _ = fs::remove_file(&tmp);
            return Err(error);
        }
        fs::rename(&tmp, output)?;
        Ok(())
    }

    fn collect_placements(
        &self,
        table: &SegmentTable,
        clip_extension: &str,
    ) -> RedubResult<Vec<ClipPlacement>> {
        let mut placements = Vec::new();
        for segment in table.iter().filter(|segment| segment.produces_audio()) {
            let path = self.workspace.clip_path(segment.index, clip_extension);
            if !path.is_file() {
                return Err(RedubError::MissingAudio {
                    index: segment.index,
                    path,
                });
            }
            placements.push(ClipPlacement {
                path,
                start_sec: segment.start_sec,
                stretch: self.stretch_factor(segment),
            });
        }
        Ok(placements)
    }

    fn stretch_factor(&self, segment: &Segment) -> Option<f64> {
        if !self.options.correct_speed {
            return None;
        }
        let recorded = segment.recorded_sec?;
        let factor = recorded / segment.duration();
        if (factor - 1.0).abs() < 1e-3 {
            return None;
        }
        Some(factor)
    }
}

/// ffmpeg argument list for the composition: video first, one input per
/// clip, a filter graph delaying (and optionally stretching) each clip
/// onto the shared timeline, the delayed clips mixed into `[aout]`, the
/// video stream copied and the source audio dropped.
pub(crate) fn build_mux_args(
    video_path: &Path,
    placements: &[ClipPlacement],
    output: &Path,
) -> Vec<String> {
    let mut args = vec![
        "-hide_banner".to_owned(),
        "-loglevel".to_owned(),
        "error".to_owned(),
        "-y".to_owned(),
        "-i".to_owned(),
        video_path.display().to_string(),
    ];
    for placement in placements {
        args.push("-i".to_owned());
        args.push(placement.path.display().to_string());
    }

    args.push("-filter_complex".to_owned());
    args.push(build_filter_graph(placements));

    args.extend([
        "-map".to_owned(),
        "0:v:0".to_owned(),
        "-map".to_owned(),
        "[aout]".to_owned(),
        "-c:v".to_owned(),
        "copy".to_owned(),
        "-c:a".to_owned(),
        "aac".to_owned(),
        output.display().to_string(),
    ]);
    args
}

fn build_filter_graph(placements: &[ClipPlacement]) -> String {
    let mut chains = Vec::with_capacity(placements.len() + 1);
    for (slot, placement) in placements.iter().enumerate() {
        let mut filters = Vec::new();
        if let Some(factor) = placement.stretch {
            for step in atempo_steps(factor) {
                filters.push(format!("atempo={step:.6}"));
            }
        }
        let delay_ms = (placement.start_sec * 1000.0).round() as u64;
        filters.push(format!("adelay={delay_ms}:all=1"));
        chains.push(format!("[{}:a]{}[a{slot}]", slot + 1, filters.join(",")));
    }

    let labels: String = (0..placements.len()).map(|slot| format!("[a{slot}]")).collect();
    chains.push(format!(
        "{labels}amix=inputs={}:normalize=0[aout]",
        placements.len()
    ));
    chains.join(";")
}

/// Split a tempo factor into steps ffmpeg's atempo accepts (each within
/// [0.5, 2.0]) whose product is the requested factor.
fn atempo_steps(factor: f64) -> Vec<f64> {
    let mut factor = factor.max(f64::MIN_POSITIVE);
    let mut steps = Vec::new();
    while factor > 2.0 {
        steps.push(2.0);
        factor /= 2.0;
    }
    while factor < 0.5 {
        steps.push(0.5);
        factor /= 0.5;
    }
    steps.push(factor);
    steps
}
