//! Speech calibration: force variable-length synthesized clips into
//! fixed subtitle slots without drift.
//!
//! The loop is batch-synchronous: a pass renders *every* segment, then
//! measures *every* clip, and only then computes the next pass's rates.
//! Pass 0 renders at the engine's neutral default; pass k >= 1 applies
//! proportional control, `rate = previous_rate * ratio`, on the
//! first-order assumption that synthesis duration varies inversely with
//! rate. The loop is bounded strictly by pass count: there is no
//! convergence-threshold exit and no oscillation detection. Engines
//! without rate control have no control variable to act on, so the loop
//! collapses to a single render-and-measure pass.

use crate::audio;
use crate::backend::SpeechEngine;
use crate::error::{RedubError, RedubResult};
use crate::model::SegmentTable;
use crate::workspace::Workspace;

/// Default pass count: one cold-start render plus one corrective pass.
pub const DEFAULT_PASSES: u32 = 2;

#[derive(Debug, Clone)]
pub struct CalibrationConfig {
    /// Total passes including the cold start; at least 1.
    pub passes: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            passes: DEFAULT_PASSES,
        }
    }
}

/// Drives the bounded calibration loop over one segment table. The
/// calibrator is the table's only writer; it mutates rate, recorded
/// duration and ratio in place and never adds or removes segments.
pub struct Calibrator<'a> {
    engine: &'a dyn SpeechEngine,
    workspace: &'a Workspace,
    config: CalibrationConfig,
}

impl<'a> Calibrator<'a> {
    #[must_use]
    pub fn new(
        engine: &'a dyn SpeechEngine,
        workspace: &'a Workspace,
        config: CalibrationConfig,
    ) -> Self {
        Self {
            engine,
            workspace,
            config,
        }
    }

    /// Run the calibration loop to completion and mark the table
    /// generated. Any render or measurement failure aborts the whole
    /// run: a missing clip would corrupt the final assembly, so nothing
    /// is skipped silently.
    pub fn run(&self, table: &mut SegmentTable) -> RedubResult<()> {
        if table.is_empty() {
            return Err(RedubError::Precondition(
                "cannot calibrate an empty segment table".to_owned(),
            ));
        }

        let supports_rate_control = self.engine.capabilities().supports_rate_control;
        let passes = if supports_rate_control {
            self.config.passes.max(1)
        } else {
            // No control variable: a single render establishes the
            // recorded durations and that is all there is to do.
            1
        };

        let default_rate = self.engine.default_rate();
        for segment in table.iter_mut() {
            segment.rate = default_rate;
        }

        for pass in 0..passes {
            if pass > 0 {
                self.adjust_rates(table);
            }
            self.render_all(table, pass)?;
            self.measure_all(table)?;
            self.log_pass(table, pass);
        }

        table.generated = true;
        Ok(())
    }

    /// Proportional control from the previous pass's error signal. A
    /// clip that ran ratio-times longer than its slot gets its rate
    /// scaled up by the same factor, and conversely.
    fn adjust_rates(&self, table: &mut SegmentTable) {
        for segment in table.iter_mut() {
            if let Some(ratio) = segment.ratio {
                segment.rate = self.engine.clamp_rate(segment.rate * ratio);
            }
        }
    }

    fn render_all(&self, table: &mut SegmentTable, pass: u32) -> RedubResult<()> {
        let language = table.language.clone();
        let extension = self.engine.clip_extension();
        for segment in table.iter_mut() {
            let clip = self.workspace.clip_path(segment.index, extension);
            tracing::debug!(
                index = segment.index,
                pass,
                rate = segment.rate,
                "rendering segment"
            );
            self.engine
                .render(&segment.text, segment.rate, &language, &clip)
                .map_err(|source| RedubError::Synthesis {
                    index: segment.index,
                    detail: source.to_string(),
                })?;
        }
        Ok(())
    }

    fn measure_all(&self, table: &mut SegmentTable) -> RedubResult<()> {
        let extension = self.engine.clip_extension();
        for segment in table.iter_mut() {
            let clip = self.workspace.clip_path(segment.index, extension);
            let recorded =
                audio::clip_duration_seconds(&clip).ok_or_else(|| RedubError::Measurement {
                    index: segment.index,
                    path: clip.clone(),
                })?;
            if recorded <= 0.0 {
                // A zero-length clip is a synthesis failure, not a
                // valid ratio of zero.
                return Err(RedubError::Synthesis {
                    index: segment.index,
                    detail: format!("rendered clip at `{}` has zero length", clip.display()),
                });
            }
            segment.recorded_sec = Some(recorded);
            segment.ratio = Some(recorded / segment.duration());
        }
        Ok(())
    }

    fn log_pass(&self, table: &SegmentTable, pass: u32) {
        let count = table.len();
        let mean_ratio = table.iter().filter_map(|s| s.ratio).sum::<f64>() / count as f64;
        tracing::info!(
            pass,
            segments = count,
            mean_ratio,
            engine = self.engine.name(),
            "calibration pass complete"
        );
    }
}
