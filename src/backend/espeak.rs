//! Local offline engine backed by the espeak-ng binary. The only engine
//! with a real rate axis: `-s` takes words per minute, which is exactly
//! the control variable the calibration loop steers.

use std::path::Path;
use std::time::Duration;

use crate::error::RedubResult;
use crate::model::{BackendKind, EngineCapabilities};
use crate::process::{command_exists, duration_from_env, run_command_with_timeout};

use super::SpeechEngine;

/// espeak-ng's own neutral speaking rate, words per minute.
pub const DEFAULT_RATE_WPM: f64 = 175.0;

/// Usable span of the `-s` parameter; rates calibrated outside it make
/// the output unintelligible or are rejected by the binary.
const MIN_RATE_WPM: f64 = 80.0;
const MAX_RATE_WPM: f64 = 450.0;

pub struct EspeakEngine;

impl EspeakEngine {
    /// Prefer the maintained espeak-ng binary, fall back to the legacy
    /// espeak name some distributions still ship.
    fn binary() -> &'static str {
        if command_exists("espeak-ng") {
            "espeak-ng"
        } else {
            "espeak"
        }
    }
}

impl SpeechEngine for EspeakEngine {
    fn name(&self) -> &'static str {
        "espeak-ng"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Espeak
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            supports_rate_control: true,
        }
    }

    fn is_available(&self) -> bool {
        command_exists("espeak-ng") || command_exists("espeak")
    }

    fn default_rate(&self) -> f64 {
        DEFAULT_RATE_WPM
    }

    fn clamp_rate(&self, rate: f64) -> f64 {
        rate.clamp(MIN_RATE_WPM, MAX_RATE_WPM)
    }

    fn clip_extension(&self) -> &'static str {
        "wav"
    }

    fn render(&self, text: &str, rate: f64, language: &str, out: &Path) -> RedubResult<()> {
        let args = vec![
            "-v".to_owned(),
            language.to_owned(),
            "-s".to_owned(),
            format!("{}", rate.round() as i64),
            "-w".to_owned(),
            out.display().to_string(),
            text.to_owned(),
        ];
        tracing::debug!(rate, out = %out.display(), "espeak render");
        run_command_with_timeout(Self::binary(), &args, None, Some(render_timeout()))?;
        Ok(())
    }
}

fn render_timeout() -> Duration {
    duration_from_env("REDUB_TTS_TIMEOUT_MS", Duration::from_secs(30))
}
