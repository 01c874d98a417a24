//! Speech synthesis backends. Every engine adapts one external speech
//! source to the single capability the calibrator needs:
//! `render(text, rate, language) -> clip file`. Fixed-rate engines
//! declare `supports_rate_control = false` and simply ignore the rate
//! argument; the calibrator branches on the capability flag, never on a
//! concrete engine type.

pub mod espeak;
pub mod gtts;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RedubResult;
use crate::model::{BackendKind, EngineCapabilities};

pub use espeak::EspeakEngine;
pub use gtts::GttsEngine;

/// Contract every speech backend adapter implements.
pub trait SpeechEngine: Send + Sync {
    /// Human-readable engine name.
    fn name(&self) -> &'static str;

    /// Which [`BackendKind`] this engine corresponds to.
    fn kind(&self) -> BackendKind;

    /// Declared capabilities of this engine.
    fn capabilities(&self) -> EngineCapabilities;

    /// Whether the engine's external binary/endpoint is usable right now.
    fn is_available(&self) -> bool;

    /// Neutral speaking rate used for the cold-start render pass.
    fn default_rate(&self) -> f64;

    /// Keep a calibrated rate inside the engine's usable span. Identity
    /// for engines without a meaningful rate axis.
    fn clamp_rate(&self, rate: f64) -> f64 {
        rate
    }

    /// Container extension of rendered clips (no dot).
    fn clip_extension(&self) -> &'static str;

    /// Render one line of speech to `out`. `rate` is ignored by engines
    /// without rate control.
    fn render(&self, text: &str, rate: f64, language: &str, out: &Path) -> RedubResult<()>;
}

/// All known engines, in preference order.
#[must_use]
pub fn all_engines() -> Vec<Box<dyn SpeechEngine>> {
    vec![Box::new(EspeakEngine), Box::new(GttsEngine)]
}

/// Engine adapter for a concrete backend kind.
#[must_use]
pub fn engine_for(kind: BackendKind) -> Box<dyn SpeechEngine> {
    match kind {
        BackendKind::Espeak => Box::new(EspeakEngine),
        BackendKind::Gtts => Box::new(GttsEngine),
    }
}

/// One backend entry in the availability report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendDiagnostics {
    pub name: String,
    pub kind: BackendKind,
    pub available: bool,
    pub capabilities: EngineCapabilities,
    pub clip_extension: String,
    pub default_rate: f64,
}

/// Availability/capability report over every known engine.
#[must_use]
pub fn diagnostics() -> Vec<BackendDiagnostics> {
    all_engines()
        .iter()
        .map(|engine| BackendDiagnostics {
            name: engine.name().to_owned(),
            kind: engine.kind(),
            available: engine.is_available(),
            capabilities: engine.capabilities(),
            clip_extension: engine.clip_extension().to_owned(),
            default_rate: engine.default_rate(),
        })
        .collect()
}
