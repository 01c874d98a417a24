//! Network engine: Google Translate's TTS endpoint, one blocking
//! request per segment. The endpoint renders at a fixed natural rate,
//! so this engine declares no rate control and the calibration loop is
//! bypassed when it is selected.

use std::path::Path;
use std::time::Duration;

use crate::error::{RedubError, RedubResult};
use crate::model::{BackendKind, EngineCapabilities};
use crate::process::duration_from_env;

use super::SpeechEngine;

const ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// Nominal rate for a backend without a rate axis; recorded on segments
/// for reporting symmetry, never fed back.
pub const NOMINAL_RATE: f64 = 1.0;

pub struct GttsEngine;

impl SpeechEngine for GttsEngine {
    fn name(&self) -> &'static str {
        "gtts"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Gtts
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            supports_rate_control: false,
        }
    }

    fn is_available(&self) -> bool {
        // No cheap liveness probe for the endpoint; the first render
        // reports failures with full context instead.
        true
    }

    fn default_rate(&self) -> f64 {
        NOMINAL_RATE
    }

    fn clip_extension(&self) -> &'static str {
        "mp3"
    }

    fn render(&self, text: &str, _rate: f64, language: &str, out: &Path) -> RedubResult<()> {
        let client = reqwest::blocking::Client::builder()
            .timeout(request_timeout())
            .build()?;

        let response = client
            .get(ENDPOINT)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language),
                ("q", text),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RedubError::Backend(format!(
                "tts endpoint returned {status} for `{}`",
                preview(text)
            )));
        }

        let body = response.bytes()?;
        if !looks_like_mp3(&body) {
            return Err(RedubError::Backend(format!(
                "tts endpoint returned a non-audio payload ({} bytes) for `{}`",
                body.len(),
                preview(text)
            )));
        }

        std::fs::write(out, &body)?;
        tracing::debug!(bytes = body.len(), out = %out.display(), "gtts render");
        Ok(())
    }
}

fn request_timeout() -> Duration {
    duration_from_env("REDUB_TTS_TIMEOUT_MS", Duration::from_secs(30))
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 40;
    if text.chars().count() <= LIMIT {
        text.to_owned()
    } else {
        let head: String = text.chars().take(LIMIT).collect();
        format!("{head}...")
    }
}

/// ID3 tag or an MPEG frame sync at the head of the payload.
fn looks_like_mp3(body: &[u8]) -> bool {
    if body.len() < 4 {
        return false;
    }
    let id3 = &body[0..3] == b"ID3";
    let mpeg_sync = body[0] == 0xFF && (body[1] & 0xE0) == 0xE0;
    id3 || mpeg_sync
}

#[cfg(test)]
mod tests {
    use super::{GttsEngine, looks_like_mp3};
    use crate::backend::SpeechEngine;

    #[test]
    fn declares_fixed_rate_and_mp3_clips() {
        let engine = GttsEngine;
        assert!(!engine.capabilities().supports_rate_control);
        assert_eq!(engine.clip_extension(), "mp3");
    }

    #[test]
    fn clamp_is_identity_without_a_rate_axis() {
        let engine = GttsEngine;
        assert_eq!(engine.clamp_rate(42.0), 42.0);
    }

    #[test]
    fn mp3_sniffing_accepts_id3_and_frame_sync() {
        assert!(looks_like_mp3(b"ID3\x04rest"));
        assert!(looks_like_mp3(&[0xFF, 0xFB, 0x90, 0x00]));
        assert!(!looks_like_mp3(b"<html>error page</html>"));
        assert!(!looks_like_mp3(b"ID"));
    }
}
