//! Clip-duration measurement. A rendered clip's recorded duration is
//! its audio frame count divided by the sample rate: WAV clips are read
//! directly with `hound`; compressed containers (the network engine's
//! MP3 payloads) go through `ffprobe`.

use std::path::Path;
use std::time::Duration;

use crate::process::{duration_from_env, run_command_with_timeout};

/// Measured length of a rendered clip in seconds, or None when the file
/// is missing or not a readable audio container. Callers translate None
/// into a measurement error carrying the segment context.
#[must_use]
pub fn clip_duration_seconds(path: &Path) -> Option<f64> {
    let is_wav = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if is_wav {
        wav_duration_seconds(path)
    } else {
        probe_duration_seconds(path)
    }
}

/// Frame count / sample rate straight from the WAV header.
#[must_use]
pub fn wav_duration_seconds(path: &Path) -> Option<f64> {
    let reader = hound::WavReader::open(path).ok()?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return None;
    }
    Some(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}

/// Container duration via `ffprobe`; also used for the source video.
#[must_use]
pub fn probe_duration_seconds(path: &Path) -> Option<f64> {
    let args = vec![
        "-v".to_owned(),
        "error".to_owned(),
        "-show_entries".to_owned(),
        "format=duration".to_owned(),
        "-of".to_owned(),
        "default=nokey=1:noprint_wrappers=1".to_owned(),
        path.display().to_string(),
    ];

    let output = run_command_with_timeout("ffprobe", &args, None, Some(ffprobe_timeout())).ok()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let secs = stdout.trim().parse::<f64>().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(secs)
}

pub(crate) fn ffmpeg_timeout() -> Duration {
    duration_from_env("REDUB_FFMPEG_TIMEOUT_MS", Duration::from_secs(180))
}

fn ffprobe_timeout() -> Duration {
    duration_from_env("REDUB_FFPROBE_TIMEOUT_MS", Duration::from_secs(10))
}
