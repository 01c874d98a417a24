//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::path::Path;

pub const SAMPLE_RATE: u32 = 8_000;

pub const TWO_CUE_VTT: &str = "WEBVTT\n\n00:00:01.000 --> 00:00:03.000\nHello\n\n00:00:03.000 --> 00:00:05.000\nWorld\n";

pub const TWO_CUE_SRT: &str =
    "1\r\n00:00:01,000 --> 00:00:03,000\r\nHello\r\n\r\n2\r\n00:00:03,000 --> 00:00:05,000\r\nWorld\r\n";

/// Write a mono 16-bit WAV of the given length.
pub fn write_wav(path: &Path, seconds: f64) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    let frames = (seconds * f64::from(SAMPLE_RATE)).round() as u32;
    for n in 0..frames {
        let sample = (f64::from(n) * 0.05).sin();
        writer
            .write_sample((sample * f64::from(i16::MAX)) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}
