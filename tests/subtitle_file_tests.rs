//! File-level parser behavior: existence and format checks happen
//! before parsing, and real files on disk round-trip into tables.

mod helpers;

use redub::error::RedubError;
use redub::subtitle::read_segments;
use redub::workspace::MediaFile;

#[test]
fn missing_subtitle_file_fails_before_parsing() {
    let file = MediaFile::new("/nonexistent/talk.vtt");
    let err = read_segments(&file, "en").expect_err("missing file should fail");
    match err {
        RedubError::SourceMissing { path } => {
            assert!(path.ends_with("talk.vtt"), "path: {}", path.display());
        }
        other => panic!("expected SourceMissing, got: {other:?}"),
    }
}

#[test]
fn unknown_extension_is_a_format_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("talk.sub");
    std::fs::write(&path, "some content").expect("write");

    let err = read_segments(&MediaFile::new(&path), "en").expect_err("unknown ext should fail");
    match err {
        RedubError::Format { detail, .. } => {
            assert!(detail.contains(".sub"), "detail: {detail}");
        }
        other => panic!("expected Format, got: {other:?}"),
    }
}

#[test]
fn vtt_file_round_trips_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("talk.vtt");
    std::fs::write(&path, helpers::TWO_CUE_VTT).expect("write");

    let table = read_segments(&MediaFile::new(&path), "en").expect("should parse");
    assert_eq!(table.len(), 2);
    assert_eq!(table.language, "en");
    assert!(!table.generated);

    let first = table.get(0).expect("first cue");
    assert_eq!(first.text, "Hello");
    assert_eq!(first.word_count, 1);
    assert!((first.start_sec - 1.0).abs() < 1e-9);
    assert!((first.duration() - 2.0).abs() < 1e-9);
}

#[test]
fn srt_file_with_bom_and_crlf_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("talk.srt");
    let content = format!("\u{feff}{}", helpers::TWO_CUE_SRT);
    std::fs::write(&path, content).expect("write");

    let table = read_segments(&MediaFile::new(&path), "en").expect("should parse");
    assert_eq!(table.len(), 2);
    let indices: Vec<usize> = table.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![1, 2], "srt declared indices are kept verbatim");
}

#[test]
fn uppercase_extension_is_accepted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("talk.VTT");
    std::fs::write(&path, helpers::TWO_CUE_VTT).expect("write");

    let table = read_segments(&MediaFile::new(&path), "en").expect("should parse");
    assert_eq!(table.len(), 2);
}
