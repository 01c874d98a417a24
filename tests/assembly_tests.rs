//! Assembly preconditions through the public API: the gate flag, the
//! missing-clip diagnosis, and the no-partial-output guarantee.

mod helpers;

use std::path::Path;

use redub::assemble::{Assembler, AssemblyOptions};
use redub::error::RedubError;
use redub::model::{Segment, SegmentTable};
use redub::workspace::Workspace;

fn measured_table(slots: &[(usize, f64, f64, &str)]) -> SegmentTable {
    let mut table = SegmentTable::new("en");
    for &(index, start, end, text) in slots {
        let mut segment = Segment::new(index, start, end, text.to_owned());
        segment.recorded_sec = Some(end - start);
        segment.ratio = Some(1.0);
        table.insert(segment);
    }
    table.derive_fields();
    table.generated = true;
    table
}

#[test]
fn assembly_refuses_an_ungenerated_table_and_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let workspace = Workspace::new(dir.path().join("job"));

    let mut table = measured_table(&[(0, 1.0, 3.0, "Hello")]);
    table.generated = false;

    let video = dir.path().join("in.mp4");
    std::fs::write(&video, b"fake container").expect("write video");
    let output = dir.path().join("out.mp4");

    let assembler = Assembler::new(&workspace, AssemblyOptions::default());
    let err = assembler
        .assemble(&table, &video, "wav", &output)
        .expect_err("ungenerated table must fail");

    assert!(matches!(err, RedubError::Precondition(_)), "got: {err:?}");
    assert!(err.to_string().contains("calibration"), "got: {err}");
    assert!(!output.exists(), "no output file may be produced");
    assert!(
        !output.with_extension("tmp.mp4").exists(),
        "no temp file may be left behind"
    );
}

#[test]
fn assembly_refuses_an_empty_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    let workspace = Workspace::new(dir.path().join("job"));
    let table = SegmentTable::new("en");

    let assembler = Assembler::new(&workspace, AssemblyOptions::default());
    let err = assembler
        .assemble(
            &table,
            Path::new("in.mp4"),
            "wav",
            &dir.path().join("out.mp4"),
        )
        .expect_err("empty table must fail");
    assert!(matches!(err, RedubError::Precondition(_)), "got: {err:?}");
}

#[test]
fn missing_clip_is_diagnosed_with_segment_and_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let workspace = Workspace::new(dir.path().join("job"));
    workspace.create().expect("create workspace");

    // Clip 0 exists, clip 3 was never rendered.
    helpers::write_wav(&workspace.clip_path(0, "wav"), 2.0);
    let table = measured_table(&[(0, 1.0, 3.0, "Hello"), (3, 3.0, 5.0, "World")]);

    let video = dir.path().join("in.mp4");
    std::fs::write(&video, b"fake container").expect("write video");

    let assembler = Assembler::new(&workspace, AssemblyOptions::default());
    let err = assembler
        .assemble(&table, &video, "wav", &dir.path().join("out.mp4"))
        .expect_err("missing clip must fail");

    match err {
        RedubError::MissingAudio { index, ref path } => {
            assert_eq!(index, 3);
            assert!(path.ends_with("seq-3.wav"), "path: {}", path.display());
        }
        other => panic!("expected MissingAudio, got: {other:?}"),
    }
}

#[test]
fn comment_segments_do_not_require_clips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let workspace = Workspace::new(dir.path().join("job"));
    workspace.create().expect("create workspace");

    // Only the spoken cue has a clip on disk; the comment cue's clip is
    // gone, which must not matter since it is never placed.
    helpers::write_wav(&workspace.clip_path(1, "wav"), 2.0);
    let table = measured_table(&[(0, 0.0, 2.0, "# intro music"), (1, 2.0, 4.0, "Hello")]);

    let video = dir.path().join("in.mp4");
    std::fs::write(&video, b"fake container").expect("write video");

    let assembler = Assembler::new(&workspace, AssemblyOptions::default());
    let result = assembler.assemble(&table, &video, "wav", &dir.path().join("out.mp4"));

    // The comment cue is excluded before clip existence is checked, so
    // any failure past this point is about running ffmpeg on the fake
    // container, not about segment 0's missing clip.
    if let Err(error) = result {
        assert!(
            !matches!(error, RedubError::MissingAudio { index: 0, .. }),
            "comment clip must not be demanded: {error:?}"
        );
    }
}
