//! Subprocess execution for the external media tools (ffmpeg, ffprobe,
//! espeak-ng). All calls are blocking; the pipeline is batch-synchronous
//! and never overlaps renders, so there is no cancellation path here,
//! only hard timeouts as a safety net around runaway externals.

use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{RedubError, RedubResult};

#[must_use]
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

pub fn run_command(program: &str, args: &[String], cwd: Option<&Path>) -> RedubResult<Output> {
    run_command_with_timeout(program, args, cwd, None)
}

pub fn run_command_with_timeout(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
    timeout: Option<Duration>,
) -> RedubResult<Output> {
    if !command_exists(program) {
        return Err(RedubError::CommandMissing {
            command: program.to_owned(),
        });
    }

    let rendered = format!("{} {}", program, args.join(" "));
    let mut command = Command::new(program);
    command.args(args);
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    if let Some(limit) = timeout {
        let mut child = command.spawn()?;
        let started_at = Instant::now();

        let mut stdout_pipe = child.stdout.take().expect("stdout piped");
        let mut stderr_pipe = child.stderr.take().expect("stderr piped");

        let (stdout_tx, stdout_rx) = std::sync::mpsc::channel();
        let (stderr_tx, stderr_rx) = std::sync::mpsc::channel();

        thread::spawn(move || {
            use std::io::Read;
            let mut buf = Vec::new();
            let _ = stdout_pipe.read_to_end(&mut buf);
            let _ = stdout_tx.send(buf);
        });

        thread::spawn(move || {
            use std::io::Read;
            let mut buf = Vec::new();
            let _ = stderr_pipe.read_to_end(&mut buf);
            let _ = stderr_tx.send(buf);
        });

        loop {
            if let Some(status) = child.try_wait()? {
                let stdout = stdout_rx
                    .recv_timeout(Duration::from_millis(100))
                    .unwrap_or_default();
                let stderr = stderr_rx
                    .recv_timeout(Duration::from_millis(100))
                    .unwrap_or_default();
                return validate_command_output(
                    &rendered,
                    Output {
                        status,
                        stdout,
                        stderr,
                    },
                );
            }

            if started_at.elapsed() >= limit {
                let _ = child.kill();
                let _ = child.wait();
                let stderr = stderr_rx
                    .recv_timeout(Duration::from_millis(100))
                    .unwrap_or_default();
                let stderr_str = String::from_utf8_lossy(&stderr).into_owned();
                return Err(RedubError::from_command_timeout(
                    rendered,
                    saturating_duration_ms(limit),
                    stderr_str,
                ));
            }

            thread::sleep(Duration::from_millis(20));
        }
    }

    let output = command.output()?;
    validate_command_output(&rendered, output)
}

/// Read a millisecond duration from an env var, falling back when the
/// variable is absent or unparseable.
pub(crate) fn duration_from_env(key: &str, fallback: Duration) -> Duration {
    let Some(raw) = std::env::var(key).ok() else {
        return fallback;
    };
    let Ok(parsed) = raw.parse::<u64>() else {
        return fallback;
    };
    Duration::from_millis(parsed)
}

fn validate_command_output(rendered: &str, output: Output) -> RedubResult<Output> {
    if output.status.success() {
        return Ok(output);
    }

    let status = output.status.code().unwrap_or(-1);
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    Err(RedubError::from_command_failure(
        rendered.to_owned(),
        status,
        stderr,
    ))
}

fn saturating_duration_ms(duration: Duration) -> u64 {
    duration.as_millis().try_into().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{
        command_exists, duration_from_env, run_command, run_command_with_timeout,
        saturating_duration_ms, validate_command_output,
    };

    #[test]
    fn run_command_succeeds_for_true() {
        let output = run_command("true", &[], None).expect("true should succeed");
        assert!(output.status.success());
    }

    #[test]
    fn run_command_missing_program_returns_command_missing() {
        let err = run_command("nonexistent_binary_xyz_12345", &[], None)
            .expect_err("nonexistent binary should fail");
        assert!(
            matches!(err, crate::error::RedubError::CommandMissing { .. }),
            "expected CommandMissing, got: {err:?}"
        );
    }

    #[test]
    fn run_command_nonzero_exit_returns_command_failed() {
        let err = run_command("false", &[], None).expect_err("false should fail");
        let text = err.to_string();
        assert!(
            text.contains("command failed") || text.contains("status"),
            "expected command failure message, got: {text}"
        );
    }

    #[test]
    fn run_command_with_timeout_kills_slow_command() {
        let err = run_command_with_timeout(
            "sleep",
            &["60".to_owned()],
            None,
            Some(Duration::from_millis(100)),
        )
        .expect_err("should timeout");
        let text = err.to_string();
        assert!(
            text.contains("timed out"),
            "expected timeout message, got: {text}"
        );
    }

    #[test]
    fn run_command_captures_stderr() {
        let err = run_command("ls", &["/nonexistent_path_xyz_99999".to_owned()], None)
            .expect_err("ls on nonexistent should fail");
        let text = err.to_string();
        assert!(
            text.contains("nonexistent_path") || text.contains("No such file"),
            "expected stderr content, got: {text}"
        );
    }

    #[test]
    fn run_command_with_cwd() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = run_command("pwd", &[], Some(dir.path())).expect("pwd should succeed");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(
            stdout.contains(dir.path().to_str().unwrap()),
            "expected cwd in stdout, got: {stdout}"
        );
    }

    #[test]
    fn command_exists_known_and_absent() {
        assert!(command_exists("ls"), "ls should exist");
        assert!(!command_exists("definitely_not_a_real_binary_abc_xyz_99999"));
    }

    #[test]
    fn saturating_duration_ms_cases() {
        assert_eq!(saturating_duration_ms(Duration::from_secs(5)), 5000);
        assert_eq!(saturating_duration_ms(Duration::ZERO), 0);
        assert_eq!(saturating_duration_ms(Duration::from_secs(u64::MAX)), u64::MAX);
    }

    #[test]
    fn duration_from_env_falls_back_on_missing_var() {
        let fallback = Duration::from_secs(42);
        let result = duration_from_env("REDUB_TEST_NONEXISTENT_VAR_39285", fallback);
        assert_eq!(result, fallback);
    }

    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    fn fake_output(code: i32, stderr: &str) -> std::process::Output {
        std::process::Output {
            status: ExitStatus::from_raw(code << 8),
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn validate_command_output_success_returns_ok() {
        assert!(validate_command_output("test-cmd", fake_output(0, "")).is_ok());
    }

    #[test]
    fn validate_command_output_nonzero_exit_keeps_stderr_and_code() {
        let err = validate_command_output("my-tool --flag", fake_output(42, "exploded")).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("42"), "got: {text}");
        assert!(text.contains("exploded"), "got: {text}");
        assert!(text.contains("my-tool"), "got: {text}");
    }

    #[test]
    fn validate_command_output_signal_terminated_uses_negative_one() {
        let output = std::process::Output {
            status: ExitStatus::from_raw(9),
            stdout: Vec::new(),
            stderr: b"killed".to_vec(),
        };
        let text = validate_command_output("signaled-cmd", output)
            .unwrap_err()
            .to_string();
        assert!(
            text.contains("-1") || text.contains("killed"),
            "should mention -1 or killed: {text}"
        );
    }
}
