use std::path::PathBuf;

use thiserror::Error;

pub type RedubResult<T> = Result<T, RedubError>;

#[derive(Debug, Error)]
pub enum RedubError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("json failure: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http failure: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source file not found: `{path}`")]
    SourceMissing { path: PathBuf },

    #[error("unrecognized or invalid subtitle format for `{path}`: {detail}")]
    Format { path: PathBuf, detail: String },

    #[error("backend failure: {0}")]
    Backend(String),

    #[error("speech synthesis failed for segment {index}: {detail}")]
    Synthesis { index: usize, detail: String },

    #[error("cannot measure rendered clip for segment {index} at `{path}`")]
    Measurement { index: usize, path: PathBuf },

    #[error(
        "no rendered clip for segment {index} at `{path}`; run speech calibration before assembly"
    )]
    MissingAudio { index: usize, path: PathBuf },

    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("missing command `{command}` on PATH")]
    CommandMissing { command: String },

    #[error("command failed: `{command}` (status: {status}){stderr_suffix}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr_suffix: String,
    },

    #[error("command timed out after {timeout_ms}ms: `{command}`{stderr_suffix}")]
    CommandTimedOut {
        command: String,
        timeout_ms: u64,
        stderr_suffix: String,
    },
}

impl RedubError {
    #[must_use]
    pub fn from_command_failure(command: String, status: i32, stderr: String) -> Self {
        let trimmed = stderr.trim();
        let stderr_suffix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("; stderr: {trimmed}")
        };
        Self::CommandFailed {
            command,
            status,
            stderr_suffix,
        }
    }

    #[must_use]
    pub fn from_command_timeout(command: String, timeout_ms: u64, stderr: String) -> Self {
        let trimmed = stderr.trim();
        let stderr_suffix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("; stderr: {trimmed}")
        };
        Self::CommandTimedOut {
            command,
            timeout_ms,
            stderr_suffix,
        }
    }

    /// Stable, unique, machine-readable error code for every variant.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "RD-IO",
            Self::Json(_) => "RD-JSON",
            Self::Http(_) => "RD-HTTP",
            Self::SourceMissing { .. } => "RD-SOURCE-MISSING",
            Self::Format { .. } => "RD-FORMAT",
            Self::Backend(_) => "RD-BACKEND",
            Self::Synthesis { .. } => "RD-SYNTHESIS",
            Self::Measurement { .. } => "RD-MEASUREMENT",
            Self::MissingAudio { .. } => "RD-MISSING-AUDIO",
            Self::Precondition(_) => "RD-PRECONDITION",
            Self::CommandMissing { .. } => "RD-CMD-MISSING",
            Self::CommandFailed { .. } => "RD-CMD-FAILED",
            Self::CommandTimedOut { .. } => "RD-CMD-TIMEOUT",
        }
    }
}
