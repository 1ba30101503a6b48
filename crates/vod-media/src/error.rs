//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while invoking external media tools.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("Tool not found in PATH: {0}")]
    ToolNotFound(String),

    #[error("{program} exited with status {exit_code:?}: {stderr}")]
    StageFailed {
        program: String,
        exit_code: Option<i32>,
        /// Captured stderr, verbatim.
        stderr: String,
    },

    #[error("Expected output artifact not produced: {0}")]
    MissingArtifact(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a stage failure carrying the tool's stderr.
    pub fn stage_failed(
        program: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::StageFailed {
            program: program.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }
}
