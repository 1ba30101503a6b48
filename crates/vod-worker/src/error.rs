//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Separation failed: {0}")]
    SeparationFailed(String),

    #[error("Insufficient system resources")]
    AdmissionDenied,

    #[error("Media error: {0}")]
    Media(#[from] vod_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn separation_failed(msg: impl Into<String>) -> Self {
        Self::SeparationFailed(msg.into())
    }
}
