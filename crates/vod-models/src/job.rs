//! Job and processing result models.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Video container extensions accepted for processing (lowercase, no dot).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];

/// Suffix appended to an input's stem to form its output artifact name.
pub const OUTPUT_SUFFIX: &str = "_no_copyright";

/// Stable job identifier, derived from the input filename stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Derive a job id from an input path's file stem.
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self(stem)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of pending work, created when a video is discovered in the
/// incoming directory. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Absolute path to the input video.
    pub input_path: PathBuf,
    /// Identifier derived from the input filename.
    pub id: JobId,
    /// When the job was discovered.
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Create a job for an input video path.
    pub fn from_path(input_path: impl Into<PathBuf>) -> Self {
        let input_path = input_path.into();
        let id = JobId::from_path(&input_path);
        Self {
            input_path,
            id,
            created_at: Utc::now(),
        }
    }

    /// Output artifact filename for this job, e.g. `talk_no_copyright.mp4`.
    pub fn output_name(&self) -> String {
        output_name_for_stem(self.id.as_str())
    }

    /// True if `path` carries one of the recognized video container extensions.
    pub fn is_supported_video(path: &Path) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                VIDEO_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }
}

/// Output artifact filename for a given input stem.
pub fn output_name_for_stem(stem: &str) -> String {
    format!("{stem}{OUTPUT_SUFFIX}.mp4")
}

/// Terminal outcome of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ProcessingOutcome {
    /// Output artifact was produced.
    Success { output_path: PathBuf },
    /// No output was produced; the input is left in place for retry.
    Failure { reason: String },
}

impl ProcessingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingOutcome::Success { .. })
    }

    /// The produced artifact path, if any.
    pub fn output_path(&self) -> Option<&Path> {
        match self {
            ProcessingOutcome::Success { output_path } => Some(output_path),
            ProcessingOutcome::Failure { .. } => None,
        }
    }
}

/// Produced once per job; consumed by the scheduler for archiving and logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub job: Job,
    pub outcome: ProcessingOutcome,
    /// Wall-clock time spent on the job.
    pub elapsed: Duration,
    /// Input size minus output size, in bytes. Only set on success.
    pub size_delta_bytes: Option<i64>,
}

impl ProcessingResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}
