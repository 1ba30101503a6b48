//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent pipeline runs. Separation inference and encoding
    /// are CPU/memory-heavy, so this stays small.
    pub max_concurrent_jobs: usize,
    /// Directory scanned for pending videos.
    pub incoming_dir: PathBuf,
    /// Directory receiving `<stem>_no_copyright.mp4` artifacts.
    pub output_dir: PathBuf,
    /// Root for per-job ephemeral work directories.
    pub work_dir: PathBuf,
    /// Delay between discovery cycles in continuous mode.
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            incoming_dir: PathBuf::from("/opt/vod-processor/incoming"),
            output_dir: PathBuf::from("/opt/vod-processor/processed"),
            work_dir: PathBuf::from("/opt/vod-processor/processing"),
            poll_interval: Duration::from_secs(60),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_concurrent_jobs),
            incoming_dir: std::env::var("VOD_INCOMING_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.incoming_dir),
            output_dir: std::env::var("VOD_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            work_dir: std::env::var("VOD_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            poll_interval: Duration::from_secs(
                std::env::var("WORKER_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }

    /// Archive subdirectory for consumed originals.
    pub fn archive_dir(&self) -> PathBuf {
        self.incoming_dir.join("archive")
    }
}
