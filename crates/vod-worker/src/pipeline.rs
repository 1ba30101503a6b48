//! Per-video processing pipeline.
//!
//! State machine per job: extract audio, separate, recombine. Failure at
//! any stage is terminal for the job and is reported through the returned
//! outcome, never as a panic or error the caller must catch. The job's
//! work area is removed on every exit path.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use tempfile::TempDir;
use tracing::{error, info};

use vod_media::{extract_audio, mux_video_audio};
use vod_models::{Job, ProcessingOutcome, ProcessingResult};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::separation::AudioSeparator;

/// Processes one video to a terminal outcome. The scheduler depends on
/// this trait so tests can substitute a fake.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, input: &Path) -> ProcessingResult;
}

/// Scoped per-job working directory.
///
/// Uniquely named under the work root and owned exclusively by one
/// pipeline run. Removal on drop is the invariant that keeps failed jobs
/// from leaking intermediate artifacts.
pub struct WorkArea {
    dir: TempDir,
}

impl WorkArea {
    /// Create a fresh work area for a job under `root`.
    pub fn create(root: &Path, job_id: &str) -> WorkerResult<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("work_{job_id}_"))
            .tempdir_in(root)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Orchestrates the three-stage transform for one video.
pub struct VideoPipeline {
    config: WorkerConfig,
    separator: AudioSeparator,
}

impl VideoPipeline {
    pub fn new(config: WorkerConfig, separator: AudioSeparator) -> Self {
        Self { config, separator }
    }

    /// Run extract, separate, recombine. Any error is terminal for the job.
    async fn run_stages(&self, input: &Path, work: &Path, output: &Path) -> WorkerResult<()> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let raw_audio = work.join("audio.wav");
        info!("Extracting audio...");
        extract_audio(input, &raw_audio).await?;

        let clean_audio = self.separator.separate(&raw_audio, work).await?;

        info!("Recombining with video...");
        mux_video_audio(input, &clean_audio, output).await?;

        Ok(())
    }

    async fn size_delta(&self, input: &Path, output: &Path) -> Option<i64> {
        let input_len = tokio::fs::metadata(input).await.ok()?.len() as i64;
        let output_len = tokio::fs::metadata(output).await.ok()?.len() as i64;
        Some(input_len - output_len)
    }
}

#[async_trait]
impl Processor for VideoPipeline {
    async fn process(&self, input: &Path) -> ProcessingResult {
        let job = Job::from_path(input);
        info!(
            "Processing video: {}",
            input.file_name().unwrap_or_default().to_string_lossy()
        );

        let start = Instant::now();
        let output: PathBuf = self.config.output_dir.join(job.output_name());

        let outcome = match WorkArea::create(&self.config.work_dir, job.id.as_str()) {
            Ok(work) => match self.run_stages(input, work.path(), &output).await {
                Ok(()) => ProcessingOutcome::Success {
                    output_path: output.clone(),
                },
                Err(e) => {
                    error!("Processing failed: {}", e);
                    ProcessingOutcome::Failure {
                        reason: e.to_string(),
                    }
                }
            },
            // Work area dropped here, removed on success and failure alike.
            Err(e) => {
                error!("Failed to create work area: {}", e);
                ProcessingOutcome::Failure {
                    reason: e.to_string(),
                }
            }
        };

        let elapsed = start.elapsed();
        let size_delta_bytes = if outcome.is_success() {
            self.size_delta(input, &output).await
        } else {
            None
        };

        if let Some(delta) = size_delta_bytes {
            info!(
                "Processing complete in {:.1}s, size change: {:.1}MB",
                elapsed.as_secs_f64(),
                delta as f64 / 1e6
            );
        }

        ProcessingResult {
            job,
            outcome,
            elapsed,
            size_delta_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vod_models::{SeparationCapabilities, SeparationMethod};

    fn test_pipeline(root: &Path) -> VideoPipeline {
        let config = WorkerConfig {
            max_concurrent_jobs: 1,
            incoming_dir: root.join("incoming"),
            output_dir: root.join("processed"),
            work_dir: root.join("processing"),
            poll_interval: std::time::Duration::from_secs(1),
        };
        let separator = AudioSeparator::new(
            Some(SeparationMethod::BandpassFilter),
            SeparationCapabilities::none(),
        );
        VideoPipeline::new(config, separator)
    }

    #[test]
    fn test_work_area_removed_on_drop() {
        let root = tempfile::TempDir::new().unwrap();
        let path = {
            let work = WorkArea::create(root.path(), "job1").unwrap();
            assert!(work.path().exists());
            assert!(work
                .path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("work_job1_"));
            work.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_work_areas_are_distinct() {
        let root = tempfile::TempDir::new().unwrap();
        let a = WorkArea::create(root.path(), "same").unwrap();
        let b = WorkArea::create(root.path(), "same").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn test_failed_job_leaves_no_work_area_and_no_output() {
        let root = tempfile::TempDir::new().unwrap();
        let pipeline = test_pipeline(root.path());

        // Garbage bytes: extraction fails whatever tools are installed.
        let input = root.path().join("incoming").join("broken.mp4");
        tokio::fs::create_dir_all(input.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&input, b"definitely not an mp4").await.unwrap();

        let result = pipeline.process(&input).await;

        assert!(!result.is_success());
        assert!(result.outcome.output_path().is_none());
        assert!(result.size_delta_bytes.is_none());

        // No output artifact was produced.
        assert!(!root
            .path()
            .join("processed")
            .join("broken_no_copyright.mp4")
            .exists());

        // Hard invariant: the work root holds no leftover work areas.
        let work_root = root.path().join("processing");
        if work_root.exists() {
            let leftovers: Vec<_> = std::fs::read_dir(&work_root).unwrap().collect();
            assert!(leftovers.is_empty(), "work area leaked: {leftovers:?}");
        }

        // Source is left in place for retry.
        assert!(input.exists());
    }
}
