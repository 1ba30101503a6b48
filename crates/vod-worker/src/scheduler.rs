//! Batch discovery and bounded dispatch.
//!
//! Each cycle scans the incoming directory for videos without an existing
//! output artifact, dispatches up to `max_concurrent_jobs` pipeline runs,
//! archives originals on success and leaves them in place on failure so
//! the next cycle retries them. Nothing marks a job done before its run
//! actually completes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use vod_media::move_file;
use vod_models::{output_name_for_stem, Job, ProcessingResult};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::monitor::SystemMonitor;
use crate::pipeline::Processor;

/// Discovers pending work and dispatches it to the pipeline with bounded
/// concurrency. The semaphore persists across cycles.
pub struct BatchScheduler {
    config: WorkerConfig,
    processor: Arc<dyn Processor>,
    monitor: SystemMonitor,
    semaphore: Arc<Semaphore>,
    active_jobs: Arc<AtomicUsize>,
}

impl BatchScheduler {
    pub fn new(config: WorkerConfig, processor: Arc<dyn Processor>, monitor: SystemMonitor) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        Self {
            config,
            processor,
            monitor,
            semaphore,
            active_jobs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of pipeline runs currently in flight.
    pub fn active_jobs(&self) -> usize {
        self.active_jobs.load(Ordering::SeqCst)
    }

    /// List pending videos: recognized container extension, no output
    /// artifact yet.
    pub async fn scan_for_videos(&self) -> WorkerResult<Vec<PathBuf>> {
        if !self.config.incoming_dir.exists() {
            tokio::fs::create_dir_all(&self.config.incoming_dir).await?;
        }

        let mut videos = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.config.incoming_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() || !Job::is_supported_video(&path) {
                continue;
            }
            if !self.output_exists(&path) {
                videos.push(path);
            }
        }

        videos.sort();
        Ok(videos)
    }

    /// Already-processed check: the job's derived output name exists in
    /// the output directory.
    fn output_exists(&self, input: &Path) -> bool {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.config.output_dir.join(output_name_for_stem(&stem)).exists()
    }

    /// One discovery/dispatch cycle. Blocks until every dispatched job in
    /// this cycle reached a terminal state.
    pub async fn process_all(&self) -> WorkerResult<()> {
        let videos = self.scan_for_videos().await?;

        if videos.is_empty() {
            info!("No videos to process");
            return Ok(());
        }

        info!("Found {} videos to process", videos.len());

        let mut jobs: JoinSet<(PathBuf, ProcessingResult)> = JoinSet::new();

        for video in videos {
            // Admission gate: a blocked check defers the rest of the cycle,
            // in-flight jobs are unaffected.
            if !self.monitor.check_resources().await {
                warn!("Insufficient system resources, deferring remaining videos");
                break;
            }

            let permit = Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .map_err(|_| WorkerError::job_failed("scheduler semaphore closed"))?;
            let processor = Arc::clone(&self.processor);
            let active = Arc::clone(&self.active_jobs);

            jobs.spawn(async move {
                let _permit = permit;
                active.fetch_add(1, Ordering::SeqCst);
                let result = processor.process(&video).await;
                active.fetch_sub(1, Ordering::SeqCst);
                (video, result)
            });
        }

        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok((video, result)) => self.finish_job(&video, &result).await,
                Err(e) => error!("Pipeline task aborted: {}", e),
            }
        }

        Ok(())
    }

    /// Post-processing: archive the original on success, leave it alone on
    /// failure so the next scan retries it.
    async fn finish_job(&self, video: &Path, result: &ProcessingResult) {
        let name = video.file_name().unwrap_or_default().to_string_lossy();

        if result.is_success() {
            info!("Successfully processed: {}", name);
            let dest = self.config.archive_dir().join(name.as_ref());
            if let Err(e) = move_file(video, &dest).await {
                error!("Failed to archive {}: {}", name, e);
            }
        } else {
            error!("Failed to process {} (will retry next cycle)", name);
        }
    }

    /// Continuous mode: scan, dispatch, sleep. A failed cycle is logged
    /// and the loop keeps going.
    pub async fn run(&self) {
        info!(
            "Batch scheduler started: {} workers, polling every {:?}",
            self.config.max_concurrent_jobs, self.config.poll_interval
        );

        loop {
            if let Err(e) = self.process_all().await {
                error!("Batch processing error: {}", e);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use async_trait::async_trait;
    use vod_models::ProcessingOutcome;

    /// Fake processor: succeeds unless the filename contains "fail",
    /// writes the output artifact on success, and tracks the maximum
    /// number of concurrent runs it observed.
    struct FakeProcessor {
        output_dir: PathBuf,
        running: AtomicUsize,
        max_running: AtomicUsize,
        delay: Duration,
    }

    impl FakeProcessor {
        fn new(output_dir: PathBuf, delay: Duration) -> Self {
            Self {
                output_dir,
                running: AtomicUsize::new(0),
                max_running: AtomicUsize::new(0),
                delay,
            }
        }

        fn max_running(&self) -> usize {
            self.max_running.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Processor for FakeProcessor {
        async fn process(&self, input: &Path) -> ProcessingResult {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            let job = Job::from_path(input);
            let outcome = if input.to_string_lossy().contains("fail") {
                ProcessingOutcome::Failure {
                    reason: "forced failure".to_string(),
                }
            } else {
                let output_path = self.output_dir.join(job.output_name());
                std::fs::create_dir_all(&self.output_dir).unwrap();
                std::fs::write(&output_path, b"processed").unwrap();
                ProcessingOutcome::Success { output_path }
            };

            ProcessingResult {
                job,
                outcome,
                elapsed: self.delay,
                size_delta_bytes: None,
            }
        }
    }

    fn test_config(root: &Path, workers: usize) -> WorkerConfig {
        WorkerConfig {
            max_concurrent_jobs: workers,
            incoming_dir: root.join("incoming"),
            output_dir: root.join("processed"),
            work_dir: root.join("processing"),
            poll_interval: Duration::from_secs(1),
        }
    }

    async fn seed_incoming(config: &WorkerConfig, names: &[&str]) {
        tokio::fs::create_dir_all(&config.incoming_dir).await.unwrap();
        for name in names {
            tokio::fs::write(config.incoming_dir.join(name), b"video")
                .await
                .unwrap();
        }
    }

    fn scheduler_with_fake(
        config: WorkerConfig,
        delay: Duration,
    ) -> (BatchScheduler, Arc<FakeProcessor>) {
        let fake = Arc::new(FakeProcessor::new(config.output_dir.clone(), delay));
        // Thresholds at 100% so host load never skews test dispatch.
        let monitor = SystemMonitor::new(&config.work_dir).with_limits(100.0, 100.0);
        let scheduler =
            BatchScheduler::new(config, Arc::clone(&fake) as Arc<dyn Processor>, monitor);
        (scheduler, fake)
    }

    #[tokio::test]
    async fn test_scan_filters_extensions_and_processed() {
        let root = tempfile::TempDir::new().unwrap();
        let config = test_config(root.path(), 2);
        seed_incoming(&config, &["a.mp4", "b.MKV", "notes.txt", "c.webm", "done.mp4"]).await;

        // done.mp4 already has an output artifact.
        tokio::fs::create_dir_all(&config.output_dir).await.unwrap();
        tokio::fs::write(config.output_dir.join("done_no_copyright.mp4"), b"x")
            .await
            .unwrap();

        let (scheduler, _) = scheduler_with_fake(config, Duration::ZERO);
        let videos = scheduler.scan_for_videos().await.unwrap();
        let names: Vec<String> = videos
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.mp4", "b.MKV", "c.webm"]);
    }

    #[tokio::test]
    async fn test_scan_ignores_archive_subdirectory() {
        let root = tempfile::TempDir::new().unwrap();
        let config = test_config(root.path(), 2);
        seed_incoming(&config, &["a.mp4"]).await;
        tokio::fs::create_dir_all(config.incoming_dir.join("archive"))
            .await
            .unwrap();
        tokio::fs::write(config.incoming_dir.join("archive").join("old.mp4"), b"x")
            .await
            .unwrap();

        let (scheduler, _) = scheduler_with_fake(config, Duration::ZERO);
        let videos = scheduler.scan_for_videos().await.unwrap();
        assert_eq!(videos.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_pool_size() {
        let root = tempfile::TempDir::new().unwrap();
        let config = test_config(root.path(), 2);
        seed_incoming(
            &config,
            &["a.mp4", "b.mp4", "c.mp4", "d.mp4", "e.mp4", "f.mp4"],
        )
        .await;

        let (scheduler, fake) = scheduler_with_fake(config, Duration::from_millis(50));
        scheduler.process_all().await.unwrap();

        assert!(
            fake.max_running() <= 2,
            "observed {} concurrent runs",
            fake.max_running()
        );
        assert_eq!(scheduler.active_jobs(), 0);
    }

    #[tokio::test]
    async fn test_blocked_resources_defer_whole_cycle() {
        let root = tempfile::TempDir::new().unwrap();
        let config = test_config(root.path(), 2);
        seed_incoming(&config, &["a.mp4", "b.mp4"]).await;

        let fake = Arc::new(FakeProcessor::new(config.output_dir.clone(), Duration::ZERO));
        // Zero thresholds make the admission gate reject every dispatch.
        let monitor = SystemMonitor::new(&config.work_dir).with_limits(0.0, 0.0);
        let scheduler = BatchScheduler::new(
            config.clone(),
            Arc::clone(&fake) as Arc<dyn Processor>,
            monitor,
        );

        scheduler.process_all().await.unwrap();

        // Nothing ran: no output artifacts, inputs still pending for the
        // next cycle.
        assert_eq!(fake.max_running(), 0);
        assert!(!config.output_dir.join("a_no_copyright.mp4").exists());
        assert!(config.incoming_dir.join("a.mp4").exists());
        assert!(config.incoming_dir.join("b.mp4").exists());
        assert_eq!(scheduler.scan_for_videos().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_success_archives_and_failure_retries() {
        let root = tempfile::TempDir::new().unwrap();
        let config = test_config(root.path(), 2);
        seed_incoming(&config, &["good.mp4", "fail_this.mp4"]).await;

        let (scheduler, _) = scheduler_with_fake(config.clone(), Duration::ZERO);
        scheduler.process_all().await.unwrap();

        // Success: original archived, absent from pending, output present.
        assert!(config.archive_dir().join("good.mp4").exists());
        assert!(!config.incoming_dir.join("good.mp4").exists());
        assert!(config.output_dir.join("good_no_copyright.mp4").exists());

        // Failure: original untouched, no output.
        assert!(config.incoming_dir.join("fail_this.mp4").exists());
        assert!(!config
            .output_dir
            .join("fail_this_no_copyright.mp4")
            .exists());

        // Re-scan only re-enqueues the failed job.
        let videos = scheduler.scan_for_videos().await.unwrap();
        assert_eq!(videos.len(), 1);
        assert!(videos[0].ends_with("fail_this.mp4"));
    }
}
