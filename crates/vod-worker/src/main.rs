//! VOD processing worker binary.
//!
//! With a video path argument, processes that single file and exits
//! non-zero on failure. Without arguments, runs the continuous batch
//! scheduler loop.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vod_worker::{
    probe_capabilities, AudioSeparator, BatchScheduler, Processor, SystemMonitor, VideoPipeline,
    WorkerConfig,
};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vod_worker=info".parse().unwrap())
        .add_directive("vod_media=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("VOD processor starting...");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    // Capability probe runs once; the result is read-only for the run.
    let caps = probe_capabilities();

    let monitor = SystemMonitor::new(&config.work_dir);
    info!("System stats: {:?}", monitor.snapshot().await);

    let separator = AudioSeparator::new(None, caps);
    let pipeline = Arc::new(VideoPipeline::new(config.clone(), separator));

    let mut args = std::env::args().skip(1);
    if let Some(path) = args.next() {
        // Single-file mode: success/failure reported via exit status.
        let input = PathBuf::from(path);
        if !input.exists() {
            error!("Input file not found: {}", input.display());
            std::process::exit(1);
        }

        if !monitor.check_resources().await {
            error!("Insufficient system resources");
            std::process::exit(1);
        }

        let result = pipeline.process(&input).await;
        match result.outcome.output_path() {
            Some(output) => {
                println!("Success: {}", output.display());
            }
            None => {
                println!("Processing failed");
                std::process::exit(1);
            }
        }
    } else {
        // Continuous mode: poll until killed.
        let scheduler = BatchScheduler::new(config, pipeline, monitor);
        tokio::select! {
            _ = scheduler.run() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
            }
        }
    }
}
