//! Batch video processing worker.
//!
//! This crate provides:
//! - Resource admission gate (memory/disk thresholds)
//! - The three-stage per-video pipeline (extract, separate, recombine)
//! - Separation strategy with tiered ML fallback
//! - Bounded-concurrency batch scheduler with archiving

pub mod config;
pub mod error;
pub mod monitor;
pub mod pipeline;
pub mod scheduler;
pub mod separation;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use monitor::SystemMonitor;
pub use pipeline::{Processor, VideoPipeline, WorkArea};
pub use scheduler::BatchScheduler;
pub use separation::{probe_capabilities, AudioSeparator};
