//! Shared data models for the VOD processor.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and per-job processing results
//! - Audio separation methods and probed capabilities
//! - Host resource snapshots

pub mod job;
pub mod resources;
pub mod separation;

pub use job::{
    output_name_for_stem, Job, JobId, ProcessingOutcome, ProcessingResult, OUTPUT_SUFFIX,
    VIDEO_EXTENSIONS,
};
pub use resources::ResourceSnapshot;
pub use separation::{SeparationCapabilities, SeparationMethod};
