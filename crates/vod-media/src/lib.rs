//! FFmpeg CLI wrapper for the VOD processor.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A stage runner that captures tool stderr verbatim for diagnosability
//! - The three pipeline operations: audio extraction, band-pass filtering,
//!   and video/audio muxing
//! - Cross-device file moves for archiving

pub mod audio;
pub mod command;
pub mod error;
pub mod fs_utils;

pub use audio::{extract_audio, filter_voice_band, mux_video_audio};
pub use command::{check_ffmpeg, FfmpegCommand, StageOutput, StageRunner};
pub use error::{MediaError, MediaResult};
pub use fs_utils::move_file;
