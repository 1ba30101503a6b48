//! FFmpeg command builder and external stage runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg invocations.
///
/// Supports multiple inputs (muxing takes two) with per-input arguments,
/// plus output arguments. The `-y` overwrite flag and log level are always
/// emitted.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input files, each preceded by its input arguments.
    inputs: Vec<(Vec<String>, PathBuf)>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after the last -i)
    output_args: Vec<String>,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command with a single input.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            inputs: vec![(Vec::new(), input.as_ref().to_path_buf())],
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            log_level: "error".to_string(),
        }
    }

    /// Add another input file.
    pub fn input(mut self, input: impl AsRef<Path>) -> Self {
        self.inputs.push((Vec::new(), input.as_ref().to_path_buf()));
        self
    }

    /// Add an output argument (after the inputs).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set audio filter.
    pub fn audio_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-af").output_arg(filter)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set audio bitrate.
    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Drop the video stream.
    pub fn no_video(self) -> Self {
        self.output_arg("-vn")
    }

    /// Trim the output to the shortest input stream.
    pub fn shortest(self) -> Self {
        self.output_arg("-shortest")
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        // Overwrite flag
        args.push("-y".to_string());

        // Log level
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Inputs
        for (input_args, input) in &self.inputs {
            args.extend(input_args.clone());
            args.push("-i".to_string());
            args.push(input.to_string_lossy().to_string());
        }

        // Output args
        args.extend(self.output_args.clone());

        // Output file
        args.push(self.output.to_string_lossy().to_string());

        args
    }

    /// Run this command through the stage runner.
    pub async fn run(&self) -> MediaResult<StageOutput> {
        check_ffmpeg()?;
        StageRunner::new().run("ffmpeg", &self.build_args()).await
    }
}

/// Captured output of a completed stage.
#[derive(Debug, Clone, Default)]
pub struct StageOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs a single external tool invocation with structured error capture.
///
/// Every pipeline stage goes through here: a non-zero exit is turned into
/// a [`MediaError::StageFailed`] carrying the tool's stderr verbatim, and
/// is never allowed to escape as a panic. Callers decide whether to retry,
/// fall back, or abort the job.
#[derive(Debug, Default)]
pub struct StageRunner;

impl StageRunner {
    pub fn new() -> Self {
        Self
    }

    /// Invoke `program` with `args`, blocking the calling task until the
    /// subprocess exits. No timeout is enforced; a hung tool blocks its
    /// worker.
    pub async fn run<S: AsRef<str>>(&self, program: &str, args: &[S]) -> MediaResult<StageOutput> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        debug!("Running stage: {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediaError::ToolNotFound(program.to_string())
                } else {
                    MediaError::Io(e)
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(StageOutput { stdout, stderr })
        } else {
            Err(MediaError::stage_failed(
                program,
                output.status.code(),
                stderr,
            ))
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}
