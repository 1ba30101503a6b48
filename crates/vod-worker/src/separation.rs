//! Audio separation strategy with tiered fallback.
//!
//! Given a raw PCM audio artifact, produce a commentary-only track. The
//! selected ML backend is attempted first via the stage runner; any failure
//! (non-zero exit, missing stem, tool not installed) falls through to the
//! deterministic band-pass filter. The fallback must succeed or the job
//! fails outright.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use vod_media::{filter_voice_band, StageRunner};
use vod_models::{SeparationCapabilities, SeparationMethod};

use crate::error::{WorkerError, WorkerResult};

/// Probe which separation backends are usable. Called once at process
/// start; the result is passed by value into the components that need it.
///
/// Demucs is driven as `python3 -m demucs`, so its availability tracks the
/// interpreter; spleeter ships a standalone binary.
pub fn probe_capabilities() -> SeparationCapabilities {
    let caps = SeparationCapabilities {
        demucs: which::which("python3").is_ok(),
        spleeter: which::which("spleeter").is_ok(),
    };
    info!(
        "Available separation methods: {:?}",
        caps.available_methods()
    );
    caps
}

/// Selects and runs an audio separation backend for one job.
#[derive(Debug, Clone)]
pub struct AudioSeparator {
    method: SeparationMethod,
}

impl AudioSeparator {
    /// Resolve the method to use from an optional explicit request and the
    /// probed capabilities.
    pub fn new(requested: Option<SeparationMethod>, caps: SeparationCapabilities) -> Self {
        let method = select_method(requested, caps);
        info!("Using audio separation method: {}", method);
        Self { method }
    }

    /// The method this separator will attempt first.
    pub fn method(&self) -> SeparationMethod {
        self.method
    }

    /// Produce a clean (commentary-only) audio artifact from `audio`.
    ///
    /// The returned path lives inside `work_dir`, which the pipeline keeps
    /// alive until the job reaches a terminal state.
    pub async fn separate(&self, audio: &Path, work_dir: &Path) -> WorkerResult<PathBuf> {
        let attempt = match self.method {
            SeparationMethod::Demucs => self.run_demucs(audio, work_dir).await,
            SeparationMethod::Spleeter => self.run_spleeter(audio, work_dir).await,
            SeparationMethod::BandpassFilter => return fallback_filter(audio, work_dir).await,
        };

        match attempt {
            Ok(vocals) => Ok(vocals),
            Err(e) => {
                error!("{} error: {}", self.method, e);
                fallback_filter(audio, work_dir).await
            }
        }
    }

    async fn run_demucs(&self, audio: &Path, work_dir: &Path) -> WorkerResult<PathBuf> {
        info!("Separating audio using demucs...");
        let args = [
            "-m".to_string(),
            "demucs".to_string(),
            "--two-stems=vocals".to_string(),
            "-o".to_string(),
            work_dir.to_string_lossy().into_owned(),
            audio.to_string_lossy().into_owned(),
        ];
        StageRunner::new().run("python3", &args).await?;

        // Demucs nests its output under model/track directories.
        find_file_named(work_dir, "vocals.wav")
            .ok_or_else(|| WorkerError::separation_failed("demucs output not found"))
    }

    async fn run_spleeter(&self, audio: &Path, work_dir: &Path) -> WorkerResult<PathBuf> {
        info!("Separating audio using spleeter...");
        let args = [
            "separate".to_string(),
            "-p".to_string(),
            "spleeter:2stems".to_string(),
            "-o".to_string(),
            work_dir.to_string_lossy().into_owned(),
            audio.to_string_lossy().into_owned(),
        ];
        StageRunner::new().run("spleeter", &args).await?;

        let stem = audio
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let vocals = work_dir.join(stem).join("vocals.wav");
        if vocals.exists() {
            Ok(vocals)
        } else {
            Err(WorkerError::separation_failed("spleeter output not found"))
        }
    }
}

/// Resolve which method to run: explicit request if usable, otherwise
/// downgrade to demucs with a warning; with no request, prefer spleeter
/// when present.
fn select_method(
    requested: Option<SeparationMethod>,
    caps: SeparationCapabilities,
) -> SeparationMethod {
    match requested {
        None => {
            if caps.spleeter {
                SeparationMethod::Spleeter
            } else {
                SeparationMethod::Demucs
            }
        }
        Some(method) if caps.is_available(method) => method,
        Some(method) => {
            warn!("{} not available, using demucs", method);
            SeparationMethod::Demucs
        }
    }
}

/// Deterministic band-pass fallback. Invoked via the stage runner like
/// every other stage; if this fails the job fails.
async fn fallback_filter(audio: &Path, work_dir: &Path) -> WorkerResult<PathBuf> {
    warn!("Using fallback audio filter");
    let output = work_dir.join("filtered.wav");
    filter_voice_band(audio, &output).await?;
    Ok(output)
}

/// Depth-first search for a file with the given name.
fn find_file_named(dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file_named(&path, name) {
                return Some(found);
            }
        } else if path.file_name().map(|n| n == name).unwrap_or(false) {
            return Some(path);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(demucs: bool, spleeter: bool) -> SeparationCapabilities {
        SeparationCapabilities { demucs, spleeter }
    }

    #[test]
    fn test_select_prefers_spleeter_when_available() {
        assert_eq!(
            select_method(None, caps(true, true)),
            SeparationMethod::Spleeter
        );
        assert_eq!(
            select_method(None, caps(true, false)),
            SeparationMethod::Demucs
        );
    }

    #[test]
    fn test_select_downgrades_unavailable_request() {
        assert_eq!(
            select_method(Some(SeparationMethod::Spleeter), caps(true, false)),
            SeparationMethod::Demucs
        );
    }

    #[test]
    fn test_select_honors_available_request() {
        assert_eq!(
            select_method(Some(SeparationMethod::Demucs), caps(true, true)),
            SeparationMethod::Demucs
        );
        assert_eq!(
            select_method(Some(SeparationMethod::BandpassFilter), caps(false, false)),
            SeparationMethod::BandpassFilter
        );
    }

    #[test]
    fn test_find_file_named_nested() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("htdemucs").join("audio");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("vocals.wav"), b"wav").unwrap();
        std::fs::write(nested.join("no_vocals.wav"), b"wav").unwrap();

        let found = find_file_named(dir.path(), "vocals.wav").unwrap();
        assert_eq!(found, nested.join("vocals.wav"));

        assert!(find_file_named(dir.path(), "missing.wav").is_none());
    }

    #[tokio::test]
    async fn test_ml_failure_falls_back_to_filter_error_path() {
        // With a guaranteed-missing interpreter path the demucs attempt
        // fails, and with no ffmpeg output the fallback fails too, so
        // separation as a whole must report an error rather than panic.
        let dir = tempfile::TempDir::new().unwrap();
        let audio = dir.path().join("audio.wav");
        tokio::fs::write(&audio, b"not really audio").await.unwrap();

        let separator = AudioSeparator::new(Some(SeparationMethod::Demucs), caps(true, false));
        let result = separator.separate(&audio, dir.path()).await;

        // Either the host has ffmpeg (fallback ran, produced an error from
        // the bogus input) or it does not (ToolNotFound). Both are Err.
        assert!(result.is_err());
    }
}
