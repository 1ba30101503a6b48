//! Audio separation methods and probed capabilities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Audio separation backend, ordered by preference.
///
/// The two ML methods produce a vocals stem from a trained model; the
/// band-pass filter is a deterministic approximation used when no model
/// is available or a model run fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeparationMethod {
    /// Demucs (`python -m demucs`). Slower, better quality.
    Demucs,
    /// Spleeter CLI. Faster, good quality.
    Spleeter,
    /// FFmpeg band-pass filter (200 Hz – 3000 Hz). Always available.
    BandpassFilter,
}

impl SeparationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeparationMethod::Demucs => "demucs",
            SeparationMethod::Spleeter => "spleeter",
            SeparationMethod::BandpassFilter => "bandpass_filter",
        }
    }
}

impl fmt::Display for SeparationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which separation backends are usable on this host.
///
/// Probed once at process start and passed by value into the components
/// that need it; read-only for the lifetime of the run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeparationCapabilities {
    pub demucs: bool,
    pub spleeter: bool,
}

impl SeparationCapabilities {
    /// Capabilities with only the deterministic fallback usable.
    pub fn none() -> Self {
        Self {
            demucs: false,
            spleeter: false,
        }
    }

    /// True if the given method can be attempted on this host.
    pub fn is_available(&self, method: SeparationMethod) -> bool {
        match method {
            SeparationMethod::Demucs => self.demucs,
            SeparationMethod::Spleeter => self.spleeter,
            SeparationMethod::BandpassFilter => true,
        }
    }

    /// Usable methods in preference order, fallback last.
    pub fn available_methods(&self) -> Vec<SeparationMethod> {
        let mut methods = Vec::new();
        if self.demucs {
            methods.push(SeparationMethod::Demucs);
        }
        if self.spleeter {
            methods.push(SeparationMethod::Spleeter);
        }
        methods.push(SeparationMethod::BandpassFilter);
        methods
    }
}
