//! API configuration.

use std::path::PathBuf;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Directory uploads are written into (shared with the worker).
    pub incoming_dir: PathBuf,
    /// Directory processed artifacts appear in.
    pub output_dir: PathBuf,
    /// Max upload body size in bytes.
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            incoming_dir: PathBuf::from("/opt/vod-processor/incoming"),
            output_dir: PathBuf::from("/opt/vod-processor/processed"),
            max_body_size: 4 * 1024 * 1024 * 1024, // 4GB, VODs are large
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            incoming_dir: std::env::var("VOD_INCOMING_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.incoming_dir),
            output_dir: std::env::var("VOD_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
        }
    }
}
