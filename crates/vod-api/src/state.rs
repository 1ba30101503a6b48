//! Shared application state.

use vod_models::SeparationCapabilities;
use vod_worker::{probe_capabilities, SystemMonitor};

use crate::config::ApiConfig;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    /// Separation backends probed once at startup.
    pub capabilities: SeparationCapabilities,
    pub monitor: SystemMonitor,
}

impl AppState {
    pub fn new(config: ApiConfig) -> Self {
        let capabilities = probe_capabilities();
        let monitor = SystemMonitor::new(&config.output_dir);
        Self {
            config,
            capabilities,
            monitor,
        }
    }
}
