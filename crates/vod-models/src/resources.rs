//! Host resource snapshot.

use serde::{Deserialize, Serialize};

/// Point-in-time view of host load. Sampled fresh on each check,
/// never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// Global CPU utilisation, 0–100.
    pub cpu_percent: f64,
    /// Used physical memory, 0–100.
    pub memory_percent: f64,
    /// Used space on the work filesystem, 0–100.
    pub disk_percent: f64,
    /// 1/5/15-minute load averages.
    pub load_average: [f64; 3],
}

impl ResourceSnapshot {
    /// Memory threshold above which new work is not admitted.
    pub const MEMORY_LIMIT_PERCENT: f64 = 90.0;
    /// Disk threshold above which new work is not admitted.
    pub const DISK_LIMIT_PERCENT: f64 = 85.0;

    /// True if the host has headroom to start another expensive job.
    pub fn has_headroom(&self) -> bool {
        self.memory_percent <= Self::MEMORY_LIMIT_PERCENT
            && self.disk_percent <= Self::DISK_LIMIT_PERCENT
    }
}
