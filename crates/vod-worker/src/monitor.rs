//! Host resource monitoring and the admission gate.

use std::path::{Path, PathBuf};

use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::warn;

use vod_models::ResourceSnapshot;

/// Samples host CPU, memory, disk and load average.
///
/// Used as an advisory admission gate before starting expensive work:
/// a blocked check makes the caller skip starting new jobs for the cycle,
/// it never cancels work already in flight.
#[derive(Debug, Clone)]
pub struct SystemMonitor {
    /// Filesystem whose usage is checked (the work directory's mount).
    work_dir: PathBuf,
    memory_limit_percent: f64,
    disk_limit_percent: f64,
}

impl SystemMonitor {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            memory_limit_percent: ResourceSnapshot::MEMORY_LIMIT_PERCENT,
            disk_limit_percent: ResourceSnapshot::DISK_LIMIT_PERCENT,
        }
    }

    /// Override the admission thresholds (used by tests and tooling).
    pub fn with_limits(mut self, memory_percent: f64, disk_percent: f64) -> Self {
        self.memory_limit_percent = memory_percent;
        self.disk_limit_percent = disk_percent;
        self
    }

    /// Take a fresh snapshot. Nothing is cached between calls; CPU usage
    /// needs two refreshes a short interval apart to be meaningful.
    pub async fn snapshot(&self) -> ResourceSnapshot {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        tokio::time::sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let cpu_percent = sys.global_cpu_usage() as f64;
        let memory_percent = if sys.total_memory() > 0 {
            sys.used_memory() as f64 / sys.total_memory() as f64 * 100.0
        } else {
            0.0
        };

        let disk_percent = disk_usage_percent(&self.work_dir);

        let load = System::load_average();

        ResourceSnapshot {
            cpu_percent,
            memory_percent,
            disk_percent,
            load_average: [load.one, load.five, load.fifteen],
        }
    }

    /// Admission check: false blocks starting further work this cycle.
    pub async fn check_resources(&self) -> bool {
        let stats = self.snapshot().await;
        if stats.memory_percent > self.memory_limit_percent {
            warn!("High memory usage: {:.1}%", stats.memory_percent);
            return false;
        }
        if stats.disk_percent > self.disk_limit_percent {
            warn!("High disk usage: {:.1}%", stats.disk_percent);
            return false;
        }
        true
    }
}

/// Used-space percentage of the disk holding `path`, matched by the longest
/// mount point prefix. Falls back to 0 when no disk matches (containers
/// without /proc mounts, for instance).
fn disk_usage_percent(path: &Path) -> f64 {
    let disks = Disks::new_with_refreshed_list();

    let best = disks
        .iter()
        .filter(|d| path.starts_with(d.mount_point()) || d.mount_point() == Path::new("/"))
        .max_by_key(|d| d.mount_point().as_os_str().len());

    match best {
        Some(disk) if disk.total_space() > 0 => {
            let used = disk.total_space() - disk.available_space();
            used as f64 / disk.total_space() as f64 * 100.0
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_is_sane() {
        let monitor = SystemMonitor::new("/tmp");
        let snap = monitor.snapshot().await;

        assert!(snap.cpu_percent >= 0.0);
        assert!((0.0..=100.0).contains(&snap.memory_percent));
        assert!((0.0..=100.0).contains(&snap.disk_percent));
    }
}
