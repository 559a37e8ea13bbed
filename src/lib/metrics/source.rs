use std::{path::Path, thread, time::Duration};

use sysinfo::{
    CpuExt, DiskExt, NetworkExt, NetworksExt, PidExt, ProcessExt, System, SystemExt,
};
use tracing::*;

use super::error::{CollectionError, Result};

/// Shortest wait between two CPU refreshes that still yields usable usage figures.
pub const MIN_CPU_SAMPLE_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawMemory {
    pub total_bytes: u64,
    pub used_bytes: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawDisk {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawNetwork {
    pub sent_bytes: u64,
    pub recv_bytes: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawProcess {
    pub pid: u32,
    pub name: String,
    /// Percent of a single core, may exceed 100 on multi-core hosts.
    pub cpu_usage: f32,
    pub memory_bytes: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawProcessTable {
    pub cpu_count: usize,
    pub total_memory_bytes: u64,
    pub processes: Vec<RawProcess>,
}

/// Access to the host counters a snapshot is built from.
///
/// Every query is independent. `sample_cpu` is the only one allowed to block,
/// and it must be called before `processes` so per-process CPU usage covers
/// the same interval.
pub trait MetricsSource {
    fn sample_cpu(&mut self, interval: Duration) -> Result<f32>;
    fn memory(&mut self) -> Result<RawMemory>;
    fn disk(&mut self, mount_point: &Path) -> Result<RawDisk>;
    fn network(&mut self) -> Result<RawNetwork>;
    /// Seconds since boot
    fn uptime(&mut self) -> Result<u64>;
    fn processes(&mut self) -> Result<RawProcessTable>;
}

impl<T: MetricsSource + ?Sized> MetricsSource for Box<T> {
    fn sample_cpu(&mut self, interval: Duration) -> Result<f32> {
        (**self).sample_cpu(interval)
    }

    fn memory(&mut self) -> Result<RawMemory> {
        (**self).memory()
    }

    fn disk(&mut self, mount_point: &Path) -> Result<RawDisk> {
        (**self).disk(mount_point)
    }

    fn network(&mut self) -> Result<RawNetwork> {
        (**self).network()
    }

    fn uptime(&mut self) -> Result<u64> {
        (**self).uptime()
    }

    fn processes(&mut self) -> Result<RawProcessTable> {
        (**self).processes()
    }
}

/// Reads the live host through `sysinfo`.
#[derive(Debug)]
pub struct SysinfoSource {
    system: System,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoSource {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl MetricsSource for SysinfoSource {
    #[instrument(level = "debug", skip(self))]
    fn sample_cpu(&mut self, interval: Duration) -> Result<f32> {
        // Both tables need two refreshes apart in time to report usage
        self.system.refresh_cpu();
        self.system.refresh_processes();
        thread::sleep(interval.max(MIN_CPU_SAMPLE_INTERVAL));
        self.system.refresh_cpu();
        self.system.refresh_processes();

        if self.system.cpus().is_empty() {
            return Err(CollectionError::Cpu("no CPU reported by the host".into()));
        }

        Ok(self.system.global_cpu_info().cpu_usage())
    }

    #[instrument(level = "debug", skip(self))]
    fn memory(&mut self) -> Result<RawMemory> {
        self.system.refresh_memory();

        let total_bytes = self.system.total_memory();
        if total_bytes == 0 {
            return Err(CollectionError::Memory("total memory reported as 0".into()));
        }

        Ok(RawMemory {
            total_bytes,
            used_bytes: self.system.used_memory(),
        })
    }

    #[instrument(level = "debug", skip(self))]
    fn disk(&mut self, mount_point: &Path) -> Result<RawDisk> {
        self.system.refresh_disks_list();
        self.system.refresh_disks();

        let disk = self
            .system
            .disks()
            .iter()
            .find(|disk| disk.mount_point() == mount_point)
            .ok_or_else(|| CollectionError::DiskNotFound(mount_point.to_path_buf()))?;

        Ok(RawDisk {
            total_bytes: disk.total_space(),
            available_bytes: disk.available_space(),
        })
    }

    #[instrument(level = "debug", skip(self))]
    fn network(&mut self) -> Result<RawNetwork> {
        self.system.refresh_networks_list();

        let counters = self
            .system
            .networks()
            .iter()
            .fold(RawNetwork::default(), |total, (_name, data)| RawNetwork {
                sent_bytes: total.sent_bytes.saturating_add(data.total_transmitted()),
                recv_bytes: total.recv_bytes.saturating_add(data.total_received()),
            });

        Ok(counters)
    }

    #[instrument(level = "debug", skip(self))]
    fn uptime(&mut self) -> Result<u64> {
        let boot_time = self.system.boot_time();
        if boot_time == 0 {
            return Err(CollectionError::Uptime("boot time unavailable".into()));
        }

        let now = chrono::Utc::now().timestamp();
        u64::try_from(now)
            .ok()
            .and_then(|now| now.checked_sub(boot_time))
            .ok_or_else(|| {
                CollectionError::Uptime(format!("boot time {boot_time} is in the future"))
            })
    }

    #[instrument(level = "debug", skip(self))]
    fn processes(&mut self) -> Result<RawProcessTable> {
        if self.system.processes().is_empty() {
            self.system.refresh_processes();
        }
        if self.system.total_memory() == 0 {
            self.system.refresh_memory();
        }

        let processes: Vec<RawProcess> = self
            .system
            .processes()
            .iter()
            .filter(|(_pid, process)| !process.name().is_empty())
            .map(|(pid, process)| RawProcess {
                pid: pid.as_u32(),
                name: process.name().to_string(),
                cpu_usage: process.cpu_usage(),
                memory_bytes: process.memory(),
            })
            .collect();

        if processes.is_empty() {
            return Err(CollectionError::Processes("no visible process".into()));
        }
        trace!("Enumerated {} processes", processes.len());

        Ok(RawProcessTable {
            cpu_count: self.system.cpus().len().max(1),
            total_memory_bytes: self.system.total_memory(),
            processes,
        })
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[serial]
    #[test]
    fn network_counters_never_go_backwards() {
        let mut source = SysinfoSource::new();

        let first = source.network().unwrap();
        let second = source.network().unwrap();

        assert!(second.sent_bytes >= first.sent_bytes);
        assert!(second.recv_bytes >= first.recv_bytes);
    }

    #[serial]
    #[test]
    fn host_reports_memory_and_uptime() {
        let mut source = SysinfoSource::new();

        let memory = source.memory().unwrap();
        assert!(memory.total_bytes > 0);
        assert!(memory.used_bytes <= memory.total_bytes);

        assert!(source.uptime().is_ok());
    }

    #[serial]
    #[test]
    fn missing_mount_point_is_an_error() {
        let mut source = SysinfoSource::new();
        let result = source.disk(Path::new("/this/mount/point/does/not/exist"));

        assert!(matches!(result, Err(CollectionError::DiskNotFound(_))));
    }

    #[serial]
    #[test]
    fn short_cpu_sample_still_waits_the_minimum() {
        let mut source = SysinfoSource::new();

        let started = std::time::Instant::now();
        source.sample_cpu(Duration::from_millis(10)).unwrap();
        assert!(started.elapsed() >= MIN_CPU_SAMPLE_INTERVAL);
    }

    #[serial]
    #[test]
    fn process_table_follows_cpu_sample() {
        let mut source = SysinfoSource::new();
        source.sample_cpu(Duration::from_millis(200)).unwrap();

        let table = source.processes().unwrap();
        assert!(table.cpu_count >= 1);
        assert!(table.total_memory_bytes > 0);

        let own_pid = std::process::id();
        assert!(table.processes.iter().any(|process| process.pid == own_pid));
    }
}
