use std::{
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use tracing::*;

use super::{
    error::{CollectionError, Degrade, Result},
    format,
    ranking::{rank_processes, truncate_name},
    source::{MetricsSource, RawProcessTable, SysinfoSource},
    types::{NetworkCounters, ProcessInfo, Snapshot, Usage, UNKNOWN_UPTIME},
};

#[cfg(windows)]
pub const DEFAULT_DISK_PATH: &str = "C:\\";
#[cfg(not(windows))]
pub const DEFAULT_DISK_PATH: &str = "/";

pub const DEFAULT_TOP_PROCESSES: usize = 5;
pub const DEFAULT_CPU_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);
pub const PROCESS_NAME_LIMIT: usize = 20;

/// Builds a fresh source for every collection, nothing is shared between requests.
pub type SourceFactory = Arc<dyn Fn() -> Box<dyn MetricsSource + Send> + Send + Sync>;

#[derive(Clone, Debug, PartialEq)]
pub struct CollectorConfig {
    pub disk_path: PathBuf,
    pub top_processes: usize,
    pub cpu_sample_interval: Duration,
    pub process_name_limit: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            disk_path: PathBuf::from(DEFAULT_DISK_PATH),
            top_processes: DEFAULT_TOP_PROCESSES,
            cpu_sample_interval: DEFAULT_CPU_SAMPLE_INTERVAL,
            process_name_limit: PROCESS_NAME_LIMIT,
        }
    }
}

pub fn sysinfo_factory() -> SourceFactory {
    Arc::new(|| Box::new(SysinfoSource::new()) as Box<dyn MetricsSource + Send>)
}

/// Sample the live host once. Blocks for the CPU sampling interval.
pub fn collect(config: &CollectorConfig) -> Snapshot {
    Collector::new(SysinfoSource::new(), config.clone()).collect()
}

pub struct Collector<S: MetricsSource> {
    source: S,
    config: CollectorConfig,
}

impl<S: MetricsSource> Collector<S> {
    pub fn new(source: S, config: CollectorConfig) -> Self {
        Self { source, config }
    }

    /// Never fails: any error that escapes the per-metric fallbacks, or a
    /// panic inside the source, yields [`Snapshot::degraded`].
    #[instrument(level = "debug", skip(self))]
    pub fn collect(&mut self) -> Snapshot {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.try_collect()))
            .unwrap_or_else(|payload| Err(CollectionError::Panicked(panic_message(&*payload))));

        match outcome {
            Ok(snapshot) => snapshot,
            Err(error) => {
                error!("Metrics collection failed, answering with a degraded snapshot. Reason: {error}");
                Snapshot::degraded()
            }
        }
    }

    /// Only the CPU sample is mandatory: it anchors the interval the process
    /// percentages are measured over. Everything else degrades on its own.
    pub fn try_collect(&mut self) -> Result<Snapshot> {
        let cpu = self.source.sample_cpu(self.config.cpu_sample_interval)?;
        let timestamp = format::timestamp_now();

        let memory = self
            .source
            .memory()
            .map(|memory| usage(memory.used_bytes, memory.total_bytes))
            .or_degrade("memory");

        let disk = self
            .source
            .disk(&self.config.disk_path)
            .map(|disk| {
                let used = disk.total_bytes.saturating_sub(disk.available_bytes);
                usage(used, disk.total_bytes)
            })
            .or_degrade("disk");

        let network = self
            .source
            .network()
            .map(|network| NetworkCounters {
                sent_mb: format::bytes_to_mb(network.sent_bytes),
                recv_mb: format::bytes_to_mb(network.recv_bytes),
                sent_gb: format::bytes_to_gb(network.sent_bytes),
                recv_gb: format::bytes_to_gb(network.recv_bytes),
            })
            .or_degrade("network");

        let uptime = self
            .source
            .uptime()
            .map(format::format_uptime)
            .or_degrade_to("uptime", UNKNOWN_UPTIME.to_string());

        let processes = self
            .source
            .processes()
            .map(|table| self.normalize_processes(table))
            .or_degrade("processes");

        Ok(Snapshot {
            cpu: format::clamp_percent(cpu as f64),
            memory,
            disk,
            uptime,
            network,
            processes: rank_processes(&processes, self.config.top_processes),
            timestamp,
        })
    }

    fn normalize_processes(&self, table: RawProcessTable) -> Vec<ProcessInfo> {
        let cpu_count = table.cpu_count.max(1) as f64;

        table
            .processes
            .into_iter()
            .map(|process| ProcessInfo {
                pid: process.pid,
                name: truncate_name(&process.name, self.config.process_name_limit),
                cpu_percent: format::clamp_percent(process.cpu_usage as f64 / cpu_count),
                memory_percent: format::percent(process.memory_bytes, table.total_memory_bytes),
            })
            .collect()
    }
}

fn usage(used: u64, total: u64) -> Usage {
    Usage {
        percent: format::percent(used, total),
        used_gb: format::bytes_to_gb(used),
        total_gb: format::bytes_to_gb(total),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return message.to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic".to_string()
}
