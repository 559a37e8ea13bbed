use serde::{Deserialize, Serialize};

pub const UNKNOWN_UPTIME: &str = "unknown";
pub const UNKNOWN_TIMESTAMP: &str = "N/A";

/// One point-in-time view of the host, rebuilt on every request.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Snapshot {
    /// Global CPU utilization over the sampling interval.
    pub cpu: f32,
    pub memory: Usage,
    /// Usage of the configured volume, all zero when it could not be read.
    pub disk: Usage,
    pub uptime: String,
    pub network: NetworkCounters,
    pub processes: TopProcesses,
    pub timestamp: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Usage {
    pub percent: f32,
    pub used_gb: f64,
    pub total_gb: f64,
}

/// Cumulative bytes since boot, not a rate.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct NetworkCounters {
    pub sent_mb: f64,
    pub recv_mb: f64,
    pub sent_gb: f64,
    pub recv_gb: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct TopProcesses {
    pub by_cpu: Vec<ProcessInfo>,
    pub by_memory: Vec<ProcessInfo>,
}

impl Snapshot {
    /// The canonical answer when a collection could not be completed.
    /// Keeps the exact JSON shape of a healthy snapshot.
    pub fn degraded() -> Self {
        Self {
            cpu: 0.0,
            memory: Usage::default(),
            disk: Usage::default(),
            uptime: UNKNOWN_UPTIME.to_string(),
            network: NetworkCounters::default(),
            processes: TopProcesses::default(),
            timestamp: UNKNOWN_TIMESTAMP.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_snapshot_keeps_every_key() {
        let value = serde_json::to_value(Snapshot::degraded()).unwrap();

        for key in [
            "cpu",
            "memory",
            "disk",
            "uptime",
            "network",
            "processes",
            "timestamp",
        ] {
            assert!(!value[key].is_null(), "missing {key}");
        }

        assert_eq!(
            value["disk"],
            serde_json::json!({"percent": 0.0, "used_gb": 0.0, "total_gb": 0.0})
        );
        assert_eq!(
            value["processes"],
            serde_json::json!({"by_cpu": [], "by_memory": []})
        );
        assert_eq!(value["uptime"], "unknown");
        assert_eq!(value["timestamp"], "N/A");
    }
}
