use super::types::{ProcessInfo, TopProcesses};

/// Cut a process name down to `limit` characters, never splitting a character.
pub fn truncate_name(name: &str, limit: usize) -> String {
    name.chars().take(limit).collect()
}

/// Highest `k` entries by `key`, descending. Equal keys keep their input order.
pub fn top_by<F>(processes: &[ProcessInfo], k: usize, key: F) -> Vec<ProcessInfo>
where
    F: Fn(&ProcessInfo) -> f32,
{
    let mut ranked = processes.to_vec();
    ranked.sort_by(|a, b| key(b).total_cmp(&key(a)));
    ranked.truncate(k);
    ranked
}

pub fn rank_processes(processes: &[ProcessInfo], k: usize) -> TopProcesses {
    TopProcesses {
        by_cpu: top_by(processes, k, |process| process.cpu_percent),
        by_memory: top_by(processes, k, |process| process.memory_percent),
    }
}
