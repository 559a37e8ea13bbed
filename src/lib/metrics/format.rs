//! Unit conversions and human-readable renderings used by the snapshot.

pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    round_to(bytes as f64 / BYTES_PER_MB, 2)
}

pub fn bytes_to_gb(bytes: u64) -> f64 {
    round_to(bytes as f64 / BYTES_PER_GB, 2)
}

/// Clamp into [0, 100] with one decimal. Non-finite readings become 0.
pub fn clamp_percent(value: f64) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    round_to(value.clamp(0.0, 100.0), 1) as f32
}

pub fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    clamp_percent(used as f64 / total as f64 * 100.0)
}

/// Renders `H:MM:SS`, prefixed with `N day(s), ` once past 24 hours.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let seconds = seconds % 60;

    let clock = format!("{hours}:{minutes:02}:{seconds:02}");
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        days => format!("{days} days, {clock}"),
    }
}

pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_binary_units() {
        assert_eq!(bytes_to_mb(0), 0.0);
        assert_eq!(bytes_to_mb(1024 * 1024), 1.0);
        assert_eq!(bytes_to_mb(1_572_864), 1.5);
        assert_eq!(bytes_to_gb(8 * 1024 * 1024 * 1024), 8.0);
        // 123456789 bytes ~ 0.1149 GB
        assert_eq!(bytes_to_gb(123_456_789), 0.11);
    }

    #[test]
    fn percent_is_bounded() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(50, 200), 25.0);
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(300, 200), 100.0);
        assert_eq!(clamp_percent(-4.0), 0.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(f64::INFINITY), 0.0);
    }

    #[test]
    fn uptime_rendering() {
        let descriptions = vec![
            (0, "0:00:00"),
            (59, "0:00:59"),
            (3_661, "1:01:01"),
            (86_399, "23:59:59"),
            (86_400, "1 day, 0:00:00"),
            (90_061, "1 day, 1:01:01"),
            (3 * 86_400 + 4 * 3_600 + 5 * 60 + 6, "3 days, 4:05:06"),
        ];

        for (seconds, expected) in descriptions {
            assert_eq!(format_uptime(seconds), expected);
        }
    }

    #[test]
    fn timestamp_has_fixed_layout() {
        let timestamp = timestamp_now();
        assert!(
            chrono::NaiveDateTime::parse_from_str(&timestamp, TIMESTAMP_FORMAT).is_ok(),
            "unexpected timestamp: {timestamp}"
        );
    }
}
