use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;

use crate::metrics::collector::{CollectorConfig, DEFAULT_DISK_PATH, PROCESS_NAME_LIMIT};

#[derive(Parser, Debug)]
#[command(
    version,
    about = env!("CARGO_PKG_DESCRIPTION"),
    author = env!("CARGO_PKG_AUTHORS")
)]
struct Args {
    /// Sets the address for the REST API server
    #[arg(
        long,
        value_name = "<IP>:<PORT>",
        default_value = "0.0.0.0:5000",
        env = "HOST_METRICS_REST_SERVER"
    )]
    rest_server: String,

    /// Turn all log categories up to Debug, for more information check RUST_LOG env variable.
    #[arg(short, long)]
    verbose: bool,

    /// Mount point of the volume reported in the disk section
    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_DISK_PATH,
        env = "HOST_METRICS_DISK_PATH"
    )]
    disk_path: PathBuf,

    /// Number of entries in each ranked process list
    #[arg(
        long,
        value_name = "K",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..=50),
        env = "HOST_METRICS_TOP_PROCESSES"
    )]
    top_processes: u64,

    /// How long each collection samples CPU usage for, in milliseconds
    #[arg(
        long,
        value_name = "MS",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(200..=10_000),
        env = "HOST_METRICS_CPU_SAMPLE_INTERVAL_MS"
    )]
    cpu_sample_interval_ms: u64,

    /// Directory for daily rotated log files, console only when unset
    #[arg(long, value_name = "DIR", env = "HOST_METRICS_LOG_PATH")]
    log_path: Option<PathBuf>,

    /// Print a snapshot to stdout every SECONDS instead of serving HTTP
    #[arg(long, value_name = "SECONDS", conflicts_with = "once")]
    watch: Option<u64>,

    /// Print a single snapshot to stdout and exit
    #[arg(long)]
    once: bool,
}

#[derive(Debug)]
struct Manager {
    clap_matches: Args,
}

lazy_static! {
    static ref MANAGER: Arc<Manager> = Arc::new(Manager::new());
}

impl Manager {
    fn new() -> Self {
        Self {
            clap_matches: Args::parse(),
        }
    }
}

// Construct our manager, should be done inside main
pub fn init() {
    MANAGER.as_ref();
}

// Check if the verbosity parameter was used
pub fn is_verbose() -> bool {
    MANAGER.as_ref().clap_matches.verbose
}

// Return the desired address for the REST API
pub fn server_address() -> String {
    MANAGER.as_ref().clap_matches.rest_server.clone()
}

pub fn log_path() -> Option<PathBuf> {
    MANAGER.as_ref().clap_matches.log_path.clone()
}

pub fn watch_interval() -> Option<Duration> {
    MANAGER
        .as_ref()
        .clap_matches
        .watch
        .map(|seconds| Duration::from_secs(seconds.max(1)))
}

pub fn is_once() -> bool {
    MANAGER.as_ref().clap_matches.once
}

pub fn collector_config() -> CollectorConfig {
    collector_config_from(&MANAGER.as_ref().clap_matches)
}

fn collector_config_from(args: &Args) -> CollectorConfig {
    CollectorConfig {
        disk_path: args.disk_path.clone(),
        top_processes: args.top_processes as usize,
        cpu_sample_interval: Duration::from_millis(args.cpu_sample_interval_ms),
        process_name_limit: PROCESS_NAME_LIMIT,
    }
}

// Return the command line used to start this application
pub fn command_line_string() -> String {
    std::env::args().collect::<Vec<String>>().join(" ")
}

// Return a clone of current Args struct
pub fn command_line() -> String {
    format!("{:#?}", MANAGER.as_ref().clap_matches)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn parse(arguments: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("host-metrics-server").chain(arguments.iter().copied()))
    }

    #[serial]
    #[test]
    fn default_arguments() {
        let args = parse(&[]).unwrap();

        assert!(!args.verbose);
        assert!(!args.once);
        assert_eq!(args.watch, None);
        assert_eq!(args.log_path, None);
        assert_eq!(collector_config_from(&args), CollectorConfig::default());
    }

    #[serial]
    #[test]
    fn collector_arguments() {
        let args = parse(&[
            "--disk-path",
            "/data",
            "--top-processes",
            "3",
            "--cpu-sample-interval-ms",
            "250",
            "-v",
        ])
        .unwrap();

        assert!(args.verbose);
        let config = collector_config_from(&args);
        assert_eq!(config.disk_path, PathBuf::from("/data"));
        assert_eq!(config.top_processes, 3);
        assert_eq!(config.cpu_sample_interval, Duration::from_millis(250));
    }

    #[serial]
    #[test]
    fn collector_arguments_from_environment() {
        std::env::set_var("HOST_METRICS_TOP_PROCESSES", "7");
        std::env::set_var("HOST_METRICS_CPU_SAMPLE_INTERVAL_MS", "400");
        let args = parse(&[]);
        std::env::remove_var("HOST_METRICS_TOP_PROCESSES");
        std::env::remove_var("HOST_METRICS_CPU_SAMPLE_INTERVAL_MS");

        let config = collector_config_from(&args.unwrap());
        assert_eq!(config.top_processes, 7);
        assert_eq!(config.cpu_sample_interval, Duration::from_millis(400));

        // The command line wins over the environment
        std::env::set_var("HOST_METRICS_TOP_PROCESSES", "7");
        let args = parse(&["--top-processes", "2"]);
        std::env::remove_var("HOST_METRICS_TOP_PROCESSES");
        assert_eq!(collector_config_from(&args.unwrap()).top_processes, 2);
    }

    #[serial]
    #[test]
    fn out_of_range_arguments_are_rejected() {
        assert!(parse(&["--top-processes", "0"]).is_err());
        assert!(parse(&["--top-processes", "51"]).is_err());
        assert!(parse(&["--cpu-sample-interval-ms", "10"]).is_err());
        // Shorter than the host needs between two CPU refreshes
        assert!(parse(&["--cpu-sample-interval-ms", "150"]).is_err());
        assert!(parse(&["--cpu-sample-interval-ms", "10001"]).is_err());
        assert!(parse(&["--cpu-sample-interval-ms", "200"]).is_ok());
        assert!(parse(&["--watch", "2", "--once"]).is_err());
    }
}
