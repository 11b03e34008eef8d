use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Fire a fixed number of HTTP GET requests with bounded concurrency.
#[derive(Debug, Clone, Default, Parser)]
#[command(version, about)]
pub struct Cmd {
    /// Target URL, for example "http://127.0.0.1:8080/health".
    ///
    /// Only plain HTTP is supported.
    pub url: Option<String>,
    /// Total number of requests to issue.
    #[clap(short = 'n', long)]
    pub requests: Option<u64>,
    /// Maximum number of requests in flight.
    ///
    /// Defaults to the number of available CPUs.
    #[clap(short, long)]
    pub concurrency: Option<u64>,
    /// Maximum number of attempts per request, including the first one.
    ///
    /// A request is retried on transport failures and on any status other
    /// than 200.
    #[clap(short, long)]
    pub retries: Option<u32>,
    /// Pause between two attempts of the same request, in milliseconds.
    #[clap(long, value_name = "MS")]
    pub backoff: Option<u64>,
    /// Per-attempt timeout, in milliseconds.
    #[clap(long, value_name = "MS")]
    pub timeout: Option<u64>,
    /// Path to a YAML profile with default values for the options above.
    ///
    /// Options given on the command line take precedence.
    #[clap(long, value_name = "PATH")]
    pub profile: Option<PathBuf>,
    /// Print the report as JSON.
    #[clap(long)]
    pub json: bool,
    /// Be verbose in terms of logging.
    #[clap(short, action = ArgAction::Count)]
    pub verbose: u8,
}
