use core::{num::NonZero, time::Duration};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use http::{uri::Scheme, Uri};
use serde::Deserialize;
use thiserror::Error;

use crate::cmd::Cmd;

const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target URL is required")]
    MissingUrl,
    #[error("invalid target URL \"{0}\"")]
    InvalidUrl(String),
    #[error("unsupported URL scheme \"{0}\", only http is supported")]
    UnsupportedScheme(String),
    #[error("target URL has no host")]
    MissingHost,
    #[error("{0} must be a positive integer")]
    NotPositive(&'static str),
    #[error("failed to read profile {path}")]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse profile {path}")]
    ProfileParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Immutable run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Target endpoint.
    pub url: Uri,
    /// Total number of requests to issue.
    pub requests: NonZero<u64>,
    /// Maximum number of requests in flight.
    pub concurrency: NonZero<usize>,
    /// Maximum number of attempts per request.
    pub max_attempts: NonZero<u32>,
    /// Fixed pause between two attempts of one request.
    pub backoff: Duration,
    /// Per-attempt timeout.
    pub timeout: Duration,
}

impl Config {
    /// Constructs a new [`Config`] with default backoff and timeout.
    pub fn new(url: Uri, requests: NonZero<u64>, concurrency: NonZero<usize>, max_attempts: NonZero<u32>) -> Self {
        Self {
            url,
            requests,
            concurrency,
            max_attempts,
            backoff: DEFAULT_BACKOFF,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[inline]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl TryFrom<Cmd> for Config {
    type Error = ConfigError;

    fn try_from(cmd: Cmd) -> Result<Self, Self::Error> {
        let profile = match &cmd.profile {
            Some(path) => Profile::from_fs(path)?,
            None => Profile::default(),
        };

        let url = cmd.url.or(profile.url).ok_or(ConfigError::MissingUrl)?;
        let url = parse_url(&url)?;

        let requests = cmd.requests.or(profile.requests).unwrap_or(0);
        let requests = NonZero::new(requests).ok_or(ConfigError::NotPositive("requests"))?;

        let concurrency = match cmd.concurrency.or(profile.concurrency) {
            Some(v) => usize::try_from(v)
                .ok()
                .and_then(NonZero::new)
                .ok_or(ConfigError::NotPositive("concurrency"))?,
            None => std::thread::available_parallelism().unwrap_or(NonZero::<usize>::MIN),
        };

        let max_attempts = cmd.retries.or(profile.retries).unwrap_or(1);
        let max_attempts = NonZero::new(max_attempts).ok_or(ConfigError::NotPositive("retries"))?;

        let backoff = cmd
            .backoff
            .or(profile.backoff_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BACKOFF);
        let timeout = cmd
            .timeout
            .or(profile.timeout_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT);

        let m = Self {
            url,
            requests,
            concurrency,
            max_attempts,
            backoff,
            timeout,
        };

        Ok(m)
    }
}

/// Checks that the given string is an absolute plain HTTP URL.
pub fn parse_url(url: &str) -> Result<Uri, ConfigError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ConfigError::MissingUrl);
    }

    let uri: Uri = url.parse().map_err(|_| ConfigError::InvalidUrl(url.to_string()))?;

    match uri.scheme() {
        Some(scheme) if *scheme == Scheme::HTTP => {}
        Some(scheme) => return Err(ConfigError::UnsupportedScheme(scheme.to_string())),
        None => return Err(ConfigError::InvalidUrl(url.to_string())),
    }
    if uri.host().is_none_or(str::is_empty) {
        return Err(ConfigError::MissingHost);
    }

    Ok(uri)
}

/// Run defaults loaded from a YAML file.
///
/// ```yaml
/// url: http://127.0.0.1:8080/
/// requests: 1000
/// concurrency: 32
/// retries: 3
/// backoff_ms: 50
/// timeout_ms: 2000
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Profile {
    url: Option<String>,
    requests: Option<u64>,
    concurrency: Option<u64>,
    retries: Option<u32>,
    backoff_ms: Option<u64>,
    timeout_ms: Option<u64>,
}

impl Profile {
    fn from_fs<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| ConfigError::ProfileRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml::from_slice(&data).map_err(|source| ConfigError::ProfileParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
