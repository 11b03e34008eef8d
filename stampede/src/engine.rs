use core::future::Future;
use std::{io, sync::Arc, time::Instant};

use http::Uri;
use thiserror::Error;

pub use self::{
    client::HttpTransport,
    dispatch::{Dispatcher, Job},
    permit::{Permit, PermitPool},
    retry::RetryPolicy,
};
use crate::{cfg::Config, report::Report, stat::Accumulator};

mod client;
mod dispatch;
mod permit;
mod retry;

/// Failure to obtain any response for one attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid target: {0}")]
    InvalidTarget(&'static str),
    #[error("failed to connect: {0}")]
    Connect(#[source] io::Error),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid request: {0}")]
    Request(#[from] http::Error),
    #[error("http error: {0}")]
    Http(#[from] hyper::Error),
    #[error("timed out")]
    Timeout,
    #[error("cancelled")]
    Cancelled,
}

/// Single request/response primitive the engine drives.
pub trait Transport: Send + Sync + 'static {
    /// Performs a single GET and returns the response status code.
    fn get(&self, uri: &Uri) -> impl Future<Output = Result<u16, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    #[inline]
    fn get(&self, uri: &Uri) -> impl Future<Output = Result<u16, TransportError>> + Send {
        T::get(self, uri)
    }
}

/// Terminal outcome of one request task.
#[derive(Debug)]
pub struct Outcome {
    /// Status code of the deciding attempt, or why it failed.
    pub status: Result<u16, TransportError>,
    /// Number of attempts made, including the deciding one.
    pub attempts: u32,
}

impl Outcome {
    /// Outcome of a task that never got to make an attempt.
    #[inline]
    pub fn cancelled() -> Self {
        Self {
            status: Err(TransportError::Cancelled),
            attempts: 0,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self.status, Ok(crate::stat::STATUS_OK))
    }
}

/// Run coordinator.
///
/// Drives one full pass of the configured number of requests and collects
/// the report once every request task is done.
#[derive(Debug)]
pub struct Runtime<T> {
    cfg: Config,
    transport: T,
}

impl Runtime<HttpTransport> {
    pub fn new(cfg: Config) -> Self {
        Self::with_transport(cfg, HttpTransport::new())
    }
}

impl<T> Runtime<T>
where
    T: Transport,
{
    pub fn with_transport(cfg: Config, transport: T) -> Self {
        Self { cfg, transport }
    }

    pub async fn run(self) -> Report {
        let Self { cfg, transport } = self;

        log::info!(
            "running {} requests against {} with concurrency {}",
            cfg.requests,
            cfg.url,
            cfg.concurrency
        );

        let policy = RetryPolicy::new(cfg.max_attempts, cfg.backoff, cfg.timeout);
        let job = Arc::new(Job::new(transport, policy, cfg.url));
        let acc = Arc::new(Accumulator::new());
        let dispatcher = Dispatcher::new(cfg.concurrency);

        let now = Instant::now();
        dispatcher.dispatch(cfg.requests.get(), job, acc.clone()).await;
        let elapsed = now.elapsed();

        log::debug!("all requests done in {elapsed:?}, peak in flight: {}", dispatcher.pool().peak());

        Report::new(elapsed, acc.snapshot())
    }
}

/// Issues the configured requests over plain HTTP and returns the report.
pub async fn run_load(cfg: Config) -> Report {
    Runtime::new(cfg).run().await
}
