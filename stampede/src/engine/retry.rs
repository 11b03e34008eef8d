use core::{num::NonZero, time::Duration};

use http::Uri;

use super::{Outcome, Transport, TransportError};
use crate::stat::STATUS_OK;

/// Per-request retry policy.
///
/// Performs up to `max_attempts` attempts, pausing for a fixed `backoff`
/// between them. The first HTTP 200 wins, otherwise the last attempt decides.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: NonZero<u32>,
    backoff: Duration,
    timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: NonZero<u32>, backoff: Duration, timeout: Duration) -> Self {
        Self { max_attempts, backoff, timeout }
    }

    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.get()
    }

    /// Drives one request to its terminal outcome.
    pub async fn execute<T>(&self, transport: &T, uri: &Uri) -> Outcome
    where
        T: Transport,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;
            let status = self.attempt(transport, uri).await;

            if matches!(status, Ok(STATUS_OK)) || attempts >= self.max_attempts.get() {
                return Outcome { status, attempts };
            }

            match &status {
                Ok(code) => log::debug!("attempt {attempts}: status {code}, retrying"),
                Err(err) => log::debug!("attempt {attempts}: {err}, retrying"),
            }

            tokio::time::sleep(self.backoff).await;
        }
    }

    #[inline]
    async fn attempt<T>(&self, transport: &T, uri: &Uri) -> Result<u16, TransportError>
    where
        T: Transport,
    {
        match tokio::time::timeout(self.timeout, transport.get(uri)).await {
            Ok(rc) => rc,
            Err(..) => Err(TransportError::Timeout),
        }
    }
}

#[cfg(test)]
mod test {
    use core::{
        future,
        sync::atomic::{AtomicU32, Ordering},
    };
    use std::{io, time::Instant};

    use super::*;

    /// Replays a fixed script of attempt results, repeating the last one.
    #[derive(Debug)]
    struct Scripted {
        script: Vec<Option<u16>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(script: Vec<Option<u16>>) -> Self {
            Self { script, calls: AtomicU32::new(0) }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Transport for Scripted {
        async fn get(&self, _uri: &Uri) -> Result<u16, TransportError> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            let idx = idx.min(self.script.len() - 1);

            self.script[idx].ok_or_else(|| TransportError::Io(io::ErrorKind::ConnectionReset.into()))
        }
    }

    #[derive(Debug)]
    struct Hang;

    impl Transport for Hang {
        async fn get(&self, _uri: &Uri) -> Result<u16, TransportError> {
            future::pending().await
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            NonZero::new(max_attempts).unwrap(),
            Duration::from_millis(1),
            Duration::from_secs(1),
        )
    }

    fn uri() -> Uri {
        Uri::from_static("http://localhost/")
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let transport = Scripted::new(vec![Some(200)]);
        let outcome = policy(3).execute(&transport, &uri()).await;

        assert!(outcome.is_success());
        assert_eq!(1, outcome.attempts);
        assert_eq!(1, transport.calls());
    }

    #[tokio::test]
    async fn test_exhausted_non_success() {
        let transport = Scripted::new(vec![Some(503)]);
        let outcome = policy(3).execute(&transport, &uri()).await;

        assert!(matches!(outcome.status, Ok(503)));
        assert_eq!(3, outcome.attempts);
        assert_eq!(3, transport.calls());
    }

    #[tokio::test]
    async fn test_success_on_last_attempt() {
        let transport = Scripted::new(vec![None, Some(500), Some(200)]);
        let outcome = policy(3).execute(&transport, &uri()).await;

        assert!(matches!(outcome.status, Ok(200)));
        assert_eq!(3, outcome.attempts);
    }

    #[tokio::test]
    async fn test_terminal_transport_error() {
        let transport = Scripted::new(vec![Some(500), None]);
        let outcome = policy(2).execute(&transport, &uri()).await;

        assert!(matches!(outcome.status, Err(TransportError::Io(..))));
        assert_eq!(2, outcome.attempts);
    }

    #[tokio::test]
    async fn test_single_attempt_never_retries() {
        let transport = Scripted::new(vec![Some(404), Some(200)]);
        let outcome = policy(1).execute(&transport, &uri()).await;

        assert!(matches!(outcome.status, Ok(404)));
        assert_eq!(1, outcome.attempts);
        assert_eq!(1, transport.calls());
    }

    #[tokio::test]
    async fn test_no_backoff_after_success() {
        let transport = Scripted::new(vec![Some(200)]);
        let policy = RetryPolicy::new(NonZero::new(5).unwrap(), Duration::from_secs(30), Duration::from_secs(1));

        let now = Instant::now();
        let outcome = policy.execute(&transport, &uri()).await;

        assert!(outcome.is_success());
        assert!(now.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let policy = RetryPolicy::new(NonZero::new(2).unwrap(), Duration::ZERO, Duration::from_millis(10));
        let outcome = policy.execute(&Hang, &uri()).await;

        assert!(matches!(outcome.status, Err(TransportError::Timeout)));
        assert_eq!(2, outcome.attempts);
    }
}
