use core::num::NonZero;
use std::sync::Arc;

use http::Uri;
use tokio::task::JoinSet;

use super::{Outcome, PermitPool, RetryPolicy, Transport};
use crate::stat::Accumulator;

/// What every request task does: the transport, the retry policy and the
/// target they share.
#[derive(Debug)]
pub struct Job<T> {
    transport: T,
    policy: RetryPolicy,
    uri: Uri,
}

impl<T> Job<T>
where
    T: Transport,
{
    pub fn new(transport: T, policy: RetryPolicy, uri: Uri) -> Self {
        Self { transport, policy, uri }
    }

    #[inline]
    async fn execute(&self) -> Outcome {
        self.policy.execute(&self.transport, &self.uri).await
    }
}

/// Bounded dispatcher.
///
/// Launches all request tasks at once and lets at most `concurrency` of them
/// work at the same time. A task takes its permit before the first attempt
/// and keeps it until its terminal outcome is recorded, backoff pauses
/// included.
#[derive(Debug)]
pub struct Dispatcher {
    pool: Arc<PermitPool>,
}

impl Dispatcher {
    pub fn new(concurrency: NonZero<usize>) -> Self {
        let pool = Arc::new(PermitPool::new(concurrency));

        Self { pool }
    }

    #[inline]
    pub fn pool(&self) -> &Arc<PermitPool> {
        &self.pool
    }

    /// Runs `requests` tasks to completion.
    ///
    /// Returns only after every task has recorded its terminal outcome into
    /// `acc`.
    pub async fn dispatch<T>(&self, requests: u64, job: Arc<Job<T>>, acc: Arc<Accumulator>)
    where
        T: Transport,
    {
        let mut tasks = JoinSet::new();

        for _ in 0..requests {
            let pool = self.pool.clone();
            let job = job.clone();
            let acc = acc.clone();

            tasks.spawn(async move {
                match pool.acquire().await {
                    Ok(_permit) => acc.record(&job.execute().await),
                    Err(..) => acc.record(&Outcome::cancelled()),
                }
            });
        }

        while let Some(rc) = tasks.join_next().await {
            if let Err(err) = rc {
                log::error!("request task failed: {err}");
            }
        }
    }
}
