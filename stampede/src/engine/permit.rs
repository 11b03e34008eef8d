use core::{
    num::NonZero,
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
};
use std::sync::Arc;

use tokio::sync::{AcquireError, Semaphore};

/// Fixed-capacity pool of concurrency permits.
///
/// A request task must hold a [`Permit`] while it talks to the network. The
/// permit goes back to the pool when dropped, so every exit path of a task
/// returns its capacity.
#[derive(Debug)]
pub struct PermitPool {
    sem: Semaphore,
    capacity: usize,
    /// Total number of permits handed out.
    acquired: AtomicU64,
    /// Total number of permits returned.
    released: AtomicU64,
    /// Number of permits currently held.
    in_use: AtomicUsize,
    /// Maximum of `in_use` observed so far.
    peak: AtomicUsize,
}

impl PermitPool {
    pub fn new(capacity: NonZero<usize>) -> Self {
        let capacity = capacity.get().min(Semaphore::MAX_PERMITS);

        Self {
            sem: Semaphore::new(capacity),
            capacity,
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
            in_use: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Waits until a permit is free and takes it.
    ///
    /// Fails only if the pool has been closed.
    pub async fn acquire(self: &Arc<Self>) -> Result<Permit, AcquireError> {
        self.sem.acquire().await?.forget();

        self.acquired.fetch_add(1, Ordering::Relaxed);
        let in_use = self.in_use.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(in_use, Ordering::SeqCst);

        Ok(Permit { pool: self.clone() })
    }

    /// Closes the pool, failing all pending and future acquisitions.
    ///
    /// Permits already held are still returned normally.
    pub fn close(&self) {
        self.sem.close();
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of permits that can be taken right now.
    #[inline]
    pub fn available(&self) -> usize {
        self.sem.available_permits()
    }

    #[inline]
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    /// Returns the maximum number of simultaneously held permits.
    #[inline]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn release(&self) {
        // Must be decremented before the permit becomes visible to others.
        self.in_use.fetch_sub(1, Ordering::SeqCst);
        self.released.fetch_add(1, Ordering::Relaxed);
        self.sem.add_permits(1);
    }
}

/// One unit of concurrency capacity, returned to its pool on drop.
#[derive(Debug)]
pub struct Permit {
    pool: Arc<PermitPool>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.pool.release();
    }
}
