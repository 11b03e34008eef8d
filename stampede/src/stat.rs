use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::Serialize;

use crate::engine::Outcome;

/// HTTP status treated as success.
pub const STATUS_OK: u16 = 200;

/// Shared result accumulator.
///
/// All request tasks write into it through [`Accumulator::record`]. A single
/// lock guards every counter, so that one outcome is applied as one update
/// and `successful <= issued` holds at every instant.
#[derive(Debug, Default)]
pub struct Accumulator {
    inner: Mutex<Snapshot>,
}

/// Point-in-time copy of the accumulated counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Number of tasks that reached a terminal state.
    pub issued: u64,
    /// Number of tasks whose terminal outcome was HTTP 200.
    pub successful: u64,
    /// Number of tasks whose terminal outcome was a transport failure.
    pub errors: u64,
    /// Number of attempts made by all recorded tasks.
    pub attempts: u64,
    /// Terminal status code distribution.
    pub status_counts: BTreeMap<u16, u64>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the terminal outcome of one task.
    pub fn record(&self, outcome: &Outcome) {
        let mut inner = self.lock();

        inner.issued += 1;
        inner.attempts += u64::from(outcome.attempts);
        match outcome.status {
            Ok(code) => {
                *inner.status_counts.entry(code).or_insert(0) += 1;
                if code == STATUS_OK {
                    inner.successful += 1;
                }
            }
            Err(..) => inner.errors += 1,
        }
    }

    /// Returns a copy of the counters.
    ///
    /// Only meaningful once every writer is done.
    pub fn snapshot(&self) -> Snapshot {
        self.lock().clone()
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        // Counters are updated without panicking paths, so a poisoned lock
        // still guards consistent data.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, thread};

    use super::*;
    use crate::engine::TransportError;

    fn ok(code: u16, attempts: u32) -> Outcome {
        Outcome { status: Ok(code), attempts }
    }

    fn err(attempts: u32) -> Outcome {
        Outcome {
            status: Err(TransportError::Timeout),
            attempts,
        }
    }

    #[test]
    fn test_empty() {
        let acc = Accumulator::new();
        assert_eq!(Snapshot::default(), acc.snapshot());
    }

    #[test]
    fn test_record_mixed() {
        let acc = Accumulator::new();
        acc.record(&ok(200, 1));
        acc.record(&ok(200, 2));
        acc.record(&ok(503, 3));
        acc.record(&err(3));

        let snap = acc.snapshot();
        assert_eq!(4, snap.issued);
        assert_eq!(2, snap.successful);
        assert_eq!(1, snap.errors);
        assert_eq!(9, snap.attempts);
        assert_eq!(BTreeMap::from([(200, 2), (503, 1)]), snap.status_counts);
    }

    #[test]
    fn test_non_200_success_class_is_not_successful() {
        let acc = Accumulator::new();
        acc.record(&ok(204, 1));

        let snap = acc.snapshot();
        assert_eq!(1, snap.issued);
        assert_eq!(0, snap.successful);
        assert_eq!(Some(&1), snap.status_counts.get(&204));
    }

    #[test]
    fn test_concurrent_writers() {
        let acc = Arc::new(Accumulator::new());

        let threads: Vec<_> = (0..8)
            .map(|tid| {
                let acc = acc.clone();
                thread::spawn(move || {
                    for idx in 0..1000 {
                        match (tid + idx) % 3 {
                            0 => acc.record(&ok(200, 1)),
                            1 => acc.record(&ok(500, 2)),
                            _ => acc.record(&err(2)),
                        }
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        let snap = acc.snapshot();
        let codes: u64 = snap.status_counts.values().sum();
        assert_eq!(8000, snap.issued);
        assert_eq!(snap.issued, codes + snap.errors);
        assert_eq!(snap.successful, snap.status_counts[&200]);
        assert!(snap.successful <= snap.issued);
    }
}
