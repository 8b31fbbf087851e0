//! Stress tests for guarded indexes.
//!
//! These drive one guard from many threads at once. Each call either reaches
//! the index, is rejected by the guard, or fails inside the index; a correct
//! guard never lets two calls overlap no matter how the threads interleave.

use indexguard_core::{ContractCheckingProxy, GuardError, IndexProxy, IndexUpdate, Operation};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total calls made.
    pub total_ops: usize,
    /// Calls forwarded to the index that succeeded.
    pub forwarded_ops: usize,
    /// Calls the guard rejected.
    pub rejected_ops: usize,
    /// Calls forwarded to the index that failed there.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Calls per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(forwarded: usize, rejected: usize, failed: usize, duration: Duration) -> Self {
        let total = forwarded + rejected + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            forwarded_ops: forwarded,
            rejected_ops: rejected,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent threads.
    pub threads: usize,
    /// Calls made by each thread.
    pub operations_per_thread: usize,
    /// Change records in each update batch.
    pub batch_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            operations_per_thread: 1_000,
            batch_size: 8,
        }
    }
}

#[derive(Default)]
struct Tally {
    forwarded: AtomicUsize,
    rejected: AtomicUsize,
    failed: AtomicUsize,
}

impl Tally {
    fn record<E>(&self, result: Result<(), GuardError<E>>) {
        let counter = match result {
            Ok(()) => &self.forwarded,
            Err(GuardError::Contract(_)) => &self.rejected,
            Err(GuardError::Resource(_)) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(&self, start: Instant) -> StressTestResult {
        StressTestResult::new(
            self.forwarded.load(Ordering::Relaxed),
            self.rejected.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
            start.elapsed(),
        )
    }
}

fn batch(thread: usize, call: usize, size: usize) -> Vec<IndexUpdate> {
    (0..size)
        .map(|i| IndexUpdate::added((thread * 1_000_000 + call * size + i) as u64, [i as u8]))
        .collect()
}

/// Hammers an online guard with concurrent updates and forces.
///
/// Every thread alternates `update` and `force`. Returns the tally; calls
/// that lose the race for the gate show up as rejections.
pub fn stress_concurrent_operations<P: IndexProxy + 'static>(
    guard: Arc<ContractCheckingProxy<P>>,
    config: &StressConfig,
) -> StressTestResult {
    let tally = Arc::new(Tally::default());
    let barrier = Arc::new(Barrier::new(config.threads));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let guard = Arc::clone(&guard);
            let tally = Arc::clone(&tally);
            let barrier = Arc::clone(&barrier);
            let config = config.clone();

            thread::spawn(move || {
                barrier.wait();
                for i in 0..config.operations_per_thread {
                    let result = if i % 2 == 0 {
                        guard.update(&batch(t, i, config.batch_size))
                    } else {
                        guard.force()
                    };
                    tally.record(result);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    tally.finish(start)
}

/// Races every thread to make the same lifecycle call once.
///
/// Against a guard in the operation's required state, exactly one call may
/// be forwarded; every other thread must be rejected.
pub fn stress_lifecycle_race<P: IndexProxy + 'static>(
    guard: Arc<ContractCheckingProxy<P>>,
    operation: Operation,
    threads: usize,
) -> StressTestResult {
    let tally = Arc::new(Tally::default());
    let barrier = Arc::new(Barrier::new(threads));
    let start = Instant::now();

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let guard = Arc::clone(&guard);
            let tally = Arc::clone(&tally);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                let result = match operation {
                    Operation::Create => guard.create(),
                    Operation::Update => guard.update(&[]),
                    Operation::Force => guard.force(),
                    Operation::Close => guard.close(),
                    Operation::Drop => guard.drop_index(),
                };
                tally.record(result);
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    tally.finish(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxies::RecordingProxy;
    use indexguard_core::LifecycleState;

    fn online(proxy: Arc<RecordingProxy>) -> Arc<ContractCheckingProxy<Arc<RecordingProxy>>> {
        let guard = Arc::new(ContractCheckingProxy::new(proxy));
        guard.create().unwrap();
        guard
    }

    #[test]
    fn test_concurrent_operations_never_overlap() {
        let proxy = Arc::new(RecordingProxy::with_dwell(Duration::from_micros(50)));
        let guard = online(Arc::clone(&proxy));
        let config = StressConfig {
            threads: 4,
            operations_per_thread: 200,
            batch_size: 4,
        };

        let result = stress_concurrent_operations(Arc::clone(&guard), &config);

        assert_eq!(result.total_ops, 800);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(proxy.peak_concurrency(), 1);
        // Create plus everything that got through.
        assert_eq!(proxy.calls().len(), result.forwarded_ops + 1);
        assert_eq!(guard.state(), LifecycleState::Online);

        let snap = guard.stats().snapshot();
        assert_eq!(snap.in_progress_rejections as usize, result.rejected_ops);
    }

    #[test]
    fn test_single_thread_is_never_rejected() {
        let proxy = Arc::new(RecordingProxy::new());
        let guard = online(proxy);
        let config = StressConfig {
            threads: 1,
            operations_per_thread: 100,
            batch_size: 2,
        };

        let result = stress_concurrent_operations(guard, &config);
        assert_eq!(result.forwarded_ops, 100);
        assert_eq!(result.rejected_ops, 0);
    }

    #[test]
    fn test_create_race_has_one_winner() {
        let proxy = Arc::new(RecordingProxy::with_dwell(Duration::from_millis(5)));
        let guard = Arc::new(ContractCheckingProxy::new(Arc::clone(&proxy)));

        let result = stress_lifecycle_race(Arc::clone(&guard), Operation::Create, 8);

        assert_eq!(result.forwarded_ops, 1);
        assert_eq!(result.rejected_ops, 7);
        assert_eq!(proxy.call_count(Operation::Create), 1);
        assert_eq!(guard.state(), LifecycleState::Online);
    }

    #[test]
    fn test_close_race_has_one_winner() {
        let proxy = Arc::new(RecordingProxy::with_dwell(Duration::from_millis(5)));
        let guard = online(Arc::clone(&proxy));

        let result = stress_lifecycle_race(Arc::clone(&guard), Operation::Close, 8);

        assert_eq!(result.forwarded_ops, 1);
        assert_eq!(result.rejected_ops, 7);
        assert_eq!(proxy.call_count(Operation::Close), 1);
        assert_eq!(guard.state(), LifecycleState::Closed);
    }
}
