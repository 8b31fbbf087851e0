//! Scripted index handles for exercising a guard.

use crate::latch::DoubleLatch;
use indexguard_core::{IndexError, IndexProxy, IndexUpdate, NoopIndexProxy, Operation};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Parks one chosen operation on a [`DoubleLatch`] before delegating.
///
/// Every other operation is delegated straight away.
#[derive(Debug)]
pub struct BlockingProxy<P: IndexProxy = NoopIndexProxy> {
    inner: P,
    blocked: Operation,
    latch: Arc<DoubleLatch>,
}

impl BlockingProxy<NoopIndexProxy> {
    /// Blocks `blocked` on `latch`; every call otherwise succeeds.
    pub fn noop(blocked: Operation, latch: Arc<DoubleLatch>) -> Self {
        Self::new(NoopIndexProxy::new(), blocked, latch)
    }
}

impl<P: IndexProxy> BlockingProxy<P> {
    /// Wraps `inner`, blocking `blocked` on `latch`.
    pub fn new(inner: P, blocked: Operation, latch: Arc<DoubleLatch>) -> Self {
        Self {
            inner,
            blocked,
            latch,
        }
    }

    fn gate(&self, operation: Operation) {
        if operation == self.blocked {
            self.latch.start_and_await_finish();
        }
    }
}

impl<P: IndexProxy> IndexProxy for BlockingProxy<P> {
    type Error = P::Error;

    fn create(&self) -> Result<(), P::Error> {
        self.gate(Operation::Create);
        self.inner.create()
    }

    fn update(&self, updates: &[IndexUpdate]) -> Result<(), P::Error> {
        self.gate(Operation::Update);
        self.inner.update(updates)
    }

    fn force(&self) -> Result<(), P::Error> {
        self.gate(Operation::Force);
        self.inner.force()
    }

    fn close(&self) -> Result<(), P::Error> {
        self.gate(Operation::Close);
        self.inner.close()
    }

    fn drop_index(&self) -> Result<(), P::Error> {
        self.gate(Operation::Drop);
        self.inner.drop_index()
    }
}

/// Fails the operations it is told to fail; succeeds otherwise.
#[derive(Debug, Default)]
pub struct FailingProxy {
    failing: Mutex<HashSet<Operation>>,
    calls: AtomicUsize,
}

impl FailingProxy {
    /// Creates a handle that fails nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handle that fails `operations`.
    pub fn failing(operations: &[Operation]) -> Self {
        let proxy = Self::new();
        for operation in operations {
            proxy.fail_on(*operation);
        }
        proxy
    }

    /// Makes `operation` fail from now on.
    pub fn fail_on(&self, operation: Operation) {
        self.failing.lock().insert(operation);
    }

    /// Makes `operation` succeed from now on.
    pub fn succeed_on(&self, operation: Operation) {
        self.failing.lock().remove(&operation);
    }

    /// Returns how many calls reached this handle.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn call(&self, operation: Operation) -> Result<(), IndexError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().contains(&operation) {
            Err(IndexError::failed(format!("injected {operation} failure")))
        } else {
            Ok(())
        }
    }
}

impl IndexProxy for FailingProxy {
    type Error = IndexError;

    fn create(&self) -> Result<(), IndexError> {
        self.call(Operation::Create)
    }

    fn update(&self, _updates: &[IndexUpdate]) -> Result<(), IndexError> {
        self.call(Operation::Update)
    }

    fn force(&self) -> Result<(), IndexError> {
        self.call(Operation::Force)
    }

    fn close(&self) -> Result<(), IndexError> {
        self.call(Operation::Close)
    }

    fn drop_index(&self) -> Result<(), IndexError> {
        self.call(Operation::Drop)
    }
}

/// Records every call and the peak number of calls running at once.
///
/// A peak above one behind a guard means the guard let two calls overlap.
#[derive(Debug, Default)]
pub struct RecordingProxy {
    log: Mutex<Vec<Operation>>,
    update_records: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    /// Time spent inside each call, to widen race windows.
    dwell: Duration,
}

impl RecordingProxy {
    /// Creates a handle whose calls return immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handle whose calls each sleep for `dwell`.
    pub fn with_dwell(dwell: Duration) -> Self {
        Self {
            dwell,
            ..Self::default()
        }
    }

    /// Returns the calls received, in order.
    pub fn calls(&self) -> Vec<Operation> {
        self.log.lock().clone()
    }

    /// Returns how many calls of `operation` were received.
    pub fn call_count(&self, operation: Operation) -> usize {
        self.log.lock().iter().filter(|op| **op == operation).count()
    }

    /// Returns the total number of change records received by `update`.
    pub fn update_records(&self) -> usize {
        self.update_records.load(Ordering::SeqCst)
    }

    /// Returns the most calls ever observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn call(&self, operation: Operation) -> Result<(), IndexError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.log.lock().push(operation);
        if !self.dwell.is_zero() {
            thread::sleep(self.dwell);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

impl IndexProxy for RecordingProxy {
    type Error = IndexError;

    fn create(&self) -> Result<(), IndexError> {
        self.call(Operation::Create)
    }

    fn update(&self, updates: &[IndexUpdate]) -> Result<(), IndexError> {
        self.update_records.fetch_add(updates.len(), Ordering::SeqCst);
        self.call(Operation::Update)
    }

    fn force(&self) -> Result<(), IndexError> {
        self.call(Operation::Force)
    }

    fn close(&self) -> Result<(), IndexError> {
        self.call(Operation::Close)
    }

    fn drop_index(&self) -> Result<(), IndexError> {
        self.call(Operation::Drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_proxy_fails_chosen_operations() {
        let proxy = FailingProxy::failing(&[Operation::Force]);
        assert!(proxy.create().is_ok());
        assert!(matches!(proxy.force(), Err(IndexError::Failed { .. })));

        proxy.succeed_on(Operation::Force);
        assert!(proxy.force().is_ok());
        assert_eq!(proxy.calls(), 3);
    }

    #[test]
    fn recording_proxy_logs_calls() {
        let proxy = RecordingProxy::new();
        proxy.create().unwrap();
        proxy
            .update(&[IndexUpdate::added(1, "a"), IndexUpdate::added(2, "b")])
            .unwrap();
        proxy.close().unwrap();

        assert_eq!(
            proxy.calls(),
            vec![Operation::Create, Operation::Update, Operation::Close]
        );
        assert_eq!(proxy.call_count(Operation::Update), 1);
        assert_eq!(proxy.update_records(), 2);
        assert_eq!(proxy.peak_concurrency(), 1);
    }

    #[test]
    fn blocking_proxy_parks_only_the_chosen_operation() {
        let latch = Arc::new(DoubleLatch::new());
        let proxy = Arc::new(BlockingProxy::noop(Operation::Force, Arc::clone(&latch)));

        proxy.create().unwrap();
        assert_eq!(latch.started(), 0);

        let worker = {
            let proxy = Arc::clone(&proxy);
            thread::spawn(move || proxy.force())
        };
        latch.await_start();
        latch.finish();
        worker.join().unwrap().unwrap();
    }
}
