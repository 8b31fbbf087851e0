//! Two-phase start/finish handshake.
//!
//! A worker thread calls [`DoubleLatch::start_and_await_finish`] from inside
//! an index operation to announce it is in flight and then park. The test
//! thread calls [`DoubleLatch::await_start`], performs the racing call, and
//! finally [`DoubleLatch::finish`] to let the worker complete.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// How long the blocking methods wait before declaring the test broken.
pub const DEFAULT_LATCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
struct LatchState {
    started: usize,
    finished: bool,
}

/// A start latch and a finish latch sharing one lock.
#[derive(Debug)]
pub struct DoubleLatch {
    parties: usize,
    state: Mutex<LatchState>,
    changed: Condvar,
}

impl Default for DoubleLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl DoubleLatch {
    /// Creates a latch for a single worker.
    pub fn new() -> Self {
        Self::with_parties(1)
    }

    /// Creates a latch that opens its start phase after `parties` workers
    /// have called [`Self::start_and_await_finish`].
    pub fn with_parties(parties: usize) -> Self {
        Self {
            parties,
            state: Mutex::new(LatchState::default()),
            changed: Condvar::new(),
        }
    }

    /// Announces this worker has started, then waits for [`Self::finish`].
    ///
    /// # Panics
    ///
    /// Panics if `finish` is not called within [`DEFAULT_LATCH_TIMEOUT`].
    pub fn start_and_await_finish(&self) {
        assert!(
            self.try_start_and_await_finish(DEFAULT_LATCH_TIMEOUT),
            "latch was never finished"
        );
    }

    /// Like [`Self::start_and_await_finish`] but returns false on timeout.
    pub fn try_start_and_await_finish(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        state.started += 1;
        self.changed.notify_all();

        while !state.finished {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return state.finished;
            }
        }
        true
    }

    /// Waits until every worker has started.
    ///
    /// # Panics
    ///
    /// Panics if the workers do not start within [`DEFAULT_LATCH_TIMEOUT`].
    pub fn await_start(&self) {
        assert!(
            self.try_await_start(DEFAULT_LATCH_TIMEOUT),
            "latch was never started"
        );
    }

    /// Like [`Self::await_start`] but returns false on timeout.
    pub fn try_await_start(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();

        while state.started < self.parties {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return state.started >= self.parties;
            }
        }
        true
    }

    /// Releases every worker waiting in [`Self::start_and_await_finish`].
    pub fn finish(&self) {
        self.state.lock().finished = true;
        self.changed.notify_all();
    }

    /// Returns true once [`Self::finish`] has been called.
    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    /// Returns how many workers have started.
    pub fn started(&self) -> usize {
        self.state.lock().started
    }
}

/// Calls [`DoubleLatch::finish`] when dropped.
///
/// Keeps a failing assertion in the test thread from leaving the worker
/// parked until the latch timeout.
#[derive(Debug)]
pub struct FinishOnDrop<'a>(pub &'a DoubleLatch);

impl Drop for FinishOnDrop<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}
