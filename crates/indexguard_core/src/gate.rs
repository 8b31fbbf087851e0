//! Non-blocking exclusive gate.
//!
//! At most one forwarded operation holds the gate at a time. Acquisition is
//! try-once: a caller that finds the gate held gets `None` back immediately
//! and never waits. The gate is released when the [`GatePass`] drops, which
//! also happens while unwinding from a panic inside the forwarded call.

use crate::state::Operation;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU8, Ordering};

const NO_HOLDER: u8 = 0;

/// A binary exclusive-ownership token.
#[derive(Debug, Default)]
pub struct Gate {
    lock: Mutex<()>,
    /// Operation code of the current holder, for diagnostics only.
    holder: AtomicU8,
}

impl Gate {
    /// Creates an open gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tries to take the gate for `operation` without blocking.
    ///
    /// Returns `None` if another operation holds it.
    pub fn try_acquire(&self, operation: Operation) -> Option<GatePass<'_>> {
        let guard = self.lock.try_lock()?;
        self.holder.store(operation as u8, Ordering::Release);
        Some(GatePass {
            operation,
            holder: &self.holder,
            _guard: guard,
        })
    }

    /// Returns the operation currently holding the gate.
    ///
    /// Racy by nature: the answer may be stale by the time it is read. Use
    /// for diagnostics, never for decisions.
    pub fn holder(&self) -> Option<Operation> {
        Operation::from_u8(self.holder.load(Ordering::Acquire))
    }

    /// Returns true if some operation currently holds the gate.
    pub fn is_held(&self) -> bool {
        self.lock.is_locked()
    }
}

/// Proof of holding the gate. Dropping it opens the gate.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the pass is dropped"]
pub struct GatePass<'a> {
    operation: Operation,
    holder: &'a AtomicU8,
    _guard: MutexGuard<'a, ()>,
}

impl GatePass<'_> {
    /// Returns the operation this pass was issued for.
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

impl Drop for GatePass<'_> {
    fn drop(&mut self) {
        // Cleared before `_guard` releases the mutex.
        self.holder.store(NO_HOLDER, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn gate_starts_open() {
        let gate = Gate::new();
        assert!(!gate.is_held());
        assert_eq!(gate.holder(), None);
    }

    #[test]
    fn second_acquire_fails_while_held() {
        let gate = Gate::new();
        let pass = gate.try_acquire(Operation::Update).unwrap();
        assert_eq!(pass.operation(), Operation::Update);
        assert!(gate.is_held());
        assert_eq!(gate.holder(), Some(Operation::Update));

        assert!(gate.try_acquire(Operation::Close).is_none());
        assert!(gate.try_acquire(Operation::Update).is_none());

        drop(pass);
        assert!(!gate.is_held());
        assert_eq!(gate.holder(), None);
        assert!(gate.try_acquire(Operation::Close).is_some());
    }

    #[test]
    fn pass_is_released_on_panic() {
        let gate = Gate::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _pass = gate.try_acquire(Operation::Force).unwrap();
            panic!("index blew up");
        }));

        assert!(result.is_err());
        assert!(!gate.is_held());
        assert!(gate.try_acquire(Operation::Force).is_some());
    }

    #[test]
    fn acquire_from_other_thread_fails_fast() {
        let gate = Arc::new(Gate::new());
        let _pass = gate.try_acquire(Operation::Create).unwrap();

        let other = Arc::clone(&gate);
        let acquired = thread::spawn(move || other.try_acquire(Operation::Drop).is_some())
            .join()
            .unwrap();

        assert!(!acquired);
    }

    #[test]
    fn concurrent_acquires_never_overlap() {
        use std::sync::atomic::AtomicUsize;

        let gate = Arc::new(Gate::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let inside = Arc::clone(&inside);
                let overlaps = Arc::clone(&overlaps);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        if let Some(_pass) = gate.try_acquire(Operation::Update) {
                            if inside.fetch_add(1, Ordering::SeqCst) != 0 {
                                overlaps.fetch_add(1, Ordering::SeqCst);
                            }
                            inside.fetch_sub(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }
}
