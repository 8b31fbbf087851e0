//! Races between an operation held in flight and a conflicting call.
//!
//! Each test parks one operation inside the index with a `DoubleLatch`, makes
//! the conflicting call from the test thread, and checks it fails right away.

use indexguard_core::{
    ContractCheckingProxy, ContractViolation, GuardError, IndexError, IndexProxy, LifecycleState,
    Operation,
};
use indexguard_testkit::{
    init_test_logging, run_in_separate_thread, BlockingProxy, DoubleLatch, FinishOnDrop,
};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

type Guard = ContractCheckingProxy<BlockingProxy>;

/// A call made while another holds the gate must not wait for it.
const FAIL_FAST: Duration = Duration::from_secs(1);

fn blocking_guard(blocked: Operation) -> (Arc<DoubleLatch>, Arc<Guard>) {
    init_test_logging();
    let latch = Arc::new(DoubleLatch::new());
    let guard = Arc::new(ContractCheckingProxy::new(BlockingProxy::noop(
        blocked,
        Arc::clone(&latch),
    )));
    (latch, guard)
}

fn in_flight<F>(guard: &Arc<Guard>, call: F) -> JoinHandle<Result<(), GuardError<IndexError>>>
where
    F: FnOnce(&Guard) -> Result<(), GuardError<IndexError>> + Send + 'static,
{
    let guard = Arc::clone(guard);
    run_in_separate_thread(move || call(&guard))
}

fn assert_races(
    result: Result<(), GuardError<IndexError>>,
    operation: Operation,
    holder: Operation,
) {
    match result {
        Err(GuardError::Contract(ContractViolation::OperationInProgress {
            operation: rejected,
            in_flight,
            ..
        })) => {
            assert_eq!(rejected, operation);
            assert_eq!(in_flight, Some(holder));
        }
        Err(GuardError::Contract(ContractViolation::IllegalState {
            operation: rejected,
            state,
            ..
        })) => {
            // Create, close and drop publish their transient state before
            // the index is called, so the unlocked check may see it first.
            assert_eq!(rejected, operation);
            assert!(state.is_transient(), "unexpected state {state}");
        }
        other => panic!("expected {operation} to race {holder}, got {other:?}"),
    }
}

#[test]
fn should_not_close_while_creating() {
    let (latch, guard) = blocking_guard(Operation::Create);
    let creator = in_flight(&guard, |g| g.create());

    {
        let _finish = FinishOnDrop(&latch);
        latch.await_start();
        assert_eq!(guard.state(), LifecycleState::Creating);

        let started = Instant::now();
        assert_races(guard.close(), Operation::Close, Operation::Create);
        assert!(started.elapsed() < FAIL_FAST);
    }

    creator.join().unwrap().unwrap();
    assert_eq!(guard.state(), LifecycleState::Online);
}

#[test]
fn should_not_drop_while_creating() {
    let (latch, guard) = blocking_guard(Operation::Create);
    let creator = in_flight(&guard, |g| g.create());

    {
        let _finish = FinishOnDrop(&latch);
        latch.await_start();

        let started = Instant::now();
        assert_races(guard.drop_index(), Operation::Drop, Operation::Create);
        assert!(started.elapsed() < FAIL_FAST);
    }

    creator.join().unwrap().unwrap();
    assert_eq!(guard.state(), LifecycleState::Online);
}

#[test]
fn should_not_close_while_updating() {
    let (latch, guard) = blocking_guard(Operation::Update);
    guard.create().unwrap();
    let updater = in_flight(&guard, |g| g.update(&[]));

    {
        let _finish = FinishOnDrop(&latch);
        latch.await_start();
        assert_eq!(guard.in_flight(), Some(Operation::Update));

        let started = Instant::now();
        assert_races(guard.close(), Operation::Close, Operation::Update);
        assert!(started.elapsed() < FAIL_FAST);
    }

    updater.join().unwrap().unwrap();
    guard.close().unwrap();
    assert_eq!(guard.state(), LifecycleState::Closed);
}

#[test]
fn should_not_close_while_forcing() {
    let (latch, guard) = blocking_guard(Operation::Force);
    guard.create().unwrap();
    let forcer = in_flight(&guard, |g| g.force());

    {
        let _finish = FinishOnDrop(&latch);
        latch.await_start();

        let started = Instant::now();
        assert_races(guard.close(), Operation::Close, Operation::Force);
        assert!(started.elapsed() < FAIL_FAST);
    }

    forcer.join().unwrap().unwrap();
    guard.close().unwrap();
    assert_eq!(guard.state(), LifecycleState::Closed);
}

#[test]
fn should_not_drop_while_updating() {
    let (latch, guard) = blocking_guard(Operation::Update);
    guard.create().unwrap();
    let updater = in_flight(&guard, |g| g.update(&[]));

    {
        let _finish = FinishOnDrop(&latch);
        latch.await_start();
        assert_races(guard.drop_index(), Operation::Drop, Operation::Update);
    }

    updater.join().unwrap().unwrap();
    guard.drop_index().unwrap();
    assert_eq!(guard.state(), LifecycleState::Dropped);
}

#[test]
fn updates_are_exclusive_with_each_other() {
    let (latch, guard) = blocking_guard(Operation::Update);
    guard.create().unwrap();
    let updater = in_flight(&guard, |g| g.update(&[]));

    {
        let _finish = FinishOnDrop(&latch);
        latch.await_start();
        assert_races(guard.update(&[]), Operation::Update, Operation::Update);
        assert_races(guard.force(), Operation::Force, Operation::Update);
    }

    updater.join().unwrap().unwrap();
    guard.update(&[]).unwrap();
}

#[test]
fn should_not_update_while_closing() {
    let (latch, guard) = blocking_guard(Operation::Close);
    guard.create().unwrap();
    let closer = in_flight(&guard, |g| g.close());

    {
        let _finish = FinishOnDrop(&latch);
        latch.await_start();
        assert_eq!(guard.state(), LifecycleState::Closing);
        assert_races(guard.update(&[]), Operation::Update, Operation::Close);
        assert_races(guard.force(), Operation::Force, Operation::Close);
        assert_races(guard.drop_index(), Operation::Drop, Operation::Close);
    }

    closer.join().unwrap().unwrap();
    assert_eq!(guard.state(), LifecycleState::Closed);
}

#[test]
fn should_not_create_while_creating() {
    let (latch, guard) = blocking_guard(Operation::Create);
    let creator = in_flight(&guard, |g| g.create());

    {
        let _finish = FinishOnDrop(&latch);
        latch.await_start();
        assert_races(guard.create(), Operation::Create, Operation::Create);
    }

    creator.join().unwrap().unwrap();
    assert_eq!(guard.stats().snapshot().creates, 1);
}

#[test]
fn rejected_racer_does_not_disturb_holder() {
    let (latch, guard) = blocking_guard(Operation::Force);
    guard.create().unwrap();
    let forcer = in_flight(&guard, |g| g.force());

    {
        let _finish = FinishOnDrop(&latch);
        latch.await_start();
        for _ in 0..10 {
            assert!(guard.close().unwrap_err().is_contract_violation());
        }
        assert_eq!(guard.in_flight(), Some(Operation::Force));
        assert_eq!(guard.state(), LifecycleState::Online);
    }

    forcer.join().unwrap().unwrap();
    assert_eq!(guard.in_flight(), None);
    assert_eq!(guard.stats().in_progress_rejections(), 10);
}
