//! The lifecycle guard.
//!
//! [`ContractCheckingProxy`] wraps one index handle for its whole life and
//! forwards the five lifecycle operations only when they are legal:
//!
//! | Operation | Required state | State after success |
//! |-----------|----------------|---------------------|
//! | create    | Uninitialized  | Online              |
//! | update    | Online         | Online              |
//! | force     | Online         | Online              |
//! | close     | Online         | Closed              |
//! | drop      | Online         | Dropped             |
//!
//! Every forwarded call also holds the [`Gate`], so no two calls of any kind
//! ever run inside the index at the same time. A call that finds the gate
//! held fails at once with [`ContractViolation::OperationInProgress`]; the
//! guard never waits for another caller. Callers that need to serialize
//! their own calls must do so themselves.

use crate::config::{FailurePolicy, GuardConfig};
use crate::error::{ContractViolation, GuardError, GuardResult};
use crate::gate::{Gate, GatePass};
use crate::proxy::IndexProxy;
use crate::state::{AtomicLifecycleState, LifecycleState, Operation};
use crate::stats::GuardStats;
use crate::update::IndexUpdate;
use std::fmt;

/// An index handle that enforces lifecycle order and call exclusivity.
///
/// # Example
///
/// ```rust
/// use indexguard_core::{ContractCheckingProxy, IndexProxy, LifecycleState, NoopIndexProxy};
///
/// let index = ContractCheckingProxy::new(NoopIndexProxy::new());
///
/// assert!(index.update(&[]).is_err()); // not created yet
///
/// index.create().unwrap();
/// index.update(&[]).unwrap();
/// index.close().unwrap();
///
/// assert_eq!(index.state(), LifecycleState::Closed);
/// assert!(index.drop_index().is_err()); // closed indexes cannot be dropped
/// ```
pub struct ContractCheckingProxy<P: IndexProxy> {
    inner: P,
    state: AtomicLifecycleState,
    gate: Gate,
    config: GuardConfig,
    stats: GuardStats,
}

impl<P: IndexProxy> ContractCheckingProxy<P> {
    /// Wraps `inner` with the default configuration.
    pub fn new(inner: P) -> Self {
        Self::with_config(inner, GuardConfig::default())
    }

    /// Wraps `inner` with the given configuration.
    pub fn with_config(inner: P, config: GuardConfig) -> Self {
        Self {
            inner,
            state: AtomicLifecycleState::new(LifecycleState::Uninitialized),
            gate: Gate::new(),
            config,
            stats: GuardStats::new(),
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state.load()
    }

    /// Returns true once the index is closed or dropped.
    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Returns the operation currently running inside the index, if any.
    pub fn in_flight(&self) -> Option<Operation> {
        self.gate.holder()
    }

    /// Returns the name of the guarded index.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the guard configuration.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Returns the guard's counters.
    pub fn stats(&self) -> &GuardStats {
        &self.stats
    }

    /// Checks the contract for `operation`, then runs `call` against the
    /// wrapped handle while holding the gate.
    fn forward<F>(&self, operation: Operation, call: F) -> GuardResult<(), P::Error>
    where
        F: FnOnce(&P) -> Result<(), P::Error>,
    {
        let observed = self.state.load();
        if !operation.is_permitted_in(observed) {
            return Err(self.illegal_state(operation, observed).into());
        }

        let _pass = self.enter(operation)?;

        // The state may have moved between the unlocked check and taking the
        // gate, e.g. a close that completed just before we got in.
        let from = operation.required_state();
        match operation.transient_state() {
            Some(transient) => {
                if let Err(actual) = self.state.transition(from, transient) {
                    return Err(self.illegal_state(operation, actual).into());
                }
            }
            None => {
                let current = self.state.load();
                if current != from {
                    return Err(self.illegal_state(operation, current).into());
                }
            }
        }

        tracing::debug!(
            index = %self.config.name,
            operation = %operation,
            "forwarding index operation"
        );
        self.stats.record_forwarded(operation);

        match call(&self.inner) {
            Ok(()) => {
                if operation.transient_state().is_some() {
                    let to = operation.completed_state();
                    self.state.store(to);
                    tracing::debug!(
                        index = %self.config.name,
                        from = %from,
                        to = %to,
                        "index lifecycle transition"
                    );
                }
                Ok(())
            }
            Err(error) => {
                self.stats.record_resource_failure();
                if operation == Operation::Create
                    && self.config.failure_policy == FailurePolicy::Revert
                {
                    self.state.store(from);
                }
                tracing::warn!(
                    index = %self.config.name,
                    operation = %operation,
                    state = %self.state.load(),
                    error = %error,
                    "index operation failed"
                );
                Err(GuardError::Resource(error))
            }
        }
    }

    /// Takes the gate or reports the race.
    fn enter(&self, operation: Operation) -> Result<GatePass<'_>, ContractViolation> {
        match self.gate.try_acquire(operation) {
            Some(pass) => Ok(pass),
            None => {
                self.stats.record_in_progress();
                let in_flight = self.gate.holder();
                tracing::warn!(
                    index = %self.config.name,
                    operation = %operation,
                    in_flight = ?in_flight,
                    "rejected index operation: another operation is in progress"
                );
                Err(ContractViolation::OperationInProgress {
                    index: self.config.name.clone(),
                    operation,
                    in_flight,
                })
            }
        }
    }

    fn illegal_state(&self, operation: Operation, state: LifecycleState) -> ContractViolation {
        self.stats.record_illegal_state();
        tracing::warn!(
            index = %self.config.name,
            operation = %operation,
            state = %state,
            "rejected index operation: illegal in current state"
        );
        ContractViolation::IllegalState {
            index: self.config.name.clone(),
            operation,
            state,
        }
    }
}

impl<P: IndexProxy> IndexProxy for ContractCheckingProxy<P> {
    type Error = GuardError<P::Error>;

    fn create(&self) -> GuardResult<(), P::Error> {
        self.forward(Operation::Create, |inner| inner.create())
    }

    fn update(&self, updates: &[IndexUpdate]) -> GuardResult<(), P::Error> {
        self.forward(Operation::Update, |inner| {
            self.stats.record_update_records(updates.len());
            inner.update(updates)
        })
    }

    fn force(&self) -> GuardResult<(), P::Error> {
        self.forward(Operation::Force, |inner| inner.force())
    }

    fn close(&self) -> GuardResult<(), P::Error> {
        self.forward(Operation::Close, |inner| inner.close())
    }

    fn drop_index(&self) -> GuardResult<(), P::Error> {
        self.forward(Operation::Drop, |inner| inner.drop_index())
    }
}

impl<P: IndexProxy> fmt::Debug for ContractCheckingProxy<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractCheckingProxy")
            .field("name", &self.config.name)
            .field("state", &self.state())
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}
