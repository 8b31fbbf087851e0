//! Reference model of the guard's lifecycle rules.
//!
//! The model is deliberately naive: a plain state field walked through a
//! `match`. Property tests drive a real guard and the model with the same
//! sequential calls and compare the outcomes.

use indexguard_core::{FailurePolicy, LifecycleState, Operation};

/// What the guard is expected to do with a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The call reaches the index.
    Forwarded,
    /// The guard rejects the call without touching the index.
    Rejected,
}

/// Sequential model of a guard.
#[derive(Debug, Clone)]
pub struct LifecycleModel {
    state: LifecycleState,
    policy: FailurePolicy,
}

impl Default for LifecycleModel {
    fn default() -> Self {
        Self::new(FailurePolicy::default())
    }
}

impl LifecycleModel {
    /// Creates a model of a fresh guard.
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            state: LifecycleState::Uninitialized,
            policy,
        }
    }

    /// Returns the modelled state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Applies a call that succeeds inside the index if forwarded.
    pub fn apply(&mut self, operation: Operation) -> Outcome {
        self.step(operation, true)
    }

    /// Applies a call that fails inside the index if forwarded.
    pub fn apply_failing(&mut self, operation: Operation) -> Outcome {
        self.step(operation, false)
    }

    fn step(&mut self, operation: Operation, succeeds: bool) -> Outcome {
        use LifecycleState as S;

        let next = match (self.state, operation, succeeds) {
            (S::Uninitialized, Operation::Create, true) => S::Online,
            (S::Uninitialized, Operation::Create, false) => match self.policy {
                FailurePolicy::RemainTransient => S::Creating,
                FailurePolicy::Revert => S::Uninitialized,
            },
            (S::Online, Operation::Update | Operation::Force, _) => S::Online,
            (S::Online, Operation::Close, true) => S::Closed,
            (S::Online, Operation::Close, false) => S::Closing,
            (S::Online, Operation::Drop, true) => S::Dropped,
            (S::Online, Operation::Drop, false) => S::Dropping,
            _ => return Outcome::Rejected,
        };

        self.state = next;
        Outcome::Forwarded
    }
}
