//! Lifecycle states, guarded operations and the transition table.
//!
//! The guard owns exactly one [`AtomicLifecycleState`]. Transitions only move
//! forward:
//!
//! ```text
//! Uninitialized -> Creating -> Online
//! Online -> Closing -> Closed
//! Online -> Dropping -> Dropped
//! ```
//!
//! `Closed` and `Dropped` are absorbing. The only backward edge is the
//! opt-in `Creating -> Uninitialized` revert taken by
//! [`crate::FailurePolicy::Revert`] when a forwarded create fails.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a guarded index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    /// The index has not been created yet.
    Uninitialized = 0,
    /// A forwarded `create` is in flight.
    Creating = 1,
    /// The index is created and usable.
    Online = 2,
    /// A forwarded `close` is in flight.
    Closing = 3,
    /// The index is closed. Terminal.
    Closed = 4,
    /// A forwarded `drop` is in flight.
    Dropping = 5,
    /// The index is dropped. Terminal.
    Dropped = 6,
}

impl LifecycleState {
    /// All states, in declaration order.
    pub const ALL: [LifecycleState; 7] = [
        LifecycleState::Uninitialized,
        LifecycleState::Creating,
        LifecycleState::Online,
        LifecycleState::Closing,
        LifecycleState::Closed,
        LifecycleState::Dropping,
        LifecycleState::Dropped,
    ];

    /// Returns true while a lifecycle call is being forwarded.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            LifecycleState::Creating | LifecycleState::Closing | LifecycleState::Dropping
        )
    }

    /// Returns true once no further operation can ever be legal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Closed | LifecycleState::Dropped)
    }

    /// Returns the lowercase name used in log fields and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Creating => "creating",
            LifecycleState::Online => "online",
            LifecycleState::Closing => "closing",
            LifecycleState::Closed => "closed",
            LifecycleState::Dropping => "dropping",
            LifecycleState::Dropped => "dropped",
        }
    }

    /// Explains why no operation but `create` is legal from this state.
    ///
    /// Used to build contract violation messages.
    pub(crate) const fn describe(self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "index has not been created",
            LifecycleState::Creating => "index is still being created",
            LifecycleState::Online => "index has already been created",
            LifecycleState::Closing => "index is being closed",
            LifecycleState::Closed => "index has already been closed",
            LifecycleState::Dropping => "index is being dropped",
            LifecycleState::Dropped => "index has already been dropped",
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LifecycleState::Uninitialized,
            1 => LifecycleState::Creating,
            2 => LifecycleState::Online,
            3 => LifecycleState::Closing,
            4 => LifecycleState::Closed,
            5 => LifecycleState::Dropping,
            // Only values written by `AtomicLifecycleState` are ever stored.
            _ => LifecycleState::Dropped,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation forwarded through the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Operation {
    /// Build the index.
    Create = 1,
    /// Apply a batch of changes.
    Update = 2,
    /// Flush to durable storage.
    Force = 3,
    /// Close the index, keeping its data.
    Close = 4,
    /// Drop the index and its data.
    Drop = 5,
}

impl Operation {
    /// All operations, in declaration order.
    pub const ALL: [Operation; 5] = [
        Operation::Create,
        Operation::Update,
        Operation::Force,
        Operation::Close,
        Operation::Drop,
    ];

    /// The only state from which this operation may start.
    #[must_use]
    pub const fn required_state(self) -> LifecycleState {
        match self {
            Operation::Create => LifecycleState::Uninitialized,
            Operation::Update | Operation::Force | Operation::Close | Operation::Drop => {
                LifecycleState::Online
            }
        }
    }

    /// The state held while this operation is forwarded, if it changes state.
    #[must_use]
    pub const fn transient_state(self) -> Option<LifecycleState> {
        match self {
            Operation::Create => Some(LifecycleState::Creating),
            Operation::Close => Some(LifecycleState::Closing),
            Operation::Drop => Some(LifecycleState::Dropping),
            Operation::Update | Operation::Force => None,
        }
    }

    /// The state reached after the forwarded call succeeds.
    #[must_use]
    pub const fn completed_state(self) -> LifecycleState {
        match self {
            Operation::Create => LifecycleState::Online,
            Operation::Update | Operation::Force => LifecycleState::Online,
            Operation::Close => LifecycleState::Closed,
            Operation::Drop => LifecycleState::Dropped,
        }
    }

    /// Returns true if this operation may start from `state`.
    #[must_use]
    pub fn is_permitted_in(self, state: LifecycleState) -> bool {
        self.required_state() == state
    }

    /// Returns the lowercase verb used in log fields and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Force => "force",
            Operation::Close => "close",
            Operation::Drop => "drop",
        }
    }

    pub(crate) const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Operation::Create),
            2 => Some(Operation::Update),
            3 => Some(Operation::Force),
            4 => Some(Operation::Close),
            5 => Some(Operation::Drop),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle state readable from any thread without a lock.
///
/// Loads use `Acquire` and stores use `Release`, so a transition published by
/// one caller is visible to the precondition check of the next.
#[derive(Debug)]
pub struct AtomicLifecycleState {
    raw: AtomicU8,
}

impl AtomicLifecycleState {
    /// Creates a new cell holding `state`.
    #[must_use]
    pub const fn new(state: LifecycleState) -> Self {
        Self {
            raw: AtomicU8::new(state as u8),
        }
    }

    /// Returns the current state.
    pub fn load(&self) -> LifecycleState {
        LifecycleState::from_u8(self.raw.load(Ordering::Acquire))
    }

    /// Unconditionally publishes `state`.
    pub fn store(&self, state: LifecycleState) {
        self.raw.store(state as u8, Ordering::Release);
    }

    /// Moves from `current` to `new` if the cell still holds `current`.
    ///
    /// On failure returns the state actually observed.
    pub fn transition(
        &self,
        current: LifecycleState,
        new: LifecycleState,
    ) -> Result<LifecycleState, LifecycleState> {
        self.raw
            .compare_exchange(
                current as u8,
                new as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(LifecycleState::from_u8)
            .map_err(LifecycleState::from_u8)
    }
}

impl Default for AtomicLifecycleState {
    fn default() -> Self {
        Self::new(LifecycleState::Uninitialized)
    }
}
