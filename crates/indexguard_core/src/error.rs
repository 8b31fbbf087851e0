//! Error types for guarded index operations.

use crate::state::{LifecycleState, Operation};
use thiserror::Error;

/// Result type for operations forwarded through a guard.
pub type GuardResult<T, E> = Result<T, GuardError<E>>;

/// Result type for index handle operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// A caller asked for an operation the guard will not forward.
///
/// Always raised before the index is touched. Never transient: it means the
/// caller broke the lifecycle contract and retrying will not help.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// The operation is not legal from the current lifecycle state.
    #[error("cannot {operation} index '{index}': {}", .state.describe())]
    IllegalState {
        /// Name of the guarded index.
        index: String,
        /// The rejected operation.
        operation: Operation,
        /// The state observed when the call was rejected.
        state: LifecycleState,
    },

    /// Another operation currently holds the gate.
    #[error("cannot {operation} index '{index}': {} already in progress", in_flight_label(.in_flight))]
    OperationInProgress {
        /// Name of the guarded index.
        index: String,
        /// The rejected operation.
        operation: Operation,
        /// The operation holding the gate, if it could be observed.
        in_flight: Option<Operation>,
    },
}

fn in_flight_label(in_flight: &Option<Operation>) -> String {
    match in_flight {
        Some(op) => format!("{op} is"),
        None => "another operation is".to_string(),
    }
}

impl ContractViolation {
    /// Returns the operation that was rejected.
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::IllegalState { operation, .. } | Self::OperationInProgress { operation, .. } => {
                *operation
            }
        }
    }

    /// Returns the name of the index the violation was raised for.
    #[must_use]
    pub fn index(&self) -> &str {
        match self {
            Self::IllegalState { index, .. } | Self::OperationInProgress { index, .. } => index,
        }
    }

    /// Returns true if the call raced another in-flight operation.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::OperationInProgress { .. })
    }
}

/// Error returned by a guard: either its own contract check or the index's
/// failure, passed through untouched.
#[derive(Debug, Error)]
pub enum GuardError<E> {
    /// The guard refused to forward the call.
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    /// The forwarded call failed inside the index.
    #[error(transparent)]
    Resource(E),
}

impl<E> GuardError<E> {
    /// Returns true if the guard rejected the call.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Contract(_))
    }

    /// Returns the contract violation, if this is one.
    #[must_use]
    pub fn as_contract(&self) -> Option<&ContractViolation> {
        match self {
            Self::Contract(violation) => Some(violation),
            Self::Resource(_) => None,
        }
    }

    /// Returns the index's own error, if this is one.
    #[must_use]
    pub fn as_resource(&self) -> Option<&E> {
        match self {
            Self::Contract(_) => None,
            Self::Resource(error) => Some(error),
        }
    }

    /// Consumes the error and returns the index's own error, if this is one.
    pub fn into_resource(self) -> Option<E> {
        match self {
            Self::Contract(_) => None,
            Self::Resource(error) => Some(error),
        }
    }
}

/// Errors raised by index handles.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The index could not complete the operation.
    #[error("index operation failed: {message}")]
    Failed {
        /// Description of the failure.
        message: String,
    },

    /// The index has no data to operate on.
    #[error("index has not been created")]
    NotCreated,

    /// The index has been closed or dropped.
    #[error("index is closed")]
    Closed,
}

impl IndexError {
    /// Creates a generic failure error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
