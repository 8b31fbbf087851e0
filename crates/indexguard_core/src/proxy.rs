//! The index handle contract.

use crate::error::IndexError;
use crate::update::IndexUpdate;
use std::sync::Arc;

/// A handle to an index, exposing its five lifecycle operations.
///
/// Implementations make no promises about call order or concurrency. Wrap
/// them in a [`crate::ContractCheckingProxy`] to get both.
///
/// # Implementors
///
/// - [`crate::InMemoryIndex`] - A working in-memory index
/// - [`NoopIndexProxy`] - Accepts every call and does nothing
/// - [`crate::ContractCheckingProxy`] - The lifecycle guard itself
pub trait IndexProxy: Send + Sync {
    /// Error raised by this handle.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Builds the index.
    ///
    /// # Errors
    ///
    /// Returns the handle's error if the index cannot be built.
    fn create(&self) -> Result<(), Self::Error>;

    /// Applies a batch of changes. The batch may be empty.
    ///
    /// # Errors
    ///
    /// Returns the handle's error if the batch cannot be applied.
    fn update(&self, updates: &[IndexUpdate]) -> Result<(), Self::Error>;

    /// Makes all applied changes durable.
    ///
    /// # Errors
    ///
    /// Returns the handle's error if the flush fails.
    fn force(&self) -> Result<(), Self::Error>;

    /// Closes the index, keeping its data.
    ///
    /// # Errors
    ///
    /// Returns the handle's error if the index cannot be closed.
    fn close(&self) -> Result<(), Self::Error>;

    /// Drops the index and discards its data.
    ///
    /// # Errors
    ///
    /// Returns the handle's error if the index cannot be dropped.
    fn drop_index(&self) -> Result<(), Self::Error>;
}

/// An index handle that accepts every call and does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIndexProxy;

impl NoopIndexProxy {
    /// Creates a new no-op handle.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl IndexProxy for NoopIndexProxy {
    type Error = IndexError;

    fn create(&self) -> Result<(), IndexError> {
        Ok(())
    }

    fn update(&self, _updates: &[IndexUpdate]) -> Result<(), IndexError> {
        Ok(())
    }

    fn force(&self) -> Result<(), IndexError> {
        Ok(())
    }

    fn close(&self) -> Result<(), IndexError> {
        Ok(())
    }

    fn drop_index(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

/// A shared handle, so a caller can keep inspecting an index it handed to a
/// guard.
impl<P: IndexProxy + ?Sized> IndexProxy for Arc<P> {
    type Error = P::Error;

    fn create(&self) -> Result<(), P::Error> {
        (**self).create()
    }

    fn update(&self, updates: &[IndexUpdate]) -> Result<(), P::Error> {
        (**self).update(updates)
    }

    fn force(&self) -> Result<(), P::Error> {
        (**self).force()
    }

    fn close(&self) -> Result<(), P::Error> {
        (**self).close()
    }

    fn drop_index(&self) -> Result<(), P::Error> {
        (**self).drop_index()
    }
}
