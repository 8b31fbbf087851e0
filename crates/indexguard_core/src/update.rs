//! Change records applied to an index.
//!
//! The guard never inspects these; it forwards batches verbatim. Index
//! handles such as [`crate::InMemoryIndex`] interpret them.

/// Identifier of the entity an indexed value belongs to.
pub type EntityId = u64;

/// How an indexed value changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// A value was added.
    Added {
        /// The new value.
        value: Vec<u8>,
    },
    /// A value was replaced.
    Changed {
        /// The value before the change.
        before: Vec<u8>,
        /// The value after the change.
        after: Vec<u8>,
    },
    /// A value was removed.
    Removed {
        /// The value that was removed.
        value: Vec<u8>,
    },
}

/// One change to an indexed property of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexUpdate {
    /// The entity whose property changed.
    pub entity_id: EntityId,
    /// What changed.
    pub kind: UpdateKind,
}

impl IndexUpdate {
    /// Creates an update recording an added value.
    pub fn added(entity_id: EntityId, value: impl Into<Vec<u8>>) -> Self {
        Self {
            entity_id,
            kind: UpdateKind::Added {
                value: value.into(),
            },
        }
    }

    /// Creates an update recording a replaced value.
    pub fn changed(
        entity_id: EntityId,
        before: impl Into<Vec<u8>>,
        after: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            entity_id,
            kind: UpdateKind::Changed {
                before: before.into(),
                after: after.into(),
            },
        }
    }

    /// Creates an update recording a removed value.
    pub fn removed(entity_id: EntityId, value: impl Into<Vec<u8>>) -> Self {
        Self {
            entity_id,
            kind: UpdateKind::Removed {
                value: value.into(),
            },
        }
    }
}
