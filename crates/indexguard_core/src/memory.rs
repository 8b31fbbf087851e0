//! In-memory index handle.

use crate::error::{IndexError, IndexResult};
use crate::proxy::IndexProxy;
use crate::update::{EntityId, IndexUpdate, UpdateKind};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

type Entries = BTreeMap<Vec<u8>, BTreeSet<EntityId>>;

#[derive(Debug, Default)]
struct IndexData {
    /// `None` until created, and again after a drop.
    live: Option<Entries>,
    /// Contents as of the last `force`.
    durable: Entries,
    flushes: u64,
    closed: bool,
}

/// An index that maps values to the entities holding them, kept in memory.
///
/// Suitable for tests and for indexes that are rebuilt on startup. The
/// handle itself does not police call order: updating before `create`
/// fails with [`IndexError::NotCreated`], but racing calls are simply
/// serialized by its internal lock. Put it behind a
/// [`crate::ContractCheckingProxy`] to enforce the lifecycle.
///
/// # Example
///
/// ```rust
/// use indexguard_core::{InMemoryIndex, IndexProxy, IndexUpdate};
///
/// let index = InMemoryIndex::new();
/// index.create().unwrap();
/// index.update(&[IndexUpdate::added(1, "alice")]).unwrap();
/// assert_eq!(index.lookup(b"alice"), vec![1]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    data: RwLock<IndexData>,
}

impl InMemoryIndex {
    /// Creates a handle for an index that does not exist yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entities currently indexed under `value`, in ascending order.
    #[must_use]
    pub fn lookup(&self, value: &[u8]) -> Vec<EntityId> {
        self.data
            .read()
            .live
            .as_ref()
            .and_then(|entries| entries.get(value))
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the number of (value, entity) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().live.as_ref().map_or(0, count_entries)
    }

    /// Returns true if the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of entries as of the last `force`.
    #[must_use]
    pub fn durable_len(&self) -> usize {
        count_entries(&self.data.read().durable)
    }

    /// Returns how many times the index has been forced.
    #[must_use]
    pub fn flush_count(&self) -> u64 {
        self.data.read().flushes
    }

    /// Returns true if the index exists (created and not dropped).
    #[must_use]
    pub fn exists(&self) -> bool {
        self.data.read().live.is_some()
    }

    /// Returns true after `close` or `drop_index`.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.data.read().closed
    }
}

fn count_entries(entries: &Entries) -> usize {
    entries.values().map(BTreeSet::len).sum()
}

fn insert(entries: &mut Entries, value: &[u8], entity_id: EntityId) {
    entries.entry(value.to_vec()).or_default().insert(entity_id);
}

fn remove(entries: &mut Entries, value: &[u8], entity_id: EntityId) {
    if let Some(ids) = entries.get_mut(value) {
        ids.remove(&entity_id);
        if ids.is_empty() {
            entries.remove(value);
        }
    }
}

impl IndexProxy for InMemoryIndex {
    type Error = IndexError;

    fn create(&self) -> IndexResult<()> {
        let mut data = self.data.write();
        if data.closed {
            return Err(IndexError::Closed);
        }
        data.live = Some(Entries::new());
        data.durable.clear();
        Ok(())
    }

    fn update(&self, updates: &[IndexUpdate]) -> IndexResult<()> {
        let mut data = self.data.write();
        if data.closed {
            return Err(IndexError::Closed);
        }
        let entries = data.live.as_mut().ok_or(IndexError::NotCreated)?;

        for update in updates {
            match &update.kind {
                UpdateKind::Added { value } => insert(entries, value, update.entity_id),
                UpdateKind::Changed { before, after } => {
                    remove(entries, before, update.entity_id);
                    insert(entries, after, update.entity_id);
                }
                UpdateKind::Removed { value } => remove(entries, value, update.entity_id),
            }
        }
        Ok(())
    }

    fn force(&self) -> IndexResult<()> {
        let mut data = self.data.write();
        if data.closed {
            return Err(IndexError::Closed);
        }
        let snapshot = data.live.clone().ok_or(IndexError::NotCreated)?;
        data.durable = snapshot;
        data.flushes += 1;
        Ok(())
    }

    fn close(&self) -> IndexResult<()> {
        let mut data = self.data.write();
        if data.closed {
            return Err(IndexError::Closed);
        }
        data.closed = true;
        Ok(())
    }

    fn drop_index(&self) -> IndexResult<()> {
        let mut data = self.data.write();
        data.live = None;
        data.durable.clear();
        data.closed = true;
        Ok(())
    }
}
