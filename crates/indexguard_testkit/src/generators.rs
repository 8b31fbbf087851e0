//! Property-based test generators using proptest.

use indexguard_core::{EntityId, IndexUpdate, Operation};
use proptest::prelude::*;

/// Strategy for generating any guarded operation.
pub fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop::sample::select(Operation::ALL.to_vec())
}

/// Strategy for generating call sequences of up to `max_len` operations.
///
/// Create is weighted up so sequences regularly get past the first call.
pub fn operation_sequence_strategy(max_len: usize) -> impl Strategy<Value = Vec<Operation>> {
    let weighted = prop_oneof![
        3 => Just(Operation::Create),
        3 => Just(Operation::Update),
        2 => Just(Operation::Force),
        1 => Just(Operation::Close),
        1 => Just(Operation::Drop),
    ];
    prop::collection::vec(weighted, 0..=max_len)
}

/// Strategy for generating a call sequence paired with a per-call flag
/// saying whether the index fails that call.
pub fn faulty_sequence_strategy(max_len: usize) -> impl Strategy<Value = Vec<(Operation, bool)>> {
    prop::collection::vec((operation_strategy(), prop::bool::weighted(0.2)), 0..=max_len)
}

fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..8)
}

/// Strategy for generating a single change record.
pub fn update_strategy() -> impl Strategy<Value = IndexUpdate> {
    let entity = 0..64 as EntityId;
    prop_oneof![
        (entity.clone(), value_strategy()).prop_map(|(id, v)| IndexUpdate::added(id, v)),
        (entity.clone(), value_strategy(), value_strategy())
            .prop_map(|(id, before, after)| IndexUpdate::changed(id, before, after)),
        (entity, value_strategy()).prop_map(|(id, v)| IndexUpdate::removed(id, v)),
    ]
}

/// Strategy for generating update batches, including empty ones.
pub fn update_batch_strategy() -> impl Strategy<Value = Vec<IndexUpdate>> {
    prop::collection::vec(update_strategy(), 0..32)
}
