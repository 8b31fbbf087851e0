//! Property tests: a guard driven sequentially behaves like the model.

use indexguard_core::{
    ContractCheckingProxy, FailurePolicy, GuardConfig, GuardError, IndexProxy, IndexUpdate,
    InMemoryIndex, LifecycleState, Operation,
};
use indexguard_testkit::{
    faulty_sequence_strategy, operation_sequence_strategy, update_batch_strategy, FailingProxy,
    LifecycleModel, Outcome,
};
use proptest::prelude::*;
use std::sync::Arc;

fn call<P: IndexProxy>(
    guard: &ContractCheckingProxy<P>,
    operation: Operation,
) -> Result<(), GuardError<P::Error>> {
    match operation {
        Operation::Create => guard.create(),
        Operation::Update => guard.update(&[]),
        Operation::Force => guard.force(),
        Operation::Close => guard.close(),
        Operation::Drop => guard.drop_index(),
    }
}

fn policy_strategy() -> impl Strategy<Value = FailurePolicy> {
    prop_oneof![
        Just(FailurePolicy::RemainTransient),
        Just(FailurePolicy::Revert)
    ]
}

proptest! {
    #[test]
    fn guard_matches_model(ops in operation_sequence_strategy(24)) {
        let proxy = Arc::new(FailingProxy::new());
        let guard = ContractCheckingProxy::new(Arc::clone(&proxy));
        let mut model = LifecycleModel::default();
        let mut forwarded = 0;

        for op in ops {
            let expected = model.apply(op);
            let result = call(&guard, op);

            match expected {
                Outcome::Forwarded => {
                    prop_assert!(result.is_ok(), "{} should succeed: {:?}", op, result);
                    forwarded += 1;
                }
                Outcome::Rejected => {
                    prop_assert!(
                        matches!(result, Err(GuardError::Contract(_))),
                        "{} should be rejected", op
                    );
                }
            }
            prop_assert_eq!(guard.state(), model.state());
        }

        prop_assert_eq!(proxy.calls(), forwarded);
    }

    #[test]
    fn guard_matches_model_with_failures(
        ops in faulty_sequence_strategy(24),
        policy in policy_strategy(),
    ) {
        let proxy = Arc::new(FailingProxy::new());
        let guard = ContractCheckingProxy::with_config(
            Arc::clone(&proxy),
            GuardConfig::new().with_failure_policy(policy),
        );
        let mut model = LifecycleModel::new(policy);

        for (op, fails) in ops {
            if fails {
                proxy.fail_on(op);
            } else {
                proxy.succeed_on(op);
            }

            let expected = if fails { model.apply_failing(op) } else { model.apply(op) };
            let result = call(&guard, op);

            match (expected, fails) {
                (Outcome::Forwarded, false) => prop_assert!(result.is_ok()),
                (Outcome::Forwarded, true) => {
                    prop_assert!(matches!(result, Err(GuardError::Resource(_))));
                }
                (Outcome::Rejected, _) => {
                    prop_assert!(matches!(result, Err(GuardError::Contract(_))));
                }
            }
            prop_assert_eq!(guard.state(), model.state());
        }
    }

    #[test]
    fn terminal_states_absorb(ops in operation_sequence_strategy(16)) {
        let guard = ContractCheckingProxy::new(FailingProxy::new());
        let mut terminal: Option<LifecycleState> = None;

        for op in ops {
            let _ = call(&guard, op);
            let state = guard.state();
            if let Some(reached) = terminal {
                prop_assert_eq!(state, reached);
            } else if state.is_terminal() {
                terminal = Some(state);
            }
        }
    }

    #[test]
    fn memory_index_sees_every_forwarded_batch(batches in prop::collection::vec(update_batch_strategy(), 0..8)) {
        let memory = Arc::new(InMemoryIndex::new());
        let reference = InMemoryIndex::new();
        let guard = ContractCheckingProxy::new(Arc::clone(&memory));

        guard.create().unwrap();
        reference.create().unwrap();

        let mut records = 0;
        for batch in &batches {
            guard.update(batch).unwrap();
            reference.update(batch).unwrap();
            records += batch.len();
        }
        guard.force().unwrap();

        prop_assert_eq!(memory.len(), reference.len());
        prop_assert_eq!(memory.durable_len(), reference.len());
        prop_assert_eq!(guard.stats().snapshot().update_records, records as u64);

        guard.close().unwrap();
        prop_assert!(guard.update(&[IndexUpdate::added(0, "late")]).is_err());
        prop_assert_eq!(memory.len(), reference.len());
    }
}
