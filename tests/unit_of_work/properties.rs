use proptest::prelude::*;

use sourced_uow::{Cancellation, UnitOfWork};

use crate::support::{ids, Calls, ContextScript, RuleViolation, ScriptedBus, ScriptedStorage};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn published_batch_preserves_emission_order(
        emitted in prop::collection::vec("[a-z]{1,6}", 0..16)
    ) {
        let calls = Calls::new();
        let bus = ScriptedBus::new(&calls);
        let uow = UnitOfWork::new(
            ScriptedStorage::new(&calls),
            ContextScript::new(&calls).factory(),
            bus.clone(),
        );

        uow.atomic(&Cancellation::new(), |_, ctx| {
            for id in &emitted {
                ctx.emit(id);
            }
            Ok::<_, RuleViolation>(())
        })
        .unwrap();

        let batches = bus.batches();
        prop_assert_eq!(batches.len(), 1);
        prop_assert_eq!(ids(&batches[0]), emitted);
    }

    #[test]
    fn attempt_either_rolls_back_or_publishes(
        emitted in 0usize..8,
        fail in any::<bool>(),
    ) {
        let calls = Calls::new();
        let bus = ScriptedBus::new(&calls);
        let uow = UnitOfWork::new(
            ScriptedStorage::new(&calls),
            ContextScript::new(&calls).factory(),
            bus.clone(),
        );

        let outcome = uow.atomic(&Cancellation::new(), |_, ctx| {
            for _ in 0..emitted {
                ctx.emit("e");
            }
            if fail {
                Err(RuleViolation("scripted failure"))
            } else {
                Ok(())
            }
        });

        prop_assert_eq!(outcome.is_err(), fail);
        prop_assert_eq!(calls.count("rollback") + calls.count("publish"), 1);
        prop_assert_eq!(calls.count("rollback"), usize::from(fail));
        prop_assert_eq!(calls.count("close"), 1);
        if !fail {
            prop_assert_eq!(bus.batches()[0].len(), emitted);
        }
    }
}
