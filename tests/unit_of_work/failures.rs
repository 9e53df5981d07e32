use std::error::Error as _;
use std::sync::Arc;

use sourced_uow::diagnostics::DiagnosticKind;
use sourced_uow::{
    BufferDiagnostics, Cancellation, ContextError, HashMapStorage, HashMapTransaction,
    InMemoryBus, Phase, PublishError, StorageError, UnitOfWork,
};

use crate::accounts::{AccountsContext, AccountsError};
use crate::support::{Calls, ContextScript, RuleViolation, ScriptedBus, ScriptedStorage};

#[test]
fn logic_failure_rolls_back_without_publishing() {
    let calls = Calls::new();
    let bus = ScriptedBus::new(&calls);
    let uow = UnitOfWork::new(
        ScriptedStorage::new(&calls),
        ContextScript::new(&calls).factory(),
        bus.clone(),
    );

    let err = uow
        .atomic(&Cancellation::new(), |_, ctx| {
            ctx.emit("e1");
            Err(RuleViolation("amount must be positive"))
        })
        .unwrap_err();

    assert!(err.is_rollback());
    assert_eq!(err.phase(), Phase::Logic);
    assert_eq!(err.logic(), Some(&RuleViolation("amount must be positive")));
    assert!(err.source().unwrap().is::<RuleViolation>());
    assert_eq!(
        err.to_string(),
        "state rollback: business rule violated: amount must be positive"
    );

    assert_eq!(calls.count("rollback"), 1);
    assert_eq!(calls.count("publish"), 0);
    assert_eq!(calls.count("commit"), 0);
    assert_eq!(calls.count("collect"), 0);
    assert!(bus.batches().is_empty());
}

#[test]
fn acquisition_failure_short_circuits() {
    let calls = Calls::new();
    let uow = UnitOfWork::new(
        ScriptedStorage::new(&calls)
            .failing_begin(StorageError::Unavailable("pool exhausted".into())),
        ContextScript::new(&calls).factory(),
        ScriptedBus::new(&calls),
    );

    let mut body_ran = false;
    let err = uow
        .atomic(&Cancellation::new(), |_, _| {
            body_ran = true;
            Ok::<_, RuleViolation>(())
        })
        .unwrap_err();

    assert!(!body_ran);
    assert!(err.is_rollback());
    assert_eq!(err.phase(), Phase::Begin);
    assert_eq!(
        err.storage(),
        Some(&StorageError::Unavailable("pool exhausted".into()))
    );
    assert_eq!(calls.all(), vec!["begin"]);
}

#[test]
fn context_failure_is_rollback_class() {
    let calls = Calls::new();
    let uow = UnitOfWork::new(
        ScriptedStorage::new(&calls),
        ContextScript::new(&calls)
            .failing_build("schema mismatch")
            .factory(),
        ScriptedBus::new(&calls),
    );

    let mut body_ran = false;
    let err = uow
        .atomic(&Cancellation::new(), |_, _| {
            body_ran = true;
            Ok::<_, RuleViolation>(())
        })
        .unwrap_err();

    assert!(!body_ran);
    assert!(err.is_rollback());
    assert_eq!(err.phase(), Phase::Context);
    assert!(err.source().unwrap().is::<ContextError>());
    assert_eq!(calls.all(), vec!["begin", "context"]);
}

#[test]
fn context_failure_releases_in_memory_transaction() {
    let storage = HashMapStorage::new();
    let uow = UnitOfWork::new(
        storage.clone(),
        |_tx: Arc<HashMapTransaction>| {
            Err::<AccountsContext, _>(ContextError::invalid("tenant missing"))
        },
        InMemoryBus::new(),
    );

    let err = uow
        .atomic(&Cancellation::new(), |_, _| Ok::<_, AccountsError>(()))
        .unwrap_err();

    assert_eq!(err.phase(), Phase::Context);
    assert!(!storage.is_busy());
}

#[test]
fn publication_failure_is_distinguishable() {
    let calls = Calls::new();
    let diagnostics = BufferDiagnostics::new();
    let uow = UnitOfWork::new(
        ScriptedStorage::new(&calls),
        ContextScript::new(&calls).factory(),
        ScriptedBus::new(&calls).rejecting("broker offline"),
    )
    .with_diagnostics(diagnostics.clone());

    let err = uow
        .atomic(&Cancellation::new(), |_, ctx| {
            ctx.emit("e1");
            Ok::<_, RuleViolation>(())
        })
        .unwrap_err();

    assert!(!err.is_rollback());
    assert_eq!(err.phase(), Phase::Publish);
    assert!(matches!(
        err.publish(),
        Some(PublishError::Rejected(reason)) if reason == "broker offline"
    ));
    assert!(err.logic().is_none());

    assert_eq!(calls.count("rollback"), 0);
    assert_eq!(calls.count("tx.commit"), 1);
    assert_eq!(calls.count("publish"), 1);

    let records = diagnostics.of_kind(DiagnosticKind::Publish);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message, "events rejected: broker offline (1 events)");
}

#[test]
fn publication_failure_keeps_committed_data() {
    let storage = HashMapStorage::new();
    let bus = InMemoryBus::new();
    let uow = UnitOfWork::new(storage.clone(), AccountsContext::new, bus.clone());

    // The bus refuses batches once the caller's token is cancelled, but the
    // transaction itself never looks at the token after begin.
    let cancel = Cancellation::new();
    let err = uow
        .atomic(&cancel, |_, ctx| {
            ctx.open("dave", "Dave")?;
            cancel.cancel();
            Ok::<_, AccountsError>(())
        })
        .unwrap_err();

    assert_eq!(err.phase(), Phase::Publish);
    assert!(matches!(err.publish(), Some(PublishError::Cancelled(_))));
    assert_eq!(storage.keys(), vec!["account:dave".to_string()]);
    assert!(bus.is_empty());
}

#[test]
fn commit_failure_rolls_back_without_publishing() {
    let calls = Calls::new();
    let bus = ScriptedBus::new(&calls);
    let uow = UnitOfWork::new(
        ScriptedStorage::new(&calls),
        ContextScript::new(&calls)
            .failing_commit(StorageError::Other("serialization failure".into()))
            .factory(),
        bus.clone(),
    );

    let err = uow
        .atomic(&Cancellation::new(), |_, ctx| {
            ctx.emit("e1");
            Ok::<_, RuleViolation>(())
        })
        .unwrap_err();

    assert!(err.is_rollback());
    assert_eq!(err.phase(), Phase::Commit);
    assert_eq!(
        calls.all(),
        vec!["begin", "context", "commit", "rollback", "close"]
    );
    assert!(bus.batches().is_empty());
}

#[test]
fn rollback_failure_is_reported_not_returned() {
    let calls = Calls::new();
    let diagnostics = BufferDiagnostics::new();
    let uow = UnitOfWork::new(
        ScriptedStorage::new(&calls)
            .failing_rollback(StorageError::Unavailable("connection reset".into())),
        ContextScript::new(&calls).factory(),
        ScriptedBus::new(&calls),
    )
    .with_diagnostics(diagnostics.clone());

    let err = uow
        .atomic(&Cancellation::new(), |_, _| Err(RuleViolation("limit exceeded")))
        .unwrap_err();

    assert_eq!(err.into_logic(), Some(RuleViolation("limit exceeded")));
    let records = diagnostics.of_kind(DiagnosticKind::Rollback);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message, "storage unavailable: connection reset");
    assert_eq!(calls.count("rollback"), 1);
    assert_eq!(calls.count("close"), 1);
}

#[test]
fn close_failure_is_reported_on_success() {
    let calls = Calls::new();
    let diagnostics = BufferDiagnostics::new();
    let bus = ScriptedBus::new(&calls);
    let uow = UnitOfWork::new(
        ScriptedStorage::new(&calls),
        ContextScript::new(&calls)
            .failing_close(StorageError::Other("cursor leak".into()))
            .factory(),
        bus.clone(),
    )
    .with_diagnostics(diagnostics.clone());

    uow.atomic(&Cancellation::new(), |_, ctx| {
        ctx.emit("e1");
        Ok::<_, RuleViolation>(())
    })
    .unwrap();

    assert_eq!(bus.batches().len(), 1);
    assert_eq!(diagnostics.of_kind(DiagnosticKind::Close).len(), 1);
}

#[test]
fn insufficient_funds_leaves_balances_untouched() {
    let storage = HashMapStorage::new();
    let bus = InMemoryBus::new();
    let uow = UnitOfWork::new(storage.clone(), AccountsContext::new, bus.clone());

    uow.atomic(&Cancellation::new(), |_, ctx| {
        ctx.open("erin", "Erin")?;
        ctx.open("frank", "Frank")?;
        ctx.deposit("erin", 10)
    })
    .unwrap();
    bus.clear();

    let err = uow
        .atomic(&Cancellation::new(), |_, ctx| {
            ctx.deposit("frank", 5)?;
            ctx.transfer("erin", "frank", 50)
        })
        .unwrap_err();

    assert!(matches!(
        err.logic(),
        Some(AccountsError::InsufficientFunds { balance: 10, amount: 50, .. })
    ));
    let frank: crate::accounts::Account = storage.get_json("account:frank").unwrap().unwrap();
    assert_eq!(frank.balance, 0);
    assert!(bus.is_empty());
}
