//! Integration tests for actor context propagation.
//!
//! The critical property: two concurrently executing operations must each
//! observe their own principal, with no cross-contamination, even when their
//! execution windows fully overlap.

use std::sync::Arc;

use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use tokio::sync::Barrier;

use warden_core::context::{self, ContextError};
use warden_core::model::Principal;

fn principal() -> Arc<Principal> {
    let email: String = SafeEmail().fake();
    let name: String = Name().fake();
    Arc::new(Principal::new(email, name))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_operations_observe_independent_actors() {
    let alice = principal();
    let bob = principal();
    let barrier = Arc::new(Barrier::new(2));

    let run = |actor: Arc<Principal>, barrier: Arc<Barrier>| async move {
        context::scope(actor.clone(), async move {
            // Synchronize so both operations are inside their scopes at the
            // same time, then re-check the slot across many yield points.
            barrier.wait().await;
            for _ in 0..100 {
                let current = context::current().expect("actor must be visible in scope");
                assert_eq!(current.id(), actor.id());
                tokio::task::yield_now().await;
            }
            actor.id()
        })
        .await
    };

    let first = tokio::spawn(run(alice.clone(), barrier.clone()));
    let second = tokio::spawn(run(bob.clone(), barrier.clone()));

    assert_eq!(first.await.unwrap(), alice.id());
    assert_eq!(second.await.unwrap(), bob.id());

    // Neither operation leaked its actor into this task.
    assert!(context::current().is_none());
}

#[tokio::test]
async fn scope_clears_context_on_early_error_return() {
    let actor = principal();

    let result: Result<(), &str> = context::scope(actor, async {
        assert!(context::current().is_some());
        Err("operation failed")
    })
    .await;

    assert!(result.is_err());
    assert!(context::current().is_none());
}

#[tokio::test]
async fn scope_clears_context_when_operation_panics() {
    let actor = principal();

    let handle = tokio::spawn(context::scope(actor, async {
        panic!("operation blew up");
    }));
    assert!(handle.await.is_err());

    // The panicking operation's slot died with its task.
    assert!(context::current().is_none());
}

#[tokio::test]
async fn set_and_clear_within_entered_operation() {
    let alice = principal();
    let bob = principal();

    context::enter(async {
        assert!(context::current().is_none());

        context::set(alice.clone()).unwrap();
        assert_eq!(context::current().unwrap().id(), alice.id());

        // Switching actors without clearing is a programming error.
        let error = context::set(bob.clone()).unwrap_err();
        assert!(matches!(error, ContextError::AlreadySet { .. }));

        context::clear();
        context::set(bob.clone()).unwrap();
        assert_eq!(context::current().unwrap().id(), bob.id());
    })
    .await;

    assert!(context::current().is_none());
}

#[tokio::test]
async fn set_outside_operation_scope_fails_loudly() {
    let result = context::set(principal());
    assert!(matches!(result, Err(ContextError::NoActiveOperation)));
}

#[tokio::test]
async fn spawned_task_does_not_inherit_context() {
    let actor = principal();

    context::scope(actor, async {
        // A freshly spawned task is a new unit of work with its own slot.
        let seen = tokio::spawn(async { context::current().is_some() })
            .await
            .unwrap();
        assert!(!seen);
    })
    .await;
}
