//! Actor context propagation.
//!
//! Makes "who is acting right now" available to any code running within the
//! same logical operation (an inbound request, a background job execution)
//! without threading it through every call signature. The slot is task-local:
//! two concurrently executing operations always observe independent contexts,
//! and the slot is torn down on every exit path of the scope, including
//! cancellation and panics.
//!
//! The transport layer installs the context at the edge and business logic
//! reads it:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_core::context;
//!
//! let principal = Arc::new(resolve_principal(&request)?);
//! context::scope(principal, async {
//!     handle(request).await
//! })
//! .await;
//! // context is cleared here no matter how `handle` exited
//! ```
//!
//! [`set`] / [`clear`] exist for edges that resolve the principal after the
//! operation slot has been installed (see [`enter`]). Calling [`set`] twice
//! without an intervening [`clear`] is a bug in the calling code and fails
//! loudly with [`ContextError::AlreadySet`] to prevent silent actor-switching
//! mid-operation.

use std::cell::RefCell;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::model::{Principal, PrincipalId};

tokio::task_local! {
    /// Per-operation actor slot. `None` means the operation runs without an
    /// authenticated principal (system-initiated work).
    static ACTIVE_ACTOR: RefCell<Option<Arc<Principal>>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Context propagation errors. Both variants indicate bugs in calling code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("actor context already set for this operation (current: {current}, attempted: {attempted})")]
    AlreadySet {
        current: PrincipalId,
        attempted: PrincipalId,
    },

    #[error("no operation scope is active on this task")]
    NoActiveOperation,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Scope Management
// ═══════════════════════════════════════════════════════════════════════════════

/// Run `operation` with `principal` installed as the current actor.
///
/// The context is released on every exit path, including errors, panics, and
/// task cancellation. Nesting a scope inside another operation shadows the
/// outer actor for the duration of the inner scope.
pub async fn scope<F>(principal: Arc<Principal>, operation: F) -> F::Output
where
    F: Future,
{
    ACTIVE_ACTOR
        .scope(RefCell::new(Some(principal)), operation)
        .await
}

/// Synchronous variant of [`scope`] for non-async units of work.
pub fn scope_sync<F, R>(principal: Arc<Principal>, operation: F) -> R
where
    F: FnOnce() -> R,
{
    ACTIVE_ACTOR.sync_scope(RefCell::new(Some(principal)), operation)
}

/// Run `operation` with an empty actor slot installed.
///
/// Entry point for transports that resolve the principal after the operation
/// has started (the slot is then populated with [`set`]), and for
/// system-initiated work that runs with no actor at all.
pub async fn enter<F>(operation: F) -> F::Output
where
    F: Future,
{
    ACTIVE_ACTOR.scope(RefCell::new(None), operation).await
}

/// Synchronous variant of [`enter`].
pub fn enter_sync<F, R>(operation: F) -> R
where
    F: FnOnce() -> R,
{
    ACTIVE_ACTOR.sync_scope(RefCell::new(None), operation)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Slot Access
// ═══════════════════════════════════════════════════════════════════════════════

/// Install `principal` as the current actor in the ambient operation slot.
///
/// Fails with [`ContextError::AlreadySet`] if an actor is already installed,
/// and with [`ContextError::NoActiveOperation`] when called outside any
/// operation scope.
pub fn set(principal: Arc<Principal>) -> Result<(), ContextError> {
    match ACTIVE_ACTOR.try_with(move |slot| {
        let mut current = slot.borrow_mut();
        if let Some(existing) = current.as_ref() {
            return Err(ContextError::AlreadySet {
                current: existing.id(),
                attempted: principal.id(),
            });
        }
        *current = Some(principal);
        Ok(())
    }) {
        Ok(result) => result,
        Err(_) => Err(ContextError::NoActiveOperation),
    }
}

/// Empty the ambient actor slot. A no-op outside any operation scope.
pub fn clear() {
    let _ = ACTIVE_ACTOR.try_with(|slot| slot.borrow_mut().take());
}

/// The current actor, or `None` when unset or outside any operation scope.
///
/// Never blocks, never fails.
pub fn current() -> Option<Arc<Principal>> {
    ACTIVE_ACTOR
        .try_with(|slot| slot.borrow().clone())
        .unwrap_or(None)
}

/// The current actor's id, for audit stamping.
pub fn current_actor_id() -> Option<PrincipalId> {
    current().map(|principal| principal.id())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
