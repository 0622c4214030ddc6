//! Storage abstraction: the entity store trait, soft-delete query scoping,
//! and the lifecycle-enforcing repository.
//!
//! Concrete storage backends (a SQL database, a document store) live outside
//! this crate and implement [`EntityStore`]. Business logic never talks to a
//! store directly: all writes go through [`Repository`], which is where the
//! audit stamping and soft-delete hooks run.
//!
//! Soft-delete visibility is part of every query ([`DeletionFilter`]) rather
//! than a post-filter in memory, so pagination, counting, and uniqueness
//! constraints scoped to active records behave correctly on real backends.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::entity::{Entity, EntityMeta};

pub mod memory;
pub mod repository;

pub use memory::MemoryStore;
pub use repository::Repository;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Storage layer errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("{kind} already exists: {id}")]
    Duplicate { kind: &'static str, id: Uuid },

    #[error("attempt to modify immutable field {field} on {kind} {id}")]
    ImmutableField {
        kind: &'static str,
        field: &'static str,
        id: Uuid,
    },

    #[error("storage backend failure: {0}")]
    Backend(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Deletion Filter
// ═══════════════════════════════════════════════════════════════════════════════

/// Soft-delete visibility scope, applied at the storage-query level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletionFilter {
    /// Only records where `deleted_at` is null. The path every ordinary
    /// business-logic read must use.
    #[default]
    ActiveOnly,
    /// All records regardless of `deleted_at`. Reserved for administrative,
    /// audit, and recovery use.
    All,
    /// Only soft-deleted records.
    DeletedOnly,
}

impl DeletionFilter {
    /// Whether a record with this metadata is visible under the filter.
    pub fn admits(&self, meta: &EntityMeta) -> bool {
        match self {
            Self::ActiveOnly => meta.deleted_at.is_none(),
            Self::All => true,
            Self::DeletedOnly => meta.deleted_at.is_some(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Entity Store Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Raw storage primitives for one entity type.
///
/// Implementations must apply the [`DeletionFilter`] inside the query (for a
/// SQL backend, a `deleted_at IS NULL` predicate) and enforce per-type
/// uniqueness constraints scoped to active records.
///
/// These primitives do not stamp audit fields; that is [`Repository`]'s job.
/// Callers outside this crate should not use a store directly for writes.
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Insert a new record. Fails with [`StoreError::Duplicate`] if the id is
    /// already present.
    async fn insert(&self, record: T) -> Result<T, StoreError>;

    /// Fetch a record by id under the given visibility filter.
    async fn fetch(&self, id: Uuid, filter: DeletionFilter) -> Result<Option<T>, StoreError>;

    /// Replace an existing record. Fails with [`StoreError::NotFound`] if the
    /// id is absent.
    async fn replace(&self, record: T) -> Result<T, StoreError>;

    /// List records under the given visibility filter.
    async fn list(&self, filter: DeletionFilter) -> Result<Vec<T>, StoreError>;

    /// Count records under the given visibility filter.
    async fn count(&self, filter: DeletionFilter) -> Result<u64, StoreError>;

    /// Physically remove a record. This is the explicitly-named escape hatch
    /// outside the standard (soft) deletion path; returns whether a record
    /// was removed.
    async fn hard_delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_filter_admits() {
        let mut meta = EntityMeta::new();
        assert!(DeletionFilter::ActiveOnly.admits(&meta));
        assert!(DeletionFilter::All.admits(&meta));
        assert!(!DeletionFilter::DeletedOnly.admits(&meta));

        meta.deleted_at = Some(Utc::now());
        assert!(!DeletionFilter::ActiveOnly.admits(&meta));
        assert!(DeletionFilter::All.admits(&meta));
        assert!(DeletionFilter::DeletedOnly.admits(&meta));
    }

    #[test]
    fn test_default_filter_is_active_only() {
        assert_eq!(DeletionFilter::default(), DeletionFilter::ActiveOnly);
    }
}
