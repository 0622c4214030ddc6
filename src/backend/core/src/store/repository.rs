//! Lifecycle-enforcing repository.
//!
//! [`Repository`] is the standard write path for every entity: it stamps the
//! audit trail from the ambient actor context, redirects deletion into soft
//! delete, and rejects writes that would alter creation fields. Because the
//! hooks live here rather than in each entity type, they cannot be skipped by
//! callers going through the standard path, and they run inside the same
//! store call as the triggering write.

use std::sync::Arc;
use uuid::Uuid;

use chrono::Utc;

use super::{DeletionFilter, EntityStore, StoreError};
use crate::entity::Entity;

/// Audit-stamping, soft-deleting wrapper over an [`EntityStore`].
pub struct Repository<T: Entity> {
    store: Arc<dyn EntityStore<T>>,
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn EntityStore<T>>) -> Self {
        Self { store }
    }

    /// In-memory-backed repository, for tests and reference wiring.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(super::MemoryStore::new()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist a new record.
    ///
    /// Sets `created_at`/`updated_at` to now and `created_by`/`updated_by` to
    /// the current actor (absent for system-initiated writes).
    pub async fn create(&self, mut record: T) -> Result<T, StoreError> {
        record.meta_mut().stamp_create();
        self.store.insert(record).await
    }

    /// Persist field changes to an existing record.
    ///
    /// Stamps `updated_at`/`updated_by`. Creation fields are immutable: a
    /// record whose `created_at` or `created_by` differs from the stored row
    /// is rejected with [`StoreError::ImmutableField`]. `deleted_at` is
    /// preserved from the stored row; only [`Repository::soft_delete`] and
    /// [`Repository::restore`] may change it.
    pub async fn update(&self, mut record: T) -> Result<T, StoreError> {
        let id = record.entity_id();
        let stored = self
            .store
            .fetch(id, DeletionFilter::All)
            .await?
            .ok_or(StoreError::NotFound {
                kind: T::type_name(),
                id,
            })?;

        if record.meta().created_at != stored.meta().created_at {
            return Err(StoreError::ImmutableField {
                kind: T::type_name(),
                field: "created_at",
                id,
            });
        }
        if record.meta().created_by != stored.meta().created_by {
            return Err(StoreError::ImmutableField {
                kind: T::type_name(),
                field: "created_by",
                id,
            });
        }

        record.meta_mut().deleted_at = stored.meta().deleted_at;
        record.meta_mut().stamp_update();
        self.store.replace(record).await
    }

    /// Mark an active record as deleted without removing it from storage.
    ///
    /// The default deletion path. Stamps `updated_at`/`updated_by` like any
    /// other write. Fails with [`StoreError::NotFound`] when the record does
    /// not exist or is already deleted.
    pub async fn soft_delete(&self, id: Uuid) -> Result<T, StoreError> {
        let mut record = self
            .store
            .fetch(id, DeletionFilter::ActiveOnly)
            .await?
            .ok_or(StoreError::NotFound {
                kind: T::type_name(),
                id,
            })?;

        record.meta_mut().deleted_at = Some(Utc::now());
        record.meta_mut().stamp_update();
        self.store.replace(record).await
    }

    /// Bring a soft-deleted record back into the active set.
    ///
    /// Routed through the update stamp, so `updated_at`/`updated_by` record
    /// who restored it.
    pub async fn restore(&self, id: Uuid) -> Result<T, StoreError> {
        let mut record = self
            .store
            .fetch(id, DeletionFilter::DeletedOnly)
            .await?
            .ok_or(StoreError::NotFound {
                kind: T::type_name(),
                id,
            })?;

        record.meta_mut().deleted_at = None;
        record.meta_mut().stamp_update();
        self.store.replace(record).await
    }

    /// Physically remove a record regardless of deletion state.
    ///
    /// Deliberately named: nothing in the standard path calls this. Returns
    /// whether a record was removed.
    pub async fn hard_delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.store.hard_delete(id).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch an active record by id.
    pub async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        self.store.fetch(id, DeletionFilter::ActiveOnly).await
    }

    /// Fetch a record by id regardless of deletion state.
    pub async fn get_any(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        self.store.fetch(id, DeletionFilter::All).await
    }

    /// All active records.
    pub async fn active(&self) -> Result<Vec<T>, StoreError> {
        self.store.list(DeletionFilter::ActiveOnly).await
    }

    /// All records including soft-deleted ones.
    pub async fn all(&self) -> Result<Vec<T>, StoreError> {
        self.store.list(DeletionFilter::All).await
    }

    /// Only soft-deleted records.
    pub async fn deleted_only(&self) -> Result<Vec<T>, StoreError> {
        self.store.list(DeletionFilter::DeletedOnly).await
    }

    /// Count records under the given visibility filter.
    pub async fn count(&self, filter: DeletionFilter) -> Result<u64, StoreError> {
        self.store.count(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context;
    use crate::model::{Organization, Principal};
    use std::sync::Arc;

    fn actor(email: &str) -> Arc<Principal> {
        Arc::new(Principal::new(email, "Test Actor"))
    }

    #[tokio::test]
    async fn test_create_stamps_actor() {
        let repo = Repository::in_memory();
        let alice = actor("alice@example.com");

        let org = context::scope(alice.clone(), async {
            repo.create(Organization::new("Acme Corp")).await
        })
        .await
        .unwrap();

        assert_eq!(org.meta.created_by, Some(alice.id()));
        assert_eq!(org.meta.updated_by, Some(alice.id()));
    }

    #[tokio::test]
    async fn test_create_without_actor_leaves_null_audit() {
        let repo = Repository::in_memory();
        let org = repo.create(Organization::new("Acme Corp")).await.unwrap();
        assert!(org.meta.created_by.is_none());
        assert!(org.meta.updated_by.is_none());
    }

    #[tokio::test]
    async fn test_update_rejects_created_by_change() {
        let repo = Repository::in_memory();
        let alice = actor("alice@example.com");
        let mallory = actor("mallory@example.com");

        let org = context::scope(alice.clone(), async {
            repo.create(Organization::new("Acme Corp")).await
        })
        .await
        .unwrap();

        let mut tampered = org.clone();
        tampered.meta.created_by = Some(mallory.id());
        let result = repo.update(tampered).await;
        assert!(matches!(
            result,
            Err(StoreError::ImmutableField {
                field: "created_by",
                ..
            })
        ));

        // Stored row must be untouched.
        let stored = repo.get(org.entity_id()).await.unwrap().unwrap();
        assert_eq!(stored.meta.created_by, Some(alice.id()));
    }

    #[tokio::test]
    async fn test_update_rejects_created_at_change() {
        let repo = Repository::in_memory();
        let org = repo.create(Organization::new("Acme Corp")).await.unwrap();

        let mut tampered = org;
        tampered.meta.created_at = Utc::now() + chrono::Duration::hours(1);
        let result = repo.update(tampered).await;
        assert!(matches!(
            result,
            Err(StoreError::ImmutableField {
                field: "created_at",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_ordinary_update_cannot_touch_deleted_at() {
        let repo = Repository::in_memory();
        let org = repo.create(Organization::new("Acme Corp")).await.unwrap();

        // An update that tries to sneak in a deletion timestamp is persisted
        // with the stored value (still live) instead.
        let mut sneaky = org.clone();
        sneaky.meta.deleted_at = Some(Utc::now());
        sneaky.name = "Acme Corp Ltd".to_string();
        let updated = repo.update(sneaky).await.unwrap();

        assert!(updated.meta.deleted_at.is_none());
        assert_eq!(updated.name, "Acme Corp Ltd");
    }

    #[tokio::test]
    async fn test_soft_delete_twice_fails() {
        let repo = Repository::in_memory();
        let org = repo.create(Organization::new("Acme Corp")).await.unwrap();

        repo.soft_delete(org.entity_id()).await.unwrap();
        let again = repo.soft_delete(org.entity_id()).await;
        assert!(matches!(again, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_restore_requires_deleted_record() {
        let repo = Repository::in_memory();
        let org = repo.create(Organization::new("Acme Corp")).await.unwrap();

        let result = repo.restore(org.entity_id()).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
