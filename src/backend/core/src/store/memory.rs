//! In-memory entity store.
//!
//! Reference [`EntityStore`] implementation backed by a concurrent map. Used
//! by the test suites and as the blueprint for real backends: the deletion
//! filter is evaluated inside each query, exactly where a SQL backend would
//! put its `deleted_at IS NULL` predicate.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::{DeletionFilter, EntityStore, StoreError};
use crate::entity::Entity;

/// Concurrent in-memory store for one entity type.
#[derive(Debug)]
pub struct MemoryStore<T: Entity> {
    records: DashMap<Uuid, T>,
}

impl<T: Entity> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Number of records regardless of deletion state.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Entity> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for MemoryStore<T> {
    async fn insert(&self, record: T) -> Result<T, StoreError> {
        let id = record.entity_id();
        if self.records.contains_key(&id) {
            return Err(StoreError::Duplicate {
                kind: T::type_name(),
                id,
            });
        }
        self.records.insert(id, record.clone());
        Ok(record)
    }

    async fn fetch(&self, id: Uuid, filter: DeletionFilter) -> Result<Option<T>, StoreError> {
        Ok(self
            .records
            .get(&id)
            .filter(|record| filter.admits(record.meta()))
            .map(|record| record.clone()))
    }

    async fn replace(&self, record: T) -> Result<T, StoreError> {
        let id = record.entity_id();
        match self.records.get_mut(&id) {
            Some(mut slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(StoreError::NotFound {
                kind: T::type_name(),
                id,
            }),
        }
    }

    async fn list(&self, filter: DeletionFilter) -> Result<Vec<T>, StoreError> {
        let mut records: Vec<T> = self
            .records
            .iter()
            .filter(|entry| filter.admits(entry.meta()))
            .map(|entry| entry.clone())
            .collect();
        // Deterministic order for pagination-style consumers.
        records.sort_by_key(|record| (record.meta().created_at, record.entity_id()));
        Ok(records)
    }

    async fn count(&self, filter: DeletionFilter) -> Result<u64, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|entry| filter.admits(entry.meta()))
            .count() as u64)
    }

    async fn hard_delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.records.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Organization;
    use chrono::Utc;

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let store = MemoryStore::new();
        let org = store.insert(Organization::new("Acme Corp")).await.unwrap();

        let fetched = store
            .fetch(org.entity_id(), DeletionFilter::ActiveOnly)
            .await
            .unwrap();
        assert_eq!(fetched.unwrap().name, "Acme Corp");
    }

    #[tokio::test]
    async fn test_insert_duplicate_id_fails() {
        let store = MemoryStore::new();
        let org = store.insert(Organization::new("Acme Corp")).await.unwrap();

        let result = store.insert(org).await;
        assert!(matches!(result, Err(StoreError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn test_replace_missing_fails() {
        let store = MemoryStore::new();
        let result = store.replace(Organization::new("Ghost Inc")).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_filter_applied_in_query() {
        let store = MemoryStore::new();
        let live = store.insert(Organization::new("Live Corp")).await.unwrap();

        let mut trashed = Organization::new("Trashed Corp");
        trashed.meta.deleted_at = Some(Utc::now());
        let trashed = store.insert(trashed).await.unwrap();

        let active = store.list(DeletionFilter::ActiveOnly).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].entity_id(), live.entity_id());

        let deleted = store.list(DeletionFilter::DeletedOnly).await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].entity_id(), trashed.entity_id());

        assert_eq!(store.count(DeletionFilter::All).await.unwrap(), 2);
        assert_eq!(store.count(DeletionFilter::ActiveOnly).await.unwrap(), 1);

        let miss = store
            .fetch(trashed.entity_id(), DeletionFilter::ActiveOnly)
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_hard_delete() {
        let store = MemoryStore::new();
        let org = store.insert(Organization::new("Acme Corp")).await.unwrap();

        assert!(store.hard_delete(org.entity_id()).await.unwrap());
        assert!(!store.hard_delete(org.entity_id()).await.unwrap());
        assert_eq!(store.count(DeletionFilter::All).await.unwrap(), 0);
    }
}
