//! Tenant membership storage and queries.
//!
//! [`MembershipStore`] is the storage seam for membership rows; it owns the
//! two write-time constraints:
//!
//! - one active membership per (principal, organization) pair;
//! - at most one active default membership per principal.
//!
//! Constraints belong to the storage layer because membership writes may race
//! across processes: a SQL backend enforces them with (partial) unique
//! indexes, while the in-memory reference implementation serializes
//! check-and-write under a lock.
//!
//! [`MembershipService`] layers the domain operations on top and is the only
//! write path, so every membership row carries the same audit stamping as any
//! other entity.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::roles::Role;
use crate::entity::Entity;
use crate::model::{Membership, MembershipId, OrganizationId, PrincipalId};
use crate::store::{DeletionFilter, StoreError};

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Membership model errors.
#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("{principal} already has an active membership in organization {organization}")]
    Duplicate {
        principal: PrincipalId,
        organization: OrganizationId,
    },

    #[error("{principal} already has a default membership ({existing})")]
    DefaultConflict {
        principal: PrincipalId,
        existing: MembershipId,
    },

    #[error("no membership for {principal} in organization {organization}")]
    NotFound {
        principal: PrincipalId,
        organization: OrganizationId,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Membership Store Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Storage primitives for membership rows.
///
/// Write methods must enforce the pair-uniqueness and single-default
/// constraints atomically with the write itself.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Insert a new membership row.
    async fn insert(&self, membership: Membership) -> Result<Membership, MembershipError>;

    /// Replace an existing membership row.
    async fn replace(&self, membership: Membership) -> Result<Membership, MembershipError>;

    /// Find the membership for a (principal, organization) pair.
    async fn find(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
        filter: DeletionFilter,
    ) -> Result<Option<Membership>, MembershipError>;

    /// All memberships held by a principal.
    async fn for_principal(
        &self,
        principal: PrincipalId,
        filter: DeletionFilter,
    ) -> Result<Vec<Membership>, MembershipError>;

    /// All memberships within an organization.
    async fn for_organization(
        &self,
        organization: OrganizationId,
        filter: DeletionFilter,
    ) -> Result<Vec<Membership>, MembershipError>;

    /// The principal's active default membership, if any.
    async fn default_for(
        &self,
        principal: PrincipalId,
    ) -> Result<Option<Membership>, MembershipError>;

    /// Physically remove a membership row. Returns whether a row was removed.
    async fn hard_delete(&self, id: MembershipId) -> Result<bool, MembershipError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// In-Memory Store
// ═══════════════════════════════════════════════════════════════════════════════

/// Reference in-memory [`MembershipStore`].
#[derive(Debug, Default)]
pub struct InMemoryMembershipStore {
    rows: DashMap<Uuid, Membership>,
    // Serializes constraint check + write; a database backend would use
    // unique indexes instead of a process-local lock.
    write_lock: Mutex<()>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_constraints(
        &self,
        candidate: &Membership,
        exclude: Option<Uuid>,
    ) -> Result<(), MembershipError> {
        // Soft-deleted rows count as absent for both constraints.
        if !candidate.is_active() {
            return Ok(());
        }

        for row in self.rows.iter() {
            if Some(row.entity_id()) == exclude || !row.is_active() {
                continue;
            }
            if row.principal_id == candidate.principal_id
                && row.organization_id == candidate.organization_id
            {
                return Err(MembershipError::Duplicate {
                    principal: candidate.principal_id,
                    organization: candidate.organization_id,
                });
            }
            if candidate.is_default
                && row.is_default
                && row.principal_id == candidate.principal_id
            {
                return Err(MembershipError::DefaultConflict {
                    principal: candidate.principal_id,
                    existing: row.id(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn insert(&self, membership: Membership) -> Result<Membership, MembershipError> {
        let _guard = self.write_lock.lock();
        let id = membership.entity_id();
        if self.rows.contains_key(&id) {
            return Err(StoreError::Duplicate {
                kind: Membership::type_name(),
                id,
            }
            .into());
        }
        self.check_constraints(&membership, None)?;
        self.rows.insert(id, membership.clone());
        Ok(membership)
    }

    async fn replace(&self, membership: Membership) -> Result<Membership, MembershipError> {
        let _guard = self.write_lock.lock();
        let id = membership.entity_id();
        if !self.rows.contains_key(&id) {
            return Err(StoreError::NotFound {
                kind: Membership::type_name(),
                id,
            }
            .into());
        }
        self.check_constraints(&membership, Some(id))?;
        self.rows.insert(id, membership.clone());
        Ok(membership)
    }

    async fn find(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
        filter: DeletionFilter,
    ) -> Result<Option<Membership>, MembershipError> {
        Ok(self
            .rows
            .iter()
            .find(|row| {
                row.principal_id == principal
                    && row.organization_id == organization
                    && filter.admits(row.meta())
            })
            .map(|row| row.clone()))
    }

    async fn for_principal(
        &self,
        principal: PrincipalId,
        filter: DeletionFilter,
    ) -> Result<Vec<Membership>, MembershipError> {
        let mut rows: Vec<Membership> = self
            .rows
            .iter()
            .filter(|row| row.principal_id == principal && filter.admits(row.meta()))
            .map(|row| row.clone())
            .collect();
        rows.sort_by_key(|row| (row.meta.created_at, row.entity_id()));
        Ok(rows)
    }

    async fn for_organization(
        &self,
        organization: OrganizationId,
        filter: DeletionFilter,
    ) -> Result<Vec<Membership>, MembershipError> {
        let mut rows: Vec<Membership> = self
            .rows
            .iter()
            .filter(|row| row.organization_id == organization && filter.admits(row.meta()))
            .map(|row| row.clone())
            .collect();
        rows.sort_by_key(|row| (row.meta.created_at, row.entity_id()));
        Ok(rows)
    }

    async fn default_for(
        &self,
        principal: PrincipalId,
    ) -> Result<Option<Membership>, MembershipError> {
        Ok(self
            .rows
            .iter()
            .find(|row| row.principal_id == principal && row.is_default && row.is_active())
            .map(|row| row.clone()))
    }

    async fn hard_delete(&self, id: MembershipId) -> Result<bool, MembershipError> {
        let _guard = self.write_lock.lock();
        Ok(self.rows.remove(&id.as_uuid()).is_some())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Membership Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Domain operations over tenant memberships.
///
/// The only membership write path: every mutation stamps the audit trail from
/// the ambient actor context before it reaches the store.
#[derive(Clone)]
pub struct MembershipService {
    store: Arc<dyn MembershipStore>,
}

impl MembershipService {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// In-memory-backed service, for tests and reference wiring.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryMembershipStore::new()))
    }

    /// Access to the underlying store, for the guard's queries.
    pub fn store(&self) -> &Arc<dyn MembershipStore> {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// The principal's role in an organization, or `None` without an active
    /// membership (soft-deleted memberships count as absent).
    pub async fn get_role(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
    ) -> Result<Option<Role>, MembershipError> {
        Ok(self
            .store
            .find(principal, organization, DeletionFilter::ActiveOnly)
            .await?
            .map(|membership| membership.role))
    }

    /// Whether the principal holds an active membership with a role at or
    /// above `minimum`.
    pub async fn has_role(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
        minimum: Role,
    ) -> Result<bool, MembershipError> {
        Ok(self
            .get_role(principal, organization)
            .await?
            .is_some_and(|role| role >= minimum))
    }

    /// The principal's active membership in an organization.
    pub async fn membership(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
    ) -> Result<Option<Membership>, MembershipError> {
        self.store
            .find(principal, organization, DeletionFilter::ActiveOnly)
            .await
    }

    /// The principal's default membership, if any.
    pub async fn default_membership(
        &self,
        principal: PrincipalId,
    ) -> Result<Option<Membership>, MembershipError> {
        self.store.default_for(principal).await
    }

    /// The principal's default organization, if any.
    pub async fn default_organization(
        &self,
        principal: PrincipalId,
    ) -> Result<Option<OrganizationId>, MembershipError> {
        Ok(self
            .default_membership(principal)
            .await?
            .map(|membership| membership.organization_id))
    }

    /// Active memberships within an organization.
    pub async fn members_of(
        &self,
        organization: OrganizationId,
    ) -> Result<Vec<Membership>, MembershipError> {
        self.store
            .for_organization(organization, DeletionFilter::ActiveOnly)
            .await
    }

    /// Organizations the principal actively belongs to.
    pub async fn organizations_of(
        &self,
        principal: PrincipalId,
    ) -> Result<Vec<OrganizationId>, MembershipError> {
        Ok(self
            .store
            .for_principal(principal, DeletionFilter::ActiveOnly)
            .await?
            .into_iter()
            .map(|membership| membership.organization_id)
            .collect())
    }

    /// Number of active members, for plan-limit checks.
    pub async fn active_member_count(
        &self,
        organization: OrganizationId,
    ) -> Result<u64, MembershipError> {
        Ok(self.members_of(organization).await?.len() as u64)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a principal to an organization.
    pub async fn join(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
        role: Role,
    ) -> Result<Membership, MembershipError> {
        let mut membership = Membership::new(principal, organization, role);
        membership.meta.stamp_create();
        self.store.insert(membership).await
    }

    /// Add a principal to an organization as their default.
    ///
    /// Fails with [`MembershipError::DefaultConflict`] if the principal
    /// already has an active default membership; the pre-existing default is
    /// left unchanged.
    pub async fn join_as_default(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
        role: Role,
    ) -> Result<Membership, MembershipError> {
        let mut membership = Membership::new(principal, organization, role).with_default();
        membership.meta.stamp_create();
        self.store.insert(membership).await
    }

    /// Reassign the principal's role in an organization.
    pub async fn change_role(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
        role: Role,
    ) -> Result<Membership, MembershipError> {
        let mut membership = self
            .membership(principal, organization)
            .await?
            .ok_or(MembershipError::NotFound {
                principal,
                organization,
            })?;
        membership.role = role;
        membership.meta.stamp_update();
        self.store.replace(membership).await
    }

    /// Move the principal's default flag to the given organization.
    ///
    /// Unlike a raw default insert, this transfers the flag: the previous
    /// default membership (if any) is cleared first.
    pub async fn set_default(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
    ) -> Result<Membership, MembershipError> {
        let mut target = self
            .membership(principal, organization)
            .await?
            .ok_or(MembershipError::NotFound {
                principal,
                organization,
            })?;
        if target.is_default {
            return Ok(target);
        }

        if let Some(mut previous) = self.store.default_for(principal).await? {
            previous.is_default = false;
            previous.meta.stamp_update();
            self.store.replace(previous).await?;
        }

        target.is_default = true;
        target.meta.stamp_update();
        self.store.replace(target).await
    }

    /// End a membership recoverably (soft delete).
    pub async fn leave(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
    ) -> Result<Membership, MembershipError> {
        let mut membership = self
            .membership(principal, organization)
            .await?
            .ok_or(MembershipError::NotFound {
                principal,
                organization,
            })?;
        membership.meta.deleted_at = Some(chrono::Utc::now());
        membership.meta.stamp_update();
        self.store.replace(membership).await
    }

    /// End a membership permanently (hard delete).
    pub async fn remove(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
    ) -> Result<(), MembershipError> {
        let membership = self
            .store
            .find(principal, organization, DeletionFilter::All)
            .await?
            .ok_or(MembershipError::NotFound {
                principal,
                organization,
            })?;
        self.store.hard_delete(membership.id()).await?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (PrincipalId, OrganizationId) {
        (
            PrincipalId(Uuid::new_v4()),
            OrganizationId(Uuid::new_v4()),
        )
    }

    #[tokio::test]
    async fn test_join_and_get_role() {
        let service = MembershipService::in_memory();
        let (alice, org) = ids();

        service.join(alice, org, Role::Manager).await.unwrap();
        assert_eq!(service.get_role(alice, org).await.unwrap(), Some(Role::Manager));
    }

    #[tokio::test]
    async fn test_role_is_per_organization() {
        let service = MembershipService::in_memory();
        let (alice, org1) = ids();
        let org2 = OrganizationId(Uuid::new_v4());

        service.join(alice, org1, Role::Admin).await.unwrap();
        service.join(alice, org2, Role::Viewer).await.unwrap();

        assert_eq!(service.get_role(alice, org1).await.unwrap(), Some(Role::Admin));
        assert_eq!(service.get_role(alice, org2).await.unwrap(), Some(Role::Viewer));
    }

    #[tokio::test]
    async fn test_has_role_monotonic() {
        let service = MembershipService::in_memory();
        let (alice, org) = ids();
        service.join(alice, org, Role::Admin).await.unwrap();

        for minimum in Role::all() {
            assert!(service.has_role(alice, org, minimum).await.unwrap());
        }

        let (bob, _) = ids();
        service.join(bob, org, Role::Viewer).await.unwrap();
        assert!(service.has_role(bob, org, Role::Viewer).await.unwrap());
        assert!(!service.has_role(bob, org, Role::Manager).await.unwrap());
        assert!(!service.has_role(bob, org, Role::Admin).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_membership_rejected() {
        let service = MembershipService::in_memory();
        let (alice, org) = ids();

        service.join(alice, org, Role::Viewer).await.unwrap();
        let result = service.join(alice, org, Role::Manager).await;
        assert!(matches!(result, Err(MembershipError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn test_second_default_rejected_and_first_unchanged() {
        let service = MembershipService::in_memory();
        let (alice, org1) = ids();
        let org2 = OrganizationId(Uuid::new_v4());

        let first = service
            .join_as_default(alice, org1, Role::Admin)
            .await
            .unwrap();

        let result = service.join_as_default(alice, org2, Role::Viewer).await;
        assert!(matches!(
            result,
            Err(MembershipError::DefaultConflict { .. })
        ));

        let current = service.default_membership(alice).await.unwrap().unwrap();
        assert_eq!(current.id(), first.id());
        assert_eq!(current.organization_id, org1);
    }

    #[tokio::test]
    async fn test_set_default_transfers_flag() {
        let service = MembershipService::in_memory();
        let (alice, org1) = ids();
        let org2 = OrganizationId(Uuid::new_v4());

        service.join_as_default(alice, org1, Role::Admin).await.unwrap();
        service.join(alice, org2, Role::Viewer).await.unwrap();

        service.set_default(alice, org2).await.unwrap();

        let current = service.default_membership(alice).await.unwrap().unwrap();
        assert_eq!(current.organization_id, org2);

        let old = service.membership(alice, org1).await.unwrap().unwrap();
        assert!(!old.is_default);
    }

    #[tokio::test]
    async fn test_leave_makes_membership_invisible() {
        let service = MembershipService::in_memory();
        let (alice, org) = ids();

        service.join(alice, org, Role::Manager).await.unwrap();
        service.leave(alice, org).await.unwrap();

        assert_eq!(service.get_role(alice, org).await.unwrap(), None);
        assert!(!service.has_role(alice, org, Role::Viewer).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejoin_after_leave() {
        let service = MembershipService::in_memory();
        let (alice, org) = ids();

        service.join(alice, org, Role::Manager).await.unwrap();
        service.leave(alice, org).await.unwrap();

        // The soft-deleted row counts as absent for pair uniqueness.
        service.join(alice, org, Role::Viewer).await.unwrap();
        assert_eq!(service.get_role(alice, org).await.unwrap(), Some(Role::Viewer));
    }

    #[tokio::test]
    async fn test_change_role() {
        let service = MembershipService::in_memory();
        let (alice, org) = ids();

        service.join(alice, org, Role::Viewer).await.unwrap();
        service.change_role(alice, org, Role::Admin).await.unwrap();
        assert_eq!(service.get_role(alice, org).await.unwrap(), Some(Role::Admin));
    }

    #[tokio::test]
    async fn test_remove_is_permanent() {
        let service = MembershipService::in_memory();
        let (alice, org) = ids();

        service.join(alice, org, Role::Viewer).await.unwrap();
        service.remove(alice, org).await.unwrap();

        let any = service
            .store()
            .find(alice, org, DeletionFilter::All)
            .await
            .unwrap();
        assert!(any.is_none());
    }

    #[tokio::test]
    async fn test_member_count_ignores_deleted() {
        let service = MembershipService::in_memory();
        let (alice, org) = ids();
        let (bob, _) = ids();

        service.join(alice, org, Role::Admin).await.unwrap();
        service.join(bob, org, Role::Viewer).await.unwrap();
        assert_eq!(service.active_member_count(org).await.unwrap(), 2);

        service.leave(bob, org).await.unwrap();
        assert_eq!(service.active_member_count(org).await.unwrap(), 1);
    }
}
