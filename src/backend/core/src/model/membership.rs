//! Membership domain model.
//!
//! A membership joins exactly one principal to exactly one organization and
//! carries the principal's role in that organization. Roles are never
//! inherited across organizations: the same principal may be `Admin` in one
//! tenant and `Viewer` in another.

use serde::{Deserialize, Serialize};

use super::{MembershipId, OrganizationId, PrincipalId};
use crate::access::Role;
use crate::entity::{Entity, EntityMeta};

/// Joins a principal to an organization with a role.
///
/// At most one active membership per principal may have `is_default` set;
/// the membership store rejects writes that would violate this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    #[serde(flatten)]
    pub meta: EntityMeta,

    pub principal_id: PrincipalId,

    pub organization_id: OrganizationId,

    /// The principal's role within this organization.
    pub role: Role,

    /// Whether this is the principal's default organization.
    pub is_default: bool,
}

impl Membership {
    /// Create a new non-default membership.
    pub fn new(principal_id: PrincipalId, organization_id: OrganizationId, role: Role) -> Self {
        Self {
            meta: EntityMeta::new(),
            principal_id,
            organization_id,
            role,
            is_default: false,
        }
    }

    /// Mark this membership as the principal's default.
    pub fn with_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn id(&self) -> MembershipId {
        MembershipId(self.meta.id)
    }

    /// Whether this membership currently grants access.
    pub fn is_active(&self) -> bool {
        !self.meta.is_deleted()
    }
}

impl Entity for Membership {
    fn type_name() -> &'static str {
        "membership"
    }

    fn fields() -> &'static [&'static str] {
        &["principal_id", "organization_id", "role", "is_default"]
    }

    fn declared_pii() -> Option<&'static [&'static str]> {
        // Explicitly declared empty: memberships carry no personal data.
        Some(&[])
    }

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_new_membership_is_active_non_default() {
        let membership = Membership::new(
            PrincipalId(Uuid::new_v4()),
            OrganizationId(Uuid::new_v4()),
            Role::Viewer,
        );
        assert!(membership.is_active());
        assert!(!membership.is_default);
    }

    #[test]
    fn test_with_default() {
        let membership = Membership::new(
            PrincipalId(Uuid::new_v4()),
            OrganizationId(Uuid::new_v4()),
            Role::Admin,
        )
        .with_default();
        assert!(membership.is_default);
    }
}
