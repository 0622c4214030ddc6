//! The org-scoped access guard.
//!
//! The single checkpoint every tenant-scoped operation passes through before
//! business logic runs. The transport layer resolves the organization id from
//! the inbound operation, the context carries the principal, and the guard
//! answers with either an [`AccessGrant`] or one of four distinct denial
//! kinds, checked in this order:
//!
//! 1. the organization exists and is operational, else
//!    [`AccessError::OrganizationNotFound`];
//! 2. a principal is present and able to act, else
//!    [`AccessError::Unauthenticated`];
//! 3. the principal holds an active membership, else
//!    [`AccessError::NotAMember`];
//! 4. the membership role satisfies the requirement, else
//!    [`AccessError::InsufficientRole`].
//!
//! The kinds stay distinct so transports can map them individually
//! (conventionally 404 / 401 / 403 / 403); a transport worried about tenant
//! enumeration may deliberately render `OrganizationNotFound` and
//! `NotAMember` identically. The guard never mutates membership or
//! organization state.

use metrics::counter;
use thiserror::Error;
use tracing::debug;

use super::membership::MembershipService;
use super::roles::{Role, RoleRequirement};
use crate::context;
use crate::model::{Membership, Organization, OrganizationId, Principal, PrincipalId};
use crate::store::Repository;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Access denial kinds, one per failed resolution step.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("organization not found: {0}")]
    OrganizationNotFound(OrganizationId),

    #[error("authentication required")]
    Unauthenticated,

    #[error("{principal} is not a member of organization {organization}")]
    NotAMember {
        principal: PrincipalId,
        organization: OrganizationId,
    },

    #[error("role {held} does not satisfy {required} in organization {organization}")]
    InsufficientRole {
        held: Role,
        required: RoleRequirement,
        organization: OrganizationId,
    },

    #[error("access check backend failure: {0}")]
    Backend(String),
}

impl AccessError {
    /// Stable label for metrics and logs.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::OrganizationNotFound(_) => "organization_not_found",
            Self::Unauthenticated => "unauthenticated",
            Self::NotAMember { .. } => "not_a_member",
            Self::InsufficientRole { .. } => "insufficient_role",
            Self::Backend(_) => "backend",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Grant
// ═══════════════════════════════════════════════════════════════════════════════

/// What a successful check hands to the downstream handler.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub organization: Organization,
    pub membership: Membership,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Access Guard
// ═══════════════════════════════════════════════════════════════════════════════

/// Authorizes tenant-scoped operations against organization membership.
#[derive(Clone)]
pub struct AccessGuard {
    organizations: Repository<Organization>,
    memberships: MembershipService,
}

impl AccessGuard {
    pub fn new(organizations: Repository<Organization>, memberships: MembershipService) -> Self {
        Self {
            organizations,
            memberships,
        }
    }

    /// Check whether `principal` may operate on `organization_id` with the
    /// given role requirement.
    pub async fn check(
        &self,
        principal: Option<&Principal>,
        organization_id: OrganizationId,
        required: impl Into<RoleRequirement>,
    ) -> Result<AccessGrant, AccessError> {
        let required = required.into();
        let result = self.resolve(principal, organization_id, &required).await;

        match &result {
            Ok(grant) => {
                counter!("warden_access_checks_total", "outcome" => "allowed").increment(1);
                debug!(
                    organization = %organization_id,
                    role = %grant.membership.role,
                    "Access granted"
                );
            }
            Err(error) => {
                counter!("warden_access_checks_total", "outcome" => error.reason()).increment(1);
                debug!(
                    organization = %organization_id,
                    reason = error.reason(),
                    "Access denied"
                );
            }
        }
        result
    }

    /// Like [`AccessGuard::check`], with the principal taken from the ambient
    /// actor context.
    pub async fn check_current(
        &self,
        organization_id: OrganizationId,
        required: impl Into<RoleRequirement>,
    ) -> Result<AccessGrant, AccessError> {
        let principal = context::current();
        self.check(principal.as_deref(), organization_id, required)
            .await
    }

    async fn resolve(
        &self,
        principal: Option<&Principal>,
        organization_id: OrganizationId,
        required: &RoleRequirement,
    ) -> Result<AccessGrant, AccessError> {
        // Soft-deleted organizations are filtered out by the active-only
        // fetch; deactivated ones are indistinguishable from absent.
        let organization = self
            .organizations
            .get(organization_id.as_uuid())
            .await
            .map_err(|e| AccessError::Backend(e.to_string()))?
            .filter(Organization::is_operational)
            .ok_or(AccessError::OrganizationNotFound(organization_id))?;

        let principal = principal
            .filter(|p| p.can_act())
            .ok_or(AccessError::Unauthenticated)?;

        let membership = self
            .memberships
            .membership(principal.id(), organization_id)
            .await
            .map_err(|e| AccessError::Backend(e.to_string()))?
            .ok_or(AccessError::NotAMember {
                principal: principal.id(),
                organization: organization_id,
            })?;

        if !required.satisfied_by(membership.role) {
            return Err(AccessError::InsufficientRole {
                held: membership.role,
                required: required.clone(),
                organization: organization_id,
            });
        }

        Ok(AccessGrant {
            organization,
            membership,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
