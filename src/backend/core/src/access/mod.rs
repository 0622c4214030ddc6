//! Role-based access control and multi-tenancy.
//!
//! This module provides:
//! - **Roles**: the closed, totally ordered role hierarchy
//! - **Membership**: tenant membership storage and queries
//! - **Guard**: the single checkpoint every tenant-scoped operation passes
//!   through before reaching business logic
//!
//! # Usage
//!
//! ```rust,ignore
//! use warden_core::access::{AccessGuard, Role};
//!
//! let grant = guard.check(Some(&alice), org_id, Role::Manager).await?;
//! handle_request(grant.organization, grant.membership).await
//! ```

pub mod guard;
pub mod membership;
pub mod roles;

pub use guard::{AccessError, AccessGrant, AccessGuard};
pub use membership::{
    InMemoryMembershipStore, MembershipError, MembershipService, MembershipStore,
};
pub use roles::{Role, RoleRequirement};
