//! # Warden Core
//!
//! Multi-tenancy and access-control foundation for a CRUD backend.
//!
//! ## Architecture
//!
//! - **Context**: Task-scoped propagation of the acting principal
//! - **Entity Lifecycle**: Audit stamping and soft deletion on every write
//! - **Soft Delete Scoping**: Active / all / deleted-only read paths
//! - **Compliance**: Startup-time PII declaration validation
//! - **Access**: Role ordering, tenant membership, and the org-scoped guard
//! - **Store**: Repository abstraction over pluggable storage backends
//! - **Telemetry**: Structured logging infrastructure
//!
//! Every tenant-owned record embeds [`entity::EntityMeta`] and is written
//! through [`store::Repository`], which stamps `created_by`/`updated_by` from
//! the ambient [`context`] and turns deletion into a recoverable soft delete.
//! Inbound operations pass [`access::AccessGuard`] before reaching business
//! logic. Entity types are registered in a [`compliance::EntityRegistry`] and
//! validated once at boot.

pub mod access;
pub mod compliance;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod model;
pub mod store;
pub mod telemetry;

pub use error::{ErrorCode, ErrorSeverity, Result, WardenError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::access::{
        AccessError, AccessGrant, AccessGuard, MembershipError, MembershipService, Role,
        RoleRequirement,
    };
    pub use crate::compliance::{
        ComplianceReport, ComplianceValidator, EntityRegistry, TypeDescriptor,
    };
    pub use crate::config::{CompliancePolicy, CoreConfig};
    pub use crate::context::{self, ContextError};
    pub use crate::entity::{Entity, EntityMeta};
    pub use crate::error::{ErrorCode, ErrorSeverity, Result, WardenError};
    pub use crate::model::{
        Language, Membership, MembershipId, Organization, OrganizationId, Plan, PlanLimits,
        Principal, PrincipalId,
    };
    pub use crate::store::{DeletionFilter, EntityStore, MemoryStore, Repository, StoreError};
}
