//! Entity metadata: audit trail, soft deletion, and the static field table.
//!
//! Every persisted record embeds an [`EntityMeta`] and implements [`Entity`].
//! The metadata carries the audit trail (`created_at`/`created_by`,
//! `updated_at`/`updated_by`) and the soft-delete marker (`deleted_at`); the
//! trait additionally exposes a statically enumerable field table used by the
//! startup compliance validator.
//!
//! Stamping is performed exclusively by the write paths in
//! [`crate::store::Repository`] and [`crate::access::MembershipService`], never
//! by entity constructors, so that audit fields always reflect the actor in
//! [`crate::context`] at the moment of the write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context;
use crate::model::PrincipalId;

// ═══════════════════════════════════════════════════════════════════════════════
// Entity Metadata
// ═══════════════════════════════════════════════════════════════════════════════

/// Audit and soft-delete metadata embedded in every persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    /// Unique identifier for this record.
    pub id: Uuid,

    /// When the record was created. Immutable after creation.
    pub created_at: DateTime<Utc>,

    /// When the record was last written.
    pub updated_at: DateTime<Utc>,

    /// Principal that created the record. `None` only for system-initiated
    /// writes. Immutable after creation.
    pub created_by: Option<PrincipalId>,

    /// Principal that last wrote the record. `None` when no actor was in
    /// context at write time.
    pub updated_by: Option<PrincipalId>,

    /// When the record was soft deleted. Only the soft-delete operation sets
    /// this; ordinary field updates never touch it.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EntityMeta {
    /// Fresh metadata for a record that has not been persisted yet.
    ///
    /// Audit fields are filled in by the create hook at persist time.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            created_by: None,
            updated_by: None,
            deleted_at: None,
        }
    }

    /// Whether this record has been soft deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Create-time stamp: both timestamps to now, both actor fields to the
    /// ambient actor (which may be absent).
    pub(crate) fn stamp_create(&mut self) {
        let now = Utc::now();
        let actor = context::current_actor_id();
        self.created_at = now;
        self.updated_at = now;
        self.created_by = actor;
        self.updated_by = actor;
    }

    /// Update-time stamp: `updated_at` to now, `updated_by` to the ambient
    /// actor. `created_*` are never touched here.
    pub(crate) fn stamp_update(&mut self) {
        self.updated_at = Utc::now();
        self.updated_by = context::current_actor_id();
    }
}

impl Default for EntityMeta {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Entity Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// A persisted, tenant-owned record with audit metadata and a declared field
/// table.
///
/// `fields()` enumerates the type's own persisted field names (the embedded
/// metadata columns are implicit and uniform across all types); the compliance
/// validator matches them against the configured sensitive-name patterns at
/// startup. `declared_pii()` is the type's explicit compliance declaration:
/// `None` means the type never declared one, which is distinct from an empty
/// declaration and fails validation whenever sensitive fields are detected.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Stable snake_case name of this entity type, used in diagnostics.
    fn type_name() -> &'static str;

    /// The type's own persisted field names.
    fn fields() -> &'static [&'static str];

    /// The declared set of personally-identifying field names, or `None` if
    /// the type never declared one.
    fn declared_pii() -> Option<&'static [&'static str]>;

    /// The embedded metadata.
    fn meta(&self) -> &EntityMeta;

    /// Mutable access to the embedded metadata. Reserved for the write paths;
    /// mutating audit fields directly from business logic voids the trail.
    fn meta_mut(&mut self) -> &mut EntityMeta;

    /// The record id.
    fn entity_id(&self) -> Uuid {
        self.meta().id
    }

    /// Whether this record has been soft deleted.
    fn is_deleted(&self) -> bool {
        self.meta().is_deleted()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
