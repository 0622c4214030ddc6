//! Organization domain model.
//!
//! Organizations are the tenant boundary: every tenant-owned record belongs to
//! exactly one organization, and access is granted per organization through
//! memberships.

use serde::{Deserialize, Serialize};

use super::{Language, OrganizationId};
use crate::entity::{Entity, EntityMeta};

// ═══════════════════════════════════════════════════════════════════════════════
// Subscription Plans
// ═══════════════════════════════════════════════════════════════════════════════

/// Subscription plan tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    Standard,
    Enterprise,
}

/// Resource limits attached to a plan. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub max_members: Option<u64>,
    pub max_projects: Option<u64>,
    pub storage_gb: u64,
    pub api_calls_per_month: u64,
}

impl Plan {
    /// The limits for this plan.
    pub const fn limits(&self) -> PlanLimits {
        match self {
            Self::Free => PlanLimits {
                max_members: Some(5),
                max_projects: Some(10),
                storage_gb: 1,
                api_calls_per_month: 1_000,
            },
            Self::Standard => PlanLimits {
                max_members: Some(25),
                max_projects: Some(100),
                storage_gb: 50,
                api_calls_per_month: 10_000,
            },
            Self::Enterprise => PlanLimits {
                max_members: None,
                max_projects: None,
                storage_gb: 500,
                api_calls_per_month: 100_000,
            },
        }
    }

    /// Whether this is a paid tier.
    pub const fn is_premium(&self) -> bool {
        matches!(self, Self::Standard | Self::Enterprise)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Organization
// ═══════════════════════════════════════════════════════════════════════════════

/// A tenant that owns data and grants access through memberships.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    #[serde(flatten)]
    pub meta: EntityMeta,

    /// Human-readable name.
    pub name: String,

    /// Free-form description.
    pub description: String,

    /// Subscription plan.
    pub plan: Plan,

    /// Default language for members without their own preference.
    pub language: Language,

    /// Enable experimental features for this organization.
    pub is_experimental: bool,

    /// Whether this organization is active. Deactivated organizations are
    /// invisible to the access guard.
    pub is_active: bool,

    /// Arbitrary plan/subscription attribute bag.
    pub settings: serde_json::Value,
}

impl Organization {
    /// Create a new active organization on the free plan.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::new(),
            name: name.into(),
            description: String::new(),
            plan: Plan::default(),
            language: Language::default(),
            is_experimental: false,
            is_active: true,
            settings: serde_json::json!({}),
        }
    }

    /// Set the subscription plan.
    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.plan = plan;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id(&self) -> OrganizationId {
        OrganizationId(self.meta.id)
    }

    /// Whether the organization can be operated on: active and not soft
    /// deleted.
    pub fn is_operational(&self) -> bool {
        self.is_active && !self.meta.is_deleted()
    }

    /// Whether the plan allows `additional` more members given the current
    /// active member count.
    pub fn can_add_members(&self, current_members: u64, additional: u64) -> bool {
        match self.plan.limits().max_members {
            None => true,
            Some(max) => current_members + additional <= max,
        }
    }
}

impl Entity for Organization {
    fn type_name() -> &'static str {
        "organization"
    }

    fn fields() -> &'static [&'static str] {
        &[
            "name",
            "description",
            "plan",
            "language",
            "is_experimental",
            "is_active",
            "settings",
        ]
    }

    fn declared_pii() -> Option<&'static [&'static str]> {
        Some(&["name"])
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

    #[test]
    fn test_free_plan_member_limit() {
        let org = Organization::new("Acme Corp");
        assert!(org.can_add_members(4, 1));
        assert!(!org.can_add_members(5, 1));
    }

    #[test]
    fn test_enterprise_plan_is_unlimited() {
        let org = Organization::new("Acme Corp").with_plan(Plan::Enterprise);
        assert!(org.can_add_members(10_000, 500));
    }

    #[test]
    fn test_premium_plans() {
        assert!(!Plan::Free.is_premium());
        assert!(Plan::Standard.is_premium());
        assert!(Plan::Enterprise.is_premium());
    }

    #[test]
    fn test_new_organization_is_operational() {
        let mut org = Organization::new("Acme Corp");
        assert!(org.is_operational());

        org.is_active = false;
        assert!(!org.is_operational());
    }
}
