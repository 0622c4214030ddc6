//! The organization role hierarchy.
//!
//! Roles form a closed, totally ordered set:
//!
//! | Role    | Rank | Description                                    |
//! |---------|------|------------------------------------------------|
//! | Viewer  | 0    | Read-only access to organization data          |
//! | Manager | 1    | Manage organization data and invite members    |
//! | Admin   | 2    | Full control, including roles and memberships  |
//!
//! Comparisons go through the derived total order, never through string
//! checks, so `has_role` is monotonic by construction: a principal that
//! satisfies `Manager` always satisfies `Viewer`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A principal's role within one organization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer = 0,
    Manager = 1,
    Admin = 2,
}

impl Role {
    /// The role identifier string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Parse a role from its identifier string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "viewer" => Some(Self::Viewer),
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// All roles, in ascending order.
    pub const fn all() -> [Role; 3] {
        [Self::Viewer, Self::Manager, Self::Admin]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Role Requirement
// ═══════════════════════════════════════════════════════════════════════════════

/// What a guarded operation demands of the caller's role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRequirement {
    /// The role must be greater than or equal to the given minimum.
    AtLeast(Role),
    /// The role must be one of the listed roles exactly.
    OneOf(Vec<Role>),
}

impl RoleRequirement {
    /// Whether `role` satisfies this requirement.
    pub fn satisfied_by(&self, role: Role) -> bool {
        match self {
            Self::AtLeast(minimum) => role >= *minimum,
            Self::OneOf(accepted) => accepted.contains(&role),
        }
    }
}

impl From<Role> for RoleRequirement {
    fn from(minimum: Role) -> Self {
        Self::AtLeast(minimum)
    }
}

impl fmt::Display for RoleRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtLeast(minimum) => write!(f, "at least {}", minimum),
            Self::OneOf(accepted) => {
                let names: Vec<&str> = accepted.iter().map(Role::as_str).collect();
                write!(f, "one of [{}]", names.join(", "))
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_total_order() {
        assert!(Role::Viewer < Role::Manager);
        assert!(Role::Manager < Role::Admin);
        assert!(Role::Viewer < Role::Admin);
    }

    #[test]
    fn test_at_least_is_monotonic() {
        // Admin satisfies every tier below it.
        for minimum in Role::all() {
            assert!(RoleRequirement::AtLeast(minimum).satisfied_by(Role::Admin));
        }

        // Viewer satisfies only Viewer.
        assert!(RoleRequirement::AtLeast(Role::Viewer).satisfied_by(Role::Viewer));
        assert!(!RoleRequirement::AtLeast(Role::Manager).satisfied_by(Role::Viewer));
        assert!(!RoleRequirement::AtLeast(Role::Admin).satisfied_by(Role::Viewer));
    }

    #[test]
    fn test_one_of_is_exact() {
        let requirement = RoleRequirement::OneOf(vec![Role::Viewer, Role::Admin]);
        assert!(requirement.satisfied_by(Role::Viewer));
        assert!(requirement.satisfied_by(Role::Admin));
        assert!(!requirement.satisfied_by(Role::Manager));
    }

    #[test]
    fn test_parse_roundtrip() {
        for role in Role::all() {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("super_admin"), None);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::Manager).unwrap();
        assert_eq!(json, "\"manager\"");
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }
}
