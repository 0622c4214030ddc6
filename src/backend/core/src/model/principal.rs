//! Principal domain model.
//!
//! A principal is an authenticated actor capable of being "the current user"
//! in context. Principals are created by registration (outside this core),
//! mutated by profile updates, and never hard-deleted.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::{Language, PrincipalId};
use crate::entity::{Entity, EntityMeta};

/// An authenticated actor.
///
/// The email is unique case-insensitively across the system; it is normalized
/// to lowercase here, and the storage layer enforces the uniqueness
/// constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    #[serde(flatten)]
    pub meta: EntityMeta,

    /// Email address used for authentication. Stored lowercased.
    pub email: String,

    /// Full display name.
    pub full_name: String,

    /// Preferred interface language.
    pub language: Language,

    /// IANA timezone name.
    pub timezone: String,

    /// IP address of the last login, when known.
    pub last_login_ip: Option<IpAddr>,

    /// Whether this principal should be treated as active. Inactive
    /// principals cannot act.
    pub is_active: bool,
}

impl Principal {
    /// Create a new active principal. The email is trimmed and lowercased.
    pub fn new(email: impl AsRef<str>, full_name: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::new(),
            email: email.as_ref().trim().to_lowercase(),
            full_name: full_name.into(),
            language: Language::default(),
            timezone: "UTC".to_string(),
            last_login_ip: None,
            is_active: true,
        }
    }

    /// Set the preferred language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Set the timezone preference.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn id(&self) -> PrincipalId {
        PrincipalId(self.meta.id)
    }

    /// First word of the full name, falling back to the email.
    pub fn short_name(&self) -> &str {
        self.full_name
            .split_whitespace()
            .next()
            .unwrap_or(&self.email)
    }

    /// Whether this principal can currently act: active and not soft deleted.
    pub fn can_act(&self) -> bool {
        self.is_active && !self.meta.is_deleted()
    }
}

impl Entity for Principal {
    fn type_name() -> &'static str {
        "principal"
    }

    fn fields() -> &'static [&'static str] {
        &[
            "email",
            "full_name",
            "language",
            "timezone",
            "last_login_ip",
            "is_active",
        ]
    }

    fn declared_pii() -> Option<&'static [&'static str]> {
        Some(&["email", "full_name", "last_login_ip"])
    }

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}
