//! Startup-time PII declaration validation.
//!
//! Makes it impossible to ship an entity type that exposes
//! personally-identifying data without an explicit compliance declaration.
//! Entity types are collected into an [`EntityRegistry`] at boot and
//! [`ComplianceValidator::validate_all_registered_types`] runs once before the
//! process finishes starting:
//!
//! - every field whose name matches a configured sensitive-name pattern must
//!   appear in the type's declared PII set, else startup fails with a fatal
//!   [`ComplianceError::Configuration`] naming the type and the undeclared
//!   fields;
//! - a type with matching fields and no declaration at all fails the same way
//!   (absence is not an implicit empty declaration);
//! - a declared field that does not exist on the type is a typo-tolerant
//!   warning, surfaced in logs and in the returned [`ComplianceReport`].
//!
//! The check establishes a program-wide guarantee and therefore never runs
//! per-request.

use parking_lot::RwLock;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::CompliancePolicy;
use crate::entity::Entity;

// ═══════════════════════════════════════════════════════════════════════════════
// Type Descriptors
// ═══════════════════════════════════════════════════════════════════════════════

/// Static metadata for one registered entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub type_name: &'static str,
    pub fields: &'static [&'static str],
    pub declared_pii: Option<&'static [&'static str]>,
}

impl TypeDescriptor {
    /// Build the descriptor for an entity type.
    pub fn of<T: Entity>() -> Self {
        Self {
            type_name: T::type_name(),
            fields: T::fields(),
            declared_pii: T::declared_pii(),
        }
    }
}

/// Collects entity-type metadata at boot.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    types: RwLock<Vec<TypeDescriptor>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type. Re-registering the same type is a no-op.
    pub fn register<T: Entity>(&self) {
        self.register_descriptor(TypeDescriptor::of::<T>());
    }

    /// Register a descriptor directly (integration path for types outside
    /// this crate's `Entity` trait).
    pub fn register_descriptor(&self, descriptor: TypeDescriptor) {
        let mut types = self.types.write();
        if types.iter().any(|t| t.type_name == descriptor.type_name) {
            return;
        }
        types.push(descriptor);
    }

    /// Snapshot of the registered descriptors.
    pub fn descriptors(&self) -> Vec<TypeDescriptor> {
        self.types.read().clone()
    }

    /// Register the entity types this crate ships.
    pub fn with_builtin_types(self) -> Self {
        self.register::<crate::model::Principal>();
        self.register::<crate::model::Organization>();
        self.register::<crate::model::Membership>();
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Errors and Diagnostics
// ═══════════════════════════════════════════════════════════════════════════════

/// One type that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceViolation {
    pub type_name: &'static str,
    /// Sensitive fields missing from the declaration.
    pub undeclared: Vec<&'static str>,
    /// Whether the type never declared a PII set at all.
    pub declaration_missing: bool,
}

impl fmt::Display for ComplianceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.declaration_missing {
            write!(
                f,
                "{} has sensitive fields [{}] but no PII declaration",
                self.type_name,
                self.undeclared.join(", ")
            )
        } else {
            write!(
                f,
                "{} has undeclared sensitive fields [{}]",
                self.type_name,
                self.undeclared.join(", ")
            )
        }
    }
}

/// A declared PII field that does not exist on the type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceWarning {
    pub type_name: &'static str,
    pub unknown_fields: Vec<&'static str>,
}

/// Compliance validation errors. Fatal: the process must not finish starting.
#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("PII compliance configuration invalid: {}",
        .violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Configuration { violations: Vec<ComplianceViolation> },
}

/// Diagnostics from a successful validation run.
#[derive(Debug, Clone, Default)]
pub struct ComplianceReport {
    pub checked_types: usize,
    pub warnings: Vec<ComplianceWarning>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sensitive Field Patterns
// ═══════════════════════════════════════════════════════════════════════════════

/// Case-insensitive exact-or-substring matching against the configured
/// sensitive-name terms.
#[derive(Debug, Clone)]
pub struct SensitiveFieldPatterns {
    terms: Vec<String>,
}

impl SensitiveFieldPatterns {
    pub fn new(terms: impl IntoIterator<Item = String>) -> Self {
        Self {
            terms: terms
                .into_iter()
                .map(|term| term.to_lowercase())
                .collect(),
        }
    }

    /// Whether a field name matches any sensitive-name term.
    pub fn matches(&self, field: &str) -> bool {
        let field = field.to_lowercase();
        self.terms
            .iter()
            .any(|term| field == *term || field.contains(term.as_str()))
    }
}

impl From<&CompliancePolicy> for SensitiveFieldPatterns {
    fn from(policy: &CompliancePolicy) -> Self {
        Self::new(policy.sensitive_patterns.iter().cloned())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Validator
// ═══════════════════════════════════════════════════════════════════════════════

/// Validates every registered entity type against the sensitive-name
/// patterns. Invoked once at process boot; a `Configuration` error must abort
/// startup.
#[derive(Debug, Clone)]
pub struct ComplianceValidator {
    patterns: SensitiveFieldPatterns,
}

impl ComplianceValidator {
    pub fn new(policy: &CompliancePolicy) -> Self {
        Self {
            patterns: SensitiveFieldPatterns::from(policy),
        }
    }

    /// Validate every type in the registry.
    ///
    /// Collects all violations rather than stopping at the first, so one boot
    /// failure surfaces the full cleanup list.
    pub fn validate_all_registered_types(
        &self,
        registry: &EntityRegistry,
    ) -> Result<ComplianceReport, ComplianceError> {
        let descriptors = registry.descriptors();
        let mut violations = Vec::new();
        let mut report = ComplianceReport {
            checked_types: descriptors.len(),
            warnings: Vec::new(),
        };

        for descriptor in &descriptors {
            let sensitive: Vec<&'static str> = descriptor
                .fields
                .iter()
                .copied()
                .filter(|field| self.patterns.matches(field))
                .collect();

            match descriptor.declared_pii {
                None => {
                    if !sensitive.is_empty() {
                        violations.push(ComplianceViolation {
                            type_name: descriptor.type_name,
                            undeclared: sensitive,
                            declaration_missing: true,
                        });
                    }
                }
                Some(declared) => {
                    let undeclared: Vec<&'static str> = sensitive
                        .into_iter()
                        .filter(|field| !declared.contains(field))
                        .collect();
                    if !undeclared.is_empty() {
                        violations.push(ComplianceViolation {
                            type_name: descriptor.type_name,
                            undeclared,
                            declaration_missing: false,
                        });
                    }

                    let unknown: Vec<&'static str> = declared
                        .iter()
                        .copied()
                        .filter(|field| !descriptor.fields.contains(field))
                        .collect();
                    if !unknown.is_empty() {
                        warn!(
                            entity_type = descriptor.type_name,
                            fields = ?unknown,
                            "PII declaration names fields that do not exist on the type"
                        );
                        report.warnings.push(ComplianceWarning {
                            type_name: descriptor.type_name,
                            unknown_fields: unknown,
                        });
                    }
                }
            }
        }

        if !violations.is_empty() {
            return Err(ComplianceError::Configuration { violations });
        }

        info!(
            checked_types = report.checked_types,
            warnings = report.warnings.len(),
            "PII compliance validation passed"
        );
        Ok(report)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
