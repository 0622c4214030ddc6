//! Error handling for Warden Core.
//!
//! Each subsystem defines its own `thiserror` enum ([`crate::context::ContextError`],
//! [`crate::access::AccessError`], [`crate::store::StoreError`],
//! [`crate::access::MembershipError`], [`crate::compliance::ComplianceError`]);
//! this module aggregates them into [`WardenError`] with a stable
//! machine-readable [`ErrorCode`] taxonomy, a severity level, and metrics
//! integration.
//!
//! The taxonomy mirrors how callers must treat each failure:
//!
//! - **Fatal/startup** (`ComplianceConfiguration`): the process must not
//!   finish starting. Never recovered automatically.
//! - **Access** (`Unauthenticated`, `NotAMember`, `InsufficientRole`,
//!   `OrganizationNotFound`, `DefaultConflict`): distinct typed failures,
//!   never collapsed into a generic error, never retried (they are not
//!   transient). The transport layer owns the status-code mapping; the
//!   conventional one is `Unauthenticated` -> 401, `NotAMember` /
//!   `InsufficientRole` -> 403, `OrganizationNotFound` -> 404. Integrators
//!   worried about tenant enumeration may deliberately serve `NotAMember` and
//!   `OrganizationNotFound` as the same response.
//! - **Invariant violations** (`ContextAlreadySet`, `NoActiveOperation`,
//!   `ImmutableField`): bugs in calling code, surfaced immediately.

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

use crate::access::{AccessError, MembershipError};
use crate::compliance::ComplianceError;
use crate::context::ContextError;
use crate::store::StoreError;

// ═══════════════════════════════════════════════════════════════════════════════
// Result Type Alias
// ═══════════════════════════════════════════════════════════════════════════════

/// A specialized Result type for Warden operations.
pub type Result<T> = std::result::Result<T, WardenError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes.
///
/// These codes are stable and can be used by clients for programmatic error
/// handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Context errors (1000-1099)
    ContextAlreadySet,
    NoActiveOperation,

    // Lifecycle errors (1100-1199)
    ImmutableField,

    // Access errors (1200-1299)
    Unauthenticated,
    NotAMember,
    InsufficientRole,
    OrganizationNotFound,

    // Membership errors (1300-1399)
    DefaultConflict,
    DuplicateMembership,
    MembershipNotFound,

    // Compliance errors (1400-1499)
    ComplianceConfiguration,

    // Storage errors (2000-2099)
    RecordNotFound,
    DuplicateRecord,
    StorageBackend,

    // Configuration errors (5000-5099)
    ConfigurationError,

    // Internal errors (9000-9099)
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub const fn numeric_code(&self) -> u32 {
        match self {
            Self::ContextAlreadySet => 1000,
            Self::NoActiveOperation => 1001,

            Self::ImmutableField => 1100,

            Self::Unauthenticated => 1200,
            Self::NotAMember => 1201,
            Self::InsufficientRole => 1202,
            Self::OrganizationNotFound => 1203,

            Self::DefaultConflict => 1300,
            Self::DuplicateMembership => 1301,
            Self::MembershipNotFound => 1302,

            Self::ComplianceConfiguration => 1400,

            Self::RecordNotFound => 2000,
            Self::DuplicateRecord => 2001,
            Self::StorageBackend => 2002,

            Self::ConfigurationError => 5000,

            Self::InternalError => 9000,
        }
    }

    /// Get the error category for grouping.
    pub const fn category(&self) -> &'static str {
        match self.numeric_code() {
            1000..=1099 => "context",
            1100..=1199 => "lifecycle",
            1200..=1299 => "access",
            1300..=1399 => "membership",
            1400..=1499 => "compliance",
            2000..=2099 => "storage",
            5000..=5099 => "configuration",
            _ => "internal",
        }
    }

    /// Whether this failure must abort process startup.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ComplianceConfiguration)
    }

    /// Whether this failure indicates a bug in calling code rather than a
    /// user-facing condition.
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::ContextAlreadySet | Self::NoActiveOperation | Self::ImmutableField
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Severity
// ═══════════════════════════════════════════════════════════════════════════════

/// Severity level for errors (affects logging and alerting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Expected caller-facing failures (denied access, missing records)
    Low,
    /// Bugs in calling code (invariant violations)
    High,
    /// Startup-aborting and infrastructure failures
    Critical,
}

impl ErrorSeverity {
    /// Get severity based on error code.
    pub const fn from_code(code: &ErrorCode) -> Self {
        match code {
            ErrorCode::Unauthenticated
            | ErrorCode::NotAMember
            | ErrorCode::InsufficientRole
            | ErrorCode::OrganizationNotFound
            | ErrorCode::DefaultConflict
            | ErrorCode::DuplicateMembership
            | ErrorCode::MembershipNotFound
            | ErrorCode::RecordNotFound
            | ErrorCode::DuplicateRecord => Self::Low,

            ErrorCode::ContextAlreadySet
            | ErrorCode::NoActiveOperation
            | ErrorCode::ImmutableField => Self::High,

            ErrorCode::ComplianceConfiguration
            | ErrorCode::StorageBackend
            | ErrorCode::ConfigurationError
            | ErrorCode::InternalError => Self::Critical,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The aggregated error type for Warden Core.
#[derive(Error, Debug)]
pub struct WardenError {
    /// Machine-readable error code
    code: ErrorCode,

    /// Human-readable message
    message: Cow<'static, str>,

    /// The source error that caused this error
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl fmt::Display for WardenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl WardenError {
    /// Create a new error with code and message.
    pub fn new(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> Self {
        let error = Self {
            code,
            message: message.into(),
            source: None,
        };
        error.record_metrics();
        error
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Attach a source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::from_code(&self.code)
    }

    /// Whether this failure must abort process startup.
    pub fn is_fatal(&self) -> bool {
        self.code.is_fatal()
    }

    fn record_metrics(&self) {
        counter!(
            "warden_errors_total",
            "code" => self.code.to_string(),
            "category" => self.code.category().to_string(),
        )
        .increment(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// From Implementations for Subsystem Errors
// ═══════════════════════════════════════════════════════════════════════════════

impl From<ContextError> for WardenError {
    fn from(error: ContextError) -> Self {
        let code = match &error {
            ContextError::AlreadySet { .. } => ErrorCode::ContextAlreadySet,
            ContextError::NoActiveOperation => ErrorCode::NoActiveOperation,
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

impl From<AccessError> for WardenError {
    fn from(error: AccessError) -> Self {
        let code = match &error {
            AccessError::OrganizationNotFound(_) => ErrorCode::OrganizationNotFound,
            AccessError::Unauthenticated => ErrorCode::Unauthenticated,
            AccessError::NotAMember { .. } => ErrorCode::NotAMember,
            AccessError::InsufficientRole { .. } => ErrorCode::InsufficientRole,
            AccessError::Backend(_) => ErrorCode::StorageBackend,
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

impl From<StoreError> for WardenError {
    fn from(error: StoreError) -> Self {
        let code = match &error {
            StoreError::NotFound { .. } => ErrorCode::RecordNotFound,
            StoreError::Duplicate { .. } => ErrorCode::DuplicateRecord,
            StoreError::ImmutableField { .. } => ErrorCode::ImmutableField,
            StoreError::Backend(_) => ErrorCode::StorageBackend,
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

impl From<MembershipError> for WardenError {
    fn from(error: MembershipError) -> Self {
        let code = match &error {
            MembershipError::DefaultConflict { .. } => ErrorCode::DefaultConflict,
            MembershipError::Duplicate { .. } => ErrorCode::DuplicateMembership,
            MembershipError::NotFound { .. } => ErrorCode::MembershipNotFound,
            MembershipError::Store(inner) => match inner {
                StoreError::NotFound { .. } => ErrorCode::MembershipNotFound,
                StoreError::ImmutableField { .. } => ErrorCode::ImmutableField,
                _ => ErrorCode::StorageBackend,
            },
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

impl From<ComplianceError> for WardenError {
    fn from(error: ComplianceError) -> Self {
        Self::new(ErrorCode::ComplianceConfiguration, error.to_string()).with_source(error)
    }
}

impl From<config::ConfigError> for WardenError {
    fn from(error: config::ConfigError) -> Self {
        Self::new(ErrorCode::ConfigurationError, error.to_string()).with_source(error)
    }
}

impl From<anyhow::Error> for WardenError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<WardenError>() {
            Ok(warden_error) => warden_error,
            Err(error) => Self::internal(error.to_string()),
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
    fn test_error_code_categories() {
        assert_eq!(ErrorCode::ContextAlreadySet.category(), "context");
        assert_eq!(ErrorCode::Unauthenticated.category(), "access");
        assert_eq!(ErrorCode::DefaultConflict.category(), "membership");
        assert_eq!(ErrorCode::ComplianceConfiguration.category(), "compliance");
        assert_eq!(ErrorCode::RecordNotFound.category(), "storage");
        assert_eq!(ErrorCode::ImmutableField.category(), "lifecycle");
    }

    #[test]
    fn test_fatal_codes() {
        assert!(ErrorCode::ComplianceConfiguration.is_fatal());
        assert!(!ErrorCode::NotAMember.is_fatal());
        assert!(!ErrorCode::RecordNotFound.is_fatal());
    }

    #[test]
    fn test_invariant_violations_are_high_severity() {
        for code in [
            ErrorCode::ContextAlreadySet,
            ErrorCode::NoActiveOperation,
            ErrorCode::ImmutableField,
        ] {
            assert!(code.is_invariant_violation());
            assert_eq!(ErrorSeverity::from_code(&code), ErrorSeverity::High);
        }
    }

    #[test]
    fn test_access_errors_are_low_severity() {
        for code in [
            ErrorCode::Unauthenticated,
            ErrorCode::NotAMember,
            ErrorCode::InsufficientRole,
            ErrorCode::OrganizationNotFound,
            ErrorCode::DefaultConflict,
        ] {
            assert_eq!(ErrorSeverity::from_code(&code), ErrorSeverity::Low);
        }
    }

    #[test]
    fn test_error_display() {
        let error = WardenError::new(ErrorCode::RecordNotFound, "organization not found");
        let display = format!("{}", error);
        assert!(display.contains("RecordNotFound"));
        assert!(display.contains("organization not found"));
    }

    #[test]
    fn test_from_access_error() {
        let error = WardenError::from(AccessError::Unauthenticated);
        assert_eq!(error.code(), ErrorCode::Unauthenticated);
        assert_eq!(error.severity(), ErrorSeverity::Low);
    }
}
