//! Configuration management.

use serde::Deserialize;

use crate::telemetry::LoggingConfig;

/// Main core configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoreConfig {
    /// PII compliance validation policy
    #[serde(default)]
    pub compliance: CompliancePolicy,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Policy for the startup PII declaration validator.
#[derive(Debug, Clone, Deserialize)]
pub struct CompliancePolicy {
    /// Sensitive-name terms matched (exact or substring, case-insensitive)
    /// against entity field names
    #[serde(default = "default_sensitive_patterns")]
    pub sensitive_patterns: Vec<String>,
}

impl Default for CompliancePolicy {
    fn default() -> Self {
        Self {
            sensitive_patterns: default_sensitive_patterns(),
        }
    }
}

fn default_sensitive_patterns() -> Vec<String> {
    [
        "email",
        "full_name",
        "first_name",
        "last_name",
        "name",
        "phone",
        "address",
        "city",
        "postal_code",
        "zip_code",
        "ssn",
        "social_security_number",
        "date_of_birth",
        "birth_date",
        "dob",
        "ip_address",
        "last_login_ip",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl CoreConfig {
    /// Load configuration from the environment.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("WARDEN").separator("__"))
            .build()?;

        let cfg: CoreConfig = config.try_deserialize()?;
        Ok(cfg)
    }

    /// Load from a specific file path, with environment overrides.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("WARDEN").separator("__"))
            .build()?;

        let cfg: CoreConfig = config.try_deserialize()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns_cover_original_terms() {
        let policy = CompliancePolicy::default();
        for term in ["email", "name", "phone", "ssn", "ip_address", "dob"] {
            assert!(policy.sensitive_patterns.iter().any(|p| p == term));
        }
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let cfg: CoreConfig = serde_json::from_str("{}").unwrap();
        assert!(!cfg.compliance.sensitive_patterns.is_empty());
    }

    #[test]
    fn test_patterns_overridable() {
        let cfg: CoreConfig =
            serde_json::from_str(r#"{"compliance":{"sensitive_patterns":["email"]}}"#).unwrap();
        assert_eq!(cfg.compliance.sensitive_patterns, vec!["email"]);
    }
}
