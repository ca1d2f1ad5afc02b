//! Pipeline configuration

use crate::error::{ModLogError, Result};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Moderation log pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModLogConfig {
    /// Component name attached to error reports
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Retry policy for audit trail correlation
    #[serde(default)]
    pub audit_retry: RetryPolicy,

    /// Number of audit entries fetched per correlation attempt
    ///
    /// Only the most recent entry is matched against the target.
    #[serde(default = "default_audit_fetch_limit")]
    pub audit_fetch_limit: usize,
}

fn default_service_name() -> String {
    "ModLogService".to_string()
}

fn default_audit_fetch_limit() -> usize {
    1
}

impl Default for ModLogConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            audit_retry: RetryPolicy::default(),
            audit_fetch_limit: default_audit_fetch_limit(),
        }
    }
}

impl ModLogConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ModLogConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.audit_retry.max_attempts == 0 {
            return Err(ModLogError::Config(
                "auditRetry.maxAttempts must be >= 1".to_string(),
            ));
        }
        if self.audit_fetch_limit == 0 {
            return Err(ModLogError::Config(
                "auditFetchLimit must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ModLogConfig::default();
        assert_eq!(config.service_name, "ModLogService");
        assert_eq!(config.audit_retry.max_attempts, 3);
        assert_eq!(config.audit_retry.delay_ms, 500);
        assert_eq!(config.audit_fetch_limit, 1);
    }

    #[test]
    fn test_from_json_empty_uses_defaults() {
        let config = ModLogConfig::from_json("{}").unwrap();
        assert_eq!(config, ModLogConfig::default());
    }

    #[test]
    fn test_from_json_overrides() {
        let config = ModLogConfig::from_json(
            r#"{"serviceName": "Logger", "auditRetry": {"maxAttempts": 5, "delayMs": 100}}"#,
        )
        .unwrap();
        assert_eq!(config.service_name, "Logger");
        assert_eq!(config.audit_retry.max_attempts, 5);
        assert_eq!(config.audit_retry.delay_ms, 100);
        assert_eq!(config.audit_fetch_limit, 1);
    }

    #[test]
    fn test_from_json_rejects_zero_attempts() {
        let err = ModLogConfig::from_json(r#"{"auditRetry": {"maxAttempts": 0}}"#).unwrap_err();
        assert!(matches!(err, ModLogError::Config(_)));
    }

    #[test]
    fn test_from_json_rejects_zero_fetch_limit() {
        let err = ModLogConfig::from_json(r#"{"auditFetchLimit": 0}"#).unwrap_err();
        assert!(matches!(err, ModLogError::Config(_)));
    }

    #[test]
    fn test_from_json_invalid() {
        let err = ModLogConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ModLogError::Serialization(_)));
    }
}
