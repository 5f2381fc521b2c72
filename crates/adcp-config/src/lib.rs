//! Process-level configuration for the gateway daemon: bind address, CORS,
//! storage root, and bootstrap behavior. Modeled on the teacher's settings
//! crate (`ConfigError`/`ConfigWarning` shape, TOML source, validation with
//! advisory warnings rather than hard failure where the field is optional).

use std::fmt;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },
    #[error("failed to parse config: {reason}")]
    ParseError { reason: String },
    #[error("config failed validation: {}", .reasons.join("; "))]
    ValidationError { reasons: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    DeprecatedField { field: String, suggestion: String },
    MissingOptionalField { field: String, hint: String },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::DeprecatedField { field, suggestion } => {
                write!(f, "field `{field}` is deprecated; use `{suggestion}` instead")
            }
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "optional field `{field}` not set: {hint}")
            }
        }
    }
}

/// Top-level process configuration for `adcp-daemon`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: String,
    pub storage_dir: PathBuf,
    pub storage_backend: StorageBackendKind,
    pub cors_allowed_origins: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_ui_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_webhook_url: Option<String>,
    pub log_level: String,
    pub rate_limit_per_minute: u32,
    pub enable_super_admin_bootstrap: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    Memory,
    JsonFile,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            storage_dir: PathBuf::from("./data"),
            storage_backend: StorageBackendKind::JsonFile,
            cors_allowed_origins: Vec::new(),
            admin_ui_url: None,
            slack_webhook_url: None,
            log_level: "adcp=info".to_string(),
            rate_limit_per_minute: 600,
            enable_super_admin_bootstrap: true,
        }
    }
}

impl GatewayConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.to_path_buf(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Hard validation failures plus advisory warnings. A config with
    /// warnings is still usable; one with `Err` is not.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        let mut reasons = Vec::new();
        if self.bind.is_empty() {
            reasons.push("bind address must not be empty".to_string());
        }
        if self.rate_limit_per_minute == 0 {
            reasons.push("rate_limit_per_minute must be greater than zero".to_string());
        }
        if !reasons.is_empty() {
            return Err(ConfigError::ValidationError { reasons });
        }

        let mut warnings = Vec::new();
        if self.admin_ui_url.is_none() {
            warnings.push(ConfigWarning::MissingOptionalField {
                field: "admin_ui_url".to_string(),
                hint: "links in notifications will omit the admin console".to_string(),
            });
        }
        if self.slack_webhook_url.is_none() {
            warnings.push(ConfigWarning::MissingOptionalField {
                field: "slack_webhook_url".to_string(),
                hint: "human-task notifications will not be delivered".to_string(),
            });
        }
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates_with_warnings() {
        let cfg = GatewayConfig::default();
        let warnings = cfg.validate().unwrap();
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn empty_bind_fails_validation() {
        let mut cfg = GatewayConfig::default();
        cfg.bind.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let cfg = GatewayConfig::from_toml_str(r#"bind = "0.0.0.0:9000""#).unwrap();
        assert_eq!(cfg.bind, "0.0.0.0:9000");
        assert_eq!(cfg.rate_limit_per_minute, 600);
    }
}
