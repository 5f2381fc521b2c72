//! Authentication construction (adapter side). Grounded on
//! `original_source/src/adapters/gam/auth.py`'s `GAMAuthManager`: OAuth
//! refresh token takes precedence when both methods are configured;
//! missing both is a construction error, never a silent fallback.

use adcp_error::{AdcpError, ErrorCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GamAuthConfig {
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub service_account_key_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GamAuthMethod {
    OAuth { client_id: String, client_secret: String, refresh_token: String },
    ServiceAccount { key_file: String },
}

impl GamAuthMethod {
    pub fn name(&self) -> &'static str {
        match self {
            GamAuthMethod::OAuth { .. } => "oauth",
            GamAuthMethod::ServiceAccount { .. } => "service_account",
        }
    }
}

/// Resolves the adapter's authentication method. OAuth wins when both a
/// refresh token and a service-account key file are configured.
pub fn resolve_auth(config: &GamAuthConfig) -> Result<GamAuthMethod, AdcpError> {
    if let Some(refresh_token) = &config.refresh_token {
        let client_id = config.client_id.clone().ok_or_else(|| {
            AdcpError::new(ErrorCode::Internal, "GAM OAuth config requires client_id alongside refresh_token")
        })?;
        let client_secret = config.client_secret.clone().ok_or_else(|| {
            AdcpError::new(ErrorCode::Internal, "GAM OAuth config requires client_secret alongside refresh_token")
        })?;
        return Ok(GamAuthMethod::OAuth { client_id, client_secret, refresh_token: refresh_token.clone() });
    }

    if let Some(key_file) = &config.service_account_key_file {
        return Ok(GamAuthMethod::ServiceAccount { key_file: key_file.clone() });
    }

    Err(AdcpError::new(
        ErrorCode::Internal,
        "GAM adapter config requires either 'refresh_token' (with client_id/client_secret) or 'service_account_key_file'",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oauth_takes_precedence_when_both_configured() {
        let config = GamAuthConfig {
            refresh_token: Some("rt".into()),
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            service_account_key_file: Some("/tmp/key.json".into()),
        };
        let method = resolve_auth(&config).unwrap();
        assert_eq!(method.name(), "oauth");
    }

    #[test]
    fn service_account_used_when_oauth_absent() {
        let config = GamAuthConfig {
            service_account_key_file: Some("/tmp/key.json".into()),
            ..Default::default()
        };
        assert_eq!(resolve_auth(&config).unwrap().name(), "service_account");
    }

    #[test]
    fn missing_both_is_a_construction_error() {
        assert!(resolve_auth(&GamAuthConfig::default()).is_err());
    }
}
