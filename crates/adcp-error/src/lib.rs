//! Unified error taxonomy for the ad-sales gateway.
//!
//! Every fallible path in the workspace returns `Result<T, AdcpError>` (or
//! `anyhow::Result` at binary edges). `AdcpError` carries a stable
//! [`ErrorCode`], a human message, optional structured context, and an
//! optional source error, and serializes to [`AdcpErrorDto`] for wire
//! responses.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Broad grouping of [`ErrorCode`] variants, used for metrics and HTTP
/// status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Auth,
    NotFound,
    Validation,
    Policy,
    Targeting,
    Budget,
    Unsupported,
    Upstream,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Auth => "auth",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Policy => "policy",
            ErrorCategory::Targeting => "targeting",
            ErrorCategory::Budget => "budget",
            ErrorCategory::Unsupported => "unsupported",
            ErrorCategory::Upstream => "upstream",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Stable, wire-visible error code. Renders as `SCREAMING_SNAKE_CASE` on the
/// wire; see the distilled error taxonomy (SPEC_FULL §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotAuthenticated,
    TenantInactive,
    Unauthorized,
    NotFound,
    Validation,
    PolicyRejected,
    TargetingUnsupported,
    BudgetBelowDelivery,
    UnsupportedAction,
    NotImplemented,
    SyncAlreadyInProgress,
    Upstream,
    Internal,
}

impl ErrorCode {
    /// The category this code belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::NotAuthenticated => ErrorCategory::Auth,
            ErrorCode::TenantInactive => ErrorCategory::Auth,
            ErrorCode::Unauthorized => ErrorCategory::Auth,
            ErrorCode::NotFound => ErrorCategory::NotFound,
            ErrorCode::Validation => ErrorCategory::Validation,
            ErrorCode::PolicyRejected => ErrorCategory::Policy,
            ErrorCode::TargetingUnsupported => ErrorCategory::Targeting,
            ErrorCode::BudgetBelowDelivery => ErrorCategory::Budget,
            ErrorCode::UnsupportedAction => ErrorCategory::Unsupported,
            ErrorCode::NotImplemented => ErrorCategory::Unsupported,
            ErrorCode::SyncAlreadyInProgress => ErrorCategory::Unsupported,
            ErrorCode::Upstream => ErrorCategory::Upstream,
            ErrorCode::Internal => ErrorCategory::Internal,
        }
    }

    /// The `SCREAMING_SNAKE_CASE` wire string for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotAuthenticated => "NOT_AUTHENTICATED",
            ErrorCode::TenantInactive => "TENANT_INACTIVE",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::PolicyRejected => "POLICY_REJECTED",
            ErrorCode::TargetingUnsupported => "UNSUPPORTED",
            ErrorCode::BudgetBelowDelivery => "budget_below_delivery",
            ErrorCode::UnsupportedAction => "unsupported_action",
            ErrorCode::NotImplemented => "not_implemented",
            ErrorCode::SyncAlreadyInProgress => "SYNC_ALREADY_IN_PROGRESS",
            ErrorCode::Upstream => "UPSTREAM",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The workspace's single error type.
pub struct AdcpError {
    code: ErrorCode,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    context: BTreeMap<String, serde_json::Value>,
}

impl AdcpError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.context
    }

    /// Attach a context value. Silently skipped if `value` fails to
    /// serialize, matching the builder's fire-and-forget ergonomics.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Debug for AdcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdcpError")
            .field("code", &self.code)
            .field("message", &self.message)
            .field("context", &self.context)
            .finish()
    }
}

impl fmt::Display for AdcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for AdcpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Serializable snapshot of an [`AdcpError`], used at every protocol edge.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AdcpErrorDto {
    pub code: String,
    pub category: ErrorCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, serde_json::Value>,
}

impl From<&AdcpError> for AdcpErrorDto {
    fn from(e: &AdcpError) -> Self {
        AdcpErrorDto {
            code: e.code.as_str().to_string(),
            category: e.code.category(),
            message: e.message.clone(),
            context: e.context.clone(),
        }
    }
}

impl From<AdcpError> for AdcpErrorDto {
    fn from(e: AdcpError) -> Self {
        (&e).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CODES: &[ErrorCode] = &[
        ErrorCode::NotAuthenticated,
        ErrorCode::TenantInactive,
        ErrorCode::Unauthorized,
        ErrorCode::NotFound,
        ErrorCode::Validation,
        ErrorCode::PolicyRejected,
        ErrorCode::TargetingUnsupported,
        ErrorCode::BudgetBelowDelivery,
        ErrorCode::UnsupportedAction,
        ErrorCode::NotImplemented,
        ErrorCode::SyncAlreadyInProgress,
        ErrorCode::Upstream,
        ErrorCode::Internal,
    ];

    #[test]
    fn every_code_has_a_stable_wire_string() {
        for code in ALL_CODES {
            assert!(!code.as_str().is_empty());
            assert_eq!(code.as_str(), code.to_string());
        }
    }

    #[test]
    fn dto_round_trips_through_json() {
        let err = AdcpError::new(ErrorCode::BudgetBelowDelivery, "budget too low")
            .with_context("requested", 10_000u64)
            .with_context("delivered", 15_000.0f64);
        let dto: AdcpErrorDto = (&err).into();
        let json = serde_json::to_string(&dto).unwrap();
        let back: AdcpErrorDto = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, "budget_below_delivery");
        assert_eq!(back.category, ErrorCategory::Budget);
        assert_eq!(back.context.get("requested").unwrap(), &serde_json::json!(10_000));
    }

    #[test]
    fn context_skipped_when_empty() {
        let err = AdcpError::new(ErrorCode::NotFound, "missing");
        let dto: AdcpErrorDto = err.into();
        let json = serde_json::to_value(&dto).unwrap();
        assert!(json.get("context").is_none());
    }
}
