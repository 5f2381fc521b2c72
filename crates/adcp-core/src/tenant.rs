use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A publisher boundary. Every other entity is scoped under a `tenant_id`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Tenant {
    pub tenant_id: String,
    pub name: String,
    /// Unique hostname-prefix used to resolve the tenant from an inbound request.
    pub subdomain: String,
    /// Optional unique custom domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_host: Option<String>,
    pub is_active: bool,
    pub settings: TenantSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TenantSettings {
    pub ad_server: String,
    #[serde(default)]
    pub max_daily_budget: Option<f64>,
    #[serde(default)]
    pub auto_approve_formats: Vec<String>,
    #[serde(default)]
    pub human_review_required: bool,
    #[serde(default)]
    pub authorized_emails: Vec<String>,
    #[serde(default)]
    pub authorized_domains: Vec<String>,
    #[serde(default)]
    pub webhook_urls: Vec<String>,
    #[serde(default)]
    pub policy_settings: PolicySettings,
    /// Bootstraps a synthetic `{tenant_id}_admin` principal when presented as a token.
    pub admin_token: String,
    /// Adapter-specific construction config (OAuth/service account, advertiser id, ...).
    #[serde(default)]
    pub adapter_config: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PolicySettings {
    #[serde(default)]
    pub prohibited_advertisers: Vec<String>,
    #[serde(default)]
    pub prohibited_categories: Vec<String>,
    #[serde(default)]
    pub prohibited_tactics: Vec<String>,
}

impl Tenant {
    pub fn resolve_ad_unit_for_guaranteed(&self) -> &str {
        &self.settings.ad_server
    }
}

/// Snapshot of the current tenant, threaded explicitly through every call
/// rather than read from a process-wide mutable handle (SPEC_FULL §9 /
/// Design Note 1).
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant: Tenant,
}

impl TenantContext {
    pub fn new(tenant: Tenant) -> Self {
        Self { tenant }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant.tenant_id
    }
}
