use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// An authenticated agent acting on behalf of one advertiser within a tenant.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Principal {
    pub tenant_id: String,
    pub principal_id: String,
    pub name: String,
    /// Globally unique bearer token.
    pub access_token: String,
    /// Per-adapter external IDs, e.g. `gam_advertiser_id`.
    #[serde(default)]
    pub platform_mappings: BTreeMap<String, Value>,
    #[serde(default)]
    pub is_admin: bool,
}

impl Principal {
    /// `approve_order` and similar privileged adapter actions require this.
    pub fn has_admin_privilege(&self) -> bool {
        if self.is_admin {
            return true;
        }
        matches!(
            self.platform_mappings.get("gam_admin"),
            Some(Value::Bool(true))
        ) || matches!(self.platform_mappings.get("is_admin"), Some(Value::Bool(true)))
    }

    /// Synthetic principal minted when a caller authenticates with a
    /// tenant's `admin_token` rather than a per-principal token.
    pub fn synthetic_admin(tenant_id: &str) -> Self {
        Principal {
            tenant_id: tenant_id.to_string(),
            principal_id: format!("{tenant_id}_admin"),
            name: "Tenant Admin".to_string(),
            access_token: String::new(),
            platform_mappings: BTreeMap::new(),
            is_admin: true,
        }
    }
}

/// The resolved caller for the current request: which tenant, which
/// principal. Passed explicitly to every executor method.
#[derive(Debug, Clone)]
pub struct PrincipalContext {
    pub tenant_id: String,
    pub principal: Principal,
    pub protocol: Protocol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Mcp,
    A2a,
}

impl PrincipalContext {
    pub fn owns(&self, owner_principal_id: &str) -> bool {
        self.principal.principal_id == owner_principal_id
    }
}
