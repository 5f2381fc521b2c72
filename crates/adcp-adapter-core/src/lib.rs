//! Ad-server adapter contract (C8). One capability trait every adapter
//! (mock, GAM, Kevel, Triton) implements identically — no downcasting, no
//! `hasattr`-style duck typing. Grounded on
//! `crates/abp-backend-core::Backend` (`identity()`, `capabilities()`,
//! `async fn run(...) -> Result<Receipt>`), generalized from "one opaque
//! run call" to "one async method per ad-sales operation" because, unlike
//! an LLM backend, an ad server exposes a fixed, well-known operation set.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use adcp_core::package::DeliveryMetrics;
use adcp_error::AdcpError;
use adcp_targeting::Targeting;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

/// Static identity an adapter reports for logging/diagnostics, analogous to
/// `abp_core::BackendIdentity`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AdapterIdentity {
    pub ad_server: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PackageInput {
    pub package_id: String,
    pub product_id: String,
    pub impressions: Option<u64>,
    pub cpm: Option<f64>,
    pub budget: f64,
    pub targeting: Targeting,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateMediaBuyRequest {
    pub media_buy_id: String,
    pub order_name: String,
    pub advertiser_name: String,
    pub packages: Vec<PackageInput>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Set when the executor's decision tree short-circuits straight to
    /// `active` for an automatic non-guaranteed package.
    pub activate_immediately: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AdapterOrderResult {
    pub media_buy_id: String,
    pub adapter_order_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreativeAsset {
    pub creative_id: String,
    pub package_assignments: Vec<String>,
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetApprovalStatus {
    Approved,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetStatus {
    pub creative_id: String,
    pub status: AssetApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MediaBuyStatusReport {
    pub status: String,
    pub message: String,
}

/// A buyer-facing request to change a live media buy. `action` is the
/// adapter-dispatched verb (`update_package_budget`, `activate_order`,
/// `submit_for_approval`, `approve_order`, `archive_order`, plus
/// adapter-declared extras); unsupported verbs return
/// `ErrorCode::UnsupportedAction`, and not-yet-implemented ones
/// (`pause_package`, `resume_package`, `pause_media_buy`, `resume_media_buy`)
/// return `ErrorCode::NotImplemented`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateMediaBuyRequest {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Advertiser {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The ad-server adapter contract (C8). All methods take the current
/// principal's tenant context implicitly (adapters are constructed per
/// tenant by the [`AdapterRegistry`]) and a `dry_run` flag; a dry run
/// performs all validation and returns deterministic
/// `dry_run_<op>_<uniqueish>` ids without side effects.
#[async_trait]
pub trait AdServerAdapter: Send + Sync {
    fn identity(&self) -> AdapterIdentity;

    async fn create_media_buy(&self, request: &CreateMediaBuyRequest, dry_run: bool) -> Result<AdapterOrderResult, AdcpError>;

    async fn add_creative_assets(&self, media_buy_id: &str, assets: &[CreativeAsset], today: DateTime<Utc>, dry_run: bool) -> Result<Vec<AssetStatus>, AdcpError>;

    async fn check_media_buy_status(&self, media_buy_id: &str, today: DateTime<Utc>) -> Result<MediaBuyStatusReport, AdcpError>;

    async fn get_media_buy_delivery(&self, media_buy_id: &str, today: DateTime<Utc>) -> Result<BTreeMap<String, DeliveryMetrics>, AdcpError>;

    async fn update_media_buy(&self, media_buy_id: &str, request: &UpdateMediaBuyRequest, dry_run: bool) -> Result<(), AdcpError>;

    async fn archive_order(&self, media_buy_id: &str, dry_run: bool) -> Result<bool, AdcpError>;

    async fn get_advertisers(&self) -> Result<Vec<Advertiser>, AdcpError>;

    /// §4.8 inventory/sync extension surface. Adapters that don't back a
    /// real inventory graph (mock, Kevel, Triton) inherit this default and
    /// report `ErrorCode::NotImplemented`; only the GAM adapter overrides
    /// it.
    async fn sync_inventory(&self, _force: bool) -> Result<Value, AdcpError> {
        Err(AdcpError::new(adcp_error::ErrorCode::NotImplemented, "inventory sync not implemented by this adapter"))
    }
}

/// One adapter client per `(tenant, ad_server)`, re-initialized on auth
/// failure. Thread-safe for concurrent reads across tenants.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: RwLock<HashMap<String, Arc<dyn AdServerAdapter>>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, tenant_id: impl Into<String>, adapter: Arc<dyn AdServerAdapter>) {
        self.adapters.write().await.insert(tenant_id.into(), adapter);
    }

    pub async fn get(&self, tenant_id: &str) -> Option<Arc<dyn AdServerAdapter>> {
        self.adapters.read().await.get(tenant_id).cloned()
    }

    pub async fn invalidate(&self, tenant_id: &str) {
        self.adapters.write().await.remove(tenant_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubAdapter;

    #[async_trait]
    impl AdServerAdapter for StubAdapter {
        fn identity(&self) -> AdapterIdentity {
            AdapterIdentity { ad_server: "stub".into(), version: "0".into() }
        }

        async fn create_media_buy(&self, request: &CreateMediaBuyRequest, _dry_run: bool) -> Result<AdapterOrderResult, AdcpError> {
            Ok(AdapterOrderResult {
                media_buy_id: request.media_buy_id.clone(),
                adapter_order_id: "stub_order".into(),
                status: "active".into(),
                message: "ok".into(),
            })
        }

        async fn add_creative_assets(&self, _media_buy_id: &str, _assets: &[CreativeAsset], _today: DateTime<Utc>, _dry_run: bool) -> Result<Vec<AssetStatus>, AdcpError> {
            Ok(vec![])
        }

        async fn check_media_buy_status(&self, _media_buy_id: &str, _today: DateTime<Utc>) -> Result<MediaBuyStatusReport, AdcpError> {
            Ok(MediaBuyStatusReport { status: "active".into(), message: "ok".into() })
        }

        async fn get_media_buy_delivery(&self, _media_buy_id: &str, _today: DateTime<Utc>) -> Result<BTreeMap<String, DeliveryMetrics>, AdcpError> {
            Ok(BTreeMap::new())
        }

        async fn update_media_buy(&self, _media_buy_id: &str, _request: &UpdateMediaBuyRequest, _dry_run: bool) -> Result<(), AdcpError> {
            Ok(())
        }

        async fn archive_order(&self, _media_buy_id: &str, _dry_run: bool) -> Result<bool, AdcpError> {
            Ok(true)
        }

        async fn get_advertisers(&self) -> Result<Vec<Advertiser>, AdcpError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn registry_resolves_per_tenant_adapter() {
        let registry = AdapterRegistry::new();
        registry.register("acme", Arc::new(StubAdapter)).await;
        assert!(registry.get("acme").await.is_some());
        assert!(registry.get("other").await.is_none());

        registry.invalidate("acme").await;
        assert!(registry.get("acme").await.is_none());
    }

    #[tokio::test]
    async fn default_sync_inventory_is_not_implemented() {
        let adapter = StubAdapter;
        let err = adapter.sync_inventory(false).await.unwrap_err();
        assert_eq!(err.code(), adcp_error::ErrorCode::NotImplemented);
    }
}
