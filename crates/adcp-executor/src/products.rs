//! `get_products`, `get_signals`, `get_targeting_capabilities`: the three
//! read-only discovery operations that precede a `create_media_buy` call.

use adcp_catalog::ProductFilters;
use adcp_core::principal::PrincipalContext;
use adcp_core::result::TaskResult;
use adcp_core::tenant::TenantContext;
use adcp_error::AdcpError;
use adcp_policy::PolicyStatus;
use serde::{Deserialize, Serialize};

use crate::requests::{GetProductsParams, GetSignalsParams};
use crate::Executor;

/// distilled §4.5: signals are filtered by exact `type` and substring `query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Audience,
    Contextual,
    Geographic,
}

#[derive(Debug, Clone, Serialize)]
pub struct Signal {
    pub signal_id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub category: String,
    pub coverage_percentage: f64,
}

/// A small, static fixture list. No persisted `Signal` aggregate exists
/// (distilled §9 OQ — signals activation is out of scope for storage); this
/// mirrors what a real signals-marketplace integration would return.
fn signal_catalog() -> Vec<Signal> {
    vec![
        Signal {
            signal_id: "sig_auto_intenders".into(),
            name: "Auto Intenders".into(),
            description: "Users showing recent in-market signals for vehicle purchases".into(),
            signal_type: SignalType::Audience,
            category: "automotive".into(),
            coverage_percentage: 62.0,
        },
        Signal {
            signal_id: "sig_sports_enthusiasts".into(),
            name: "Sports Enthusiasts".into(),
            description: "Users with a strong affinity for live sports content".into(),
            signal_type: SignalType::Contextual,
            category: "sports".into(),
            coverage_percentage: 48.5,
        },
        Signal {
            signal_id: "sig_high_income_hh".into(),
            name: "High Income Households".into(),
            description: "Modeled household income in the top two quintiles".into(),
            signal_type: SignalType::Audience,
            category: "demographic".into(),
            coverage_percentage: 35.0,
        },
        Signal {
            signal_id: "sig_us_metro_core".into(),
            name: "US Core Metro Areas".into(),
            description: "Users located in the top twenty US metropolitan areas".into(),
            signal_type: SignalType::Geographic,
            category: "geography".into(),
            coverage_percentage: 71.0,
        },
    ]
}

/// Exact `type` match and case-insensitive substring `query` match against
/// name/description/category, per distilled §4.5's signal filter contract.
fn filter_signals(signals: Vec<Signal>, query: Option<&str>, signal_type: Option<SignalType>) -> Vec<Signal> {
    let query_lower = query.map(|q| q.to_lowercase());
    signals
        .into_iter()
        .filter(|s| signal_type.map_or(true, |t| s.signal_type == t))
        .filter(|s| match &query_lower {
            None => true,
            Some(q) => s.name.to_lowercase().contains(q) || s.description.to_lowercase().contains(q) || s.category.to_lowercase().contains(q),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetingDimension {
    pub dimension: String,
    pub supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A static, adapter-agnostic capability map: dimensions the gateway's
/// targeting overlay recognizes, and whether they are honored across
/// adapters in general. The executor has no dependency on any concrete
/// adapter crate (it only calls through `AdServerAdapter`), so this is not
/// GAM's specific `TargetingTranslator::validate` output — it is the
/// contract-level surface from distilled §6.5.
fn targeting_capability_catalog() -> Vec<TargetingDimension> {
    let supported = ["geo_country", "geo_region", "geo_metro", "media_type", "key_value_pairs", "signals"];
    let unsupported = [
        ("geo_city", "city-level targeting requires adapter geo-service integration"),
        ("geo_zip", "postal-code targeting requires adapter geo-service integration"),
        ("device_type", "device-type targeting is not honored by reference adapters"),
        ("os", "operating-system targeting is not honored by reference adapters"),
        ("browser", "browser targeting is not honored by reference adapters"),
        ("content_category", "content-category targeting is not honored by reference adapters"),
        ("keywords", "keyword targeting is not honored by reference adapters"),
        ("audiences", "audience-segment targeting requires tenant adapter configuration"),
    ];

    let mut dims: Vec<TargetingDimension> = supported
        .iter()
        .map(|d| TargetingDimension { dimension: d.to_string(), supported: true, reason: None })
        .collect();
    dims.extend(unsupported.iter().map(|(d, reason)| TargetingDimension {
        dimension: d.to_string(),
        supported: false,
        reason: Some(reason.to_string()),
    }));
    dims
}

impl Executor {
    pub async fn get_products(&self, tenant: &TenantContext, principal: &PrincipalContext, params: GetProductsParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id().to_string();
        let principal_id = principal.principal.principal_id.clone();
        let ctx = self
            .begin(&tenant_id, &principal_id, principal.protocol, params.context_id.as_deref(), "get_products")
            .await?;

        let decision = match params.promoted_offering.as_deref().filter(|s| !s.is_empty()) {
            Some(offering) => self.policy.check(offering, &tenant.tenant.settings.policy_settings),
            None => adcp_policy::Decision::allowed(),
        };

        let result = if decision.is_rejected() {
            TaskResult::failed("policy_rejected", decision.details.unwrap_or_else(|| "promoted offering rejected by policy".into()))
        } else {
            self.fetch_products(&tenant_id, &principal_id, &params, decision.status).await?
        };

        Ok(self.finish(&tenant_id, &principal_id, "get_products", &ctx, result).await)
    }

    async fn fetch_products(
        &self,
        tenant_id: &str,
        principal_id: &str,
        params: &GetProductsParams,
        policy_status: PolicyStatus,
    ) -> Result<TaskResult, AdcpError> {
        let filters = ProductFilters {
            brief: params.brief.clone(),
            countries: params.countries.clone(),
            formats: params.formats.clone(),
            targeting_features: params.targeting_features.clone(),
            promoted_offering: params.promoted_offering.clone(),
        };
        let products = self.catalog.get_products(tenant_id, principal_id, &filters).await?;

        let mut result = if products.is_empty() {
            let message = if params.brief.as_deref().is_some_and(|b| !b.is_empty()) {
                format!("No products matched brief '{}'; narrow or rephrase the brief and try again", params.brief.as_deref().unwrap())
            } else {
                "No products matched the given filters".to_string()
            };
            TaskResult::completed(message).with_data("clarification_needed", true)
        } else {
            TaskResult::completed(format!("Found {} product(s)", products.len())).with_data("clarification_needed", false)
        };
        result = result.with_data("products", products).with_data("policy_compliance", serde_json::json!({ "status": policy_status }));
        Ok(result)
    }

    pub async fn get_signals(&self, tenant: &TenantContext, principal: &PrincipalContext, params: GetSignalsParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id().to_string();
        let principal_id = principal.principal.principal_id.clone();
        let ctx = self
            .begin(&tenant_id, &principal_id, principal.protocol, params.context_id.as_deref(), "get_signals")
            .await?;

        let signals = filter_signals(signal_catalog(), params.query.as_deref(), params.signal_type);
        let result = TaskResult::completed(format!("Found {} signal(s)", signals.len())).with_data("signals", signals);

        Ok(self.finish(&tenant_id, &principal_id, "get_signals", &ctx, result).await)
    }

    pub async fn get_targeting_capabilities(&self, tenant: &TenantContext, principal: &PrincipalContext, context_id: Option<&str>) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id().to_string();
        let principal_id = principal.principal.principal_id.clone();
        let ctx = self
            .begin(&tenant_id, &principal_id, principal.protocol, context_id, "get_targeting_capabilities")
            .await?;

        let dimensions = targeting_capability_catalog();
        let result = TaskResult::completed("Targeting capability surface").with_data("dimensions", dimensions);

        Ok(self.finish(&tenant_id, &principal_id, "get_targeting_capabilities", &ctx, result).await)
    }
}
