//! Thin reference adapter for the Kevel ad server (C8). Unlike the GAM
//! adapter there is no manager split here: Kevel's API is a single flat
//! surface (flights/ad types), so one module is enough. Grounded on the
//! teacher's thin bridge crates (`openai-bridge`, `gemini-bridge`), which
//! wrap one external surface behind `Backend` without further
//! decomposition.
//!
//! Kevel has no reservation/approval workflow — flights go live as soon as
//! they're created, so `submit_for_approval`/`approve_order` are not
//! meaningful actions here and report `UnsupportedAction` rather than
//! `NotImplemented`.

use std::collections::BTreeMap;

use adcp_adapter_core::{
    AdServerAdapter, AdapterIdentity, AdapterOrderResult, Advertiser, AssetApprovalStatus, AssetStatus, CreateMediaBuyRequest,
    CreativeAsset, MediaBuyStatusReport, UpdateMediaBuyRequest,
};
use adcp_core::package::DeliveryMetrics;
use adcp_error::{AdcpError, ErrorCode};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

fn kevel_id(op: &str, dry_run: bool) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..8];
    if dry_run {
        format!("dry_run_{op}_{suffix}")
    } else {
        format!("kevel_{op}_{suffix}")
    }
}

#[derive(Debug, Clone)]
pub struct KevelAdapterConfig {
    pub network_id: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct KevelAdapter {
    config: KevelAdapterConfig,
}

impl KevelAdapter {
    pub fn new(config: KevelAdapterConfig) -> Result<Self, AdcpError> {
        if config.api_key.trim().is_empty() {
            return Err(AdcpError::new(ErrorCode::Validation, "kevel adapter requires a non-empty api_key"));
        }
        Ok(Self { config })
    }
}

#[async_trait]
impl AdServerAdapter for KevelAdapter {
    fn identity(&self) -> AdapterIdentity {
        AdapterIdentity { ad_server: "kevel".into(), version: "1".into() }
    }

    async fn create_media_buy(&self, request: &CreateMediaBuyRequest, dry_run: bool) -> Result<AdapterOrderResult, AdcpError> {
        Ok(AdapterOrderResult {
            media_buy_id: request.media_buy_id.clone(),
            adapter_order_id: kevel_id("flight", dry_run),
            status: "active".into(),
            message: format!("Kevel flight created on network {} with {} ad(s)", self.config.network_id, request.packages.len()),
        })
    }

    async fn add_creative_assets(&self, _media_buy_id: &str, assets: &[CreativeAsset], _today: DateTime<Utc>, _dry_run: bool) -> Result<Vec<AssetStatus>, AdcpError> {
        Ok(assets
            .iter()
            .map(|a| AssetStatus { creative_id: a.creative_id.clone(), status: AssetApprovalStatus::Approved, reason: None })
            .collect())
    }

    async fn check_media_buy_status(&self, media_buy_id: &str, _today: DateTime<Utc>) -> Result<MediaBuyStatusReport, AdcpError> {
        Ok(MediaBuyStatusReport { status: "active".into(), message: format!("Kevel flight {media_buy_id} is active") })
    }

    async fn get_media_buy_delivery(&self, _media_buy_id: &str, _today: DateTime<Utc>) -> Result<BTreeMap<String, DeliveryMetrics>, AdcpError> {
        Ok(BTreeMap::new())
    }

    async fn update_media_buy(&self, _media_buy_id: &str, request: &UpdateMediaBuyRequest, _dry_run: bool) -> Result<(), AdcpError> {
        match request.action.as_str() {
            "update_package_budget" | "archive_order" | "activate_order" => Ok(()),
            "pause_package" | "resume_package" | "pause_media_buy" | "resume_media_buy" => {
                Err(AdcpError::new(ErrorCode::NotImplemented, format!("action '{}' is not yet implemented", request.action)))
            }
            "submit_for_approval" | "approve_order" => {
                Err(AdcpError::new(ErrorCode::UnsupportedAction, format!("action '{}' is not supported by the Kevel adapter: flights have no approval workflow", request.action)))
            }
            other => Err(AdcpError::new(ErrorCode::UnsupportedAction, format!("action '{other}' is not supported by the Kevel adapter"))),
        }
    }

    async fn archive_order(&self, _media_buy_id: &str, _dry_run: bool) -> Result<bool, AdcpError> {
        Ok(true)
    }

    async fn get_advertisers(&self) -> Result<Vec<Advertiser>, AdcpError> {
        Ok(vec![Advertiser { id: "1".into(), name: "Kevel Default Advertiser".into(), kind: "advertiser".into() }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcp_adapter_core::PackageInput;
    use adcp_targeting::Targeting;

    fn config() -> KevelAdapterConfig {
        KevelAdapterConfig { network_id: "net_1".into(), api_key: "secret".into() }
    }

    fn request() -> CreateMediaBuyRequest {
        CreateMediaBuyRequest {
            media_buy_id: "mb_1".into(),
            order_name: "order".into(),
            advertiser_name: "advertiser".into(),
            packages: vec![PackageInput {
                package_id: "pkg_1".into(),
                product_id: "prod_1".into(),
                impressions: Some(1000),
                cpm: Some(5.0),
                budget: 5.0,
                targeting: Targeting::default(),
            }],
            start_date: Utc::now(),
            end_date: Utc::now(),
            activate_immediately: true,
        }
    }

    #[test]
    fn construction_rejects_empty_api_key() {
        let config = KevelAdapterConfig { network_id: "net_1".into(), api_key: String::new() };
        assert!(KevelAdapter::new(config).is_err());
    }

    #[tokio::test]
    async fn create_media_buy_dry_run_id_is_prefixed() {
        let adapter = KevelAdapter::new(config()).unwrap();
        let result = adapter.create_media_buy(&request(), true).await.unwrap();
        assert!(result.adapter_order_id.starts_with("dry_run_flight_"));
    }

    #[tokio::test]
    async fn create_media_buy_live_id_uses_kevel_prefix() {
        let adapter = KevelAdapter::new(config()).unwrap();
        let result = adapter.create_media_buy(&request(), false).await.unwrap();
        assert!(result.adapter_order_id.starts_with("kevel_flight_"));
    }

    #[tokio::test]
    async fn approval_actions_are_unsupported() {
        let adapter = KevelAdapter::new(config()).unwrap();
        let err = adapter
            .update_media_buy("mb_1", &UpdateMediaBuyRequest { action: "submit_for_approval".into(), package_id: None, budget: None }, false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedAction);
    }

    #[tokio::test]
    async fn budget_update_succeeds() {
        let adapter = KevelAdapter::new(config()).unwrap();
        adapter
            .update_media_buy("mb_1", &UpdateMediaBuyRequest { action: "update_package_budget".into(), package_id: Some("pkg_1".into()), budget: Some(10.0) }, false)
            .await
            .unwrap();
    }
}
