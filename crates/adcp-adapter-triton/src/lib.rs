//! Thin reference adapter for the Triton digital-audio ad server (C8).
//! Grounded on the teacher's thin bridge crates (`openai-bridge`,
//! `gemini-sdk`), which wrap one external surface behind `Backend` without
//! a manager split.
//!
//! Triton campaigns are booked and trafficked as a unit; there is no
//! per-package budget mutation API, so every `update_media_buy` action
//! except `archive_order` reports `NotImplemented` here.

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

fn triton_id(op: &str, dry_run: bool) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..8];
    if dry_run {
        format!("dry_run_{op}_{suffix}")
    } else {
        format!("triton_{op}_{suffix}")
    }
}

#[derive(Debug, Clone)]
pub struct TritonAdapterConfig {
    pub station_group_id: String,
    pub api_token: String,
}

#[derive(Debug, Clone)]
pub struct TritonAdapter {
    config: TritonAdapterConfig,
}

impl TritonAdapter {
    pub fn new(config: TritonAdapterConfig) -> Result<Self, AdcpError> {
        if config.api_token.trim().is_empty() {
            return Err(AdcpError::new(ErrorCode::Validation, "triton adapter requires a non-empty api_token"));
        }
        Ok(Self { config })
    }
}

#[async_trait]
impl AdServerAdapter for TritonAdapter {
    fn identity(&self) -> AdapterIdentity {
        AdapterIdentity { ad_server: "triton".into(), version: "1".into() }
    }

    async fn create_media_buy(&self, request: &CreateMediaBuyRequest, dry_run: bool) -> Result<AdapterOrderResult, AdcpError> {
        Ok(AdapterOrderResult {
            media_buy_id: request.media_buy_id.clone(),
            adapter_order_id: triton_id("campaign", dry_run),
            status: if request.activate_immediately { "active" } else { "pending_activation" }.into(),
            message: format!("Triton campaign created for station group {} with {} spot(s)", self.config.station_group_id, request.packages.len()),
        })
    }

    async fn add_creative_assets(&self, _media_buy_id: &str, assets: &[CreativeAsset], _today: DateTime<Utc>, _dry_run: bool) -> Result<Vec<AssetStatus>, AdcpError> {
        Ok(assets
            .iter()
            .map(|a| AssetStatus { creative_id: a.creative_id.clone(), status: AssetApprovalStatus::Approved, reason: None })
            .collect())
    }

    async fn check_media_buy_status(&self, media_buy_id: &str, _today: DateTime<Utc>) -> Result<MediaBuyStatusReport, AdcpError> {
        Ok(MediaBuyStatusReport { status: "active".into(), message: format!("Triton campaign {media_buy_id} is active") })
    }

    async fn get_media_buy_delivery(&self, _media_buy_id: &str, _today: DateTime<Utc>) -> Result<BTreeMap<String, DeliveryMetrics>, AdcpError> {
        Ok(BTreeMap::new())
    }

    async fn update_media_buy(&self, _media_buy_id: &str, request: &UpdateMediaBuyRequest, _dry_run: bool) -> Result<(), AdcpError> {
        match request.action.as_str() {
            "archive_order" => Ok(()),
            "update_package_budget" | "activate_order" | "submit_for_approval" | "approve_order" | "pause_package" | "resume_package" | "pause_media_buy" | "resume_media_buy" => {
                Err(AdcpError::new(ErrorCode::NotImplemented, format!("action '{}' is not yet implemented by the Triton adapter", request.action)))
            }
            other => Err(AdcpError::new(ErrorCode::UnsupportedAction, format!("action '{other}' is not supported by the Triton adapter"))),
        }
    }

    async fn archive_order(&self, _media_buy_id: &str, _dry_run: bool) -> Result<bool, AdcpError> {
        Ok(true)
    }

    async fn get_advertisers(&self) -> Result<Vec<Advertiser>, AdcpError> {
        Ok(vec![Advertiser { id: "1".into(), name: "Triton Default Advertiser".into(), kind: "advertiser".into() }])
    }
}
