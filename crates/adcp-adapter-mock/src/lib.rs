//! Deterministic in-memory ad-server adapter for dry-run/demo use (C8).
//! Grounded on `crates/abp-backend-mock::MockBackend`: every call succeeds
//! deterministically, `dry_run` and non-dry-run both skip real I/O (there
//! is no "real" mock upstream) — this adapter's entire purpose is to
//! exercise the [`adcp_adapter_core::AdServerAdapter`] contract without a
//! network dependency.

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

/// Builds the `mock_<op>_<uuid-hex8>` / `dry_run_<op>_<uuid-hex8>` id
/// convention shared by every adapter's dry-run/live IDs.
fn mock_id(op: &str, dry_run: bool) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..8];
    if dry_run {
        format!("dry_run_{op}_{suffix}")
    } else {
        format!("mock_{op}_{suffix}")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockAdapter;

#[async_trait]
impl AdServerAdapter for MockAdapter {
    fn identity(&self) -> AdapterIdentity {
        AdapterIdentity {
            ad_server: "mock".into(),
            version: "1".into(),
        }
    }

    async fn create_media_buy(&self, request: &CreateMediaBuyRequest, dry_run: bool) -> Result<AdapterOrderResult, AdcpError> {
        let status = if request.activate_immediately { "active" } else { "pending_activation" };
        Ok(AdapterOrderResult {
            media_buy_id: request.media_buy_id.clone(),
            adapter_order_id: mock_id("order", dry_run),
            status: status.into(),
            message: format!("mock order created for {} packages", request.packages.len()),
        })
    }

    async fn add_creative_assets(&self, _media_buy_id: &str, assets: &[CreativeAsset], _today: DateTime<Utc>, _dry_run: bool) -> Result<Vec<AssetStatus>, AdcpError> {
        Ok(assets
            .iter()
            .map(|a| AssetStatus {
                creative_id: a.creative_id.clone(),
                status: AssetApprovalStatus::Approved,
                reason: None,
            })
            .collect())
    }

    async fn check_media_buy_status(&self, _media_buy_id: &str, _today: DateTime<Utc>) -> Result<MediaBuyStatusReport, AdcpError> {
        Ok(MediaBuyStatusReport {
            status: "active".into(),
            message: "mock order is active".into(),
        })
    }

    async fn get_media_buy_delivery(&self, _media_buy_id: &str, _today: DateTime<Utc>) -> Result<BTreeMap<String, DeliveryMetrics>, AdcpError> {
        Ok(BTreeMap::new())
    }

    async fn update_media_buy(&self, _media_buy_id: &str, request: &UpdateMediaBuyRequest, _dry_run: bool) -> Result<(), AdcpError> {
        match request.action.as_str() {
            "update_package_budget" | "activate_order" | "submit_for_approval" | "approve_order" | "archive_order" => Ok(()),
            "pause_package" | "resume_package" | "pause_media_buy" | "resume_media_buy" => {
                Err(AdcpError::new(ErrorCode::NotImplemented, format!("action '{}' is not yet implemented", request.action)))
            }
            other => Err(AdcpError::new(ErrorCode::UnsupportedAction, format!("action '{other}' is not supported by the mock adapter"))),
        }
    }

    async fn archive_order(&self, _media_buy_id: &str, _dry_run: bool) -> Result<bool, AdcpError> {
        Ok(true)
    }

    async fn get_advertisers(&self) -> Result<Vec<Advertiser>, AdcpError> {
        Ok(vec![
            Advertiser { id: "adv_1".into(), name: "Mock Advertiser One".into(), kind: "advertiser".into() },
            Advertiser { id: "adv_2".into(), name: "Mock Advertiser Two".into(), kind: "advertiser".into() },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcp_targeting::Targeting;

    fn request(activate: bool) -> CreateMediaBuyRequest {
        CreateMediaBuyRequest {
            media_buy_id: "mb_1".into(),
            order_name: "order".into(),
            advertiser_name: "advertiser".into(),
            packages: vec![adcp_adapter_core::PackageInput {
                package_id: "pkg_1".into(),
                product_id: "prod_1".into(),
                impressions: Some(1000),
                cpm: Some(5.0),
                budget: 5.0,
                targeting: Targeting::default(),
            }],
            start_date: Utc::now(),
            end_date: Utc::now(),
            activate_immediately: activate,
        }
    }

    #[tokio::test]
    async fn dry_run_ids_are_prefixed() {
        let adapter = MockAdapter;
        let result = adapter.create_media_buy(&request(false), true).await.unwrap();
        assert!(result.adapter_order_id.starts_with("dry_run_order_"));
    }

    #[tokio::test]
    async fn live_ids_use_mock_prefix() {
        let adapter = MockAdapter;
        let result = adapter.create_media_buy(&request(false), false).await.unwrap();
        assert!(result.adapter_order_id.starts_with("mock_order_"));
    }

    #[tokio::test]
    async fn immediate_activation_reports_active_status() {
        let adapter = MockAdapter;
        let result = adapter.create_media_buy(&request(true), false).await.unwrap();
        assert_eq!(result.status, "active");
    }

    #[tokio::test]
    async fn unsupported_action_reports_unsupported_action_code() {
        let adapter = MockAdapter;
        let err = adapter
            .update_media_buy("mb_1", &UpdateMediaBuyRequest { action: "teleport_order".into(), package_id: None, budget: None }, false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedAction);
    }

    #[tokio::test]
    async fn not_yet_implemented_action_reports_not_implemented() {
        let adapter = MockAdapter;
        let err = adapter
            .update_media_buy("mb_1", &UpdateMediaBuyRequest { action: "pause_package".into(), package_id: None, budget: None }, false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotImplemented);
    }
}
