//! `submit_creatives`, `get_creative_status` (C7/C9). Classification and
//! per-type field validation are pure functions in `adcp-creative`; size
//! validation against an ad server's live placeholders happens inside the
//! adapter's `add_creative_assets` (e.g. `adcp_adapter_gam::creatives`), not
//! here — this module decides only classification, type validation, and the
//! `auto_approve_formats` gate before persisting and forwarding approved
//! assets to the adapter.

use adcp_adapter_core::{AssetApprovalStatus, CreativeAsset};
use adcp_core::creative::{Creative, CreativeStatus};
use adcp_core::principal::PrincipalContext;
use adcp_core::result::TaskResult;
use adcp_core::tenant::TenantContext;
use adcp_creative::validate_type_requirements;
use adcp_error::{AdcpError, ErrorCode};
use chrono::Utc;
use serde::Serialize;

use crate::hex8;
use crate::requests::{CreativeIdParams, CreativeSubmission, SubmitCreativesParams};
use crate::Executor;

fn to_creative(submission: &CreativeSubmission, media_buy_id: &str, tenant_id: &str, principal_id: &str) -> Creative {
    let _ = media_buy_id;
    Creative {
        creative_id: submission.creative_id.clone().unwrap_or_else(|| format!("cr_{}", hex8())),
        tenant_id: tenant_id.to_string(),
        principal_id: principal_id.to_string(),
        name: submission.name.clone(),
        format: submission.format.clone(),
        snippet: submission.snippet.clone(),
        snippet_type: submission.snippet_type.clone(),
        template_variables: submission.template_variables.clone(),
        media_url: submission.media_url.clone(),
        media_data: submission.media_data.clone(),
        click_url: submission.click_url.clone(),
        landing_url: submission.landing_url.clone(),
        clickthrough_url: submission.clickthrough_url.clone(),
        duration: submission.duration,
        width: submission.width,
        height: submission.height,
        tracking_events: Default::default(),
        package_assignments: submission.package_assignments.clone(),
        status: CreativeStatus::PendingReview,
        adapter_creative_id: None,
        failure_reason: None,
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreativeOutcome {
    creative_id: String,
    status: CreativeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl Executor {
    pub async fn submit_creatives(&self, tenant: &TenantContext, principal: &PrincipalContext, params: SubmitCreativesParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id().to_string();
        let principal_id = principal.principal.principal_id.clone();
        let ctx = self
            .begin(
                &tenant_id,
                &principal_id,
                principal.protocol,
                params.context_id.as_deref(),
                format!("submit_creatives: {} asset(s) for {}", params.creatives.len(), params.media_buy_id),
            )
            .await?;

        let result = self.do_submit_creatives(tenant, principal, &params).await?;
        Ok(self.finish(&tenant_id, &principal_id, "submit_creatives", &ctx, result).await)
    }

    async fn do_submit_creatives(&self, tenant: &TenantContext, principal: &PrincipalContext, params: &SubmitCreativesParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id();
        let principal_id = &principal.principal.principal_id;

        let media_buy = match self.storage.get_media_buy(tenant_id, &params.media_buy_id).await? {
            None => return Ok(TaskResult::failed("media_buy_not_found", format!("media buy '{}' not found", params.media_buy_id))),
            Some(mb) => mb,
        };
        if !principal.owns(&media_buy.principal_id) && !principal.principal.has_admin_privilege() {
            return Err(AdcpError::new(ErrorCode::Unauthorized, "media buy belongs to a different principal"));
        }

        if params.creatives.is_empty() {
            return Ok(TaskResult::failed("validation", "submit_creatives requires at least one creative"));
        }

        let auto_approve: Vec<&str> = tenant.tenant.settings.auto_approve_formats.iter().map(String::as_str).collect();

        let mut creatives: Vec<Creative> = params
            .creatives
            .iter()
            .map(|submission| to_creative(submission, &params.media_buy_id, tenant_id, principal_id))
            .collect();

        for creative in creatives.iter_mut() {
            if let Err(reason) = validate_type_requirements(creative) {
                creative.status = CreativeStatus::Failed;
                creative.failure_reason = Some(reason);
                continue;
            }
            creative.status = if auto_approve.contains(&creative.format.as_str()) {
                CreativeStatus::Approved
            } else {
                CreativeStatus::PendingReview
            };
        }

        if !params.dry_run {
            if let Some(adapter) = self.adapters.get(tenant_id).await {
                let assets: Vec<CreativeAsset> = creatives
                    .iter()
                    .filter(|c| c.status == CreativeStatus::Approved)
                    .map(|c| CreativeAsset {
                        creative_id: c.creative_id.clone(),
                        package_assignments: c.package_assignments.clone(),
                        payload: serde_json::to_value(c).unwrap_or_default(),
                    })
                    .collect();

                if !assets.is_empty() {
                    let statuses = adapter.add_creative_assets(&params.media_buy_id, &assets, Utc::now(), params.dry_run).await?;
                    for asset_status in statuses {
                        if let Some(creative) = creatives.iter_mut().find(|c| c.creative_id == asset_status.creative_id) {
                            if asset_status.status == AssetApprovalStatus::Failed {
                                creative.status = CreativeStatus::Rejected;
                                creative.failure_reason = asset_status.reason;
                            }
                        }
                    }
                }
            }

            self.storage.submit_creatives(creatives.clone()).await?;
        }

        let outcomes: Vec<CreativeOutcome> = creatives
            .iter()
            .map(|c| CreativeOutcome { creative_id: c.creative_id.clone(), status: c.status, reason: c.failure_reason.clone() })
            .collect();
        let approved = outcomes.iter().filter(|o| o.status == CreativeStatus::Approved).count();

        Ok(TaskResult::completed(format!("{approved} of {} creative(s) approved", outcomes.len()))
            .with_data("creative_ids", outcomes.iter().map(|o| o.creative_id.clone()).collect::<Vec<_>>())
            .with_data("creatives", outcomes))
    }

    pub async fn get_creative_status(&self, tenant: &TenantContext, principal: &PrincipalContext, params: CreativeIdParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id().to_string();
        let principal_id = principal.principal.principal_id.clone();
        let ctx = self
            .begin(&tenant_id, &principal_id, principal.protocol, params.context_id.as_deref(), format!("get_creative_status: {}", params.creative_id))
            .await?;

        let result = match self.storage.get_creative(&tenant_id, &params.creative_id).await? {
            None => TaskResult::failed("creative_not_found", format!("creative '{}' not found", params.creative_id)),
            Some(creative) if creative.principal_id != principal_id && !principal.principal.has_admin_privilege() => {
                return Err(AdcpError::new(ErrorCode::Unauthorized, "creative belongs to a different principal"));
            }
            Some(creative) => TaskResult::completed(format!("Creative '{}' is {:?}", creative.creative_id, creative.status))
                .with_data("creative_id", creative.creative_id)
                .with_data("status", creative.status),
        };

        Ok(self.finish(&tenant_id, &principal_id, "get_creative_status", &ctx, result).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcp_adapter_core::AdapterRegistry;
    use adcp_catalog::DatabaseCatalog;
    use adcp_context::ContextManager;
    use adcp_core::media_buy::{MediaBuy, MediaBuyStatus};
    use adcp_core::principal::{Principal, Protocol};
    use adcp_core::tenant::{PolicySettings, Tenant, TenantSettings};
    use adcp_notify::{NullNotifier, StorageAuditSink};
    use adcp_storage::InMemoryStore;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn tenant_ctx(auto_approve_formats: Vec<String>) -> TenantContext {
        TenantContext::new(Tenant {
            tenant_id: "acme".into(),
            name: "Acme".into(),
            subdomain: "acme".into(),
            virtual_host: None,
            is_active: true,
            settings: TenantSettings {
                ad_server: "mock".into(),
                max_daily_budget: None,
                auto_approve_formats,
                human_review_required: false,
                authorized_emails: vec![],
                authorized_domains: vec![],
                webhook_urls: vec![],
                policy_settings: PolicySettings::default(),
                admin_token: "admin-secret".into(),
                adapter_config: BTreeMap::new(),
            },
        })
    }

    fn principal_ctx() -> PrincipalContext {
        PrincipalContext {
            tenant_id: "acme".into(),
            principal: Principal {
                tenant_id: "acme".into(),
                principal_id: "buyer_1".into(),
                name: "Buyer One".into(),
                access_token: "tok".into(),
                platform_mappings: BTreeMap::new(),
                is_admin: false,
            },
            protocol: Protocol::A2a,
        }
    }

    fn executor(store: Arc<dyn adcp_storage::Storage>) -> Executor {
        Executor::new(
            store.clone(),
            Arc::new(DatabaseCatalog::new(store.clone())),
            Arc::new(ContextManager::new(store.clone())),
            Arc::new(AdapterRegistry::new()),
            Arc::new(StorageAuditSink::new(store)),
            Arc::new(NullNotifier),
        )
    }

    async fn seed_media_buy(store: &Arc<dyn adcp_storage::Storage>) {
        store
            .create_media_buy(
                MediaBuy {
                    media_buy_id: "mb_1".into(),
                    tenant_id: "acme".into(),
                    principal_id: "buyer_1".into(),
                    order_name: "Summer".into(),
                    advertiser_name: "Acme Co".into(),
                    budget: 1000.0,
                    start_date: Utc::now(),
                    end_date: Utc::now(),
                    status: MediaBuyStatus::PendingActivation,
                    raw_request: serde_json::json!({}),
                    adapter_order_id: None,
                    created_at: Utc::now(),
                },
                vec![],
            )
            .await
            .unwrap();
    }

    fn hosted_image_submission() -> CreativeSubmission {
        CreativeSubmission {
            creative_id: None,
            name: "Banner".into(),
            format: "display_300x250".into(),
            snippet: None,
            snippet_type: None,
            template_variables: None,
            media_url: Some("https://cdn.example.com/banner.png".into()),
            media_data: None,
            click_url: Some("https://advertiser.example.com".into()),
            landing_url: None,
            clickthrough_url: None,
            duration: None,
            width: Some(300),
            height: Some(250),
            package_assignments: vec![],
        }
    }

    #[tokio::test]
    async fn auto_approves_formats_in_tenant_allowlist() {
        let store: Arc<dyn adcp_storage::Storage> = InMemoryStore::new();
        seed_media_buy(&store).await;
        let exec = executor(store);
        let params = SubmitCreativesParams { media_buy_id: "mb_1".into(), creatives: vec![hosted_image_submission()], dry_run: false, context_id: None };
        let result = exec.submit_creatives(&tenant_ctx(vec!["display_300x250".into()]), &principal_ctx(), params).await.unwrap();
        assert!(!result.is_failed());
        let creatives = result.data["creatives"].as_array().unwrap();
        assert_eq!(creatives[0]["status"], "approved");
    }

    #[tokio::test]
    async fn defaults_to_pending_review_outside_allowlist() {
        let store: Arc<dyn adcp_storage::Storage> = InMemoryStore::new();
        seed_media_buy(&store).await;
        let exec = executor(store);
        let params = SubmitCreativesParams { media_buy_id: "mb_1".into(), creatives: vec![hosted_image_submission()], dry_run: false, context_id: None };
        let result = exec.submit_creatives(&tenant_ctx(vec![]), &principal_ctx(), params).await.unwrap();
        let creatives = result.data["creatives"].as_array().unwrap();
        assert_eq!(creatives[0]["status"], "pending_review");
    }

    #[tokio::test]
    async fn rejects_structurally_invalid_creative_regardless_of_allowlist() {
        let store: Arc<dyn adcp_storage::Storage> = InMemoryStore::new();
        seed_media_buy(&store).await;
        let exec = executor(store);
        let mut submission = hosted_image_submission();
        submission.click_url = None;
        let params = SubmitCreativesParams { media_buy_id: "mb_1".into(), creatives: vec![submission], dry_run: false, context_id: None };
        let result = exec.submit_creatives(&tenant_ctx(vec!["display_300x250".into()]), &principal_ctx(), params).await.unwrap();
        let creatives = result.data["creatives"].as_array().unwrap();
        assert_eq!(creatives[0]["status"], "failed");
    }

    #[tokio::test]
    async fn cross_principal_submit_is_unauthorized() {
        let store: Arc<dyn adcp_storage::Storage> = InMemoryStore::new();
        seed_media_buy(&store).await;
        let exec = executor(store);
        let mut other = principal_ctx();
        other.principal.principal_id = "buyer_2".into();
        let params = SubmitCreativesParams { media_buy_id: "mb_1".into(), creatives: vec![hosted_image_submission()], dry_run: false, context_id: None };
        let err = exec.submit_creatives(&tenant_ctx(vec![]), &other, params).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}
