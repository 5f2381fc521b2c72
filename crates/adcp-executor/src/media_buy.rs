//! `create_media_buy`, `update_media_buy`, `get_media_buy_status`,
//! `get_media_buy_delivery` (C9, the bulk of distilled §4.5/§4.6).
//! Grounded on `original_source/task_executor.py`'s decision process and
//! the GAM reference adapter's guaranteed/non-guaranteed split
//! (`adcp-adapter-gam::orders::GUARANTEED_LINE_ITEM_TYPES`).

use adcp_adapter_core::{CreateMediaBuyRequest, PackageInput, UpdateMediaBuyRequest as AdapterUpdateRequest};
use adcp_core::media_buy::{MediaBuy, MediaBuyStatus};
use adcp_core::package::Package;
use adcp_core::principal::PrincipalContext;
use adcp_core::product::{DeliveryType, NonGuaranteedAutomation, Product};
use adcp_core::result::TaskResult;
use adcp_core::task::{Task, TaskStatus};
use adcp_core::tenant::TenantContext;
use adcp_error::{AdcpError, ErrorCode};
use adcp_notify::TaskNotice;
use chrono::Utc;

use crate::hex8;
use crate::requests::{CreateMediaBuyParams, MediaBuyIdParams, UpdateMediaBuyParams};
use crate::Executor;

/// What the decision tree landed on for a newly created media buy.
struct InitialDecision {
    status: MediaBuyStatus,
    activate_immediately: bool,
    task_type: Option<&'static str>,
    headline: String,
}

/// Implements the distilled §4.5 `create_media_buy` decision tree, including
/// the mixed-type rule: a buy with both guaranteed and non-guaranteed
/// packages activates immediately when the non-guaranteed side is
/// `automatic`, leaving guaranteed delivery to the ad server's own approval
/// path (distilled §4.5, "Mixed-type rule").
fn decide_initial_status(products: &[Product], human_review_required: bool) -> InitialDecision {
    if human_review_required {
        return InitialDecision {
            status: MediaBuyStatus::PendingApproval,
            activate_immediately: false,
            task_type: Some("approve_media_buy"),
            headline: "Tenant policy requires human review before activation".to_string(),
        };
    }

    let has_guaranteed = products.iter().any(|p| p.delivery_type == DeliveryType::Guaranteed);
    let non_guaranteed: Vec<&Product> = products.iter().filter(|p| p.delivery_type == DeliveryType::NonGuaranteed).collect();

    if has_guaranteed && !non_guaranteed.is_empty() {
        let all_automatic = non_guaranteed.iter().all(|p| p.non_guaranteed_automation() == NonGuaranteedAutomation::Automatic);
        if all_automatic {
            return InitialDecision {
                status: MediaBuyStatus::Active,
                activate_immediately: true,
                task_type: None,
                headline: "Media buy automatically activated; guaranteed delivery follows the ad server's normal approval path".to_string(),
            };
        }
        return InitialDecision {
            status: MediaBuyStatus::PendingActivation,
            activate_immediately: false,
            task_type: None,
            headline: "Media buy includes guaranteed line items; awaiting ad server activation".to_string(),
        };
    }

    if has_guaranteed {
        return InitialDecision {
            status: MediaBuyStatus::PendingActivation,
            activate_immediately: false,
            task_type: None,
            headline: "Media buy includes guaranteed line items; awaiting ad server activation".to_string(),
        };
    }

    let any_confirmation_required = non_guaranteed.iter().any(|p| p.non_guaranteed_automation() == NonGuaranteedAutomation::ConfirmationRequired);
    if any_confirmation_required {
        return InitialDecision {
            status: MediaBuyStatus::PendingConfirmation,
            activate_immediately: false,
            task_type: Some("activate_gam_order"),
            headline: "Media buy created; awaiting confirmation before activation".to_string(),
        };
    }

    let all_automatic = non_guaranteed.iter().all(|p| p.non_guaranteed_automation() == NonGuaranteedAutomation::Automatic);
    if all_automatic {
        return InitialDecision {
            status: MediaBuyStatus::Active,
            activate_immediately: true,
            task_type: None,
            headline: "Media buy automatically activated".to_string(),
        };
    }

    InitialDecision {
        status: MediaBuyStatus::PendingActivation,
        activate_immediately: false,
        task_type: None,
        headline: "Media buy created; awaiting manual activation".to_string(),
    }
}

impl Executor {
    pub async fn create_media_buy(&self, tenant: &TenantContext, principal: &PrincipalContext, params: CreateMediaBuyParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id().to_string();
        let principal_id = principal.principal.principal_id.clone();
        let ctx = self
            .begin(&tenant_id, &principal_id, principal.protocol, params.context_id.as_deref(), format!("create_media_buy: {}", params.order_name))
            .await?;

        let result = self.do_create_media_buy(tenant, principal, &params).await?;
        Ok(self.finish(&tenant_id, &principal_id, "create_media_buy", &ctx, result).await)
    }

    async fn do_create_media_buy(&self, tenant: &TenantContext, principal: &PrincipalContext, params: &CreateMediaBuyParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id();

        if params.packages.is_empty() {
            return Ok(TaskResult::failed("validation", "create_media_buy requires at least one package"));
        }

        let decision = self.policy.check(&params.promoted_offering, &tenant.tenant.settings.policy_settings);
        if decision.is_rejected() {
            return Ok(TaskResult::failed("policy_rejected", decision.details.unwrap_or_else(|| "promoted offering rejected by policy".into())));
        }

        let mut products = Vec::with_capacity(params.packages.len());
        for pkg in &params.packages {
            match self.storage.get_product(tenant_id, &pkg.product_id).await? {
                Some(p) => products.push(p),
                None => return Ok(TaskResult::failed("package_not_found", format!("product '{}' not found", pkg.product_id))),
            }
        }

        let initial = decide_initial_status(&products, tenant.tenant.settings.human_review_required);

        let media_buy_id = format!("mb_{}", hex8());
        let mut out_packages = Vec::with_capacity(params.packages.len());
        let mut package_inputs = Vec::with_capacity(params.packages.len());
        for (pkg, product) in params.packages.iter().zip(products.iter()) {
            let package_id = pkg.package_id.clone().unwrap_or_else(|| format!("pkg_{}", hex8()));
            out_packages.push(Package {
                tenant_id: tenant_id.to_string(),
                media_buy_id: media_buy_id.clone(),
                package_id: package_id.clone(),
                product_id: product.product_id.clone(),
                impressions: pkg.impressions.unwrap_or(0),
                cpm: pkg.cpm,
                delivery_type: product.delivery_type,
                format_ids: product.formats.clone(),
                budget: pkg.budget,
                delivery_metrics: Default::default(),
                adapter_line_item_id: None,
            });
            package_inputs.push(PackageInput {
                package_id,
                product_id: product.product_id.clone(),
                impressions: pkg.impressions,
                cpm: pkg.cpm,
                budget: pkg.budget,
                targeting: pkg.targeting.clone(),
            });
        }

        let adapter = self
            .adapters
            .get(tenant_id)
            .await
            .ok_or_else(|| AdcpError::new(ErrorCode::Internal, format!("no ad-server adapter configured for tenant '{tenant_id}'")))?;

        let adapter_request = CreateMediaBuyRequest {
            media_buy_id: media_buy_id.clone(),
            order_name: params.order_name.clone(),
            advertiser_name: params.advertiser_name.clone(),
            packages: package_inputs,
            start_date: params.start_date,
            end_date: params.end_date,
            activate_immediately: initial.activate_immediately,
        };
        let adapter_result = adapter.create_media_buy(&adapter_request, params.dry_run).await?;

        let media_buy = MediaBuy {
            media_buy_id: media_buy_id.clone(),
            tenant_id: tenant_id.to_string(),
            principal_id: principal.principal.principal_id.clone(),
            order_name: params.order_name.clone(),
            advertiser_name: params.advertiser_name.clone(),
            budget: out_packages.iter().map(|p| p.budget).sum(),
            start_date: params.start_date,
            end_date: params.end_date,
            status: initial.status,
            raw_request: serde_json::to_value(params).unwrap_or_default(),
            adapter_order_id: Some(adapter_result.adapter_order_id),
            created_at: Utc::now(),
        };
        self.storage.create_media_buy(media_buy.clone(), out_packages).await?;

        let mut result = TaskResult::completed(initial.headline.clone()).with_data("media_buy_id", media_buy_id.clone()).with_data("status", media_buy.status);

        if let Some(task_type) = initial.task_type {
            let task = Task {
                task_id: format!("task_{}", hex8()),
                tenant_id: tenant_id.to_string(),
                media_buy_id: Some(media_buy_id.clone()),
                task_type: task_type.to_string(),
                status: TaskStatus::Pending,
                created_at: Utc::now(),
                details: Default::default(),
            };
            self.storage.upsert_task(task.clone()).await?;
            result = result.with_task_id(task.task_id.clone());

            self.notifier
                .notify_new_task(&TaskNotice {
                    tenant_name: tenant.tenant.name.clone(),
                    task_id: task.task_id,
                    task_type: task_type.to_string(),
                    principal_name: principal.principal.name.clone(),
                    media_buy_id: Some(media_buy_id),
                    details: vec![],
                })
                .await;
        }

        Ok(result)
    }

    pub async fn get_media_buy_status(&self, tenant: &TenantContext, principal: &PrincipalContext, params: MediaBuyIdParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id().to_string();
        let principal_id = principal.principal.principal_id.clone();
        let ctx = self
            .begin(&tenant_id, &principal_id, principal.protocol, params.context_id.as_deref(), format!("get_media_buy_status: {}", params.media_buy_id))
            .await?;

        let result = match self.storage.get_media_buy(&tenant_id, &params.media_buy_id).await? {
            None => TaskResult::failed("media_buy_not_found", format!("media buy '{}' not found", params.media_buy_id)),
            Some(media_buy) if !principal.owns(&media_buy.principal_id) && !principal.principal.has_admin_privilege() => {
                return Err(AdcpError::new(ErrorCode::Unauthorized, "media buy belongs to a different principal"));
            }
            Some(media_buy) => TaskResult::completed(format!("Media buy '{}' is {:?}", media_buy.media_buy_id, media_buy.status))
                .with_data("media_buy_id", media_buy.media_buy_id)
                .with_data("status", media_buy.status),
        };

        Ok(self.finish(&tenant_id, &principal_id, "get_media_buy_status", &ctx, result).await)
    }

    pub async fn get_media_buy_delivery(&self, tenant: &TenantContext, principal: &PrincipalContext, params: MediaBuyIdParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id().to_string();
        let principal_id = principal.principal.principal_id.clone();
        let ctx = self
            .begin(&tenant_id, &principal_id, principal.protocol, params.context_id.as_deref(), format!("get_media_buy_delivery: {}", params.media_buy_id))
            .await?;

        let media_buy = match self.storage.get_media_buy(&tenant_id, &params.media_buy_id).await? {
            Some(mb) => mb,
            None => {
                let result = TaskResult::failed("media_buy_not_found", format!("media buy '{}' not found", params.media_buy_id));
                return Ok(self.finish(&tenant_id, &principal_id, "get_media_buy_delivery", &ctx, result).await);
            }
        };
        if !principal.owns(&media_buy.principal_id) && !principal.principal.has_admin_privilege() {
            return Err(AdcpError::new(ErrorCode::Unauthorized, "media buy belongs to a different principal"));
        }

        let adapter = self
            .adapters
            .get(&tenant_id)
            .await
            .ok_or_else(|| AdcpError::new(ErrorCode::Internal, format!("no ad-server adapter configured for tenant '{tenant_id}'")))?;
        let delivery = adapter.get_media_buy_delivery(&media_buy.media_buy_id, Utc::now()).await?;

        let result = TaskResult::completed(format!("Delivery for media buy '{}'", media_buy.media_buy_id)).with_data("delivery", delivery);
        Ok(self.finish(&tenant_id, &principal_id, "get_media_buy_delivery", &ctx, result).await)
    }

    pub async fn update_media_buy(&self, tenant: &TenantContext, principal: &PrincipalContext, params: UpdateMediaBuyParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id().to_string();
        let principal_id = principal.principal.principal_id.clone();
        let ctx = self
            .begin(&tenant_id, &principal_id, principal.protocol, params.context_id.as_deref(), format!("update_media_buy: {}", params.media_buy_id))
            .await?;

        let result = self.do_update_media_buy(tenant, principal, &params).await?;
        Ok(self.finish(&tenant_id, &principal_id, "update_media_buy", &ctx, result).await)
    }

    async fn do_update_media_buy(&self, tenant: &TenantContext, principal: &PrincipalContext, params: &UpdateMediaBuyParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id();

        let mut media_buy = match self.storage.get_media_buy(tenant_id, &params.media_buy_id).await? {
            Some(mb) => mb,
            None => return Ok(TaskResult::failed("media_buy_not_found", format!("media buy '{}' not found", params.media_buy_id))),
        };
        if !principal.owns(&media_buy.principal_id) && !principal.principal.has_admin_privilege() {
            return Err(AdcpError::new(ErrorCode::Unauthorized, "media buy belongs to a different principal"));
        }

        let Some(action) = params.action.as_deref() else {
            return self.update_media_buy_fields(tenant_id, &mut media_buy, params).await;
        };

        match action {
            "update_package_budget" => self.update_package_budget(tenant, &media_buy, params).await,
            "activate_order" => self.activate_order(tenant, &mut media_buy, params).await,
            "approve_order" => self.approve_order(tenant, principal, &mut media_buy, params).await,
            other => self.forward_adapter_action(tenant_id, &media_buy, other, params).await,
        }
    }

    async fn update_package_budget(&self, tenant: &TenantContext, media_buy: &MediaBuy, params: &UpdateMediaBuyParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id();
        let Some(package_id) = params.package_id.as_deref() else {
            return Ok(TaskResult::failed("validation", "update_package_budget requires package_id"));
        };
        let Some(new_budget) = params.budget else {
            return Ok(TaskResult::failed("validation", "update_package_budget requires budget"));
        };

        let mut package = match self.storage.get_package(tenant_id, &media_buy.media_buy_id, package_id).await? {
            Some(p) => p,
            None => return Ok(TaskResult::failed("package_not_found", format!("package '{package_id}' not found"))),
        };

        if !package.can_set_budget(new_budget) {
            return Ok(TaskResult::failed(
                "budget_below_delivery",
                format!(
                    "cannot reduce package '{package_id}' budget to {:?}: already delivered {:?} in spend",
                    new_budget, package.delivery_metrics.spend
                ),
            ));
        }

        let adapter = self
            .adapters
            .get(tenant_id)
            .await
            .ok_or_else(|| AdcpError::new(ErrorCode::Internal, format!("no ad-server adapter configured for tenant '{tenant_id}'")))?;
        adapter
            .update_media_buy(
                &media_buy.media_buy_id,
                &AdapterUpdateRequest { action: "update_package_budget".into(), package_id: Some(package_id.to_string()), budget: Some(new_budget) },
                params.dry_run,
            )
            .await?;

        package.budget = new_budget;
        self.storage.update_package(package).await?;

        Ok(TaskResult::completed(format!("Package '{package_id}' budget updated to {new_budget:?}")))
    }

    async fn activate_order(&self, tenant: &TenantContext, media_buy: &mut MediaBuy, params: &UpdateMediaBuyParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id();
        let packages = self.storage.list_packages(tenant_id, &media_buy.media_buy_id).await?;

        let mut guaranteed_types = Vec::new();
        for package in &packages {
            if package.delivery_type == DeliveryType::Guaranteed {
                let line_item_type = self
                    .storage
                    .get_product(tenant_id, &package.product_id)
                    .await?
                    .and_then(|p| p.line_item_type().map(str::to_string))
                    .unwrap_or_else(|| "STANDARD".to_string());
                guaranteed_types.push(line_item_type);
            }
        }

        if !guaranteed_types.is_empty() {
            return Ok(TaskResult::failed(
                "cannot_auto_activate_guaranteed",
                format!("Cannot auto-activate order with guaranteed line items: {guaranteed_types:?}"),
            ));
        }

        let adapter = self
            .adapters
            .get(tenant_id)
            .await
            .ok_or_else(|| AdcpError::new(ErrorCode::Internal, format!("no ad-server adapter configured for tenant '{tenant_id}'")))?;
        adapter
            .update_media_buy(&media_buy.media_buy_id, &AdapterUpdateRequest { action: "activate_order".into(), package_id: None, budget: None }, params.dry_run)
            .await?;

        media_buy.status = MediaBuyStatus::Active;
        self.storage.update_media_buy(media_buy.clone()).await?;

        Ok(TaskResult::completed(format!("Order '{}' activated", media_buy.media_buy_id)))
    }

    async fn approve_order(&self, tenant: &TenantContext, principal: &PrincipalContext, media_buy: &mut MediaBuy, params: &UpdateMediaBuyParams) -> Result<TaskResult, AdcpError> {
        if !principal.principal.has_admin_privilege() {
            return Ok(TaskResult::failed("permission_denied", "approving an order requires admin privileges"));
        }
        let tenant_id = tenant.tenant_id();

        let adapter = self
            .adapters
            .get(tenant_id)
            .await
            .ok_or_else(|| AdcpError::new(ErrorCode::Internal, format!("no ad-server adapter configured for tenant '{tenant_id}'")))?;
        adapter
            .update_media_buy(&media_buy.media_buy_id, &AdapterUpdateRequest { action: "approve_order".into(), package_id: None, budget: None }, params.dry_run)
            .await?;

        media_buy.status = MediaBuyStatus::Active;
        self.storage.update_media_buy(media_buy.clone()).await?;

        Ok(TaskResult::completed(format!("Order '{}' approved", media_buy.media_buy_id)))
    }

    async fn forward_adapter_action(&self, tenant_id: &str, media_buy: &MediaBuy, action: &str, params: &UpdateMediaBuyParams) -> Result<TaskResult, AdcpError> {
        let adapter = self
            .adapters
            .get(tenant_id)
            .await
            .ok_or_else(|| AdcpError::new(ErrorCode::Internal, format!("no ad-server adapter configured for tenant '{tenant_id}'")))?;
        adapter
            .update_media_buy(
                &media_buy.media_buy_id,
                &AdapterUpdateRequest { action: action.to_string(), package_id: params.package_id.clone(), budget: params.budget },
                params.dry_run,
            )
            .await?;

        Ok(TaskResult::completed(format!("Action '{action}' applied to media buy '{}'", media_buy.media_buy_id)))
    }

    async fn update_media_buy_fields(&self, _tenant_id: &str, media_buy: &mut MediaBuy, params: &UpdateMediaBuyParams) -> Result<TaskResult, AdcpError> {
        let wants_schedule_change = params.start_date.is_some() || params.end_date.is_some();
        if media_buy.status.is_immutable() && wants_schedule_change {
            return Ok(TaskResult::failed("validation", format!("media buy '{}' is no longer editable", media_buy.media_buy_id)));
        }

        if let Some(start) = params.start_date {
            media_buy.start_date = start;
        }
        if let Some(end) = params.end_date {
            media_buy.end_date = end;
        }
        if let Some(overlay) = &params.targeting_overlay {
            if let Some(raw) = media_buy.raw_request.as_object_mut() {
                raw.insert("targeting_overlay".to_string(), serde_json::to_value(overlay).unwrap_or_default());
            }
        }
        self.storage.update_media_buy(media_buy.clone()).await?;

        Ok(TaskResult::completed(format!("Media buy '{}' updated", media_buy.media_buy_id)))
    }
}
