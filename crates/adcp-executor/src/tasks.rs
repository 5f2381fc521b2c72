//! `create_human_task`, `verify_task` (C9). Thin persistence wrappers
//! around [`adcp_core::task::Task`] — the interesting logic (deciding
//! *when* a task is created) lives in `media_buy.rs`'s initial-status
//! decision tree; these two operations are the generic task surface a
//! caller (or an operator UI) uses afterward.

use adcp_core::principal::PrincipalContext;
use adcp_core::result::TaskResult;
use adcp_core::task::{Task, TaskStatus};
use adcp_core::tenant::TenantContext;
use adcp_error::{AdcpError, ErrorCode};
use adcp_notify::TaskNotice;
use chrono::Utc;

use crate::hex8;
use crate::requests::{CreateHumanTaskParams, VerifyTaskParams};
use crate::Executor;

impl Executor {
    pub async fn create_human_task(&self, tenant: &TenantContext, principal: &PrincipalContext, params: CreateHumanTaskParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id().to_string();
        let principal_id = principal.principal.principal_id.clone();
        let ctx = self
            .begin(&tenant_id, &principal_id, principal.protocol, params.context_id.as_deref(), format!("create_human_task: {}", params.task_type))
            .await?;

        let result = if params.task_type.trim().is_empty() {
            TaskResult::failed("validation", "create_human_task requires a task_type")
        } else {
            let task = Task {
                task_id: format!("task_{}", hex8()),
                tenant_id: tenant_id.clone(),
                media_buy_id: params.media_buy_id.clone(),
                task_type: params.task_type.clone(),
                status: TaskStatus::Pending,
                created_at: Utc::now(),
                details: params.details.clone(),
            };
            self.storage.upsert_task(task.clone()).await?;

            self.notifier
                .notify_new_task(&TaskNotice {
                    tenant_name: tenant.tenant.name.clone(),
                    task_id: task.task_id.clone(),
                    task_type: task.task_type.clone(),
                    principal_name: principal.principal.name.clone(),
                    media_buy_id: task.media_buy_id.clone(),
                    details: task.details.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                })
                .await;

            TaskResult::completed(format!("Task '{}' created", task.task_id))
                .with_data("task_id", task.task_id.clone())
                .with_task_id(task.task_id)
        };

        Ok(self.finish(&tenant_id, &principal_id, "create_human_task", &ctx, result).await)
    }

    pub async fn verify_task(&self, tenant: &TenantContext, principal: &PrincipalContext, params: VerifyTaskParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id().to_string();
        let principal_id = principal.principal.principal_id.clone();
        let ctx = self
            .begin(&tenant_id, &principal_id, principal.protocol, params.context_id.as_deref(), format!("verify_task: {}", params.task_id))
            .await?;

        let result = match self.storage.get_task(&tenant_id, &params.task_id).await? {
            None => TaskResult::failed("task_not_found", format!("task '{}' not found", params.task_id)),
            Some(task) => {
                let completed = task.status == TaskStatus::Completed;
                TaskResult::completed(format!("Task '{}' is {:?}", task.task_id, task.status))
                    .with_data("task_id", task.task_id)
                    .with_data("status", task.status)
                    .with_data("completed", completed)
            }
        };

        Ok(self.finish(&tenant_id, &principal_id, "verify_task", &ctx, result).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcp_adapter_core::AdapterRegistry;
    use adcp_catalog::DatabaseCatalog;
    use adcp_context::ContextManager;
    use adcp_core::principal::{Principal, Protocol};
    use adcp_core::tenant::{PolicySettings, Tenant, TenantSettings};
    use adcp_notify::{NullNotifier, StorageAuditSink};
    use adcp_storage::InMemoryStore;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn tenant_ctx() -> TenantContext {
        TenantContext::new(Tenant {
            tenant_id: "acme".into(),
            name: "Acme".into(),
            subdomain: "acme".into(),
            virtual_host: None,
            is_active: true,
            settings: TenantSettings {
                ad_server: "mock".into(),
                max_daily_budget: None,
                auto_approve_formats: vec![],
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

    #[tokio::test]
    async fn create_human_task_persists_and_reports_task_id() {
        let store = InMemoryStore::new();
        let exec = executor(store);
        let params = CreateHumanTaskParams { task_type: "approve_creative".into(), media_buy_id: Some("mb_1".into()), details: BTreeMap::new(), context_id: None };
        let result = exec.create_human_task(&tenant_ctx(), &principal_ctx(), params).await.unwrap();
        assert!(!result.is_failed());
        assert!(result.task_id.is_some());
    }

    #[tokio::test]
    async fn verify_task_reports_not_found() {
        let store = InMemoryStore::new();
        let exec = executor(store);
        let params = VerifyTaskParams { task_id: "task_missing".into(), context_id: None };
        let result = exec.verify_task(&tenant_ctx(), &principal_ctx(), params).await.unwrap();
        assert!(result.is_failed());
        assert_eq!(result.error.as_deref(), Some("task_not_found"));
    }

    #[tokio::test]
    async fn verify_task_reports_completion() {
        let store = InMemoryStore::new();
        let exec = executor(store);
        let create = exec
            .create_human_task(&tenant_ctx(), &principal_ctx(), CreateHumanTaskParams { task_type: "approve_media_buy".into(), media_buy_id: None, details: BTreeMap::new(), context_id: None })
            .await
            .unwrap();
        let task_id = create.task_id.unwrap();

        let mut task = exec.storage.get_task("acme", &task_id).await.unwrap().unwrap();
        task.status = TaskStatus::Completed;
        exec.storage.upsert_task(task).await.unwrap();

        let result = exec.verify_task(&tenant_ctx(), &principal_ctx(), VerifyTaskParams { task_id, context_id: None }).await.unwrap();
        assert_eq!(result.data["completed"], true);
    }
}
