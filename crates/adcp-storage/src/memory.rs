use std::collections::HashMap;
use std::sync::Arc;

use adcp_core::{AuditRecord, ContextRecord, Creative, MediaBuy, Package, Principal, Product, Task, Tenant};
use adcp_error::{AdcpError, ErrorCode};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::sync_job::{SyncJob, SyncStatus};
use crate::Storage;

fn key(tenant_id: &str, id: &str) -> String {
    format!("{tenant_id}/{id}")
}

/// In-memory backend, the default for tests and the Mock adapter path.
/// Grounded on `abp-daemon`'s `AppState { receipts: Arc<RwLock<HashMap<..>>> }`.
#[derive(Default)]
pub struct InMemoryStore {
    tenants: RwLock<HashMap<String, Tenant>>,
    principals: RwLock<HashMap<String, Principal>>,
    products: RwLock<HashMap<String, Product>>,
    media_buys: RwLock<HashMap<String, MediaBuy>>,
    packages: RwLock<HashMap<String, Package>>,
    creatives: RwLock<HashMap<String, Creative>>,
    tasks: RwLock<HashMap<String, Task>>,
    contexts: RwLock<HashMap<String, ContextRecord>>,
    audit: RwLock<Vec<AuditRecord>>,
    sync_jobs: RwLock<HashMap<String, SyncJob>>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl Storage for InMemoryStore {
    async fn get_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>, AdcpError> {
        Ok(self.tenants.read().await.get(tenant_id).cloned())
    }

    async fn upsert_tenant(&self, tenant: Tenant) -> Result<(), AdcpError> {
        self.tenants.write().await.insert(tenant.tenant_id.clone(), tenant);
        Ok(())
    }

    async fn find_tenant_by_host(&self, host: &str) -> Result<Option<Tenant>, AdcpError> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .values()
            .find(|t| t.subdomain == host || t.virtual_host.as_deref() == Some(host))
            .cloned())
    }

    async fn get_principal(&self, tenant_id: &str, principal_id: &str) -> Result<Option<Principal>, AdcpError> {
        Ok(self.principals.read().await.get(&key(tenant_id, principal_id)).cloned())
    }

    async fn find_principal_by_token(&self, tenant_id: &str, token: &str) -> Result<Option<Principal>, AdcpError> {
        let principals = self.principals.read().await;
        Ok(principals
            .values()
            .find(|p| p.tenant_id == tenant_id && p.access_token == token)
            .cloned())
    }

    async fn upsert_principal(&self, principal: Principal) -> Result<(), AdcpError> {
        let k = key(&principal.tenant_id, &principal.principal_id);
        self.principals.write().await.insert(k, principal);
        Ok(())
    }

    async fn list_products(&self, tenant_id: &str) -> Result<Vec<Product>, AdcpError> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| p.tenant_id == tenant_id).cloned().collect())
    }

    async fn get_product(&self, tenant_id: &str, product_id: &str) -> Result<Option<Product>, AdcpError> {
        Ok(self.products.read().await.get(&key(tenant_id, product_id)).cloned())
    }

    async fn upsert_product(&self, product: Product) -> Result<(), AdcpError> {
        let k = key(&product.tenant_id, &product.product_id);
        self.products.write().await.insert(k, product);
        Ok(())
    }

    async fn get_media_buy(&self, tenant_id: &str, media_buy_id: &str) -> Result<Option<MediaBuy>, AdcpError> {
        Ok(self.media_buys.read().await.get(&key(tenant_id, media_buy_id)).cloned())
    }

    async fn create_media_buy(&self, media_buy: MediaBuy, packages: Vec<Package>) -> Result<(), AdcpError> {
        let mut media_buys = self.media_buys.write().await;
        let mut pkgs = self.packages.write().await;
        let mb_key = key(&media_buy.tenant_id, &media_buy.media_buy_id);
        for package in packages {
            let pkg_key = key(&media_buy.tenant_id, &format!("{}/{}", package.media_buy_id, package.package_id));
            pkgs.insert(pkg_key, package);
        }
        media_buys.insert(mb_key, media_buy);
        Ok(())
    }

    async fn update_media_buy(&self, media_buy: MediaBuy) -> Result<(), AdcpError> {
        let k = key(&media_buy.tenant_id, &media_buy.media_buy_id);
        self.media_buys.write().await.insert(k, media_buy);
        Ok(())
    }

    async fn list_packages(&self, tenant_id: &str, media_buy_id: &str) -> Result<Vec<Package>, AdcpError> {
        let prefix = key(tenant_id, &format!("{media_buy_id}/"));
        let packages = self.packages.read().await;
        Ok(packages
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn get_package(&self, tenant_id: &str, media_buy_id: &str, package_id: &str) -> Result<Option<Package>, AdcpError> {
        let pkg_key = key(tenant_id, &format!("{media_buy_id}/{package_id}"));
        Ok(self.packages.read().await.get(&pkg_key).cloned())
    }

    async fn update_package(&self, package: Package) -> Result<(), AdcpError> {
        // tenant_id is not stored on Package; callers pass it via the owning
        // media buy lookup, so derive the same composite key used on insert.
        let pkg_key_suffix = format!("{}/{}", package.media_buy_id, package.package_id);
        let mut packages = self.packages.write().await;
        let existing_key = packages
            .keys()
            .find(|k| k.ends_with(&pkg_key_suffix))
            .cloned()
            .ok_or_else(|| AdcpError::new(ErrorCode::NotFound, "package not found"))?;
        packages.insert(existing_key, package);
        Ok(())
    }

    async fn get_creative(&self, tenant_id: &str, creative_id: &str) -> Result<Option<Creative>, AdcpError> {
        Ok(self.creatives.read().await.get(&key(tenant_id, creative_id)).cloned())
    }

    async fn submit_creatives(&self, creatives: Vec<Creative>) -> Result<(), AdcpError> {
        let mut store = self.creatives.write().await;
        for creative in creatives {
            let k = key(&creative.tenant_id, &creative.creative_id);
            store.insert(k, creative);
        }
        Ok(())
    }

    async fn update_creative(&self, creative: Creative) -> Result<(), AdcpError> {
        let k = key(&creative.tenant_id, &creative.creative_id);
        self.creatives.write().await.insert(k, creative);
        Ok(())
    }

    async fn get_task(&self, tenant_id: &str, task_id: &str) -> Result<Option<Task>, AdcpError> {
        Ok(self.tasks.read().await.get(&key(tenant_id, task_id)).cloned())
    }

    async fn upsert_task(&self, task: Task) -> Result<(), AdcpError> {
        let k = key(&task.tenant_id, &task.task_id);
        self.tasks.write().await.insert(k, task);
        Ok(())
    }

    async fn get_context(&self, tenant_id: &str, context_id: &str) -> Result<Option<ContextRecord>, AdcpError> {
        Ok(self.contexts.read().await.get(&key(tenant_id, context_id)).cloned())
    }

    async fn upsert_context(&self, context: ContextRecord) -> Result<(), AdcpError> {
        let k = key(&context.tenant_id, &context.context_id);
        self.contexts.write().await.insert(k, context);
        Ok(())
    }

    async fn append_audit(&self, record: AuditRecord) -> Result<(), AdcpError> {
        self.audit.write().await.push(record);
        Ok(())
    }

    async fn get_sync_job(&self, tenant_id: &str, sync_id: &str) -> Result<Option<SyncJob>, AdcpError> {
        Ok(self.sync_jobs.read().await.get(&key(tenant_id, sync_id)).cloned())
    }

    async fn list_sync_jobs(&self, tenant_id: &str) -> Result<Vec<SyncJob>, AdcpError> {
        let jobs = self.sync_jobs.read().await;
        Ok(jobs.values().filter(|j| j.tenant_id == tenant_id).cloned().collect())
    }

    async fn try_start_sync_job(&self, job: SyncJob) -> Result<bool, AdcpError> {
        let mut jobs = self.sync_jobs.write().await;
        let already_running = jobs
            .values()
            .any(|j| j.tenant_id == job.tenant_id && j.sync_type == job.sync_type && j.status == SyncStatus::Running);
        if already_running {
            return Ok(false);
        }
        let k = key(&job.tenant_id, &job.sync_id);
        jobs.insert(k, job);
        Ok(true)
    }

    async fn update_sync_job(&self, job: SyncJob) -> Result<(), AdcpError> {
        let k = key(&job.tenant_id, &job.sync_id);
        self.sync_jobs.write().await.insert(k, job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcp_core::tenant::{PolicySettings, TenantSettings};

    fn mk_tenant(id: &str) -> Tenant {
        Tenant {
            tenant_id: id.to_string(),
            name: id.to_string(),
            subdomain: id.to_string(),
            virtual_host: None,
            is_active: true,
            settings: TenantSettings {
                ad_server: "mock".to_string(),
                max_daily_budget: None,
                auto_approve_formats: vec![],
                human_review_required: false,
                authorized_emails: vec![],
                authorized_domains: vec![],
                webhook_urls: vec![],
                policy_settings: PolicySettings::default(),
                admin_token: "admintok".to_string(),
                adapter_config: Default::default(),
            },
        }
    }

    #[tokio::test]
    async fn cross_tenant_lookup_returns_none() {
        let store = InMemoryStore::new();
        store.upsert_tenant(mk_tenant("acme")).await.unwrap();
        assert!(store.get_tenant("acme").await.unwrap().is_some());
        assert!(store.get_tenant("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sync_job_guard_rejects_concurrent_run() {
        let store = InMemoryStore::new();
        let job = SyncJob {
            sync_id: "sync_1".into(),
            tenant_id: "acme".into(),
            sync_type: "inventory".into(),
            status: SyncStatus::Running,
            started_at: chrono::Utc::now(),
            completed_at: None,
            summary: Default::default(),
            error_message: None,
        };
        assert!(store.try_start_sync_job(job.clone()).await.unwrap());
        let mut dup = job;
        dup.sync_id = "sync_2".into();
        assert!(!store.try_start_sync_job(dup).await.unwrap());
    }
}
