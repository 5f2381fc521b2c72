//! Storage (C1): a narrow repository interface per aggregate root, always
//! scoped by `tenant_id`, plus two backends. Grounded on the teacher's
//! `abp-daemon` receipt persistence (`Arc<RwLock<HashMap<..>>>` cache
//! backed by one JSON file per record).

mod json_file;
mod memory;
pub mod sync_job;

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;
pub use sync_job::{SyncJob, SyncStatus};

use adcp_core::{AuditRecord, ContextRecord, Creative, MediaBuy, Package, Principal, Product, Task, Tenant};
use adcp_error::AdcpError;
use async_trait::async_trait;

/// One repository per aggregate root. Every lookup/list call takes
/// `tenant_id` explicitly; cross-tenant reads always return empty/`None`.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>, AdcpError>;
    async fn upsert_tenant(&self, tenant: Tenant) -> Result<(), AdcpError>;
    async fn find_tenant_by_host(&self, host: &str) -> Result<Option<Tenant>, AdcpError>;

    async fn get_principal(&self, tenant_id: &str, principal_id: &str) -> Result<Option<Principal>, AdcpError>;
    async fn find_principal_by_token(&self, tenant_id: &str, token: &str) -> Result<Option<Principal>, AdcpError>;
    async fn upsert_principal(&self, principal: Principal) -> Result<(), AdcpError>;

    async fn list_products(&self, tenant_id: &str) -> Result<Vec<Product>, AdcpError>;
    async fn get_product(&self, tenant_id: &str, product_id: &str) -> Result<Option<Product>, AdcpError>;
    async fn upsert_product(&self, product: Product) -> Result<(), AdcpError>;

    async fn get_media_buy(&self, tenant_id: &str, media_buy_id: &str) -> Result<Option<MediaBuy>, AdcpError>;
    /// Persists a media buy and its packages atomically (SPEC_FULL §4.1).
    async fn create_media_buy(&self, media_buy: MediaBuy, packages: Vec<Package>) -> Result<(), AdcpError>;
    async fn update_media_buy(&self, media_buy: MediaBuy) -> Result<(), AdcpError>;

    async fn list_packages(&self, tenant_id: &str, media_buy_id: &str) -> Result<Vec<Package>, AdcpError>;
    async fn get_package(&self, tenant_id: &str, media_buy_id: &str, package_id: &str) -> Result<Option<Package>, AdcpError>;
    async fn update_package(&self, package: Package) -> Result<(), AdcpError>;

    async fn get_creative(&self, tenant_id: &str, creative_id: &str) -> Result<Option<Creative>, AdcpError>;
    /// Persists a batch of creative submissions atomically.
    async fn submit_creatives(&self, creatives: Vec<Creative>) -> Result<(), AdcpError>;
    async fn update_creative(&self, creative: Creative) -> Result<(), AdcpError>;

    async fn get_task(&self, tenant_id: &str, task_id: &str) -> Result<Option<Task>, AdcpError>;
    async fn upsert_task(&self, task: Task) -> Result<(), AdcpError>;

    async fn get_context(&self, tenant_id: &str, context_id: &str) -> Result<Option<ContextRecord>, AdcpError>;
    async fn upsert_context(&self, context: ContextRecord) -> Result<(), AdcpError>;

    async fn append_audit(&self, record: AuditRecord) -> Result<(), AdcpError>;

    async fn get_sync_job(&self, tenant_id: &str, sync_id: &str) -> Result<Option<SyncJob>, AdcpError>;
    async fn list_sync_jobs(&self, tenant_id: &str) -> Result<Vec<SyncJob>, AdcpError>;
    /// Conditional insert: fails with `Ok(false)` (not an error) if a job of
    /// the same `(tenant_id, sync_type)` is already `running`.
    async fn try_start_sync_job(&self, job: SyncJob) -> Result<bool, AdcpError>;
    async fn update_sync_job(&self, job: SyncJob) -> Result<(), AdcpError>;
}
