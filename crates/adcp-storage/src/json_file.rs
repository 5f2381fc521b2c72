use std::path::{Path, PathBuf};
use std::sync::Arc;

use adcp_core::{AuditRecord, ContextRecord, Creative, MediaBuy, Package, Principal, Product, Task, Tenant};
use adcp_error::{AdcpError, ErrorCode};
use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use crate::memory::InMemoryStore;
use crate::sync_job::SyncJob;
use crate::Storage;

/// JSON-file-backed store: one file per tenant+aggregate under `root`, with
/// an `InMemoryStore` as a read cache populated by `hydrate`. Grounded on
/// `abp-daemon`'s `persist_receipt`/`hydrate_receipts_from_disk` pattern.
pub struct JsonFileStore {
    root: PathBuf,
    cache: Arc<InMemoryStore>,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            root: root.into(),
            cache: InMemoryStore::new(),
            write_lock: Mutex::new(()),
        })
    }

    /// Walks `root` reading every `*.json` file into the in-memory cache,
    /// skipping and logging files that fail to parse rather than aborting
    /// startup.
    pub async fn hydrate(&self) -> Result<(), AdcpError> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)
                .await
                .map_err(|e| AdcpError::new(ErrorCode::Internal, format!("cannot create storage dir: {e}")))?;
            return Ok(());
        }
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| AdcpError::new(ErrorCode::Internal, format!("cannot read storage dir: {e}")))?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Err(e) = self.hydrate_one(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable storage record");
            }
        }
        Ok(())
    }

    async fn hydrate_one(&self, path: &Path) -> Result<(), AdcpError> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| AdcpError::new(ErrorCode::Internal, e.to_string()))?;
        let record: StoredRecord = serde_json::from_str(&contents)
            .map_err(|e| AdcpError::new(ErrorCode::Internal, e.to_string()))?;
        record.hydrate_into(&self.cache).await
    }

    async fn persist(&self, filename: &str, record: &StoredRecord) -> Result<(), AdcpError> {
        let _guard = self.write_lock.lock().await;
        let path = self.root.join(filename);
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| AdcpError::new(ErrorCode::Internal, e.to_string()))?;
        fs::write(&path, json)
            .await
            .map_err(|e| AdcpError::new(ErrorCode::Internal, format!("cannot write {}: {e}", path.display())))
    }
}

/// One on-disk file's payload. Tagged so hydration can dispatch by kind
/// without a separate file-naming convention beyond the tag itself.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind")]
enum StoredRecord {
    Tenant(Tenant),
    Principal(Principal),
    Product(Product),
    MediaBuy { media_buy: MediaBuy, packages: Vec<Package> },
    Creative(Creative),
    Task(Task),
    Context(ContextRecord),
    SyncJob(SyncJob),
}

impl StoredRecord {
    async fn hydrate_into(self, cache: &InMemoryStore) -> Result<(), AdcpError> {
        match self {
            StoredRecord::Tenant(t) => cache.upsert_tenant(t).await,
            StoredRecord::Principal(p) => cache.upsert_principal(p).await,
            StoredRecord::Product(p) => cache.upsert_product(p).await,
            StoredRecord::MediaBuy { media_buy, packages } => cache.create_media_buy(media_buy, packages).await,
            StoredRecord::Creative(c) => cache.submit_creatives(vec![c]).await,
            StoredRecord::Task(t) => cache.upsert_task(t).await,
            StoredRecord::Context(c) => cache.upsert_context(c).await,
            StoredRecord::SyncJob(j) => cache.update_sync_job(j).await,
        }
    }
}

#[async_trait]
impl Storage for JsonFileStore {
    async fn get_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>, AdcpError> {
        self.cache.get_tenant(tenant_id).await
    }

    async fn upsert_tenant(&self, tenant: Tenant) -> Result<(), AdcpError> {
        let filename = format!("tenant-{}.json", tenant.tenant_id);
        self.persist(&filename, &StoredRecord::Tenant(tenant.clone())).await?;
        self.cache.upsert_tenant(tenant).await
    }

    async fn find_tenant_by_host(&self, host: &str) -> Result<Option<Tenant>, AdcpError> {
        self.cache.find_tenant_by_host(host).await
    }

    async fn get_principal(&self, tenant_id: &str, principal_id: &str) -> Result<Option<Principal>, AdcpError> {
        self.cache.get_principal(tenant_id, principal_id).await
    }

    async fn find_principal_by_token(&self, tenant_id: &str, token: &str) -> Result<Option<Principal>, AdcpError> {
        self.cache.find_principal_by_token(tenant_id, token).await
    }

    async fn upsert_principal(&self, principal: Principal) -> Result<(), AdcpError> {
        let filename = format!("principal-{}-{}.json", principal.tenant_id, principal.principal_id);
        self.persist(&filename, &StoredRecord::Principal(principal.clone())).await?;
        self.cache.upsert_principal(principal).await
    }

    async fn list_products(&self, tenant_id: &str) -> Result<Vec<Product>, AdcpError> {
        self.cache.list_products(tenant_id).await
    }

    async fn get_product(&self, tenant_id: &str, product_id: &str) -> Result<Option<Product>, AdcpError> {
        self.cache.get_product(tenant_id, product_id).await
    }

    async fn upsert_product(&self, product: Product) -> Result<(), AdcpError> {
        let filename = format!("product-{}-{}.json", product.tenant_id, product.product_id);
        self.persist(&filename, &StoredRecord::Product(product.clone())).await?;
        self.cache.upsert_product(product).await
    }

    async fn get_media_buy(&self, tenant_id: &str, media_buy_id: &str) -> Result<Option<MediaBuy>, AdcpError> {
        self.cache.get_media_buy(tenant_id, media_buy_id).await
    }

    async fn create_media_buy(&self, media_buy: MediaBuy, packages: Vec<Package>) -> Result<(), AdcpError> {
        let filename = format!("mediabuy-{}-{}.json", media_buy.tenant_id, media_buy.media_buy_id);
        let record = StoredRecord::MediaBuy {
            media_buy: media_buy.clone(),
            packages: packages.clone(),
        };
        self.persist(&filename, &record).await?;
        self.cache.create_media_buy(media_buy, packages).await
    }

    async fn update_media_buy(&self, media_buy: MediaBuy) -> Result<(), AdcpError> {
        let packages = self
            .cache
            .list_packages(&media_buy.tenant_id, &media_buy.media_buy_id)
            .await?;
        let filename = format!("mediabuy-{}-{}.json", media_buy.tenant_id, media_buy.media_buy_id);
        let record = StoredRecord::MediaBuy {
            media_buy: media_buy.clone(),
            packages,
        };
        self.persist(&filename, &record).await?;
        self.cache.update_media_buy(media_buy).await
    }

    async fn list_packages(&self, tenant_id: &str, media_buy_id: &str) -> Result<Vec<Package>, AdcpError> {
        self.cache.list_packages(tenant_id, media_buy_id).await
    }

    async fn get_package(&self, tenant_id: &str, media_buy_id: &str, package_id: &str) -> Result<Option<Package>, AdcpError> {
        self.cache.get_package(tenant_id, media_buy_id, package_id).await
    }

    async fn update_package(&self, package: Package) -> Result<(), AdcpError> {
        let tenant_id = package.tenant_id.clone();
        let media_buy_id = package.media_buy_id.clone();
        self.cache.update_package(package).await?;
        let Some(media_buy) = self.cache.get_media_buy(&tenant_id, &media_buy_id).await? else {
            return Ok(());
        };
        self.update_media_buy(media_buy).await
    }

    async fn get_creative(&self, tenant_id: &str, creative_id: &str) -> Result<Option<Creative>, AdcpError> {
        self.cache.get_creative(tenant_id, creative_id).await
    }

    async fn submit_creatives(&self, creatives: Vec<Creative>) -> Result<(), AdcpError> {
        for creative in &creatives {
            let filename = format!("creative-{}-{}.json", creative.tenant_id, creative.creative_id);
            self.persist(&filename, &StoredRecord::Creative(creative.clone())).await?;
        }
        self.cache.submit_creatives(creatives).await
    }

    async fn update_creative(&self, creative: Creative) -> Result<(), AdcpError> {
        let filename = format!("creative-{}-{}.json", creative.tenant_id, creative.creative_id);
        self.persist(&filename, &StoredRecord::Creative(creative.clone())).await?;
        self.cache.update_creative(creative).await
    }

    async fn get_task(&self, tenant_id: &str, task_id: &str) -> Result<Option<Task>, AdcpError> {
        self.cache.get_task(tenant_id, task_id).await
    }

    async fn upsert_task(&self, task: Task) -> Result<(), AdcpError> {
        let filename = format!("task-{}-{}.json", task.tenant_id, task.task_id);
        self.persist(&filename, &StoredRecord::Task(task.clone())).await?;
        self.cache.upsert_task(task).await
    }

    async fn get_context(&self, tenant_id: &str, context_id: &str) -> Result<Option<ContextRecord>, AdcpError> {
        self.cache.get_context(tenant_id, context_id).await
    }

    async fn upsert_context(&self, context: ContextRecord) -> Result<(), AdcpError> {
        let filename = format!("context-{}-{}.json", context.tenant_id, context.context_id);
        self.persist(&filename, &StoredRecord::Context(context.clone())).await?;
        self.cache.upsert_context(context).await
    }

    async fn append_audit(&self, record: AuditRecord) -> Result<(), AdcpError> {
        // Audit is append-only and high-volume; it lives in one growing
        // newline-delimited file per tenant rather than one file per record.
        let _guard = self.write_lock.lock().await;
        let filename = self.root.join(format!("audit-{}.ndjson", record.tenant_id));
        let line = serde_json::to_string(&record).map_err(|e| AdcpError::new(ErrorCode::Internal, e.to_string()))?;
        use tokio::io::AsyncWriteExt;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&filename)
            .await
            .map_err(|e| AdcpError::new(ErrorCode::Internal, e.to_string()))?;
        file.write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|e| AdcpError::new(ErrorCode::Internal, e.to_string()))?;
        self.cache.append_audit(record).await
    }

    async fn get_sync_job(&self, tenant_id: &str, sync_id: &str) -> Result<Option<SyncJob>, AdcpError> {
        self.cache.get_sync_job(tenant_id, sync_id).await
    }

    async fn list_sync_jobs(&self, tenant_id: &str) -> Result<Vec<SyncJob>, AdcpError> {
        self.cache.list_sync_jobs(tenant_id).await
    }

    async fn try_start_sync_job(&self, job: SyncJob) -> Result<bool, AdcpError> {
        let started = self.cache.try_start_sync_job(job.clone()).await?;
        if started {
            let filename = format!("syncjob-{}-{}.json", job.tenant_id, job.sync_id);
            self.persist(&filename, &StoredRecord::SyncJob(job)).await?;
        }
        Ok(started)
    }

    async fn update_sync_job(&self, job: SyncJob) -> Result<(), AdcpError> {
        let filename = format!("syncjob-{}-{}.json", job.tenant_id, job.sync_id);
        self.persist(&filename, &StoredRecord::SyncJob(job.clone())).await?;
        self.cache.update_sync_job(job).await
    }
}
