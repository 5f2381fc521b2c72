//! Process wiring for the AdCP gateway daemon (C10 host): assembles
//! storage, catalog, conversation context, ad-server adapters, audit and
//! notification sinks into one [`Executor`], then serves the `adcp-mcp`
//! and `adcp-a2a` facades behind the middleware stack, grounded on
//! `crates/abp-daemon::lib.rs`'s `AppState`/`build_app` split.

pub mod middleware;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use adcp_adapter_core::{AdServerAdapter, AdapterRegistry};
use adcp_adapter_gam::{auth::GamAuthConfig, GamAdapter, GamAdapterConfig};
use adcp_adapter_kevel::{KevelAdapter, KevelAdapterConfig};
use adcp_adapter_mock::MockAdapter;
use adcp_adapter_triton::{TritonAdapter, TritonAdapterConfig};
use adcp_catalog::DatabaseCatalog;
use adcp_config::{GatewayConfig, StorageBackendKind};
use adcp_context::ContextManager;
use adcp_core::tenant::{PolicySettings, Tenant, TenantSettings};
use adcp_error::{AdcpError, ErrorCode};
use adcp_executor::Executor;
use adcp_notify::{NullNotifier, StorageAuditSink, WebhookNotifier};
use adcp_storage::{InMemoryStore, JsonFileStore, Storage};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{from_fn, Next},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

/// Every collaborator the daemon owns, independent of any one request.
#[derive(Clone)]
pub struct Collaborators {
    pub storage: Arc<dyn Storage>,
    pub adapters: Arc<AdapterRegistry>,
    pub executor: Arc<Executor>,
    pub config: GatewayConfig,
}

pub fn build_storage(config: &GatewayConfig) -> Arc<dyn Storage> {
    match config.storage_backend {
        StorageBackendKind::Memory => InMemoryStore::new(),
        StorageBackendKind::JsonFile => JsonFileStore::new(config.storage_dir.clone()),
    }
}

fn build_notifier(config: &GatewayConfig) -> Arc<dyn adcp_notify::Notifier> {
    match &config.slack_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone(), config.admin_ui_url.clone().unwrap_or_default())),
        None => Arc::new(NullNotifier),
    }
}

/// Assembles the full collaborator set from process configuration.
pub fn build_collaborators(config: GatewayConfig) -> Collaborators {
    let storage = build_storage(&config);
    let catalog = Arc::new(DatabaseCatalog::new(storage.clone()));
    let context = Arc::new(ContextManager::new(storage.clone()));
    let adapters = Arc::new(AdapterRegistry::new());
    let audit = Arc::new(StorageAuditSink::new(storage.clone()));
    let notifier = build_notifier(&config);

    let executor = Arc::new(Executor::new(storage.clone(), catalog, context, adapters.clone(), audit, notifier));

    Collaborators { storage, adapters, executor, config }
}

/// Seeds a `"default"` tenant backed by the in-memory Mock adapter if none
/// exists yet, so the daemon is immediately usable without an operator
/// having provisioned a tenant first.
pub async fn ensure_default_tenant(storage: &dyn Storage) -> Result<(), AdcpError> {
    if storage.get_tenant("default").await?.is_some() {
        return Ok(());
    }
    storage
        .upsert_tenant(Tenant {
            tenant_id: "default".to_string(),
            name: "Default".to_string(),
            subdomain: "default".to_string(),
            virtual_host: None,
            is_active: true,
            settings: TenantSettings {
                ad_server: "mock".to_string(),
                max_daily_budget: None,
                auto_approve_formats: Vec::new(),
                human_review_required: false,
                authorized_emails: Vec::new(),
                authorized_domains: Vec::new(),
                webhook_urls: Vec::new(),
                policy_settings: PolicySettings::default(),
                admin_token: String::new(),
                adapter_config: BTreeMap::new(),
            },
        })
        .await
}

fn field(map: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn required_field(map: &BTreeMap<String, Value>, key: &str, ad_server: &str) -> Result<String, AdcpError> {
    field(map, key).ok_or_else(|| AdcpError::new(ErrorCode::Validation, format!("{ad_server} adapter requires adapter_config.{key}")))
}

/// Constructs the ad-server adapter for a tenant from its `ad_server` kind
/// and free-form `adapter_config` (distilled §6.6), grounded on each
/// adapter crate's `*AdapterConfig` shape.
pub fn build_adapter(tenant: &Tenant) -> Result<Arc<dyn AdServerAdapter>, AdcpError> {
    let cfg = &tenant.settings.adapter_config;
    match tenant.settings.ad_server.as_str() {
        "mock" => Ok(Arc::new(MockAdapter)),
        "gam" => {
            let auth = GamAuthConfig {
                refresh_token: field(cfg, "refresh_token"),
                client_id: field(cfg, "client_id"),
                client_secret: field(cfg, "client_secret"),
                service_account_key_file: field(cfg, "service_account_key_file"),
            };
            let config = GamAdapterConfig { advertiser_id: required_field(cfg, "advertiser_id", "gam")?, trafficker_id: required_field(cfg, "trafficker_id", "gam")?, auth };
            Ok(Arc::new(GamAdapter::new(config)?))
        }
        "kevel" => {
            let config = KevelAdapterConfig { network_id: required_field(cfg, "network_id", "kevel")?, api_key: required_field(cfg, "api_key", "kevel")? };
            Ok(Arc::new(KevelAdapter::new(config)?))
        }
        "triton" => {
            let config = TritonAdapterConfig { station_group_id: required_field(cfg, "station_group_id", "triton")?, api_token: required_field(cfg, "api_token", "triton")? };
            Ok(Arc::new(TritonAdapter::new(config)?))
        }
        other => Err(AdcpError::new(ErrorCode::Validation, format!("unknown ad_server '{other}' for tenant '{}'", tenant.tenant_id))),
    }
}

/// Lazily constructs and registers a tenant's adapter on first sight,
/// mirroring distilled §5's "adapter clients: one per (tenant, ad_server),
/// re-initialized on auth failure" policy without requiring every tenant
/// to be known up front.
async fn ensure_adapter(collaborators: &Collaborators, tenant_id: &str) -> Result<(), AdcpError> {
    if collaborators.adapters.get(tenant_id).await.is_some() {
        return Ok(());
    }
    let Some(tenant) = collaborators.storage.get_tenant(tenant_id).await? else {
        return Ok(());
    };
    let adapter = build_adapter(&tenant)?;
    collaborators.adapters.register(tenant_id, adapter).await;
    Ok(())
}

/// Warms the adapter registry for the request's tenant before it reaches
/// either protocol facade. Resolution failures here are not fatal — an
/// unknown or misconfigured tenant is still rejected downstream by each
/// facade's own `auth::resolve` call, with a proper `AdcpError`.
async fn adapter_bootstrap_middleware(State(collaborators): State<Arc<Collaborators>>, headers: HeaderMap, req: Request, next: Next) -> Response {
    let tenant_id = headers.get("x-adcp-tenant").and_then(|v| v.to_str().ok()).filter(|t| !t.is_empty()).unwrap_or("default").to_string();

    if let Err(e) = ensure_adapter(&collaborators, &tenant_id).await {
        tracing::warn!(tenant_id = %tenant_id, error = %e, "adapter warm-up failed; deferring to facade auth");
    }

    next.run(req).await
}

struct AdminError(StatusCode, String);

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "message": self.1 }))).into_response()
    }
}

/// The one-time super-admin API key bootstrap endpoint (distilled §6.7):
/// the first call mints a `sk-…` key and persists it as the default
/// tenant's admin token; subsequent calls return the same key unchanged —
/// rotation is an explicit operator action, never implicit here.
async fn admin_bootstrap(State(collaborators): State<Arc<Collaborators>>) -> Result<Json<Value>, AdminError> {
    if !collaborators.config.enable_super_admin_bootstrap {
        return Err(AdminError(StatusCode::NOT_FOUND, "super-admin bootstrap is disabled".to_string()));
    }

    let mut tenant = collaborators
        .storage
        .get_tenant("default")
        .await
        .map_err(|e| AdminError(StatusCode::INTERNAL_SERVER_ERROR, e.message().to_string()))?
        .ok_or_else(|| AdminError(StatusCode::INTERNAL_SERVER_ERROR, "default tenant not provisioned".to_string()))?;

    if !tenant.settings.admin_token.is_empty() {
        return Ok(Json(json!({ "api_key": tenant.settings.admin_token, "created": false })));
    }

    let api_key = format!("sk-{}", Uuid::new_v4().simple());
    tenant.settings.admin_token = api_key.clone();
    collaborators.storage.upsert_tenant(tenant).await.map_err(|e| AdminError(StatusCode::INTERNAL_SERVER_ERROR, e.message().to_string()))?;

    Ok(Json(json!({ "api_key": api_key, "created": true })))
}

/// Builds the daemon's full router: the MCP and A2A facades, the admin
/// bootstrap endpoint, and the middleware stack (CORS, rate limiting,
/// request id, request logging, adapter warm-up).
pub fn build_app(collaborators: Arc<Collaborators>, base_url: String) -> Router {
    let mcp_state = Arc::new(adcp_mcp::AppState { executor: collaborators.executor.clone() });
    let a2a_state = Arc::new(adcp_a2a::AppState { executor: collaborators.executor.clone(), base_url });

    let rate_limiter = middleware::RateLimiter::new(collaborators.config.rate_limit_per_minute, Duration::from_secs(60));
    let cors = middleware::cors_layer(&collaborators.config.cors_allowed_origins);

    let admin_router: Router<()> = Router::new().route("/admin/bootstrap", post(admin_bootstrap)).with_state(collaborators.clone());

    Router::new()
        .merge(adcp_mcp::build_app(mcp_state))
        .merge(adcp_a2a::build_app(a2a_state))
        .merge(admin_router)
        .layer(from_fn(middleware::RequestLogger::layer))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(rate_limiter.into_layer())
        .layer(cors)
        .layer(axum::middleware::from_fn_with_state(collaborators.clone(), adapter_bootstrap_middleware))
}
