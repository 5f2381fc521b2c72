//! MCP tool-call facade (C10): one HTTP route per Task Executor operation,
//! named after the operation's skill id (distilled §6.4). Grounded on
//! `crates/abp-daemon::api.rs` / `crates/abp-daemon::build_app`'s
//! router-wiring and `ApiError` style — this crate holds no business logic
//! of its own, it only extracts the principal from request headers,
//! deserializes the tool's typed request, calls into `adcp-executor`, and
//! renders the typed response (DESIGN.md open-question #4: no MCP SDK
//! dependency is introduced — the tool surface is plain axum JSON routes,
//! matching the teacher's own daemon style).

use std::sync::Arc;

use adcp_core::principal::{PrincipalContext, Protocol};
use adcp_core::result::TaskResult;
use adcp_core::tenant::TenantContext;
use adcp_error::{AdcpError, ErrorCode};
use adcp_executor::requests::{
    ContextClearParams, CreateHumanTaskParams, CreateMediaBuyParams, CreativeIdParams, GetProductsParams, GetSignalsParams, MediaBuyIdParams,
    MessageListParams, MessageSendParams, SubmitCreativesParams, UpdateMediaBuyParams, VerifyTaskParams,
};
use adcp_executor::requests::{AgentMessage, MessagePart};
use adcp_executor::Executor;
use adcp_storage::Storage;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<Executor>,
}

/// The MCP-facing structured error. Mirrors `abp-daemon::ApiError`'s
/// `{code, message, details}` shape.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip)]
    pub status: StatusCode,
}

impl From<AdcpError> for ApiError {
    fn from(e: AdcpError) -> Self {
        let status = status_for_code(e.code());
        ApiError { code: e.code().as_str().to_string(), message: e.message().to_string(), details: None, status }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(json!({ "code": self.code, "message": self.message, "details": self.details }))).into_response()
    }
}

fn status_for_code(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotAuthenticated => StatusCode::UNAUTHORIZED,
        ErrorCode::TenantInactive => StatusCode::UNAUTHORIZED,
        ErrorCode::Unauthorized => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::PolicyRejected => StatusCode::FORBIDDEN,
        ErrorCode::TargetingUnsupported => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::BudgetBelowDelivery => StatusCode::CONFLICT,
        ErrorCode::UnsupportedAction => StatusCode::BAD_REQUEST,
        ErrorCode::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        ErrorCode::SyncAlreadyInProgress => StatusCode::CONFLICT,
        ErrorCode::Upstream => StatusCode::BAD_GATEWAY,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Extracts the caller's bearer token / tenant hint / host from the
/// headers every tool call carries (distilled §6.1) and resolves them
/// into a `(TenantContext, PrincipalContext)` via the registry (C2).
async fn authenticate(storage: &dyn Storage, headers: &HeaderMap) -> Result<(TenantContext, PrincipalContext), ApiError> {
    let token = headers.get("x-adcp-auth").and_then(|v| v.to_str().ok());
    let tenant_hint = headers.get("x-adcp-tenant").and_then(|v| v.to_str().ok());
    let host = headers.get("host").and_then(|v| v.to_str().ok());
    adcp_executor::auth::resolve(storage, token, tenant_hint, host, Protocol::Mcp).await.map_err(ApiError::from)
}

/// Tool descriptor surfaced by `GET /tools`, mirroring the skill ids in
/// distilled §6.4.
#[derive(Debug, Serialize)]
struct ToolDescriptor {
    name: &'static str,
    description: &'static str,
}

const TOOLS: &[ToolDescriptor] = &[
    ToolDescriptor { name: "get_products", description: "Discover sellable inventory products, optionally filtered by brief/countries/formats." },
    ToolDescriptor { name: "get_signals", description: "List available audience/contextual/geographic signals." },
    ToolDescriptor { name: "create_media_buy", description: "Book a campaign against one or more products." },
    ToolDescriptor { name: "submit_creatives", description: "Submit creative assets for a media buy." },
    ToolDescriptor { name: "get_media_buy_status", description: "Read a media buy's persisted status." },
    ToolDescriptor { name: "update_media_buy", description: "Update a media buy's schedule, targeting, or invoke a lifecycle action." },
    ToolDescriptor { name: "get_creative_status", description: "Read a creative's persisted status." },
    ToolDescriptor { name: "get_media_buy_delivery", description: "Read delivery metrics for a media buy." },
    ToolDescriptor { name: "get_targeting_capabilities", description: "Describe which targeting dimensions are supported." },
    ToolDescriptor { name: "create_human_task", description: "Create a task requiring human review." },
    ToolDescriptor { name: "verify_task", description: "Check whether a task has been completed." },
    ToolDescriptor { name: "message/send", description: "Send a conversational message and receive an agent reply." },
    ToolDescriptor { name: "message/list", description: "List a conversation's message history." },
    ToolDescriptor { name: "context/clear", description: "Reset a conversation's message history." },
];

async fn list_tools() -> impl IntoResponse {
    Json(TOOLS)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContextIdBody {
    context_id: Option<String>,
}

fn agent_message_json(msg: AgentMessage) -> serde_json::Value {
    let parts: Vec<serde_json::Value> = msg
        .parts
        .into_iter()
        .map(|p| match p {
            MessagePart::Text(text) => json!({ "kind": "text", "text": text }),
            MessagePart::Data(data) => json!({ "kind": "data", "data": data }),
        })
        .collect();
    json!({
        "kind": "message",
        "messageId": msg.message_id,
        "role": "agent",
        "contextId": msg.context_id,
        "parts": parts,
        "timestamp": msg.timestamp,
    })
}

macro_rules! tool_handler {
    ($name:ident, $params:ty, $method:ident) => {
        async fn $name(State(state): State<Arc<AppState>>, headers: HeaderMap, Json(params): Json<$params>) -> Result<Json<TaskResult>, ApiError> {
            let (tenant, principal) = authenticate(state.executor.storage.as_ref(), &headers).await?;
            let result = state.executor.$method(&tenant, &principal, params).await?;
            Ok(Json(result))
        }
    };
}

tool_handler!(tool_get_products, GetProductsParams, get_products);
tool_handler!(tool_create_media_buy, CreateMediaBuyParams, create_media_buy);
tool_handler!(tool_submit_creatives, SubmitCreativesParams, submit_creatives);
tool_handler!(tool_get_media_buy_status, MediaBuyIdParams, get_media_buy_status);
tool_handler!(tool_update_media_buy, UpdateMediaBuyParams, update_media_buy);
tool_handler!(tool_get_creative_status, CreativeIdParams, get_creative_status);
tool_handler!(tool_get_media_buy_delivery, MediaBuyIdParams, get_media_buy_delivery);
tool_handler!(tool_create_human_task, CreateHumanTaskParams, create_human_task);
tool_handler!(tool_verify_task, VerifyTaskParams, verify_task);

async fn tool_get_signals(State(state): State<Arc<AppState>>, headers: HeaderMap, Json(params): Json<GetSignalsParams>) -> Result<Json<TaskResult>, ApiError> {
    let (tenant, principal) = authenticate(state.executor.storage.as_ref(), &headers).await?;
    let result = state.executor.get_signals(&tenant, &principal, params).await?;
    Ok(Json(result))
}

async fn tool_get_targeting_capabilities(State(state): State<Arc<AppState>>, headers: HeaderMap, Json(body): Json<ContextIdBody>) -> Result<Json<TaskResult>, ApiError> {
    let (tenant, principal) = authenticate(state.executor.storage.as_ref(), &headers).await?;
    let result = state.executor.get_targeting_capabilities(&tenant, &principal, body.context_id.as_deref()).await?;
    Ok(Json(result))
}

async fn tool_message_send(State(state): State<Arc<AppState>>, headers: HeaderMap, Json(params): Json<MessageSendParams>) -> Result<Json<serde_json::Value>, ApiError> {
    let (tenant, principal) = authenticate(state.executor.storage.as_ref(), &headers).await?;
    let reply = state.executor.message_send(&tenant, &principal, params).await?;
    Ok(Json(agent_message_json(reply)))
}

async fn tool_message_list(State(state): State<Arc<AppState>>, headers: HeaderMap, Json(params): Json<MessageListParams>) -> Result<Json<TaskResult>, ApiError> {
    let (tenant, principal) = authenticate(state.executor.storage.as_ref(), &headers).await?;
    let result = state.executor.message_list(&tenant, &principal, params).await?;
    Ok(Json(result))
}

async fn tool_context_clear(State(state): State<Arc<AppState>>, headers: HeaderMap, Json(params): Json<ContextClearParams>) -> Result<Json<TaskResult>, ApiError> {
    let (tenant, principal) = authenticate(state.executor.storage.as_ref(), &headers).await?;
    let result = state.executor.context_clear(&tenant, &principal, params).await?;
    Ok(Json(result))
}

/// Builds the MCP tool-call router. Every route is named after its skill
/// id (distilled §6.4) so the set matches the A2A facade's agent-card
/// skill list exactly.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tools", get(list_tools))
        .route("/tools/get_products", post(tool_get_products))
        .route("/tools/get_signals", post(tool_get_signals))
        .route("/tools/create_media_buy", post(tool_create_media_buy))
        .route("/tools/submit_creatives", post(tool_submit_creatives))
        .route("/tools/get_media_buy_status", post(tool_get_media_buy_status))
        .route("/tools/update_media_buy", post(tool_update_media_buy))
        .route("/tools/get_creative_status", post(tool_get_creative_status))
        .route("/tools/get_media_buy_delivery", post(tool_get_media_buy_delivery))
        .route("/tools/get_targeting_capabilities", post(tool_get_targeting_capabilities))
        .route("/tools/create_human_task", post(tool_create_human_task))
        .route("/tools/verify_task", post(tool_verify_task))
        .route("/tools/message/send", post(tool_message_send))
        .route("/tools/message/list", post(tool_message_list))
        .route("/tools/context/clear", post(tool_context_clear))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcp_adapter_core::AdapterRegistry;
    use adcp_adapter_mock::MockAdapter;
    use adcp_catalog::DatabaseCatalog;
    use adcp_context::ContextManager;
    use adcp_core::principal::Principal;
    use adcp_core::tenant::{PolicySettings, Tenant, TenantSettings};
    use adcp_notify::{NullNotifier, StorageAuditSink};
    use adcp_storage::InMemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use std::collections::BTreeMap;
    use tower::ServiceExt;

    async fn seed() -> Arc<AppState> {
        let store = InMemoryStore::new();
        store
            .upsert_tenant(Tenant {
                tenant_id: "default".into(),
                name: "Default".into(),
                subdomain: "default".into(),
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
            .await
            .unwrap();
        store
            .upsert_principal(Principal {
                tenant_id: "default".into(),
                principal_id: "buyer_1".into(),
                name: "Buyer One".into(),
                access_token: "tok".into(),
                platform_mappings: BTreeMap::new(),
                is_admin: false,
            })
            .await
            .unwrap();

        let adapters = Arc::new(AdapterRegistry::new());
        adapters.register("default", Arc::new(MockAdapter)).await;

        let executor = Arc::new(Executor::new(
            store.clone(),
            Arc::new(DatabaseCatalog::new(store.clone())),
            Arc::new(ContextManager::new(store.clone())),
            adapters,
            Arc::new(StorageAuditSink::new(store.clone())),
            Arc::new(NullNotifier),
        ));
        Arc::new(AppState { executor })
    }

    #[tokio::test]
    async fn missing_auth_header_is_rejected() {
        let state = seed().await;
        let app = build_app(state);
        let req = Request::builder().method("POST").uri("/tools/get_products").header("content-type", "application/json").body(Body::from("{}")).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_products_succeeds_with_valid_token() {
        let state = seed().await;
        let app = build_app(state);
        let req = Request::builder()
            .method("POST")
            .uri("/tools/get_products")
            .header("content-type", "application/json")
            .header("x-adcp-auth", "tok")
            .body(Body::from("{}"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn list_tools_matches_declared_skill_count() {
        let state = seed().await;
        let app = build_app(state);
        let req = Request::builder().method("GET").uri("/tools").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let tools: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(tools.len(), 14);
    }
}
