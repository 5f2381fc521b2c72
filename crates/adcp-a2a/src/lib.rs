//! A2A JSON-RPC 2.0 facade (C10): a single `POST /rpc` dispatch endpoint
//! plus an Agent Card discovery surface, grounded on
//! `crates/abp-daemon::build_app`'s router-wiring style. Like `adcp-mcp`,
//! this crate holds no business logic — it authenticates the caller,
//! deserializes the method's params, calls into `adcp-executor`, and
//! renders the result as either a Message (`message/send`) or a Task
//! (every other method), per distilled §4.7/§6.2.

use std::collections::BTreeMap;
use std::sync::Arc;

use adcp_core::principal::{PrincipalContext, Protocol};
use adcp_core::result::{TaskResult, TaskResultStatus};
use adcp_core::tenant::TenantContext;
use adcp_error::AdcpError;
use adcp_executor::requests::{
    ContextClearParams, CreateHumanTaskParams, CreateMediaBuyParams, CreativeIdParams, GetProductsParams, GetSignalsParams, MediaBuyIdParams,
    MessageListParams, MessageSendParams, SubmitCreativesParams, UpdateMediaBuyParams, VerifyTaskParams,
};
use adcp_executor::requests::{AgentMessage, MessagePart};
use adcp_executor::Executor;
use adcp_storage::Storage;
use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<Executor>,
    /// The externally-visible root URL this facade is served under, used
    /// to populate the Agent Card's `url`/`rpcEndpoints` fields.
    pub base_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonRpcRequest {
    jsonrpc: Option<String>,
    method: Option<String>,
    params: Value,
    id: Value,
}

enum DispatchError {
    MethodNotFound,
    Adcp(AdcpError),
}

impl From<AdcpError> for DispatchError {
    fn from(e: AdcpError) -> Self {
        DispatchError::Adcp(e)
    }
}

fn invalid_params(e: serde_json::Error) -> DispatchError {
    DispatchError::Adcp(AdcpError::new(adcp_error::ErrorCode::Validation, format!("invalid params: {e}")))
}

const SKILLS: &[(&str, &str)] = &[
    ("get_products", "Discover sellable inventory products, optionally filtered by brief/countries/formats."),
    ("get_signals", "List available audience/contextual/geographic signals."),
    ("message/send", "Send a conversational message and receive an agent reply."),
    ("message/list", "List a conversation's message history."),
    ("context/clear", "Reset a conversation's message history."),
    ("create_media_buy", "Book a campaign against one or more products."),
    ("submit_creatives", "Submit creative assets for a media buy."),
    ("get_media_buy_status", "Read a media buy's persisted status."),
    ("update_media_buy", "Update a media buy's schedule, targeting, or invoke a lifecycle action."),
    ("get_creative_status", "Read a creative's persisted status."),
    ("get_media_buy_delivery", "Read delivery metrics for a media buy."),
    ("get_targeting_capabilities", "Describe which targeting dimensions are supported."),
    ("create_human_task", "Create a task requiring human review."),
    ("verify_task", "Check whether a task has been completed."),
];

fn agent_card(base_url: &str) -> Value {
    let rpc_url = format!("{}/rpc", base_url.trim_end_matches('/'));
    let skills: Vec<Value> = SKILLS.iter().map(|(id, description)| json!({ "id": id, "name": id, "description": description })).collect();
    json!({
        "name": "AdCP Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Multi-tenant ad-sales gateway exposing AdCP over MCP and A2A",
        "protocolVersion": "1.0",
        "url": rpc_url,
        "rpcEndpoints": [{ "url": rpc_url, "transport": "http", "methods": ["POST"] }],
        "capabilities": { "streaming": false, "pushNotifications": false },
        "skills": skills,
        "defaultInputModes": ["text"],
        "defaultOutputModes": ["text"],
        "securitySchemes": {
            "bearer": { "type": "http", "scheme": "bearer", "description": "x-adcp-auth bearer token" }
        },
        "security": [{ "bearer": [] }],
    })
}

async fn agent_card_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(agent_card(&state.base_url))
}

async fn authenticate(storage: &dyn Storage, headers: &HeaderMap) -> Result<(TenantContext, PrincipalContext), AdcpError> {
    let token = headers.get("x-adcp-auth").and_then(|v| v.to_str().ok());
    let tenant_hint = headers.get("x-adcp-tenant").and_then(|v| v.to_str().ok());
    let host = headers.get("host").and_then(|v| v.to_str().ok());
    adcp_executor::auth::resolve(storage, token, tenant_hint, host, Protocol::A2a).await
}

/// Renders a [`TaskResult`] as an A2A Task object (distilled §6.2): the
/// `status.error` field is present if and only if the result failed.
fn task_json(result: TaskResult) -> Value {
    let failed = matches!(result.status, TaskResultStatus::Failed);
    let mut status = json!({ "state": result.status, "message": result.message });
    if failed {
        status["error"] = json!(result.error);
    }
    json!({
        "kind": "task",
        "id": result.task_id.clone().unwrap_or_default(),
        "status": status,
        "artifact": result.data,
        "history": [],
    })
}

fn agent_message_json(msg: AgentMessage) -> Value {
    let parts: Vec<Value> = msg
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

/// Accepts the two `message/send` param shapes distilled §4.7 allows: a
/// flat `{content, context_id, metadata}` object, or an A2A-native
/// `{message:{parts:[...], contextId}}` envelope, from which the text of
/// the first `kind:"text"` part is extracted.
fn parse_message_send_params(params: &Value) -> MessageSendParams {
    if let Some(content) = params.get("content").and_then(Value::as_str) {
        let context_id = params.get("context_id").and_then(Value::as_str).map(String::from);
        let metadata: BTreeMap<String, Value> = params.get("metadata").and_then(Value::as_object).map(|m| m.clone().into_iter().collect()).unwrap_or_default();
        return MessageSendParams { content: content.to_string(), context_id, metadata };
    }

    if let Some(message) = params.get("message") {
        let context_id = message
            .get("contextId")
            .and_then(Value::as_str)
            .or_else(|| message.get("context_id").and_then(Value::as_str))
            .map(String::from);
        let text = message
            .get("parts")
            .and_then(Value::as_array)
            .and_then(|parts| parts.iter().find(|p| p.get("kind").and_then(Value::as_str) == Some("text")))
            .and_then(|p| p.get("text").and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();
        return MessageSendParams { content: text, context_id, metadata: BTreeMap::new() };
    }

    MessageSendParams::default()
}

async fn dispatch(executor: &Executor, tenant: &TenantContext, principal: &PrincipalContext, method: &str, params: Value) -> Result<Value, DispatchError> {
    // An absent `params` field deserializes to `Value::Null`; every params
    // struct here expects (at minimum) an empty object.
    let params = if params.is_null() { Value::Object(Default::default()) } else { params };
    match method {
        "get_products" => {
            let p: GetProductsParams = serde_json::from_value(params).map_err(invalid_params)?;
            Ok(task_json(executor.get_products(tenant, principal, p).await?))
        }
        "get_signals" => {
            let p: GetSignalsParams = serde_json::from_value(params).map_err(invalid_params)?;
            Ok(task_json(executor.get_signals(tenant, principal, p).await?))
        }
        "get_targeting_capabilities" => {
            let context_id = params.get("context_id").and_then(Value::as_str);
            Ok(task_json(executor.get_targeting_capabilities(tenant, principal, context_id).await?))
        }
        "create_media_buy" => {
            let p: CreateMediaBuyParams = serde_json::from_value(params).map_err(invalid_params)?;
            Ok(task_json(executor.create_media_buy(tenant, principal, p).await?))
        }
        "submit_creatives" => {
            let p: SubmitCreativesParams = serde_json::from_value(params).map_err(invalid_params)?;
            Ok(task_json(executor.submit_creatives(tenant, principal, p).await?))
        }
        "get_media_buy_status" => {
            let p: MediaBuyIdParams = serde_json::from_value(params).map_err(invalid_params)?;
            Ok(task_json(executor.get_media_buy_status(tenant, principal, p).await?))
        }
        "update_media_buy" => {
            let p: UpdateMediaBuyParams = serde_json::from_value(params).map_err(invalid_params)?;
            Ok(task_json(executor.update_media_buy(tenant, principal, p).await?))
        }
        "get_creative_status" => {
            let p: CreativeIdParams = serde_json::from_value(params).map_err(invalid_params)?;
            Ok(task_json(executor.get_creative_status(tenant, principal, p).await?))
        }
        "get_media_buy_delivery" => {
            let p: MediaBuyIdParams = serde_json::from_value(params).map_err(invalid_params)?;
            Ok(task_json(executor.get_media_buy_delivery(tenant, principal, p).await?))
        }
        "create_human_task" => {
            let p: CreateHumanTaskParams = serde_json::from_value(params).map_err(invalid_params)?;
            Ok(task_json(executor.create_human_task(tenant, principal, p).await?))
        }
        "verify_task" => {
            let p: VerifyTaskParams = serde_json::from_value(params).map_err(invalid_params)?;
            Ok(task_json(executor.verify_task(tenant, principal, p).await?))
        }
        "message/send" => {
            let p = parse_message_send_params(&params);
            Ok(agent_message_json(executor.message_send(tenant, principal, p).await?))
        }
        "message/list" => {
            let p: MessageListParams = serde_json::from_value(params).map_err(invalid_params)?;
            Ok(task_json(executor.message_list(tenant, principal, p).await?))
        }
        "context/clear" => {
            let p: ContextClearParams = serde_json::from_value(params).map_err(invalid_params)?;
            Ok(task_json(executor.context_clear(tenant, principal, p).await?))
        }
        _ => Err(DispatchError::MethodNotFound),
    }
}

fn rpc_ok(id: Value, result: Value) -> Json<Value> {
    Json(json!({ "jsonrpc": "2.0", "result": result, "id": id }))
}

fn rpc_err(id: Value, code: i32, message: impl Into<String>) -> Json<Value> {
    Json(json!({ "jsonrpc": "2.0", "error": { "code": code, "message": message.into() }, "id": id }))
}

/// The single JSON-RPC 2.0 dispatch entrypoint (distilled §6.2). Every
/// response, success or error, is HTTP 200 — the envelope's `error` field
/// is how JSON-RPC signals failure, not the HTTP status line.
async fn rpc(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Result<Json<JsonRpcRequest>, axum::extract::rejection::JsonRejection>) -> Json<Value> {
    let Ok(Json(req)) = body else {
        return rpc_err(Value::Null, -32600, "Invalid Request: malformed JSON-RPC envelope");
    };
    let id = req.id.clone();

    if req.jsonrpc.as_deref() != Some("2.0") {
        return rpc_err(id, -32600, "Invalid Request: jsonrpc must be \"2.0\"");
    }
    let Some(method) = req.method.clone() else {
        return rpc_err(id, -32600, "Invalid Request: missing method");
    };

    let (tenant, principal) = match authenticate(state.executor.storage.as_ref(), &headers).await {
        Ok(v) => v,
        Err(_) => return rpc_err(id, -32000, "Authentication required"),
    };

    match dispatch(&state.executor, &tenant, &principal, &method, req.params).await {
        Ok(result) => rpc_ok(id, result),
        Err(DispatchError::MethodNotFound) => rpc_err(id, -32603, format!("Method not found: {method}")),
        Err(DispatchError::Adcp(_)) => rpc_err(id, -32603, "Internal error"),
    }
}

/// Builds the A2A router: the Agent Card discovery surface at both
/// conventional paths, and the single RPC dispatch endpoint.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/.well-known/agent-card.json", get(agent_card_handler))
        .route("/", get(agent_card_handler))
        .route("/rpc", post(rpc))
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
        Arc::new(AppState { executor, base_url: "http://localhost:8088".into() })
    }

    async fn rpc_call(app: Router, body: Value) -> Value {
        let req = Request::builder().method("POST").uri("/rpc").header("content-type", "application/json").header("x-adcp-auth", "tok").body(Body::from(body.to_string())).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn agent_card_lists_every_declared_skill() {
        let state = seed().await;
        let app = build_app(state);
        let req = Request::builder().method("GET").uri("/.well-known/agent-card.json").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), axum::http::StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let card: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(card["skills"].as_array().unwrap().len(), 14);
        assert_eq!(card["url"], "http://localhost:8088/rpc");
    }

    #[tokio::test]
    async fn missing_jsonrpc_version_is_invalid_request() {
        let state = seed().await;
        let app = build_app(state);
        let resp = rpc_call(app, json!({ "method": "get_products", "params": {}, "id": 1 })).await;
        assert_eq!(resp["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn unknown_method_reports_method_not_found() {
        let state = seed().await;
        let app = build_app(state);
        let resp = rpc_call(app, json!({ "jsonrpc": "2.0", "method": "nope", "params": {}, "id": 1 })).await;
        assert_eq!(resp["error"]["code"], -32603);
        assert_eq!(resp["error"]["message"], "Method not found: nope");
    }

    #[tokio::test]
    async fn get_products_renders_a_task_object() {
        let state = seed().await;
        let app = build_app(state);
        let resp = rpc_call(app, json!({ "jsonrpc": "2.0", "method": "get_products", "params": {}, "id": 7 })).await;
        assert_eq!(resp["id"], 7);
        assert_eq!(resp["result"]["kind"], "task");
    }

    #[tokio::test]
    async fn message_send_accepts_nested_shape_and_renders_a_message() {
        let state = seed().await;
        let app = build_app(state);
        let resp = rpc_call(
            app,
            json!({
                "jsonrpc": "2.0",
                "method": "message/send",
                "params": { "message": { "parts": [{ "kind": "text", "text": "hello" }] } },
                "id": 1,
            }),
        )
        .await;
        assert_eq!(resp["result"]["kind"], "message");
    }

    #[tokio::test]
    async fn auth_missing_reports_auth_required() {
        let state = seed().await;
        let app = build_app(state);
        let req = Request::builder()
            .method("POST")
            .uri("/rpc")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "jsonrpc": "2.0", "method": "get_products", "params": {}, "id": 1 }).to_string()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["error"]["code"], -32000);
    }
}
