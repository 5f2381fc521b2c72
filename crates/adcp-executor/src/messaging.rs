//! `message/send`, `message/list`, `context/clear` (C5/C9). `message/send`
//! is deliberately not routed through the uniform `TaskResult` contract —
//! distilled §4.5 is explicit that a conversational reply is a Message, not
//! a Task — so it logs its own context messages instead of using
//! [`Executor::begin`]/[`Executor::finish`].

use adcp_catalog::ProductFilters;
use adcp_core::context::MessageRole;
use adcp_core::principal::PrincipalContext;
use adcp_core::result::TaskResult;
use adcp_core::tenant::TenantContext;
use adcp_core::AuditRecord;
use adcp_error::AdcpError;
use chrono::Utc;
use uuid::Uuid;

use crate::requests::{AgentMessage, ContextClearParams, MessageListParams, MessagePart, MessageSendParams};
use crate::Executor;

const INVENTORY_KEYWORDS: [&str; 6] = ["product", "inventory", "sport", "video", "display", "audio"];
const CAMPAIGN_KEYWORDS: [&str; 4] = ["campaign", "media buy", "book", "create"];
const STATUS_KEYWORDS: [&str; 4] = ["status", "delivery", "spend", "performance"];

fn matches_any(content: &str, keywords: &[&str]) -> bool {
    let lower = content.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

impl Executor {
    pub async fn message_send(&self, tenant: &TenantContext, principal: &PrincipalContext, params: MessageSendParams) -> Result<AgentMessage, AdcpError> {
        let tenant_id = tenant.tenant_id();
        let principal_id = &principal.principal.principal_id;

        let ctx = self.context.get_or_create(tenant_id, principal_id, principal.protocol, params.context_id.as_deref()).await?;
        self.context.append_message(tenant_id, &ctx.context_id, MessageRole::User, params.content.clone()).await;

        let mut parts = Vec::new();
        if matches_any(&params.content, &INVENTORY_KEYWORDS) {
            let filters = ProductFilters { brief: Some(params.content.clone()), countries: None, formats: None, targeting_features: None, promoted_offering: None };
            let products = self.catalog.get_products(tenant_id, principal_id, &filters).await?;
            parts.push(MessagePart::Text(format!("Found {} matching product(s).", products.len())));
            parts.push(MessagePart::Data(serde_json::to_value(&products).unwrap_or_default()));
        } else if matches_any(&params.content, &CAMPAIGN_KEYWORDS) {
            parts.push(MessagePart::Text(
                "To create a media buy I need: the product id(s), a total budget, and a flight start/end date. \
                 Let me know those and I can set it up."
                    .to_string(),
            ));
        } else if matches_any(&params.content, &STATUS_KEYWORDS) {
            parts.push(MessagePart::Text("Which media buy would you like status or delivery details for? Please share its media_buy_id.".to_string()));
        } else {
            parts.push(MessagePart::Text(
                "I can help you discover ad inventory, create and manage media buys, and report on delivery. \
                 Ask me about products, a campaign you'd like to run, or the status of an existing media buy."
                    .to_string(),
            ));
        }

        let reply_text = parts
            .iter()
            .filter_map(|p| match p {
                MessagePart::Text(t) => Some(t.clone()),
                MessagePart::Data(_) => None,
            })
            .collect::<Vec<_>>()
            .join(" ");
        self.context.append_message(tenant_id, &ctx.context_id, MessageRole::Agent, reply_text).await;

        let record = AuditRecord {
            timestamp: Utc::now(),
            tenant_id: tenant_id.to_string(),
            principal_id: principal_id.to_string(),
            operation: "message_send".to_string(),
            success: true,
            details: Default::default(),
            error: None,
        };
        if let Err(e) = self.audit.record(record).await {
            tracing::warn!(%tenant_id, error = %e, "failed to persist audit record");
        }

        Ok(AgentMessage { message_id: format!("msg_{}", Uuid::new_v4().simple()), context_id: ctx.context_id, parts, timestamp: Utc::now() })
    }

    /// Deliberately does not log through [`Executor::begin`]/[`Executor::finish`]:
    /// reading the conversation log is not itself a conversational turn, and
    /// doing so would make every `message/list` call grow the very history
    /// it just read.
    pub async fn message_list(&self, tenant: &TenantContext, _principal: &PrincipalContext, params: MessageListParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id();
        let messages = self.context.list_messages(tenant_id, &params.context_id, params.limit, params.offset).await?;
        Ok(TaskResult::completed(format!("{} message(s)", messages.len())).with_data("context_id", params.context_id).with_data("history", messages))
    }

    pub async fn context_clear(&self, tenant: &TenantContext, _principal: &PrincipalContext, params: ContextClearParams) -> Result<TaskResult, AdcpError> {
        let tenant_id = tenant.tenant_id();
        self.context.clear(tenant_id, &params.context_id).await?;
        Ok(TaskResult::completed("Context cleared").with_data("context_id", params.context_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcp_adapter_core::AdapterRegistry;
    use adcp_catalog::DatabaseCatalog;
    use adcp_context::ContextManager;
    use adcp_core::principal::{Principal, Protocol};
    use adcp_core::product::{DeliveryType, PriceGuidance};
    use adcp_core::tenant::{PolicySettings, Tenant, TenantSettings};
    use adcp_core::Product;
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
    async fn inventory_keyword_returns_products_data_part_not_an_echo() {
        let store = InMemoryStore::new();
        store
            .upsert_product(Product {
                tenant_id: "acme".into(),
                product_id: "prod_1".into(),
                name: "Sports Video".into(),
                description: String::new(),
                formats: vec!["video_15s".into()],
                targeting_template: serde_json::Value::Null,
                delivery_type: DeliveryType::NonGuaranteed,
                is_fixed_price: true,
                cpm: Some(10.0),
                price_guidance: None::<PriceGuidance>,
                implementation_config: BTreeMap::new(),
                countries: vec![],
            })
            .await
            .unwrap();

        let exec = executor(store);
        let params = MessageSendParams { content: "do you have any sports video inventory?".into(), context_id: None, metadata: BTreeMap::new() };
        let reply = exec.message_send(&tenant_ctx(), &principal_ctx(), params).await.unwrap();

        assert!(reply.parts.iter().any(|p| matches!(p, MessagePart::Data(_))));
        assert!(reply.parts.iter().any(|p| match p {
            MessagePart::Text(t) => !t.contains("sports video inventory"),
            _ => true,
        }));
    }

    #[tokio::test]
    async fn campaign_keyword_returns_guidance_text() {
        let store = InMemoryStore::new();
        let exec = executor(store);
        let params = MessageSendParams { content: "I want to create a campaign".into(), context_id: None, metadata: BTreeMap::new() };
        let reply = exec.message_send(&tenant_ctx(), &principal_ctx(), params).await.unwrap();
        assert!(reply.parts.iter().any(|p| matches!(p, MessagePart::Text(t) if t.contains("budget"))));
    }

    #[tokio::test]
    async fn message_list_and_context_clear_round_trip() {
        let store = InMemoryStore::new();
        let exec = executor(store);
        let reply = exec
            .message_send(&tenant_ctx(), &principal_ctx(), MessageSendParams { content: "hello".into(), context_id: None, metadata: BTreeMap::new() })
            .await
            .unwrap();

        let listed = exec
            .message_list(&tenant_ctx(), &principal_ctx(), MessageListParams { context_id: reply.context_id.clone(), limit: 50, offset: 0 })
            .await
            .unwrap();
        assert!(listed.data["history"].as_array().unwrap().len() >= 2);

        exec.context_clear(&tenant_ctx(), &principal_ctx(), ContextClearParams { context_id: reply.context_id.clone() }).await.unwrap();
        let after_clear = exec
            .message_list(&tenant_ctx(), &principal_ctx(), MessageListParams { context_id: reply.context_id, limit: 50, offset: 0 })
            .await
            .unwrap();
        assert!(after_clear.data["history"].as_array().unwrap().is_empty());
    }
}
