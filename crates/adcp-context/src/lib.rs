//! Conversation context manager (C5). Persisted storage is the source of
//! truth; an in-memory write-through cache (keyed by `context_id`, short
//! TTL) absorbs best-effort message writes so `message/list` can see
//! messages the storage layer has not flushed yet. Grounded on
//! `abp-daemon`'s `AppState { receipts: Arc<RwLock<HashMap<..>>> }` cache
//! backed by persistent storage (SPEC_FULL Design Note: "Conversation
//! context"), generalized with a per-entry TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use adcp_core::context::{ContextRecord, Message, MessageRole};
use adcp_core::principal::Protocol;
use adcp_error::AdcpError;
use adcp_storage::Storage;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

struct CacheEntry {
    messages: Vec<Message>,
    expires_at: Instant,
}

/// Write-through cache over [`Storage`] for conversation contexts.
pub struct ContextManager {
    storage: Arc<dyn Storage>,
    cache: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ContextManager {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_ttl(storage, Duration::from_secs(300))
    }

    pub fn with_ttl(storage: Arc<dyn Storage>, ttl: Duration) -> Self {
        Self {
            storage,
            cache: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn cache_key(tenant_id: &str, context_id: &str) -> String {
        format!("{tenant_id}/{context_id}")
    }

    /// Resolves an existing context or lazily creates one for
    /// `(tenant_id, principal_id, protocol)`. Passing `None` for
    /// `context_id` always creates a fresh context.
    pub async fn get_or_create(
        &self,
        tenant_id: &str,
        principal_id: &str,
        protocol: Protocol,
        context_id: Option<&str>,
    ) -> Result<ContextRecord, AdcpError> {
        if let Some(id) = context_id {
            if let Some(existing) = self.storage.get_context(tenant_id, id).await? {
                return Ok(existing);
            }
            let created = ContextRecord::new(id.to_string(), tenant_id.to_string(), principal_id.to_string(), protocol);
            self.storage.upsert_context(created.clone()).await?;
            return Ok(created);
        }

        let new_id = format!("ctx_{}", Uuid::new_v4().simple());
        let created = ContextRecord::new(new_id, tenant_id.to_string(), principal_id.to_string(), protocol);
        self.storage.upsert_context(created.clone()).await?;
        Ok(created)
    }

    /// Appends a message to the persisted context and the write-through
    /// cache. Best-effort: a persistence failure is logged as a warning and
    /// does not propagate, per SPEC_FULL §4.5 step 3/5 and §5's ordering
    /// guarantee.
    pub async fn append_message(&self, tenant_id: &str, context_id: &str, role: MessageRole, content: impl Into<String>) -> Message {
        let message = Message {
            id: format!("msg_{}", Uuid::new_v4().simple()),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: Default::default(),
        };

        self.cache_push(tenant_id, context_id, message.clone()).await;

        match self.storage.get_context(tenant_id, context_id).await {
            Ok(Some(mut record)) => {
                record.messages.push(message.clone());
                if let Err(e) = self.storage.upsert_context(record).await {
                    tracing::warn!(%tenant_id, %context_id, error = %e, "failed to persist conversation message");
                }
            }
            Ok(None) => {
                tracing::warn!(%tenant_id, %context_id, "append_message called against unknown context");
            }
            Err(e) => {
                tracing::warn!(%tenant_id, %context_id, error = %e, "failed to load context for message append");
            }
        }

        message
    }

    async fn cache_push(&self, tenant_id: &str, context_id: &str, message: Message) {
        let key = Self::cache_key(tenant_id, context_id);
        let mut cache = self.cache.write().await;
        let entry = cache.entry(key).or_insert_with(|| CacheEntry {
            messages: Vec::new(),
            expires_at: Instant::now() + self.ttl,
        });
        entry.messages.push(message);
        entry.expires_at = Instant::now() + self.ttl;
    }

    /// Unions persisted messages with any cache entries the storage layer
    /// has not yet seen (matched by message id), then applies
    /// offset/limit pagination.
    pub async fn list_messages(&self, tenant_id: &str, context_id: &str, limit: usize, offset: usize) -> Result<Vec<Message>, AdcpError> {
        let mut messages = self
            .storage
            .get_context(tenant_id, context_id)
            .await?
            .map(|r| r.messages)
            .unwrap_or_default();

        let key = Self::cache_key(tenant_id, context_id);
        let cache = self.cache.read().await;
        if let Some(entry) = cache.get(&key) {
            if entry.expires_at > Instant::now() {
                let seen: std::collections::HashSet<&str> = messages.iter().map(|m| m.id.as_str()).collect();
                for cached in &entry.messages {
                    if !seen.contains(cached.id.as_str()) {
                        messages.push(cached.clone());
                    }
                }
            }
        }
        drop(cache);

        messages.sort_by_key(|m| m.timestamp);
        Ok(messages.into_iter().skip(offset).take(limit).collect())
    }

    /// `context/clear`: empty the message log, preserve the `context_id`.
    pub async fn clear(&self, tenant_id: &str, context_id: &str) -> Result<(), AdcpError> {
        if let Some(mut record) = self.storage.get_context(tenant_id, context_id).await? {
            record.clear();
            self.storage.upsert_context(record).await?;
        }
        let key = Self::cache_key(tenant_id, context_id);
        self.cache.write().await.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcp_storage::InMemoryStore;

    #[tokio::test]
    async fn message_send_persists_before_agent_reply_in_order() {
        let mgr = ContextManager::new(InMemoryStore::new());
        let ctx = mgr.get_or_create("acme", "buyer_1", Protocol::A2a, None).await.unwrap();

        mgr.append_message("acme", &ctx.context_id, MessageRole::User, "hello").await;
        mgr.append_message("acme", &ctx.context_id, MessageRole::Agent, "hi there").await;

        let messages = mgr.list_messages("acme", &ctx.context_id, 50, 0).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Agent);
    }

    #[tokio::test]
    async fn n_sends_produce_at_least_2n_messages() {
        let mgr = ContextManager::new(InMemoryStore::new());
        let ctx = mgr.get_or_create("acme", "buyer_1", Protocol::A2a, None).await.unwrap();
        for i in 0..5 {
            mgr.append_message("acme", &ctx.context_id, MessageRole::User, format!("msg {i}")).await;
            mgr.append_message("acme", &ctx.context_id, MessageRole::Agent, format!("reply {i}")).await;
        }
        let messages = mgr.list_messages("acme", &ctx.context_id, 100, 0).await.unwrap();
        assert!(messages.len() >= 10);
    }

    #[tokio::test]
    async fn clear_preserves_context_id_but_empties_messages() {
        let mgr = ContextManager::new(InMemoryStore::new());
        let ctx = mgr.get_or_create("acme", "buyer_1", Protocol::A2a, None).await.unwrap();
        mgr.append_message("acme", &ctx.context_id, MessageRole::User, "hello").await;
        mgr.clear("acme", &ctx.context_id).await.unwrap();

        let messages = mgr.list_messages("acme", &ctx.context_id, 50, 0).await.unwrap();
        assert!(messages.is_empty());

        let reloaded = mgr.get_or_create("acme", "buyer_1", Protocol::A2a, Some(&ctx.context_id)).await.unwrap();
        assert_eq!(reloaded.context_id, ctx.context_id);
    }
}
