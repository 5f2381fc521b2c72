//! The Task Executor (C9): one method per AdCP operation, orchestrating
//! auth (via [`auth::resolve`]), policy, catalog, conversation context,
//! ad-server adapters, storage, and notifications behind the uniform
//! [`TaskResult`] contract. Grounded on `original_source/task_executor.py`
//! for operation shapes and ID prefixes; every method here is the single
//! place protocol facades (`adcp-mcp`, `adcp-a2a`) call into — neither
//! facade contains business logic of its own.

pub mod auth;
pub mod creatives;
pub mod media_buy;
pub mod messaging;
pub mod products;
pub mod requests;
pub mod tasks;

use std::sync::Arc;

use adcp_adapter_core::AdapterRegistry;
use adcp_catalog::Catalog;
use adcp_context::ContextManager;
use adcp_core::context::{ContextRecord, MessageRole};
use adcp_core::result::TaskResult;
use adcp_core::AuditRecord;
use adcp_core::principal::Protocol;
use adcp_error::AdcpError;
use adcp_notify::{AuditSink, Notifier};
use adcp_policy::PolicyEngine;
use adcp_storage::Storage;
use chrono::Utc;
use uuid::Uuid;

/// An 8-character lowercase hex suffix, used by every dry-run/mock id
/// convention across the workspace.
pub(crate) fn hex8() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// The Task Executor. One instance is shared across all inbound requests;
/// every method takes the caller's resolved tenant/principal explicitly
/// (Design Note 1) rather than reading it from shared state.
pub struct Executor {
    pub storage: Arc<dyn Storage>,
    pub policy: PolicyEngine,
    pub catalog: Arc<dyn Catalog>,
    pub context: Arc<ContextManager>,
    pub adapters: Arc<AdapterRegistry>,
    pub audit: Arc<dyn AuditSink>,
    pub notifier: Arc<dyn Notifier>,
}

impl Executor {
    pub fn new(
        storage: Arc<dyn Storage>,
        catalog: Arc<dyn Catalog>,
        context: Arc<ContextManager>,
        adapters: Arc<AdapterRegistry>,
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            storage,
            policy: PolicyEngine::new(),
            catalog,
            context,
            adapters,
            audit,
            notifier,
        }
    }

    /// Step 1 of every operation's uniform contract: resolve (or create)
    /// the conversation context and log the inbound request against it
    /// before any business logic runs.
    pub(crate) async fn begin(
        &self,
        tenant_id: &str,
        principal_id: &str,
        protocol: Protocol,
        context_id: Option<&str>,
        request_summary: impl Into<String>,
    ) -> Result<ContextRecord, AdcpError> {
        let ctx = self.context.get_or_create(tenant_id, principal_id, protocol, context_id).await?;
        self.context.append_message(tenant_id, &ctx.context_id, MessageRole::User, request_summary).await;
        Ok(ctx)
    }

    /// Last step of every operation's uniform contract: log the outbound
    /// reply, append the audit record, and attach `context_id` to the
    /// result so callers (and the protocol facades) can keep the
    /// conversation going. Runs regardless of success/failure — an
    /// operation's outcome is always recorded, never silently dropped.
    pub(crate) async fn finish(&self, tenant_id: &str, principal_id: &str, operation: &str, ctx: &ContextRecord, result: TaskResult) -> TaskResult {
        self.context.append_message(tenant_id, &ctx.context_id, MessageRole::Agent, result.message.clone()).await;

        let record = AuditRecord {
            timestamp: Utc::now(),
            tenant_id: tenant_id.to_string(),
            principal_id: principal_id.to_string(),
            operation: operation.to_string(),
            success: !result.is_failed(),
            details: result.data.clone(),
            error: result.error.clone(),
        };
        if let Err(e) = self.audit.record(record).await {
            tracing::warn!(%tenant_id, %operation, error = %e, "failed to persist audit record");
        }

        result.with_data("context_id", ctx.context_id.clone())
    }
}
