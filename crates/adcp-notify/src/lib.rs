//! Notification and audit sink traits (C9). Grounded on
//! `crates/abp-telemetry/src/lib.rs`'s structured event-emission style for
//! the trait shape, and `original_source/slack_notifier.py`'s webhook
//! payload/fire-and-forget semantics for [`WebhookNotifier`]. Audit log
//! persistence is a thin wrapper over `adcp-storage`.

use std::sync::Arc;

use adcp_core::audit::AuditRecord;
use adcp_error::AdcpError;
use adcp_storage::Storage;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

/// An approval-worthy event worth surfacing to a human.
#[derive(Debug, Clone)]
pub struct TaskNotice {
    pub tenant_name: String,
    pub task_id: String,
    pub task_type: String,
    pub principal_name: String,
    pub media_buy_id: Option<String>,
    pub details: Vec<(String, Value)>,
}

/// Outbound notification channel. Implementations must never let a
/// delivery failure propagate to the caller — notifications are always
/// best-effort, mirroring `slack_notifier.py`'s `send_message` returning
/// `bool` rather than raising.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_new_task(&self, notice: &TaskNotice) -> bool;
    async fn notify_task_completed(&self, task_id: &str, task_type: &str, success: bool, error_message: Option<&str>) -> bool;
}

/// A notifier that does nothing. Used when no webhook is configured.
#[derive(Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify_new_task(&self, _notice: &TaskNotice) -> bool {
        false
    }

    async fn notify_task_completed(&self, _task_id: &str, _task_type: &str, _success: bool, _error_message: Option<&str>) -> bool {
        false
    }
}

/// Fire-and-forget Slack-style incoming-webhook notifier.
pub struct WebhookNotifier {
    webhook_url: String,
    admin_ui_url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(webhook_url: impl Into<String>, admin_ui_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            admin_ui_url: admin_ui_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn send(&self, text: &str, blocks: Value) -> bool {
        let payload = json!({ "text": text, "blocks": blocks });
        match self.client.post(&self.webhook_url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::error!(status = %resp.status(), "webhook notification rejected");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to send webhook notification");
                false
            }
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_new_task(&self, notice: &TaskNotice) -> bool {
        let fallback_text = format!(
            "New task {} ({}) from {} requires approval",
            notice.task_id, notice.task_type, notice.principal_name
        );

        let mut blocks = vec![
            json!({"type": "header", "text": {"type": "plain_text", "text": "New task requires approval"}}),
            json!({"type": "section", "fields": [
                {"type": "mrkdwn", "text": format!("*Task ID:*\n`{}`", notice.task_id)},
                {"type": "mrkdwn", "text": format!("*Type:*\n{}", notice.task_type)},
                {"type": "mrkdwn", "text": format!("*Principal:*\n{}", notice.principal_name)},
                {"type": "mrkdwn", "text": format!("*Tenant:*\n{}", notice.tenant_name)},
            ]}),
        ];

        if let Some(media_buy_id) = &notice.media_buy_id {
            blocks.push(json!({"type": "section", "text": {"type": "mrkdwn", "text": format!("*Media Buy:* `{media_buy_id}`")}}));
        }

        if !notice.details.is_empty() {
            let detail_text = notice
                .details
                .iter()
                .map(|(k, v)| format!("*{k}:* {v}"))
                .collect::<Vec<_>>()
                .join("\n");
            blocks.push(json!({"type": "section", "text": {"type": "mrkdwn", "text": format!("*Details:*\n{detail_text}")}}));
        }

        blocks.push(json!({
            "type": "actions",
            "elements": [{"type": "button", "text": {"type": "plain_text", "text": "View in Admin UI"}, "url": format!("{}/operations", self.admin_ui_url), "style": "primary"}],
        }));
        blocks.push(json!({"type": "context", "elements": [{"type": "mrkdwn", "text": format!("Created at {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))}]}));

        self.send(&fallback_text, Value::Array(blocks)).await
    }

    async fn notify_task_completed(&self, task_id: &str, task_type: &str, success: bool, error_message: Option<&str>) -> bool {
        let status = if success { "Completed" } else { "Failed" };
        let mut text = format!("Task {task_id} ({task_type}) {status}");
        if let Some(err) = error_message {
            text.push_str(&format!(": {err}"));
        }
        self.send(&text, json!([{"type": "section", "text": {"type": "mrkdwn", "text": text}}])).await
    }
}

/// Append-only audit trail, backed by [`Storage`].
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: AuditRecord) -> Result<(), AdcpError>;
}

pub struct StorageAuditSink {
    storage: Arc<dyn Storage>,
}

impl StorageAuditSink {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl AuditSink for StorageAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), AdcpError> {
        self.storage.append_audit(record).await
    }
}
