//! Input/output DTOs for the Task Executor's operations. Distinct from the
//! adapter-facing types in `adcp_adapter_core` — these are the
//! client-facing request shapes the protocol facades (`adcp-mcp`,
//! `adcp-a2a`) deserialize a skill call's params into.

use std::collections::BTreeMap;

use adcp_targeting::Targeting;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetProductsParams {
    pub brief: Option<String>,
    pub promoted_offering: Option<String>,
    pub countries: Option<Vec<String>>,
    pub formats: Option<Vec<String>>,
    pub targeting_features: Option<Vec<String>>,
    pub context_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetSignalsParams {
    pub query: Option<String>,
    #[serde(rename = "type")]
    pub signal_type: Option<crate::products::SignalType>,
    pub context_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRequest {
    pub product_id: String,
    #[serde(default)]
    pub package_id: Option<String>,
    #[serde(default)]
    pub impressions: Option<u64>,
    #[serde(default)]
    pub cpm: Option<f64>,
    pub budget: f64,
    #[serde(default)]
    pub targeting: Targeting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMediaBuyParams {
    pub order_name: String,
    #[serde(default)]
    pub advertiser_name: String,
    pub promoted_offering: String,
    pub packages: Vec<PackageRequest>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub context_id: Option<String>,
}

/// A buyer-submitted creative, one field per [`adcp_core::creative::Creative`]
/// field the caller may populate; server-assigned identity/status fields
/// are filled in by the executor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreativeSubmission {
    pub creative_id: Option<String>,
    pub name: String,
    pub format: String,
    pub snippet: Option<String>,
    pub snippet_type: Option<String>,
    pub template_variables: Option<BTreeMap<String, Value>>,
    pub media_url: Option<String>,
    pub media_data: Option<String>,
    pub click_url: Option<String>,
    pub landing_url: Option<String>,
    pub clickthrough_url: Option<String>,
    pub duration: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub package_assignments: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitCreativesParams {
    pub media_buy_id: String,
    pub creatives: Vec<CreativeSubmission>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub context_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaBuyIdParams {
    pub media_buy_id: String,
    #[serde(default)]
    pub context_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreativeIdParams {
    pub creative_id: String,
    #[serde(default)]
    pub context_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMediaBuyParams {
    pub media_buy_id: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub package_id: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub targeting_overlay: Option<Targeting>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub context_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateHumanTaskParams {
    pub task_type: String,
    pub media_buy_id: Option<String>,
    pub details: BTreeMap<String, Value>,
    pub context_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyTaskParams {
    pub task_id: String,
    #[serde(default)]
    pub context_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessageSendParams {
    pub content: String,
    pub context_id: Option<String>,
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageListParams {
    pub context_id: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextClearParams {
    pub context_id: String,
}

/// One part of an [`AgentMessage`]. A reply may carry both a human-readable
/// text part and a structured data part (e.g. matching products), per the
/// A2A message/send contract.
#[derive(Debug, Clone)]
pub enum MessagePart {
    Text(String),
    Data(Value),
}

/// `message/send`'s return value: a Message, never a Task, per distilled
/// §4.5. Carries its own `parts` rather than reusing `TaskResult` because an
/// agent reply is not a business-operation outcome.
#[derive(Debug, Clone)]
pub struct AgentMessage {
    pub message_id: String,
    pub context_id: String,
    pub parts: Vec<MessagePart>,
    pub timestamp: DateTime<Utc>,
}
