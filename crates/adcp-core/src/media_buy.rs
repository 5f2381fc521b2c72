use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaBuyStatus {
    PendingApproval,
    PendingActivation,
    PendingConfirmation,
    Active,
    Paused,
    Completed,
    Failed,
    Archived,
}

impl MediaBuyStatus {
    /// Once a media buy is active or later, its `raw_request` is immutable
    /// (SPEC_FULL §3 invariant).
    pub fn is_immutable(&self) -> bool {
        !matches!(
            self,
            MediaBuyStatus::PendingApproval
                | MediaBuyStatus::PendingActivation
                | MediaBuyStatus::PendingConfirmation
        )
    }
}

/// A campaign booked by a principal.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MediaBuy {
    pub media_buy_id: String,
    pub tenant_id: String,
    pub principal_id: String,
    pub order_name: String,
    #[serde(default)]
    pub advertiser_name: String,
    pub budget: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: MediaBuyStatus,
    /// The original, normalized request, frozen at creation time.
    pub raw_request: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
