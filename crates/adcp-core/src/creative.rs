use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CreativeStatus {
    PendingReview,
    Approved,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TrackingEvents {
    #[serde(default)]
    pub impression: Vec<String>,
    #[serde(default)]
    pub click: Vec<String>,
}

/// A buyer-submitted ad asset. Exactly one of `snippet`, `template_variables`,
/// or `media_url`/`media_data` is expected to be populated; which one governs
/// classification (see `adcp-creative::classify`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Creative {
    pub creative_id: String,
    pub tenant_id: String,
    pub principal_id: String,
    pub name: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_variables: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landing_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clickthrough_url: Option<String>,
    /// Required for video creatives, in seconds (converted to ms upstream).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default)]
    pub tracking_events: TrackingEvents,
    #[serde(default)]
    pub package_assignments: Vec<String>,
    pub status: CreativeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter_creative_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl Creative {
    /// Chain of click-through candidates, in the order the gateway tries them.
    pub fn click_through_url(&self) -> Option<&str> {
        self.click_url
            .as_deref()
            .or(self.landing_url.as_deref())
            .or(self.clickthrough_url.as_deref())
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        }
    }
}
