use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::product::DeliveryType;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DeliveryMetrics {
    #[serde(default)]
    pub spend: f64,
    #[serde(default)]
    pub impressions_delivered: u64,
}

/// A line-item within a media buy, bound to exactly one product.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Package {
    pub tenant_id: String,
    pub media_buy_id: String,
    pub package_id: String,
    pub product_id: String,
    pub impressions: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
    pub delivery_type: DeliveryType,
    pub format_ids: Vec<String>,
    pub budget: f64,
    #[serde(default)]
    pub delivery_metrics: DeliveryMetrics,
    /// Adapter-side line-item id, once created upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter_line_item_id: Option<String>,
}

impl Package {
    /// Invariant 4 (SPEC_FULL §8): after a budget update the new budget must
    /// never be below delivered spend.
    pub fn can_set_budget(&self, new_budget: f64) -> bool {
        new_budget >= self.delivery_metrics.spend
    }
}
