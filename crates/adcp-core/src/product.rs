use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    Guaranteed,
    NonGuaranteed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NonGuaranteedAutomation {
    Automatic,
    ConfirmationRequired,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PriceGuidance {
    pub floor: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

/// A sellable inventory package offered by a tenant.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Product {
    pub tenant_id: String,
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub formats: Vec<String>,
    #[serde(default)]
    pub targeting_template: Value,
    pub delivery_type: DeliveryType,
    pub is_fixed_price: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_guidance: Option<PriceGuidance>,
    /// Adapter-specific config: GAM ad-unit paths, `line_item_type`,
    /// `non_guaranteed_automation`, etc.
    #[serde(default)]
    pub implementation_config: BTreeMap<String, Value>,
    #[serde(default)]
    pub countries: Vec<String>,
}

impl Product {
    pub fn non_guaranteed_automation(&self) -> NonGuaranteedAutomation {
        match self
            .implementation_config
            .get("non_guaranteed_automation")
            .and_then(Value::as_str)
        {
            Some("automatic") => NonGuaranteedAutomation::Automatic,
            Some("confirmation_required") => NonGuaranteedAutomation::ConfirmationRequired,
            _ => NonGuaranteedAutomation::Manual,
        }
    }

    pub fn line_item_type(&self) -> Option<&str> {
        self.implementation_config
            .get("line_item_type")
            .and_then(Value::as_str)
    }
}
