//! Shared targeting types (C6). The wire-facing overlay buyers attach to
//! `create_media_buy`/`update_media_buy`, and the `TargetingTranslator`
//! contract every adapter implements to turn it into an upstream targeting
//! payload. Adapter-specific translation (geo maps, unsupported-dimension
//! rules) lives with each adapter crate; this crate only fixes the shape
//! both sides agree on. Grounded on
//! `original_source/src/adapters/gam/managers/targeting.py`'s
//! `validate_targeting`/`build_targeting` signatures.

use std::collections::BTreeMap;

use adcp_error::AdcpError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Buyer-supplied targeting overlay. Every field is optional; an absent
/// list means "no constraint on this dimension".
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", default)]
pub struct Targeting {
    pub geo_country_any_of: Vec<String>,
    pub geo_country_none_of: Vec<String>,
    pub geo_region_any_of: Vec<String>,
    pub geo_region_none_of: Vec<String>,
    pub geo_metro_any_of: Vec<String>,
    pub geo_metro_none_of: Vec<String>,
    pub geo_city_any_of: Vec<String>,
    pub geo_city_none_of: Vec<String>,
    pub geo_zip_any_of: Vec<String>,
    pub geo_zip_none_of: Vec<String>,
    pub device_type_any_of: Vec<String>,
    pub os_any_of: Vec<String>,
    pub browser_any_of: Vec<String>,
    pub content_cat_any_of: Vec<String>,
    pub keywords_any_of: Vec<String>,
    pub media_type_any_of: Vec<String>,
    pub audiences_any_of: Vec<String>,
    pub signals: Vec<String>,
    pub key_value_pairs: BTreeMap<String, Value>,
    /// Per-adapter escape hatch, e.g. `{"gam": {"key_values": {...}}}`.
    pub custom: BTreeMap<String, Value>,
}

impl Targeting {
    pub fn is_empty(&self) -> bool {
        self.geo_country_any_of.is_empty()
            && self.geo_country_none_of.is_empty()
            && self.geo_region_any_of.is_empty()
            && self.geo_region_none_of.is_empty()
            && self.geo_metro_any_of.is_empty()
            && self.geo_metro_none_of.is_empty()
            && self.geo_city_any_of.is_empty()
            && self.geo_city_none_of.is_empty()
            && self.geo_zip_any_of.is_empty()
            && self.geo_zip_none_of.is_empty()
            && self.device_type_any_of.is_empty()
            && self.os_any_of.is_empty()
            && self.browser_any_of.is_empty()
            && self.content_cat_any_of.is_empty()
            && self.keywords_any_of.is_empty()
            && self.media_type_any_of.is_empty()
            && self.audiences_any_of.is_empty()
            && self.signals.is_empty()
            && self.key_value_pairs.is_empty()
            && self.custom.is_empty()
    }
}

/// Contract every ad-server adapter implements to translate a [`Targeting`]
/// overlay into its own wire format. `validate` is advisory (non-fatal
/// unsupported-feature descriptions); `build` is authoritative and fails
/// loudly (`ErrorCode::TargetingUnsupported`) the moment a requested
/// dimension cannot be fulfilled, per distilled §4.6's "no quiet failures"
/// rule.
pub trait TargetingTranslator: Send + Sync {
    /// Non-fatal: lists dimensions this adapter cannot honor without
    /// rejecting the whole overlay.
    fn validate(&self, targeting: &Targeting) -> Vec<String>;

    /// Fatal: produces the adapter's native targeting payload or fails with
    /// `ErrorCode::TargetingUnsupported` carrying the exact offending
    /// values.
    fn build(&self, targeting: &Targeting) -> Result<Value, AdcpError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targeting_is_empty() {
        assert!(Targeting::default().is_empty());
    }

    #[test]
    fn populated_field_is_not_empty() {
        let targeting = Targeting {
            geo_country_any_of: vec!["US".into()],
            ..Default::default()
        };
        assert!(!targeting.is_empty());
    }
}
