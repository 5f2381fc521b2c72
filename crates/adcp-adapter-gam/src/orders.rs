//! Order create/status/archive/advertisers/lifecycle actions. Grounded on
//! `original_source/src/adapters/gam/managers/orders.py`
//! (`create_order`/`archive_order`/`check_order_has_guaranteed_items`/
//! `get_advertisers`), translated from a stateful GAM SOAP client wrapper
//! into pure, deterministic reference logic — this crate never speaks the
//! real GAM wire protocol (Non-goal, distilled §1).

use std::collections::HashSet;

use adcp_adapter_core::Advertiser;
use once_cell::sync::Lazy;
use uuid::Uuid;

/// {STANDARD, SPONSORSHIP}. Disjoint from the non-guaranteed set
/// {NETWORK, HOUSE, PRICE_PRIORITY, BULK}; membership decides whether
/// auto-activation is permitted.
pub static GUARANTEED_LINE_ITEM_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| HashSet::from(["STANDARD", "SPONSORSHIP"]));

pub fn is_guaranteed_line_item_type(line_item_type: &str) -> bool {
    GUARANTEED_LINE_ITEM_TYPES.contains(line_item_type)
}

/// Returns `(has_guaranteed_items, guaranteed_types)` for a line item type
/// list, mirroring `check_order_has_guaranteed_items`.
pub fn check_order_has_guaranteed_items(line_item_types: &[String]) -> (bool, Vec<String>) {
    let guaranteed: Vec<String> = line_item_types.iter().filter(|t| is_guaranteed_line_item_type(t)).cloned().collect();
    (!guaranteed.is_empty(), guaranteed)
}

fn hex8() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

pub fn order_id(dry_run: bool) -> String {
    if dry_run {
        format!("dry_run_order_{}", hex8())
    } else {
        format!("gam_order_{}", hex8())
    }
}

/// Reference `get_advertisers`: GAM's real implementation sorts the
/// company list by name; the dry-run fixture returns two deterministic
/// entries.
pub fn get_advertisers(dry_run: bool) -> Vec<Advertiser> {
    if dry_run {
        return vec![
            Advertiser { id: "123456789".into(), name: "Test Advertiser 1".into(), kind: "ADVERTISER".into() },
            Advertiser { id: "987654321".into(), name: "Test Advertiser 2".into(), kind: "ADVERTISER".into() },
        ];
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guaranteed_types_are_recognized() {
        let (has_guaranteed, types) = check_order_has_guaranteed_items(&["STANDARD".into(), "NETWORK".into()]);
        assert!(has_guaranteed);
        assert_eq!(types, vec!["STANDARD".to_string()]);
    }

    #[test]
    fn non_guaranteed_order_has_no_guaranteed_items() {
        let (has_guaranteed, types) = check_order_has_guaranteed_items(&["NETWORK".into(), "BULK".into()]);
        assert!(!has_guaranteed);
        assert!(types.is_empty());
    }

    #[test]
    fn dry_run_order_ids_are_prefixed() {
        assert!(order_id(true).starts_with("dry_run_order_"));
        assert!(order_id(false).starts_with("gam_order_"));
    }
}
