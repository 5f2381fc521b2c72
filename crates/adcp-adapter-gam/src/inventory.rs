//! Inventory discovery & sync surface (distilled §4.8). A deterministic
//! reference implementation: this crate never speaks the real GAM SOAP
//! protocol (Non-goal, distilled §1), so discovery returns a small
//! fixture-backed ad-unit graph rather than a live network call. Sync-job
//! bookkeeping (the `running`/`completed`/`failed` state machine, the
//! one-job-per-`(tenant, sync_type)` guard) lives in `adcp-storage`'s
//! `SyncJob`; this module only produces the summary counts a sync run
//! would report.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdUnit {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    pub id: String,
    pub name: String,
    pub ad_unit_ids: Vec<String>,
}

/// Reference fixture: a two-level ad unit tree under the given parent (or
/// the network root when `parent` is `None`), bounded by `max_depth`.
pub fn discover_ad_units(parent: Option<&str>, max_depth: u32) -> Vec<AdUnit> {
    let root = parent.unwrap_or("network_root").to_string();
    let mut units = vec![AdUnit { id: format!("{root}_display"), name: "Display".into(), parent_id: Some(root.clone()) }];
    if max_depth > 1 {
        units.push(AdUnit { id: format!("{root}_display_leaderboard"), name: "Leaderboard".into(), parent_id: Some(format!("{root}_display")) });
    }
    units
}

pub fn discover_placements() -> Vec<Placement> {
    vec![Placement { id: "placement_homepage".into(), name: "Homepage".into(), ad_unit_ids: vec!["network_root_display".into()] }]
}

pub fn discover_custom_targeting() -> Value {
    serde_json::json!({ "keys": ["aee_signal"], "values": { "aee_signal": ["enabled", "disabled"] } })
}

pub fn discover_audience_segments() -> Value {
    serde_json::json!([])
}

/// Nests a flat [`AdUnit`] list into a parent/children tree, keyed by id.
pub fn build_ad_unit_tree(units: &[AdUnit]) -> Value {
    let mut by_id: std::collections::BTreeMap<String, Value> = units
        .iter()
        .map(|u| (u.id.clone(), serde_json::json!({ "id": u.id, "name": u.name, "children": [] })))
        .collect();

    let mut roots = Vec::new();
    for unit in units {
        let node = by_id.get(&unit.id).cloned().unwrap();
        match &unit.parent_id {
            Some(parent_id) if by_id.contains_key(parent_id) => {
                if let Some(parent) = by_id.get_mut(parent_id) {
                    parent["children"].as_array_mut().unwrap().push(node);
                }
            }
            _ => roots.push(node),
        }
    }
    Value::Array(roots)
}

/// Picks ad units whose name loosely matches the requested sizes/keywords.
/// A reference heuristic, not a real GAM compatible-size lookup.
pub fn suggest_ad_units_for_product(units: &[AdUnit], sizes: &[(u32, u32)], keywords: Option<&[String]>) -> Vec<String> {
    units
        .iter()
        .filter(|u| {
            let name_matches_keyword = keywords.map(|kws| kws.iter().any(|k| u.name.to_lowercase().contains(&k.to_lowercase()))).unwrap_or(true);
            name_matches_keyword && !sizes.is_empty()
        })
        .map(|u| u.id.clone())
        .collect()
}

/// A reference `sync_*` summary: deterministic counts derived from the
/// reference fixture rather than a live inventory pull.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncSummary {
    pub ad_units: u64,
    pub custom_targeting_keys: u64,
    pub custom_targeting_values: u64,
    pub orders: u64,
}

pub fn sync_summary() -> SyncSummary {
    let units = discover_ad_units(None, 2);
    let custom = discover_custom_targeting();
    SyncSummary {
        ad_units: units.len() as u64,
        custom_targeting_keys: custom["keys"].as_array().map(|a| a.len() as u64).unwrap_or(0),
        custom_targeting_values: custom["values"].as_object().map(|o| o.values().filter_map(|v| v.as_array()).map(|a| a.len() as u64).sum()).unwrap_or(0),
        orders: 0,
    }
}
