//! Policy engine (C3): classifies a promoted-offering string against a
//! tenant's configured prohibited lists. Grounded on `abp-policy`'s
//! `Decision::allow`/`deny` shape and `IncludeExcludeGlobs` glob matching,
//! adapted from path-matching to tactic-string matching.

use adcp_core::tenant::PolicySettings;
use globset::{Glob, GlobSetBuilder};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Allowed,
    ReviewRequired,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Decision {
    pub status: PolicyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Decision {
    pub fn allowed() -> Self {
        Self {
            status: PolicyStatus::Allowed,
            details: None,
        }
    }

    pub fn review_required(details: impl Into<String>) -> Self {
        Self {
            status: PolicyStatus::ReviewRequired,
            details: Some(details.into()),
        }
    }

    pub fn rejected(details: impl Into<String>) -> Self {
        Self {
            status: PolicyStatus::Rejected,
            details: Some(details.into()),
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.status == PolicyStatus::Rejected
    }
}

/// Stateless evaluator over a tenant's [`PolicySettings`]. Rules are
/// tenant-configured, so this engine is constructed fresh per check rather
/// than cached — the settings it reads are cheap to clone.
#[derive(Debug, Default)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn new() -> Self {
        Self
    }

    /// `check` (C3): case-insensitive substring match for advertisers and
    /// categories; glob pattern match for tactics. The first prohibited
    /// match found is fatal (`REJECTED`); no match is `ALLOWED`. Unlike
    /// `prohibited_*` lists, `REVIEW_REQUIRED` is never produced by
    /// substring/pattern matching alone — it is reserved for tenant policy
    /// rules that require a human look (see Open Question decisions in
    /// DESIGN.md for how the executor additionally routes
    /// `human_review_required` tenants into review independent of this
    /// check).
    pub fn check(&self, promoted_offering_text: &str, settings: &PolicySettings) -> Decision {
        let haystack = promoted_offering_text.to_lowercase();

        for advertiser in &settings.prohibited_advertisers {
            if !advertiser.is_empty() && haystack.contains(&advertiser.to_lowercase()) {
                return Decision::rejected(format!(
                    "promoted offering matches prohibited advertiser '{advertiser}'"
                ));
            }
        }

        for category in &settings.prohibited_categories {
            if !category.is_empty() && haystack.contains(&category.to_lowercase()) {
                return Decision::rejected(format!(
                    "promoted offering matches prohibited category '{category}'"
                ));
            }
        }

        for tactic_pattern in &settings.prohibited_tactics {
            if tactic_pattern.is_empty() {
                continue;
            }
            match Glob::new(&tactic_pattern.to_lowercase()) {
                Ok(glob) => {
                    let mut builder = GlobSetBuilder::new();
                    builder.add(glob);
                    if let Ok(set) = builder.build() {
                        if set.is_match(&haystack) {
                            return Decision::rejected(format!(
                                "promoted offering matches prohibited tactic pattern '{tactic_pattern}'"
                            ));
                        }
                    }
                }
                Err(_) => {
                    if haystack.contains(&tactic_pattern.to_lowercase()) {
                        return Decision::rejected(format!(
                            "promoted offering matches prohibited tactic '{tactic_pattern}'"
                        ));
                    }
                }
            }
        }

        Decision::allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(advertisers: &[&str], categories: &[&str], tactics: &[&str]) -> PolicySettings {
        PolicySettings {
            prohibited_advertisers: advertisers.iter().map(|s| s.to_string()).collect(),
            prohibited_categories: categories.iter().map(|s| s.to_string()).collect(),
            prohibited_tactics: tactics.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn allows_clean_offering() {
        let engine = PolicyEngine::new();
        let decision = engine.check("premium running shoes", &PolicySettings::default());
        assert_eq!(decision.status, PolicyStatus::Allowed);
    }

    #[test]
    fn rejects_case_insensitive_advertiser_substring_match() {
        let engine = PolicyEngine::new();
        let settings = settings(&["BadCorp"], &[], &[]);
        let decision = engine.check("a campaign for badcorp industries", &settings);
        assert!(decision.is_rejected());
    }

    #[test]
    fn rejects_category_substring_match() {
        let engine = PolicyEngine::new();
        let settings = settings(&[], &["gambling"], &[]);
        let decision = engine.check("online gambling promotions", &settings);
        assert!(decision.is_rejected());
    }

    #[test]
    fn rejects_tactic_glob_pattern_match() {
        let engine = PolicyEngine::new();
        let settings = settings(&[], &[], &["*clickbait*"]);
        let decision = engine.check("ultimate clickbait offer", &settings);
        assert!(decision.is_rejected());
    }

    #[test]
    fn unmatched_tactic_pattern_allows() {
        let engine = PolicyEngine::new();
        let settings = settings(&[], &[], &["*clickbait*"]);
        let decision = engine.check("quality sports gear", &settings);
        assert_eq!(decision.status, PolicyStatus::Allowed);
    }
}
