//! Creative classification and placeholder matching (C7). Pure functions —
//! no I/O, no adapter-specific payload construction. Grounded on
//! `original_source/src/adapters/gam/managers/creatives.py`'s
//! `_get_creative_type` cascade and
//! `_validate_creative_size_against_placeholders`, reworked per Design Note
//! 3 (§9): instead of an `isinstance`/string-sniffing cascade returning a
//! loosely-typed string, `classify` returns a tagged enum, the way
//! `abp-capability::SupportLevel` is a tagged enum rather than a class
//! hierarchy.

use std::collections::BTreeMap;

use adcp_core::creative::Creative;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Result of classifying a [`Creative`]. VAST is handled at the line-item
/// level by adapters, never submitted as a GAM creative object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CreativeKind {
    Vast,
    ThirdPartyTag,
    Native,
    Html5,
    HostedImage,
    HostedVideo,
}

const HTML5_EXTENSIONS: [&str; 4] = [".html", ".htm", ".html5", ".zip"];

fn looks_like_html5(media_url: &str, format: &str) -> bool {
    let lower_url = media_url.to_lowercase();
    let lower_format = format.to_lowercase();
    HTML5_EXTENSIONS.iter().any(|ext| lower_url.ends_with(ext))
        || lower_format.contains("html5")
        || lower_format.contains("rich_media")
}

fn is_html_snippet(content: &str) -> bool {
    let trimmed = content.trim_start().to_lowercase();
    ["<script", "<div", "<iframe", "<!doctype", "<html"]
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
}

/// Classifies a creative (first match wins), per distilled §4.7:
/// 1. `snippet_type ∈ {vast_xml, vast_url}` → VAST.
/// 2. `snippet_type` present (any other value) → third-party tag.
/// 3. `template_variables` present → native.
/// 4. `media_url`/`media_data` present → HTML5 (by extension/format) or a
///    hosted asset (image if no `duration`, video if `duration` is set).
/// 5. Legacy fallback: sniff `click_url` as an HTML snippet, VAST by
///    `.xml`/`vast` substring, else HTML5/hosted-asset by the same rule as
///    step 4.
pub fn classify(creative: &Creative) -> CreativeKind {
    if let (Some(_snippet), Some(snippet_type)) = (&creative.snippet, &creative.snippet_type) {
        return if matches!(snippet_type.as_str(), "vast_xml" | "vast_url") {
            CreativeKind::Vast
        } else {
            CreativeKind::ThirdPartyTag
        };
    }

    if creative.template_variables.is_some() {
        return CreativeKind::Native;
    }

    if creative.media_url.is_some() || creative.media_data.is_some() {
        let media_url = creative.media_url.as_deref().unwrap_or("");
        if looks_like_html5(media_url, &creative.format) {
            return CreativeKind::Html5;
        }
        return if creative.duration.is_some() {
            CreativeKind::HostedVideo
        } else {
            CreativeKind::HostedImage
        };
    }

    // Legacy fallback: sniff whatever click-through-style URL is present.
    let legacy_url = creative
        .click_url
        .as_deref()
        .or(creative.landing_url.as_deref())
        .or(creative.clickthrough_url.as_deref())
        .unwrap_or("");

    if is_html_snippet(legacy_url) {
        return CreativeKind::ThirdPartyTag;
    }
    if creative.format.to_lowercase().contains("native") {
        return CreativeKind::Native;
    }
    let lower_url = legacy_url.to_lowercase();
    if !legacy_url.is_empty() && (lower_url.contains(".xml") || lower_url.contains("vast")) {
        return CreativeKind::Vast;
    }
    if looks_like_html5(legacy_url, &creative.format) {
        return CreativeKind::Html5;
    }
    if creative.duration.is_some() {
        CreativeKind::HostedVideo
    } else {
        CreativeKind::HostedImage
    }
}

/// A single `creativePlaceholder` slot a package/line-item advertises.
#[derive(Debug, Clone, Copy)]
pub struct Placeholder {
    pub width: u32,
    pub height: u32,
}

impl Placeholder {
    /// A `1x1` placeholder is a wildcard: it accepts any creative size,
    /// used by GAM native templates and programmatic line items.
    pub fn is_wildcard(&self) -> bool {
        self.width == 1 && self.height == 1
    }

    pub fn matches(&self, size: (u32, u32)) -> bool {
        self.is_wildcard() || (self.width, self.height) == size
    }
}

/// Parses a product id out of a package id shaped like
/// `pkg_prod_XXXXXX_YYYYYYYY_N`, yielding `prod_XXXXXX`. Mirrors
/// `_validate_creative_size_against_placeholders`'s fallback lookup for
/// line-item naming conventions.
pub fn product_id_from_package_id(package_id: &str) -> Option<String> {
    if !package_id.starts_with("pkg_prod_") {
        return None;
    }
    let parts: Vec<&str> = package_id.split('_').collect();
    if parts.len() >= 3 {
        Some(format!("prod_{}", parts[2]))
    } else {
        None
    }
}

/// Resolves whether `size` matches an available placeholder for any of the
/// creative's assigned packages. Tries a direct lookup by package id first,
/// then falls back to the product id parsed out of the package id.
pub fn match_placeholder(
    size: (u32, u32),
    package_assignments: &[String],
    placeholders_by_key: &BTreeMap<String, Vec<Placeholder>>,
) -> bool {
    package_assignments.iter().any(|package_id| {
        let direct = placeholders_by_key.get(package_id);
        let resolved = direct.or_else(|| {
            product_id_from_package_id(package_id).and_then(|product_id| placeholders_by_key.get(&product_id))
        });
        resolved.is_some_and(|slots| slots.iter().any(|p| p.matches(size)))
    })
}

/// Per-`CreativeKind` field requirements, checked before placeholder
/// matching. Mirrors `_validate_creative_type_requirements`'s field
/// presence checks, generalized over the tagged `CreativeKind` instead of
/// re-deriving the type from scratch.
pub fn validate_type_requirements(creative: &Creative) -> Result<(), String> {
    match classify(creative) {
        CreativeKind::Vast => Ok(()),
        CreativeKind::ThirdPartyTag => {
            if creative.snippet.as_deref().unwrap_or("").trim().is_empty() {
                return Err("third-party tag creative requires a non-empty snippet".to_string());
            }
            Ok(())
        }
        CreativeKind::Native => {
            if creative.template_variables.as_ref().map_or(true, |v| v.is_empty()) {
                return Err("native creative requires non-empty template_variables".to_string());
            }
            Ok(())
        }
        CreativeKind::Html5 => {
            if creative.media_url.is_none() && creative.media_data.is_none() {
                return Err("HTML5 creative requires media_url or media_data".to_string());
            }
            Ok(())
        }
        CreativeKind::HostedImage => {
            let url = creative.media_url.as_deref().unwrap_or("");
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err("hosted image creative requires an http(s) media_url".to_string());
            }
            if creative.click_through_url().is_none() {
                return Err("hosted image creative requires a click-through URL".to_string());
            }
            Ok(())
        }
        CreativeKind::HostedVideo => {
            let url = creative.media_url.as_deref().unwrap_or("");
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err("hosted video creative requires an http(s) media_url".to_string());
            }
            if creative.duration.is_none() {
                return Err("hosted video creative requires a duration".to_string());
            }
            Ok(())
        }
    }
}

/// Sizes available across a creative's assigned packages, for building a
/// "no placeholder matches" error message.
pub fn available_sizes(
    package_assignments: &[String],
    placeholders_by_key: &BTreeMap<String, Vec<Placeholder>>,
) -> Vec<(u32, u32)> {
    let mut sizes = Vec::new();
    for package_id in package_assignments {
        let direct = placeholders_by_key.get(package_id);
        let resolved = direct.or_else(|| {
            product_id_from_package_id(package_id).and_then(|product_id| placeholders_by_key.get(&product_id))
        });
        if let Some(slots) = resolved {
            for p in slots {
                sizes.push((p.width, p.height));
            }
        }
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcp_core::creative::CreativeStatus;
    use std::collections::BTreeMap as Map;

    fn base_creative() -> Creative {
        Creative {
            creative_id: "cr_1".into(),
            tenant_id: "acme".into(),
            principal_id: "buyer_1".into(),
            name: "test".into(),
            format: "display_300x250".into(),
            snippet: None,
            snippet_type: None,
            template_variables: None,
            media_url: None,
            media_data: None,
            click_url: None,
            landing_url: None,
            clickthrough_url: None,
            duration: None,
            width: Some(300),
            height: Some(250),
            tracking_events: Default::default(),
            package_assignments: Vec::new(),
            status: CreativeStatus::PendingReview,
            adapter_creative_id: None,
            failure_reason: None,
        }
    }

    #[test]
    fn classifies_vast_snippet_type() {
        let mut c = base_creative();
        c.snippet = Some("<VAST></VAST>".into());
        c.snippet_type = Some("vast_xml".into());
        assert_eq!(classify(&c), CreativeKind::Vast);
    }

    #[test]
    fn classifies_third_party_tag() {
        let mut c = base_creative();
        c.snippet = Some("<script>...</script>".into());
        c.snippet_type = Some("javascript".into());
        assert_eq!(classify(&c), CreativeKind::ThirdPartyTag);
    }

    #[test]
    fn classifies_native_from_template_variables() {
        let mut c = base_creative();
        c.template_variables = Some(Map::new());
        assert_eq!(classify(&c), CreativeKind::Native);
    }

    #[test]
    fn classifies_html5_by_extension() {
        let mut c = base_creative();
        c.media_url = Some("https://cdn.example.com/banner.html5".into());
        assert_eq!(classify(&c), CreativeKind::Html5);
    }

    #[test]
    fn classifies_hosted_image_without_duration() {
        let mut c = base_creative();
        c.media_url = Some("https://cdn.example.com/banner.png".into());
        assert_eq!(classify(&c), CreativeKind::HostedImage);
    }

    #[test]
    fn classifies_hosted_video_with_duration() {
        let mut c = base_creative();
        c.media_url = Some("https://cdn.example.com/ad.mp4".into());
        c.duration = Some(15.0);
        assert_eq!(classify(&c), CreativeKind::HostedVideo);
    }

    #[test]
    fn wildcard_placeholder_matches_any_size() {
        let mut placeholders = Map::new();
        placeholders.insert("pkg_1".to_string(), vec![Placeholder { width: 1, height: 1 }]);
        assert!(match_placeholder((640, 480), &["pkg_1".to_string()], &placeholders));
    }

    #[test]
    fn falls_back_to_product_id_when_package_id_unknown() {
        let mut placeholders = Map::new();
        placeholders.insert("prod_2215c0".to_string(), vec![Placeholder { width: 300, height: 250 }]);
        let assignments = vec!["pkg_prod_2215c0_63e4864a_1".to_string()];
        assert!(match_placeholder((300, 250), &assignments, &placeholders));
    }

    #[test]
    fn no_match_when_size_absent_from_placeholders() {
        let mut placeholders = Map::new();
        placeholders.insert("pkg_1".to_string(), vec![Placeholder { width: 728, height: 90 }]);
        assert!(!match_placeholder((300, 250), &["pkg_1".to_string()], &placeholders));
    }

    #[test]
    fn product_id_parsing_requires_pkg_prod_prefix() {
        assert_eq!(product_id_from_package_id("pkg_prod_2215c038_63e4864a_1").as_deref(), Some("prod_2215c038"));
        assert_eq!(product_id_from_package_id("line_item_name"), None);
    }

    #[test]
    fn hosted_image_requires_http_url_and_click_through() {
        let mut c = base_creative();
        c.media_url = Some("https://cdn.example.com/banner.png".into());
        assert!(validate_type_requirements(&c).is_err());
        c.click_url = Some("https://advertiser.example.com".into());
        assert!(validate_type_requirements(&c).is_ok());
    }

    #[test]
    fn hosted_video_requires_duration() {
        let mut c = base_creative();
        c.media_url = Some("https://cdn.example.com/ad.mp4".into());
        assert!(validate_type_requirements(&c).is_err());
        c.duration = Some(15.0);
        assert!(validate_type_requirements(&c).is_ok());
    }

    #[test]
    fn third_party_tag_requires_snippet() {
        let mut c = base_creative();
        c.snippet = Some(String::new());
        c.snippet_type = Some("javascript".into());
        assert!(validate_type_requirements(&c).is_err());
        c.snippet = Some("<script>ok</script>".into());
        assert!(validate_type_requirements(&c).is_ok());
    }

    #[test]
    fn native_requires_nonempty_template_variables() {
        let mut c = base_creative();
        c.template_variables = Some(Map::new());
        assert!(validate_type_requirements(&c).is_err());
        let mut vars = Map::new();
        vars.insert("headline".to_string(), serde_json::json!("Buy now"));
        c.template_variables = Some(vars);
        assert!(validate_type_requirements(&c).is_ok());
    }
}
