//! Creative classification, validation, placeholder matching, creative
//! construction, and line-item association. Grounded on
//! `original_source/src/adapters/gam/managers/creatives.py`
//! (`_create_hosted_asset_creative`, `_associate_creative_with_line_items`);
//! classification and placeholder matching are delegated to `adcp-creative`
//! (Design Note 3, §9) — this module only adds the GAM `xsi_type` payload
//! shape on top.

use std::collections::BTreeMap;

use adcp_core::creative::Creative;
use adcp_creative::{classify, match_placeholder, Placeholder, CreativeKind};
use adcp_error::{AdcpError, ErrorCode};
use serde_json::{json, Value};

/// Builds the upstream GAM creative payload for a classified creative.
/// Image creatives require an http(s) click-through URL (never inline
/// binary); video creatives require a non-null `duration`, converted from
/// seconds to milliseconds for the wire.
pub fn build_gam_creative(creative: &Creative, advertiser_id: &str) -> Result<Value, AdcpError> {
    let kind = classify(creative);
    match kind {
        CreativeKind::Vast => Ok(json!({ "xsi_type": "VastRedirectCreative", "handledAtLineItemLevel": true })),
        CreativeKind::ThirdPartyTag => Ok(json!({
            "xsi_type": "ThirdPartyCreative",
            "advertiserId": advertiser_id,
            "name": creative.name,
            "snippet": creative.snippet.clone().unwrap_or_default(),
        })),
        CreativeKind::Native => Ok(json!({
            "xsi_type": "TemplateCreative",
            "advertiserId": advertiser_id,
            "name": creative.name,
            "creativeTemplateVariableValues": creative.template_variables.clone().unwrap_or_default(),
        })),
        CreativeKind::Html5 => Ok(json!({
            "xsi_type": "Html5Creative",
            "advertiserId": advertiser_id,
            "name": creative.name,
            "htmlAsset": creative.media_url.clone().or_else(|| creative.media_data.clone()),
        })),
        CreativeKind::HostedImage => build_hosted_image(creative, advertiser_id),
        CreativeKind::HostedVideo => build_hosted_video(creative, advertiser_id),
    }
}

fn build_hosted_image(creative: &Creative, advertiser_id: &str) -> Result<Value, AdcpError> {
    let (width, height) = creative.size().unwrap_or((300, 250));
    let url = creative
        .media_url
        .as_deref()
        .ok_or_else(|| AdcpError::new(ErrorCode::Validation, format!("creative {} has no media_url for an image asset", creative.creative_id)))?;

    let click_url = creative.click_through_url().ok_or_else(|| {
        AdcpError::new(
            ErrorCode::Validation,
            format!("Image creative {} missing required click_url. GAM ImageRedirectCreative requires a destination URL.", creative.creative_id),
        )
    })?;

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AdcpError::new(
            ErrorCode::Validation,
            format!("Image creative {} has invalid URL: {url}. GAM ImageRedirectCreative requires an HTTP(S) URL, not binary data.", creative.creative_id),
        ));
    }

    Ok(json!({
        "xsi_type": "ImageRedirectCreative",
        "name": creative.name,
        "advertiserId": advertiser_id,
        "size": { "width": width, "height": height },
        "imageUrl": url,
        "destinationUrl": click_url,
    }))
}

fn build_hosted_video(creative: &Creative, advertiser_id: &str) -> Result<Value, AdcpError> {
    let (width, height) = creative.size().unwrap_or((300, 250));
    let url = creative
        .media_url
        .as_deref()
        .ok_or_else(|| AdcpError::new(ErrorCode::Validation, format!("creative {} has no media_url for a video asset", creative.creative_id)))?;
    let duration = creative
        .duration
        .ok_or_else(|| AdcpError::new(ErrorCode::Validation, format!("Video creative {} missing required duration field", creative.creative_id)))?;
    let click_url = creative.click_through_url().unwrap_or(url);

    Ok(json!({
        "xsi_type": "VideoRedirectCreative",
        "name": creative.name,
        "advertiserId": advertiser_id,
        "size": { "width": width, "height": height },
        "videoSourceUrl": url,
        "destinationUrl": click_url,
        "duration": (duration * 1000.0) as i64,
    }))
}

/// Validates `creative`'s `(width, height)` against the placeholders
/// available across its assigned packages. Returns `Ok(())` or a
/// `Validation` error listing the sizes that were available.
pub fn validate_against_placeholders(creative: &Creative, placeholders_by_key: &BTreeMap<String, Vec<Placeholder>>) -> Result<(), AdcpError> {
    let Some(size) = creative.size() else {
        return Err(AdcpError::new(ErrorCode::Validation, format!("creative {} is missing width/height", creative.creative_id)));
    };

    if creative.package_assignments.is_empty() {
        return Ok(());
    }

    if match_placeholder(size, &creative.package_assignments, placeholders_by_key) {
        return Ok(());
    }

    let available = adcp_creative::available_sizes(&creative.package_assignments, placeholders_by_key);
    Err(AdcpError::new(
        ErrorCode::Validation,
        format!(
            "creative {} size {}x{} does not match any placeholder for its assigned packages (available: {available:?})",
            creative.creative_id, size.0, size.1
        ),
    ))
}

/// Line-item name suffix association rule: a line item is associated with
/// a creative's product if its name ends with `" - {product_id}"`.
pub fn associated_line_items<'a>(line_item_names: &'a [String], product_id: &str) -> Vec<&'a str> {
    let suffix = format!(" - {product_id}");
    line_item_names.iter().filter(|name| name.ends_with(&suffix)).map(|s| s.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcp_core::creative::CreativeStatus;

    fn creative(media_url: &str, click_url: Option<&str>, duration: Option<f64>) -> Creative {
        Creative {
            creative_id: "cr_1".into(),
            tenant_id: "acme".into(),
            principal_id: "buyer_1".into(),
            name: "banner".into(),
            format: "display_300x250".into(),
            snippet: None,
            snippet_type: None,
            template_variables: None,
            media_url: Some(media_url.into()),
            media_data: None,
            click_url: click_url.map(str::to_string),
            landing_url: None,
            clickthrough_url: None,
            duration,
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
    fn hosted_image_requires_click_url() {
        let c = creative("https://cdn.example.com/banner.png", None, None);
        let err = build_gam_creative(&c, "adv_1").unwrap_err();
        assert!(err.message().contains("missing required click_url"));
    }

    #[test]
    fn hosted_image_rejects_non_http_url() {
        let mut c = creative("data:image/png;base64,AAAA", Some("https://example.com"), None);
        c.media_url = Some("data:image/png;base64,AAAA".into());
        let err = build_gam_creative(&c, "adv_1").unwrap_err();
        assert!(err.message().contains("invalid URL"));
    }

    #[test]
    fn hosted_image_builds_with_click_url() {
        let c = creative("https://cdn.example.com/banner.png", Some("https://advertiser.example.com"), None);
        let payload = build_gam_creative(&c, "adv_1").unwrap();
        assert_eq!(payload["xsi_type"], "ImageRedirectCreative");
        assert_eq!(payload["destinationUrl"], "https://advertiser.example.com");
    }

    #[test]
    fn hosted_video_requires_duration() {
        let c = creative("https://cdn.example.com/ad.mp4", Some("https://advertiser.example.com"), None);
        let err = build_gam_creative(&c, "adv_1").unwrap_err();
        assert!(err.message().contains("missing required duration"));
    }

    #[test]
    fn hosted_video_converts_seconds_to_milliseconds() {
        let c = creative("https://cdn.example.com/ad.mp4", Some("https://advertiser.example.com"), Some(15.0));
        let payload = build_gam_creative(&c, "adv_1").unwrap();
        assert_eq!(payload["duration"], 15000);
    }

    #[test]
    fn line_item_suffix_association_matches_product_id() {
        let names = vec!["Acme Campaign - prod_123".to_string(), "Other Line Item".to_string()];
        let matched = associated_line_items(&names, "prod_123");
        assert_eq!(matched, vec!["Acme Campaign - prod_123"]);
    }
}
