use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::vendor::Metadata;

// Host attribute names on the left, vendor metadata keys on the right.
static VENDOR_METADATA_KEYS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ad_content_advertiser", "a.media.ad.advertiser"),
        ("ad_content_campaign", "a.media.ad.campaign"),
        ("ad_content_creative", "a.media.ad.creative"),
        ("ad_content_placement", "a.media.ad.placement"),
        ("ad_content_site_id", "a.media.ad.site"),
        ("content_show", "a.media.show"),
        ("content_episode", "a.media.episode"),
        ("content_asset_id", "a.media.asset"),
        ("content_genre", "a.media.genre"),
        ("content_first_air_date", "a.media.airDate"),
        ("content_digital_date", "a.media.digitalDate"),
        ("content_rating", "a.media.rating"),
        ("content_originator", "a.media.originator"),
        ("content_network", "a.media.network"),
        ("content_show_type", "a.media.type"),
        ("content_mvpd", "a.media.pass.mvpd"),
        ("content_authorized", "a.media.pass.auth"),
        ("content_daypart", "a.media.dayPart"),
        ("content_feed", "a.media.feed"),
    ])
});

/// Vendor key for a host attribute name. Unknown names pass through unchanged.
pub fn vendor_key(key: &str) -> &str {
    VENDOR_METADATA_KEYS.get(key).copied().unwrap_or(key)
}

/// Translate host custom attributes into vendor metadata, stringifying every value.
pub fn to_vendor_metadata(attributes: &HashMap<String, Value>) -> Metadata {
    attributes
        .iter()
        .map(|(key, value)| (vendor_key(key).to_owned(), stringify(value)))
        .collect()
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_owned(),
        other => other.to_string(),
    }
}
