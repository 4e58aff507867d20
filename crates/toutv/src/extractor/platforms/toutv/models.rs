use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::extractor::utils::value_as_u64;

/// Response of the `presentation/<path id>` endpoint (only the fields we use).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemMetadata {
    #[serde(deserialize_with = "string_or_number")]
    pub id_media: String,
    // Not a reliable DRM indicator, see `TouTv::resolve`.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_drm: bool,
    #[serde(default)]
    pub app_code: Option<String>,
    pub details: ItemDetails,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemDetails {
    pub original_title: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub length_in_seconds: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a media id, got {other}"
        ))),
    }
}

/// Truthy bools, non-zero numbers and strings other than `""`, `"0"` and
/// `"false"`. Anything else is false.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => {
            let s = s.trim();
            !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
        }
        _ => false,
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(value_as_u64))
}
