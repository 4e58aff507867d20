use regex::Regex;
use serde_json::Value;

use crate::extractor::error::ExtractorError;

#[inline]
pub fn capture_group_1<'a>(re: &Regex, input: &'a str) -> Option<&'a str> {
    re.captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[inline]
pub fn capture_group_1_or_invalid_url<'a>(
    re: &Regex,
    input: &'a str,
) -> Result<&'a str, ExtractorError> {
    capture_group_1(re, input).ok_or_else(|| ExtractorError::InvalidUrl(input.to_string()))
}

/// Like [`capture_group_1`], but a missing match is a [`ExtractorError::ParseError`]
/// naming `what` was searched for.
#[inline]
pub fn capture_group_1_or_parse_error<'a>(
    re: &Regex,
    input: &'a str,
    what: &str,
) -> Result<&'a str, ExtractorError> {
    capture_group_1(re, input)
        .ok_or_else(|| ExtractorError::parse(format!("unable to extract {what}")))
}

#[inline]
pub fn extras_get_str<'a>(extras: Option<&'a Value>, key: &str) -> Option<&'a str> {
    extras.and_then(|e| e.get(key)).and_then(|v| v.as_str())
}

/// Reads an integer that may be encoded as a number or a numeric string.
/// Fractional values are truncated, anything else is `None`.
pub fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u64))
        }
        _ => None,
    }
}
