//! HTML form scraping for login flows.
//!
//! Pages served by OAuth providers usually carry several forms (login,
//! sign-up, password reset, language switch). [`locate_form`] picks the one
//! whose opening tag matches a marker and returns its submit target together
//! with the pre-filled hidden fields that must be posted back.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use rustc_hash::FxHashMap;

use super::error::ExtractorError;

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static INPUT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<input[^>]+>").unwrap());

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/>"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"'=<`]+)))?"#).unwrap()
});

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap());

/// Submit target and pre-filled values of an HTML form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDescriptor {
    /// `action` attribute of the form, or the caller's default.
    /// May be relative; resolve it against the page URL before posting.
    pub action_url: String,
    pub fields: FxHashMap<String, String>,
}

/// Locates the first form whose opening tag matches `marker` and extracts its
/// action and hidden fields.
///
/// `marker` is a regex fragment matched inside the `<form ...>` tag, e.g.
/// `(?:id|name)="Form-login"`. An empty marker selects the first form of the
/// page. When the form has no (or an empty) `action`, `default_action` is used.
///
/// Only `hidden` and `submit` inputs with a value are collected. When a name
/// appears twice, the last occurrence wins.
pub fn locate_form(
    html: &str,
    marker: &str,
    default_action: &str,
) -> Result<FormDescriptor, ExtractorError> {
    let form_re = Regex::new(&format!(r"(?is)(<form\b[^>]*?{marker}[^>]*?>).*?</form>"))
        .map_err(|e| ExtractorError::parse(format!("invalid form marker {marker:?}: {e}")))?;

    let caps = form_re.captures(html).ok_or_else(|| {
        if marker.is_empty() {
            ExtractorError::parse("no form found in page")
        } else {
            ExtractorError::parse(format!("no form matching {marker:?} found in page"))
        }
    })?;

    let form = caps.get(0).map_or("", |m| m.as_str());
    let form_tag = caps.get(1).map_or("", |m| m.as_str());

    let action_url = extract_attributes(form_tag)
        .remove("action")
        .flatten()
        .filter(|action| !action.is_empty())
        .unwrap_or_else(|| default_action.to_string());

    Ok(FormDescriptor {
        action_url,
        fields: hidden_inputs(form),
    })
}

/// Collects `name -> value` for every hidden or submit input in `html`.
/// Inputs without a name fall back to their `id`.
pub fn hidden_inputs(html: &str) -> FxHashMap<String, String> {
    let html = COMMENT_RE.replace_all(html, "");
    let mut fields = FxHashMap::default();

    for input in INPUT_RE.find_iter(&html) {
        let mut attrs = extract_attributes(input.as_str());
        let is_hidden = matches!(
            attrs.get("type").and_then(|t| t.as_deref()).map(str::to_ascii_lowercase).as_deref(),
            Some("hidden" | "submit")
        );
        if !is_hidden {
            continue;
        }

        let name = attrs
            .remove("name")
            .flatten()
            .or_else(|| attrs.remove("id").flatten());
        let value = attrs.remove("value").flatten();
        if let (Some(name), Some(value)) = (name, value) {
            fields.insert(name, value);
        }
    }

    fields
}

/// Parses the attributes of a single HTML start tag.
///
/// Names are lowercased, values are entity-decoded. Attributes without a
/// value (e.g. `disabled`) map to `None`.
pub fn extract_attributes(tag: &str) -> FxHashMap<String, Option<String>> {
    let inner = tag
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim_end_matches('/');
    // drop the tag name
    let inner = inner
        .split_once(char::is_whitespace)
        .map_or("", |(_, rest)| rest);

    let mut attrs = FxHashMap::default();
    for caps in ATTR_RE.captures_iter(inner) {
        let Some(name) = caps.get(1) else { continue };
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| unescape_html(m.as_str()));
        attrs.insert(name.as_str().to_ascii_lowercase(), value);
    }
    attrs
}

/// Decodes the common named entities and numeric character references.
/// Unknown entities are left untouched.
pub fn unescape_html(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    ENTITY_RE
        .replace_all(s, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
