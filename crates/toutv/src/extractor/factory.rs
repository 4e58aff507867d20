use std::sync::LazyLock;

use regex::Regex;

use super::default::HttpConfig;
use super::error::ExtractorError;
use super::platform_extractor::PlatformExtractor;
use crate::extractor::platforms::{self, toutv::TouTv};

// A type alias for a thread-safe constructor function.
type ExtractorConstructor = fn(
    String,
    &HttpConfig,
    Option<String>,
    Option<serde_json::Value>,
) -> Result<Box<dyn PlatformExtractor>, ExtractorError>;

struct PlatformEntry {
    name: &'static str,
    regex: &'static LazyLock<Regex>,
    constructor: ExtractorConstructor,
}

macro_rules! platform_registry {
    ( $( $name:literal : $regex:path => $builder:path ),+ $(,)? ) => {
        &[
            $(
                PlatformEntry {
                    name: $name,
                    regex: &$regex,
                    constructor: |url, http, cookies, extras| {
                        Ok(Box::new($builder(url, http, cookies, extras)?)
                            as Box<dyn PlatformExtractor>)
                    },
                },
            )+
        ]
    };
}

// Static platform registry.
static PLATFORMS: &[PlatformEntry] = platform_registry![
    "TOU.TV": platforms::toutv::URL_REGEX => TouTv::new,
];

/// A factory for creating platform-specific extractors.
///
/// Every extractor gets a freshly built HTTP client, so login state of one
/// run is never visible to another.
pub struct ExtractorFactory {
    http: HttpConfig,
}

impl ExtractorFactory {
    pub fn new(http: HttpConfig) -> Self {
        Self { http }
    }

    pub fn http_config(&self) -> &HttpConfig {
        &self.http
    }

    pub fn supported_platforms(&self) -> Vec<&'static str> {
        PLATFORMS.iter().map(|p| p.name).collect()
    }

    pub fn create_extractor(
        &self,
        url: &str,
        cookies: Option<String>,
        extras: Option<serde_json::Value>,
    ) -> Result<Box<dyn PlatformExtractor>, ExtractorError> {
        let platform = PLATFORMS
            .iter()
            .find(|platform| platform.regex.is_match(url))
            .ok_or(ExtractorError::UnsupportedExtractor)?;

        (platform.constructor)(url.to_string(), &self.http, cookies, extras)
    }
}
