use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, cookie::Jar, redirect::Policy};
use serde::{Deserialize, Serialize};

use super::error::ExtractorError;
use super::factory::ExtractorFactory;

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Settings for the per-run HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Maximum number of redirects followed by a single request
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_UA.to_string(),
            max_redirects: 10,
        }
    }
}

/// Builds a fresh client bound to `jar`.
///
/// Login state lives in the cookie jar, so every run gets its own client
/// and jar; clients are never pooled across runs. Redirects are followed by
/// the [`Extractor`](super::platform_extractor::Extractor), not the client.
pub fn default_client(config: &HttpConfig, jar: Arc<Jar>) -> Result<Client, ExtractorError> {
    let client = Client::builder()
        .cookie_provider(jar)
        .redirect(Policy::none())
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.as_str())
        .build()?;
    Ok(client)
}

/// Returns a new `ExtractorFactory` populated with all the supported platforms.
pub fn default_factory() -> ExtractorFactory {
    ExtractorFactory::new(HttpConfig::default())
}
