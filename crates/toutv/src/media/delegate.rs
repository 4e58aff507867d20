use std::fmt;

use async_trait::async_trait;
use serde::{Serialize, Serializer};

use crate::extractor::error::ExtractorError;
use crate::session::SessionContext;

/// A resolver URL with an optional session riding alongside it.
///
/// Only `primary` is ever displayed, logged or serialized. The sidecar is
/// reachable solely through [`SmuggledUrl::sidecar`], so authorization data
/// never ends up in the textual form of the locator.
#[derive(Clone, PartialEq)]
pub struct SmuggledUrl {
    primary: String,
    sidecar: Option<SessionContext>,
}

impl SmuggledUrl {
    pub fn new<S: Into<String>>(primary: S) -> Self {
        Self {
            primary: primary.into(),
            sidecar: None,
        }
    }

    /// Attaches `session` if it is authenticated; anonymous sessions leave
    /// the url unchanged.
    pub fn with_session(mut self, session: &SessionContext) -> Self {
        self.sidecar = session.is_authenticated().then(|| session.clone());
        self
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn sidecar(&self) -> Option<&SessionContext> {
        self.sidecar.as_ref()
    }

    pub fn into_parts(self) -> (String, Option<SessionContext>) {
        (self.primary, self.sidecar)
    }
}

impl fmt::Display for SmuggledUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.primary)
    }
}

impl fmt::Debug for SmuggledUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmuggledUrl")
            .field("primary", &self.primary)
            .field("sidecar", &self.sidecar.is_some())
            .finish()
    }
}

impl Serialize for SmuggledUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.primary)
    }
}

/// `radiocanada:<app code>:<media id>` reference understood by the
/// Radio-Canada media resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLocator {
    pub app_code: String,
    pub media_id: String,
}

impl TargetLocator {
    pub const SCHEME: &str = "radiocanada";

    pub fn new<S1: Into<String>, S2: Into<String>>(app_code: S1, media_id: S2) -> Self {
        Self {
            app_code: app_code.into(),
            media_id: media_id.into(),
        }
    }

    /// Parses a locator, returning `None` for foreign schemes or missing parts.
    pub fn parse(locator: &str) -> Option<Self> {
        let rest = locator
            .strip_prefix(Self::SCHEME)
            .and_then(|r| r.strip_prefix(':'))?;
        let (app_code, media_id) = rest.split_once(':')?;
        if app_code.is_empty() || media_id.is_empty() {
            return None;
        }
        Some(Self::new(app_code, media_id))
    }
}

impl fmt::Display for TargetLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", Self::SCHEME, self.app_code, self.media_id)
    }
}

/// Result of resolving a TOU.TV page: metadata plus a pointer to the
/// downstream media resolver that produces the actual streams.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelegateReference {
    // resolver url, e.g., "radiocanada:toutv:122017"
    pub url: SmuggledUrl,
    // media id
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    // seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DelegateReference {
    /// Serialize the reference to a pretty-formatted JSON string.
    /// The session sidecar is never included.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub async fn resolve_with<R: DelegateResolver + ?Sized>(
        &self,
        resolver: &R,
    ) -> Result<R::Output, ExtractorError> {
        resolver.resolve(&self.url).await
    }
}

/// Downstream resolver for `radiocanada:` locators.
///
/// Implementations must accept a url without sidecar and treat it as an
/// unauthenticated, best-effort request.
#[async_trait]
pub trait DelegateResolver: Send + Sync {
    type Output: Send;

    async fn resolve(&self, url: &SmuggledUrl) -> Result<Self::Output, ExtractorError>;
}
