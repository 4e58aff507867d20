use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use super::claims::ClaimsFetcher;
use super::config::TouTvEndpoints;
use super::login::{HandshakeStep, LoginError, LoginHandshake};
use super::models::ItemMetadata;
use crate::extractor::default::HttpConfig;
use crate::extractor::error::ExtractorError;
use crate::extractor::platform_extractor::{Extractor, PlatformExtractor};
use crate::extractor::utils::capture_group_1_or_invalid_url;
use crate::media::{DelegateReference, SmuggledUrl, TargetLocator};
use crate::session::{Credentials, SessionContext};

pub static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://ici\.tou\.tv/(?P<id>[a-zA-Z0-9_-]+(?:/S[0-9]+[EC][0-9]+)?)").unwrap()
});

pub struct TouTv {
    pub extractor: Extractor,
    endpoints: TouTvEndpoints,
    credentials: Option<Credentials>,
}

impl TouTv {
    pub const BASE_URL: &str = "https://ici.tou.tv";

    const DEFAULT_APP_CODE: &str = "toutv";

    /// Creates the extractor with its own HTTP session.
    ///
    /// Recognized extras: `username`/`email` and `password` for the account
    /// login, and `endpoints` to override remote endpoints.
    pub fn new(
        url: String,
        http: &HttpConfig,
        cookies: Option<String>,
        extras: Option<serde_json::Value>,
    ) -> Result<Self, ExtractorError> {
        let extractor = Extractor::new("TOU.TV", url, http)?;

        if let Some(cookies) = cookies {
            extractor.set_cookies_from_string(&cookies);
        }

        let endpoints = TouTvEndpoints::from_extras(extras.as_ref())?;
        let credentials = Credentials::from_extras(extras.as_ref());

        Ok(Self {
            extractor,
            endpoints,
            credentials,
        })
    }

    /// Replaces the credentials read from the extras.
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_endpoints(mut self, endpoints: TouTvEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Path id of the page, e.g. `garfield-tout-court/S2015E17`.
    pub fn extract_path_id(&self) -> Result<&str, ExtractorError> {
        capture_group_1_or_invalid_url(&URL_REGEX, &self.extractor.url)
    }

    /// Logs in and fetches the claims. Nothing is returned unless both
    /// succeeded.
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionContext, LoginError> {
        let token = LoginHandshake::new(&self.extractor, &self.endpoints)
            .run(credentials)
            .await?;

        let claims = ClaimsFetcher::new(&self.extractor, &self.endpoints.claims)
            .fetch(&token)
            .await
            .map_err(|e| LoginError::new(HandshakeStep::FetchClaims, e))?;

        Ok(SessionContext::authenticated(token, claims))
    }

    /// Session for this run: anonymous without credentials, and anonymous
    /// again if the login fails. Resolution works either way.
    pub async fn establish_session(&self) -> SessionContext {
        let Some(credentials) = &self.credentials else {
            debug!("No credentials provided, continuing anonymously");
            return SessionContext::anonymous();
        };

        match self.login(credentials).await {
            Ok(session) => session,
            Err(e) => {
                warn!(step = %e.step, error = %e.source, "Login failed, continuing anonymously");
                SessionContext::anonymous()
            }
        }
    }

    pub async fn fetch_metadata(&self, path_id: &str) -> Result<ItemMetadata, ExtractorError> {
        self.extractor
            .get_json(&self.endpoints.presentation_url(path_id), &[])
            .await
    }

    pub async fn resolve(
        &self,
        path_id: &str,
        session: &SessionContext,
    ) -> Result<DelegateReference, ExtractorError> {
        let metadata = self.fetch_metadata(path_id).await?;

        // IsDrm is set on items that play fine without DRM, so it only warns.
        if metadata.is_drm {
            warn!(path_id, "This video is probably DRM protected");
        }

        let app_code = metadata
            .app_code
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_APP_CODE.to_string());
        let locator = TargetLocator::new(app_code, metadata.id_media.as_str());
        let url = SmuggledUrl::new(locator.to_string()).with_session(session);
        debug!(%url, authenticated = session.is_authenticated(), "Resolved delegate");

        let details = metadata.details;
        Ok(DelegateReference {
            url,
            id: metadata.id_media,
            title: details.original_title,
            thumbnail: details.image_url,
            duration: details.length_in_seconds,
            description: details.description,
        })
    }
}

#[async_trait]
impl PlatformExtractor for TouTv {
    fn get_extractor(&self) -> &Extractor {
        &self.extractor
    }

    async fn extract(&self) -> Result<DelegateReference, ExtractorError> {
        let path_id = self.extract_path_id()?;
        let session = self.establish_session().await;
        self.resolve(path_id, &session).await
    }
}
