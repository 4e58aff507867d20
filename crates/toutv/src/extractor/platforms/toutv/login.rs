//! Radio-Canada OAuth web login (implicit grant).
//!
//! The login replays what a browser does on ici.tou.tv:
//!
//! 1. fetch `app.js` and read the OAuth client id out of it,
//! 2. open the authorize endpoint, which serves the login page,
//! 3. post the login form with the account email and password,
//! 4. post the consent form as served,
//! 5. read `access_token` from the URL the redirect chain ends on.
//!
//! Every step depends on the previous one; the first failure aborts the
//! whole login and is reported with the step it happened in.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::config::TouTvEndpoints;
use crate::extractor::error::ExtractorError;
use crate::extractor::form::locate_form;
use crate::extractor::platform_extractor::{Extractor, FetchedPage};
use crate::extractor::utils::capture_group_1_or_parse_error;
use crate::session::{BearerToken, Credentials};

static CLIENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"document\.URL:\{clientId:"(.+?)""#).unwrap());

static ACCESS_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"access_token=([\da-f]{8}-[\da-f]{4}-[\da-f]{4}-[\da-f]{4}-[\da-f]{12})").unwrap()
});

const LOGIN_FORM_MARKER: &str = r#"(?:id|name)="Form-login""#;
const LOGIN_EMAIL_FIELD: &str = "login-email";
const LOGIN_PASSWORD_FIELD: &str = "login-password";

/// Steps of the session bootstrap, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeStep {
    FetchClientId,
    FetchAuthorizationPage,
    SubmitCredentials,
    SubmitConsent,
    ExtractToken,
    /// Token to claims exchange, run right after a successful handshake.
    FetchClaims,
}

impl HandshakeStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandshakeStep::FetchClientId => "fetch client id",
            HandshakeStep::FetchAuthorizationPage => "fetch authorization page",
            HandshakeStep::SubmitCredentials => "submit credentials",
            HandshakeStep::SubmitConsent => "submit consent",
            HandshakeStep::ExtractToken => "extract token",
            HandshakeStep::FetchClaims => "fetch claims",
        }
    }
}

impl fmt::Display for HandshakeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("login failed at step '{step}': {source}")]
pub struct LoginError {
    pub step: HandshakeStep,
    #[source]
    pub source: ExtractorError,
}

impl LoginError {
    pub fn new(step: HandshakeStep, source: ExtractorError) -> Self {
        Self { step, source }
    }

    fn at(step: HandshakeStep) -> impl FnOnce(ExtractorError) -> Self {
        move |source| Self::new(step, source)
    }
}

/// Drives the login over the extractor's HTTP session.
///
/// Cookies picked up along the way stay in the extractor's jar, which is why
/// all steps must go through the same [`Extractor`].
pub struct LoginHandshake<'a> {
    extractor: &'a Extractor,
    endpoints: &'a TouTvEndpoints,
}

impl<'a> LoginHandshake<'a> {
    pub fn new(extractor: &'a Extractor, endpoints: &'a TouTvEndpoints) -> Self {
        Self {
            extractor,
            endpoints,
        }
    }

    /// Runs all steps and returns the bearer token.
    pub async fn run(&self, credentials: &Credentials) -> Result<BearerToken, LoginError> {
        debug!(step = %HandshakeStep::FetchClientId, "Login step");
        let client_id = self
            .fetch_client_id()
            .await
            .map_err(LoginError::at(HandshakeStep::FetchClientId))?;

        debug!(step = %HandshakeStep::FetchAuthorizationPage, "Login step");
        let login_page = self
            .fetch_authorization_page(&client_id)
            .await
            .map_err(LoginError::at(HandshakeStep::FetchAuthorizationPage))?;

        debug!(step = %HandshakeStep::SubmitCredentials, "Login step");
        let consent_page = self
            .submit_credentials(&login_page, credentials)
            .await
            .map_err(LoginError::at(HandshakeStep::SubmitCredentials))?;

        // An already granted client is redirected straight to the callback.
        let landing = if ACCESS_TOKEN_RE.is_match(consent_page.final_url.as_str()) {
            debug!("Consent already granted, skipping consent form");
            consent_page
        } else {
            debug!(step = %HandshakeStep::SubmitConsent, "Login step");
            self.submit_consent(&consent_page)
                .await
                .map_err(LoginError::at(HandshakeStep::SubmitConsent))?
        };

        debug!(step = %HandshakeStep::ExtractToken, "Login step");
        let token = extract_token(landing.final_url.as_str())
            .map_err(LoginError::at(HandshakeStep::ExtractToken))?;
        debug!(token = ?token, "Login succeeded");
        Ok(token)
    }

    pub async fn fetch_client_id(&self) -> Result<String, ExtractorError> {
        let page = self.extractor.get_page(&self.endpoints.app_js, &[]).await?;
        capture_group_1_or_parse_error(&CLIENT_ID_RE, &page.body, "client id")
            .map(ToOwned::to_owned)
    }

    pub async fn fetch_authorization_page(
        &self,
        client_id: &str,
    ) -> Result<FetchedPage, ExtractorError> {
        let endpoints = self.endpoints;
        self.extractor
            .get_page(
                &endpoints.authorize,
                &[
                    ("client_id", client_id),
                    ("redirect_uri", endpoints.redirect_uri.as_str()),
                    ("response_type", "token"),
                    ("scope", endpoints.scope.as_str()),
                    ("state", endpoints.app_js.as_str()),
                ],
            )
            .await
    }

    /// Posts the login form found on `login_page`. The account fields override
    /// any hidden field with the same name.
    pub async fn submit_credentials(
        &self,
        login_page: &FetchedPage,
        credentials: &Credentials,
    ) -> Result<FetchedPage, ExtractorError> {
        let form = locate_form(
            &login_page.body,
            LOGIN_FORM_MARKER,
            &self.endpoints.login_action,
        )?;
        let action = login_page.final_url.join(&form.action_url)?;

        let mut fields = form.fields;
        fields.insert(
            LOGIN_EMAIL_FIELD.to_string(),
            credentials.identifier().to_string(),
        );
        fields.insert(
            LOGIN_PASSWORD_FIELD.to_string(),
            credentials.secret().to_string(),
        );

        self.extractor.post_form(action.as_str(), &fields).await
    }

    /// Posts the single form of `consent_page` unmodified and follows the
    /// redirects to the OAuth callback.
    pub async fn submit_consent(
        &self,
        consent_page: &FetchedPage,
    ) -> Result<FetchedPage, ExtractorError> {
        let form = locate_form(&consent_page.body, "", &self.endpoints.consent_action)?;
        let action = consent_page.final_url.join(&form.action_url)?;
        self.extractor.post_form(action.as_str(), &form.fields).await
    }
}

/// Extracts the bearer token from the URL the login redirect chain ended on.
pub fn extract_token(final_url: &str) -> Result<BearerToken, ExtractorError> {
    let token = capture_group_1_or_parse_error(&ACCESS_TOKEN_RE, final_url, "access token")?;
    BearerToken::parse(token)
}
