use serde::{Deserialize, Serialize};

use crate::extractor::error::ExtractorError;

/// Remote endpoints used by the TOU.TV extractor.
///
/// Defaults point at the production services; every field can be overridden
/// through the `endpoints` object of the extractor extras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouTvEndpoints {
    /// Web app bundle holding the OAuth client id. Also sent as `state`.
    pub app_js: String,
    pub authorize: String,
    /// Fallback target when the login form has no `action`.
    pub login_action: String,
    /// Fallback target when the consent form has no `action`.
    pub consent_action: String,
    pub redirect_uri: String,
    pub scope: String,
    pub claims: String,
    /// Item metadata is fetched from `<presentation>/<path id>`.
    pub presentation: String,
}

impl TouTvEndpoints {
    const SITE: &str = "http://ici.tou.tv";
    const SERVICES: &str = "https://services.radio-canada.ca";
    const REDIRECT_URI: &str = "https://ici.tou.tv/login/loginCallback";
    const SCOPE: &str =
        "media-drmt openid profile email id.write media-validation.read.privileged";

    /// Endpoints rooted at `site` (TOU.TV web app) and `services`
    /// (Radio-Canada auth and validation APIs).
    pub fn for_hosts(site: &str, services: &str) -> Self {
        let site = site.trim_end_matches('/');
        let services = services.trim_end_matches('/');
        let authorize = format!("{services}/auth/oauth/v2/authorize");
        Self {
            app_js: format!("{site}/app.js"),
            login_action: format!("{authorize}/login"),
            consent_action: format!("{authorize}/consent"),
            authorize,
            redirect_uri: format!("{site}/login/loginCallback"),
            scope: Self::SCOPE.to_string(),
            claims: format!("{services}/media/validation/v2/getClaims"),
            presentation: format!("{site}/presentation"),
        }
    }

    /// Reads the `endpoints` object of the extras; missing keys keep their defaults.
    pub fn from_extras(extras: Option<&serde_json::Value>) -> Result<Self, ExtractorError> {
        match extras.and_then(|e| e.get("endpoints")) {
            Some(value) => Ok(serde_json::from_value(value.clone())?),
            None => Ok(Self::default()),
        }
    }

    pub fn presentation_url(&self, path_id: &str) -> String {
        format!("{}/{}", self.presentation.trim_end_matches('/'), path_id)
    }
}

impl Default for TouTvEndpoints {
    fn default() -> Self {
        Self {
            redirect_uri: Self::REDIRECT_URI.to_string(),
            ..Self::for_hosts(Self::SITE, Self::SERVICES)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_endpoints() {
        let endpoints = TouTvEndpoints::default();
        assert_eq!(endpoints.app_js, "http://ici.tou.tv/app.js");
        assert_eq!(
            endpoints.authorize,
            "https://services.radio-canada.ca/auth/oauth/v2/authorize"
        );
        assert_eq!(
            endpoints.login_action,
            "https://services.radio-canada.ca/auth/oauth/v2/authorize/login"
        );
        assert_eq!(
            endpoints.consent_action,
            "https://services.radio-canada.ca/auth/oauth/v2/authorize/consent"
        );
        assert_eq!(endpoints.redirect_uri, "https://ici.tou.tv/login/loginCallback");
        assert_eq!(
            endpoints.claims,
            "https://services.radio-canada.ca/media/validation/v2/getClaims"
        );
        assert_eq!(
            endpoints.presentation_url("infoman/S01E01"),
            "http://ici.tou.tv/presentation/infoman/S01E01"
        );
    }

    #[test]
    fn test_partial_override_from_extras() {
        let extras = json!({"endpoints": {"claims": "http://localhost/claims"}});
        let endpoints = TouTvEndpoints::from_extras(Some(&extras)).unwrap();
        assert_eq!(endpoints.claims, "http://localhost/claims");
        assert_eq!(endpoints.app_js, TouTvEndpoints::default().app_js);

        let extras = json!({"endpoints": {"claims": 3}});
        assert!(TouTvEndpoints::from_extras(Some(&extras)).is_err());
    }
}
