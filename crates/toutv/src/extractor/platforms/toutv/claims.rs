use serde_json::Value;
use tracing::debug;

use crate::extractor::error::ExtractorError;
use crate::extractor::platform_extractor::Extractor;
use crate::session::{BearerToken, Claims};

/// Exchanges a bearer token for the media validation claims.
pub struct ClaimsFetcher<'a> {
    extractor: &'a Extractor,
    endpoint: &'a str,
}

impl<'a> ClaimsFetcher<'a> {
    pub fn new(extractor: &'a Extractor, endpoint: &'a str) -> Self {
        Self {
            extractor,
            endpoint,
        }
    }

    pub async fn fetch(&self, token: &BearerToken) -> Result<Claims, ExtractorError> {
        let mut json: Value = self
            .extractor
            .get_json(
                self.endpoint,
                &[("token", token.as_str()), ("access_token", token.as_str())],
            )
            .await?;

        match json.get_mut("claims").map(Value::take) {
            None | Some(Value::Null) => Err(ExtractorError::parse("claims field missing")),
            Some(claims) => {
                debug!("Claims received");
                Ok(claims)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::HttpConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "abcd1234-ef00-4a12-8b34-1234567890ab";

    async fn fetch_with(response: ResponseTemplate) -> Result<Claims, ExtractorError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getClaims"))
            .and(query_param("token", TOKEN))
            .and(query_param("access_token", TOKEN))
            .respond_with(response)
            .mount(&server)
            .await;

        let extractor = Extractor::new("TOU.TV", server.uri(), &HttpConfig::default()).unwrap();
        let endpoint = format!("{}/getClaims", server.uri());
        ClaimsFetcher::new(&extractor, &endpoint)
            .fetch(&BearerToken::parse(TOKEN).unwrap())
            .await
    }

    #[tokio::test]
    async fn test_fetch_claims() {
        let claims = fetch_with(
            ResponseTemplate::new(200).set_body_json(json!({"claims": {"level": "full"}, "x": 1})),
        )
        .await
        .unwrap();
        assert_eq!(claims, json!({"level": "full"}));
    }

    #[tokio::test]
    async fn test_opaque_string_claims_pass_through() {
        let claims = fetch_with(
            ResponseTemplate::new(200).set_body_json(json!({"claims": "eyJhbGciOi.opaque"})),
        )
        .await
        .unwrap();
        assert_eq!(claims, json!("eyJhbGciOi.opaque"));
    }

    #[tokio::test]
    async fn test_missing_claims_is_parse_error() {
        let err = fetch_with(ResponseTemplate::new(200).set_body_json(json!({"error": "expired"})))
            .await
            .unwrap_err();
        assert!(err.is_parse_error());

        let err = fetch_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .await
            .unwrap_err();
        assert!(err.is_parse_error());
    }

    #[tokio::test]
    async fn test_error_status_is_http_error() {
        let err = fetch_with(ResponseTemplate::new(401)).await.unwrap_err();
        assert!(matches!(err, ExtractorError::HttpError { .. }));
    }
}
