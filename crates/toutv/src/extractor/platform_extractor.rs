use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, LOCATION};
use reqwest::{Client, Method, Request, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::default::{HttpConfig, default_client};
use super::error::ExtractorError;
use crate::media::DelegateReference;

/// A fully read response: body plus where the redirect chain ended.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: StatusCode,
    /// Final URL after redirects, fragment included.
    pub final_url: Url,
    pub body: String,
}

/// Base extractor with a per-run HTTP session.
///
/// Each extractor owns its own client and cookie jar, so cookies set at any
/// point of a redirect chain are replayed on the following requests of the
/// same run, and nothing leaks between runs.
///
/// # Example Usage
///
/// ```rust,ignore
/// # use toutv_parser::extractor::{HttpConfig, platform_extractor::Extractor};
/// # async fn doc_test() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = Extractor::new("Platform", "https://example.com", &HttpConfig::default())?;
///
/// // Seed cookies exported from a browser
/// extractor.set_cookies_from_string("token=xyz789; user_id=12345");
///
/// // Redirects are followed, the final URL keeps any fragment
/// let page = extractor.get_page("https://example.com/start", &[]).await?;
/// println!("{}", page.final_url);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Extractor {
    // url to extract from, e.g., "https://ici.tou.tv/infoman"
    pub url: String,
    // name of the platform, e.g., "TOU.TV"
    pub platform_name: String,
    client: Client,
    jar: Arc<Jar>,
    platform_headers: HeaderMap,
    max_redirects: usize,
}

impl Extractor {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        platform_name: S1,
        platform_url: S2,
        http: &HttpConfig,
    ) -> Result<Self, ExtractorError> {
        let jar = Arc::new(Jar::default());
        let client = default_client(http, jar.clone())?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        default_headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("fr-CA,fr;q=0.9,en-US;q=0.5,en;q=0.3"),
        );

        Ok(Self {
            platform_name: platform_name.into(),
            url: platform_url.into(),
            client,
            jar,
            platform_headers: default_headers,
            max_redirects: http.max_redirects,
        })
    }

    /// Set cookies from a cookie string (format: "name1=value1; name2=value2").
    ///
    /// Cookies are scoped to the extractor's page URL. Malformed pairs are
    /// skipped.
    pub fn set_cookies_from_string(&self, cookie_string: &str) {
        let Ok(scope) = Url::parse(&self.url) else {
            debug!(url = %self.url, "Extractor url is not absolute; ignoring cookies");
            return;
        };

        // Accept common separators: ';' from Cookie headers and '\n' from copy/paste.
        for part in cookie_string.split(&[';', '\n'][..]).map(str::trim) {
            let Some((name, value)) = part.split_once('=') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                continue;
            }
            self.jar.add_cookie_str(&format!("{name}={value}"), &scope);
        }
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Create an HTTP request carrying the platform headers.
    /// Cookies are added by the session's jar.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .headers(self.platform_headers.clone())
    }

    /// GET `url` and follow redirects to the end of the chain.
    pub async fn get_page(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<FetchedPage, ExtractorError> {
        let request = self.get(url).query(query).build()?;
        self.execute_page(request).await
    }

    /// POST `fields` as `application/x-www-form-urlencoded` and follow redirects.
    pub async fn post_form<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        fields: &T,
    ) -> Result<FetchedPage, ExtractorError> {
        let request = self.post(url).form(fields).build()?;
        self.execute_page(request).await
    }

    /// GET `url` and decode the body as JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ExtractorError> {
        let page = self.get_page(url, query).await?;
        let value = serde_json::from_str(&page.body)?;
        Ok(value)
    }

    /// Sends `request` and follows the redirect chain by hand.
    ///
    /// The client never follows redirects itself: its `Response::url()` drops
    /// the fragment of a `Location`, and the fragment is where implicit-grant
    /// tokens end up. A `Location` without a fragment inherits the previous
    /// one (RFC 7231 section 7.1.2).
    async fn execute_page(&self, request: Request) -> Result<FetchedPage, ExtractorError> {
        let mut current_url = request.url().clone();
        let mut request = request;
        let mut hops = 0;

        loop {
            let next = request.try_clone();
            let response = self.client.execute(request).await?;
            let status = response.status();

            let Some(location) = redirect_location(&response) else {
                return Self::read_page(response, current_url).await;
            };
            if hops == self.max_redirects {
                return Err(ExtractorError::HttpError {
                    status,
                    url: loggable(&current_url),
                });
            }
            hops += 1;

            let mut target = current_url.join(&location)?;
            if target.fragment().is_none() {
                target.set_fragment(current_url.fragment());
            }
            debug!(
                %status,
                host = target.host_str().unwrap_or_default(),
                path = target.path(),
                "Following redirect"
            );

            // Fragments stay client side.
            let mut wire = target.clone();
            wire.set_fragment(None);

            request = match next {
                // 307/308 replay the request as is, body included.
                Some(mut replay)
                    if matches!(
                        status,
                        StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT
                    ) || *replay.method() == Method::GET =>
                {
                    *replay.url_mut() = wire;
                    replay
                }
                _ => self.request(Method::GET, wire.as_str()).build()?,
            };
            current_url = target;
        }
    }

    async fn read_page(response: Response, final_url: Url) -> Result<FetchedPage, ExtractorError> {
        let status = response.status();

        // Query and fragment may carry tokens, only host and path are logged.
        debug!(
            %status,
            host = final_url.host_str().unwrap_or_default(),
            path = final_url.path(),
            "Response received"
        );

        if !status.is_success() {
            return Err(ExtractorError::HttpError {
                status,
                url: loggable(&final_url),
            });
        }

        let body = response.text().await?;
        Ok(FetchedPage {
            status,
            final_url,
            body,
        })
    }
}

fn redirect_location(response: &Response) -> Option<String> {
    match response.status() {
        StatusCode::MOVED_PERMANENTLY
        | StatusCode::FOUND
        | StatusCode::SEE_OTHER
        | StatusCode::TEMPORARY_REDIRECT
        | StatusCode::PERMANENT_REDIRECT => response
            .headers()
            .get(LOCATION)?
            .to_str()
            .ok()
            .map(str::to_owned),
        _ => None,
    }
}

fn loggable(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}

#[async_trait]
pub trait PlatformExtractor: Send + Sync {
    fn get_extractor(&self) -> &Extractor;

    async fn extract(&self) -> Result<DelegateReference, ExtractorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_final_url_keeps_fragment_after_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/start"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", "/landing#state=abc&x=1")
                    .insert_header("Set-Cookie", "sid=s1; Path=/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/landing"))
            .and(header("cookie", "sid=s1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("done"))
            .mount(&server)
            .await;

        let extractor = Extractor::new("Test", server.uri(), &HttpConfig::default()).unwrap();
        let page = extractor
            .get_page(&format!("{}/start", server.uri()), &[])
            .await
            .unwrap();

        assert_eq!(page.body, "done");
        assert_eq!(page.final_url.path(), "/landing");
        assert_eq!(page.final_url.fragment(), Some("state=abc&x=1"));
    }

    #[tokio::test]
    async fn test_redirect_without_fragment_inherits_previous_one() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/authorize"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "/callback#access_token=t1"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/callback"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/home?lang=fr"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/home"))
            .respond_with(ResponseTemplate::new(200).set_body_string("home"))
            .mount(&server)
            .await;

        let extractor = Extractor::new("Test", server.uri(), &HttpConfig::default()).unwrap();
        let page = extractor
            .get_page(&format!("{}/authorize", server.uri()), &[])
            .await
            .unwrap();

        assert_eq!(page.body, "home");
        assert_eq!(page.final_url.path(), "/home");
        assert_eq!(page.final_url.query(), Some("lang=fr"));
        assert_eq!(page.final_url.fragment(), Some("access_token=t1"));
    }

    #[tokio::test]
    async fn test_post_redirect_switches_to_get_unless_307() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/consent"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/consent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("consent"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/moved"))
            .respond_with(ResponseTemplate::new(307).insert_header("Location", "/kept"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/kept"))
            .and(body_string_contains("a=1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("kept"))
            .mount(&server)
            .await;

        let extractor = Extractor::new("Test", server.uri(), &HttpConfig::default()).unwrap();
        let fields = [("a", "1")];

        let page = extractor
            .post_form(&format!("{}/login", server.uri()), &fields)
            .await
            .unwrap();
        assert_eq!(page.body, "consent");

        let page = extractor
            .post_form(&format!("{}/moved", server.uri()), &fields)
            .await
            .unwrap();
        assert_eq!(page.body, "kept");
        assert_eq!(page.final_url.path(), "/kept");
    }

    #[tokio::test]
    async fn test_redirect_limit_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
            .expect(4)
            .mount(&server)
            .await;

        let http = HttpConfig {
            max_redirects: 3,
            ..HttpConfig::default()
        };
        let extractor = Extractor::new("Test", server.uri(), &http).unwrap();
        let err = extractor
            .get_page(&format!("{}/loop", server.uri()), &[])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExtractorError::HttpError { status: StatusCode::FOUND, .. }
        ));
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let extractor = Extractor::new("Test", server.uri(), &HttpConfig::default()).unwrap();
        let err = extractor
            .get_page(&format!("{}/missing", server.uri()), &[("token", "secret")])
            .await
            .unwrap_err();

        match err {
            ExtractorError::HttpError { status, url } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert!(!url.contains("secret"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_seeded_cookies_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("cookie", "pref=fr"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let extractor = Extractor::new("Test", server.uri(), &HttpConfig::default()).unwrap();
        extractor.set_cookies_from_string("pref=fr; broken; =nothing");
        let page = extractor
            .get_page(&format!("{}/me", server.uri()), &[])
            .await
            .unwrap();
        assert_eq!(page.body, "ok");
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let extractor =
            Extractor::new("Test", "http://127.0.0.1:1", &HttpConfig::default()).unwrap();
        let err = extractor
            .get_page("http://127.0.0.1:1/nothing", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractorError::NetworkError(_)));
    }
}
