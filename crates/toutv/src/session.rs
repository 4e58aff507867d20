//! Account credentials and the authenticated session they produce.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::extractor::error::ExtractorError;
use crate::extractor::utils::extras_get_str;

static TOKEN_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\da-f]{8}-[\da-f]{4}-[\da-f]{4}-[\da-f]{4}-[\da-f]{12}$").unwrap()
});

/// Opaque authorization payload issued by the media validation service.
pub type Claims = Value;

/// Account login supplied by the user. The secret is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    identifier: String,
    secret: String,
}

impl Credentials {
    pub fn new<S1: Into<String>, S2: Into<String>>(identifier: S1, secret: S2) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Reads `username` (or `email`) and `password` from extractor extras.
    /// Both must be present and non-empty.
    pub fn from_extras(extras: Option<&Value>) -> Option<Self> {
        let identifier = extras_get_str(extras, "username")
            .or_else(|| extras_get_str(extras, "email"))
            .filter(|s| !s.is_empty())?;
        let secret = extras_get_str(extras, "password").filter(|s| !s.is_empty())?;
        Some(Self::new(identifier, secret))
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// OAuth access token of the implicit grant, shaped like a lowercase UUID.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn parse(token: &str) -> Result<Self, ExtractorError> {
        if TOKEN_SHAPE.is_match(token) {
            Ok(Self(token.to_string()))
        } else {
            Err(ExtractorError::parse("access token has an unexpected shape"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First group only, safe for logs.
    pub fn redacted(&self) -> String {
        let head = self.0.split('-').next().unwrap_or_default();
        format!("{head}-****")
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken({})", self.redacted())
    }
}

#[derive(Clone, PartialEq)]
struct Authorization {
    token: BearerToken,
    claims: Claims,
}

/// Login state of one extraction run.
///
/// Either anonymous or holding both the bearer token and its claims; a token
/// without claims cannot be represented. Built once, then passed by
/// reference into resolution.
#[derive(Clone, Default, PartialEq)]
pub struct SessionContext {
    auth: Option<Authorization>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: BearerToken, claims: Claims) -> Self {
        Self {
            auth: Some(Authorization { token, claims }),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    pub fn token(&self) -> Option<&BearerToken> {
        self.auth.as_ref().map(|a| &a.token)
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.auth.as_ref().map(|a| &a.claims)
    }

    /// `{"access_token": .., "claims": ..}` as consumed by the media resolver,
    /// `None` for anonymous sessions.
    pub fn to_payload(&self) -> Option<Value> {
        self.auth.as_ref().map(|a| {
            serde_json::json!({
                "access_token": a.token.as_str(),
                "claims": a.claims,
            })
        })
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.auth {
            Some(auth) => f
                .debug_struct("SessionContext")
                .field("token", &auth.token)
                .field("claims", &"<opaque>")
                .finish(),
            None => f.write_str("SessionContext(anonymous)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TOKEN: &str = "abcd1234-ef00-4a12-8b34-1234567890ab";

    #[test]
    fn test_bearer_token_shape() {
        assert_eq!(BearerToken::parse(TOKEN).unwrap().as_str(), TOKEN);
        assert!(BearerToken::parse("ABCD1234-EF00-4A12-8B34-1234567890AB").is_err());
        assert!(BearerToken::parse("abcd1234-ef00-4a12-8b34").is_err());
        assert!(BearerToken::parse("").is_err());
    }

    #[test]
    fn test_debug_never_prints_secrets() {
        let token = BearerToken::parse(TOKEN).unwrap();
        let session = SessionContext::authenticated(token.clone(), json!({"level": "full"}));
        let creds = Credentials::new("user@example.com", "hunter2");

        assert_eq!(format!("{token:?}"), "BearerToken(abcd1234-****)");
        let printed = format!("{session:?} {creds:?}");
        assert!(!printed.contains(TOKEN));
        assert!(!printed.contains("full"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_session_is_all_or_nothing() {
        let anonymous = SessionContext::anonymous();
        assert!(!anonymous.is_authenticated());
        assert!(anonymous.token().is_none() && anonymous.claims().is_none());
        assert!(anonymous.to_payload().is_none());

        let session =
            SessionContext::authenticated(BearerToken::parse(TOKEN).unwrap(), json!({"a": 1}));
        assert!(session.token().is_some() && session.claims().is_some());
        assert_eq!(
            session.to_payload().unwrap(),
            json!({"access_token": TOKEN, "claims": {"a": 1}})
        );
    }

    #[test]
    fn test_credentials_from_extras() {
        let extras = json!({"username": "me@example.com", "password": "pw"});
        let creds = Credentials::from_extras(Some(&extras)).unwrap();
        assert_eq!(creds.identifier(), "me@example.com");
        assert_eq!(creds.secret(), "pw");

        let extras = json!({"email": "me@example.com", "password": "pw"});
        assert!(Credentials::from_extras(Some(&extras)).is_some());

        let extras = json!({"username": "me@example.com"});
        assert!(Credentials::from_extras(Some(&extras)).is_none());
        let extras = json!({"username": "", "password": "pw"});
        assert!(Credentials::from_extras(Some(&extras)).is_none());
        assert!(Credentials::from_extras(None).is_none());
    }
}
