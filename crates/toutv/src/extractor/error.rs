use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("http error {status} for {url}")]
    HttpError { status: StatusCode, url: String },
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("unsupported extractor")]
    UnsupportedExtractor,
}

impl ExtractorError {
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::ParseError(_))
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<url::ParseError> for ExtractorError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}
