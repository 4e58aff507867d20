use thiserror::Error;
use toutv_parser::extractor::error::ExtractorError;
use toutv_parser::extractor::platforms::toutv::LoginError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Extractor(#[from] ExtractorError),
    #[error(transparent)]
    Login(#[from] LoginError),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing credentials: pass --username/--password or set TOUTV_USERNAME/TOUTV_PASSWORD")]
    MissingCredentials,
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
