use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use toutv_parser::extractor::HttpConfig;
use toutv_parser::extractor::platforms::toutv::TouTvEndpoints;

use crate::error::{CliError, Result};

/// Settings read from `config.toml`. Passwords are never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
    /// Default account email, used when `--username` is not given
    pub username: Option<String>,
    pub endpoints: TouTvEndpoints,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timeout_secs: HttpConfig::default().timeout_secs,
            user_agent: None,
            username: None,
            endpoints: TouTvEndpoints::default(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("toutv").join("config.toml"))
    }

    fn resolve_path(path: Option<&Path>) -> Option<PathBuf> {
        path.map(Path::to_path_buf).or_else(Self::default_path)
    }

    /// Loads the configuration; a missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = Self::resolve_path(path) else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn reset(path: Option<&Path>) -> Result<PathBuf> {
        let path = Self::resolve_path(path)
            .ok_or_else(|| CliError::Config("no configuration directory available".into()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, Self::default().show()?)?;
        Ok(path)
    }

    pub fn show(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn http_config(&self) -> HttpConfig {
        let defaults = HttpConfig::default();
        HttpConfig {
            timeout_secs: self.timeout_secs,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "timeout_secs = 5\nusername = \"me@example.com\"\n[endpoints]\nclaims = \"http://localhost/claims\"\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.username.as_deref(), Some("me@example.com"));
        assert_eq!(config.endpoints.claims, "http://localhost/claims");
        assert_eq!(config.endpoints.app_js, TouTvEndpoints::default().app_js);
        assert_eq!(config.http_config().timeout_secs, 5);

        AppConfig::reset(Some(&path)).unwrap();
        assert_eq!(AppConfig::load(Some(&path)).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout_secs = \"soon\"").unwrap();
        assert!(matches!(
            AppConfig::load(Some(&path)),
            Err(CliError::Config(_))
        ));
    }
}
