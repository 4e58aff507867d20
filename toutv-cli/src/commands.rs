use serde_json::{Map, Value, json};
use toutv_parser::extractor::{HttpConfig, factory::ExtractorFactory, platforms::toutv::TouTv};
use toutv_parser::session::Credentials;
use tracing::{debug, info};

use crate::{
    cli::{AccountArgs, OutputFormat},
    config::AppConfig,
    error::{CliError, Result},
    output::OutputManager,
};

pub struct CommandExecutor {
    config: AppConfig,
    factory: ExtractorFactory,
    output_manager: OutputManager,
}

impl CommandExecutor {
    pub fn new(config: AppConfig, timeout: Option<u64>) -> Self {
        let mut http = config.http_config();
        if let Some(timeout) = timeout {
            http.timeout_secs = timeout;
        }
        Self {
            config,
            factory: ExtractorFactory::new(http),
            output_manager: OutputManager::new(cfg!(feature = "colored-output")),
        }
    }

    fn http_config(&self) -> &HttpConfig {
        self.factory.http_config()
    }

    /// Command-line values win over the configured default account.
    fn credentials(&self, account: &AccountArgs) -> Option<Credentials> {
        let username = account
            .username
            .as_deref()
            .or(self.config.username.as_deref())?;
        let password = account.password.as_deref()?;
        Some(Credentials::new(username, password))
    }

    fn extras(&self, credentials: Option<&Credentials>) -> Result<Value> {
        let mut extras = Map::new();
        extras.insert(
            "endpoints".to_string(),
            serde_json::to_value(&self.config.endpoints)?,
        );
        if let Some(credentials) = credentials {
            extras.insert("username".to_string(), json!(credentials.identifier()));
            extras.insert("password".to_string(), json!(credentials.secret()));
        }
        Ok(Value::Object(extras))
    }

    pub async fn extract(
        &self,
        url: &str,
        account: &AccountArgs,
        cookies: Option<String>,
        format: &OutputFormat,
        show_session: bool,
    ) -> Result<()> {
        let credentials = self.credentials(account);
        debug!(
            authenticated = credentials.is_some(),
            "Creating extractor for {}", url
        );

        let extras = self.extras(credentials.as_ref())?;
        let extractor = self
            .factory
            .create_extractor(url, cookies, Some(extras))?;
        let reference = extractor.extract().await?;

        info!(id = %reference.id, "Resolved {}", reference.title);
        let output = self
            .output_manager
            .format_reference(&reference, format, show_session)?;
        println!("{output}");
        Ok(())
    }

    pub async fn login(&self, account: &AccountArgs) -> Result<()> {
        let credentials = self
            .credentials(account)
            .ok_or(CliError::MissingCredentials)?;

        let toutv = TouTv::new(
            TouTv::BASE_URL.to_string(),
            self.http_config(),
            None,
            Some(self.extras(None)?),
        )?;
        let session = toutv.login(&credentials).await?;

        let token = session
            .token()
            .map(|token| token.redacted())
            .unwrap_or_default();
        println!("✓ Logged in as {}", credentials.identifier());
        println!("  token: {token}");
        if let Some(claims) = session.claims() {
            println!("  claims: {} bytes", claims.to_string().len());
        }
        Ok(())
    }

    pub fn list_platforms(&self) {
        println!("Supported platforms:");
        for name in self.factory.supported_platforms() {
            println!("  - {name}");
        }
    }
}
