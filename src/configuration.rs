use std::num::{NonZeroU32, NonZeroU64};
use std::{env, time};

use anyhow::Context;
use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::ConnectOptions;
use tracing::log::LevelFilter;
use url::Url;

use crate::domain::{CrossRate, EmailAddress, RateFormula};
use crate::email_client::{AlertTemplate, EmailClient};
use crate::rate_client::RateClient;

/// Settings
#[derive(Clone, serde::Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub rate_source: RateSourceSettings,
    pub email_client: EmailClientSettings,
    pub alert: AlertSettings,
    pub rate_limit: RateLimitSettings,
}

impl Settings {
    /// Get settings from configuration files
    pub fn get_config() -> Result<Self, ConfigError> {
        let config_dir = env::current_dir()
            .map_err(|e| ConfigError::Message(format!("Failed to determine the current directory: {e}")))?
            .join("config");

        // Detect the running environment (default: `dev`)
        let env: Env = env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "dev".into())
            .try_into()
            .map_err(ConfigError::Message)?;

        // Read the configuration from files and environment variables
        Config::builder()
            // Base configuration file
            .add_source(File::from(config_dir.join("base.yaml")).required(true))
            // Environment-specific configuration file
            .add_source(
                File::from(config_dir.join(format!("{}.yaml", env.as_str()))).required(true),
            )
            // Environment variables (e.g., `RATE_ALERT__ALERT__THRESHOLD=0.1`
            // would set Settings.alert.threshold to 0.1)
            .add_source(
                Environment::with_prefix("RATE_ALERT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

/// Application settings
#[derive(Clone, serde::Deserialize)]
pub struct ApplicationSettings {
    pub app_host: String,
    pub app_port: u16,
    pub base_url: String,
}

/// Database settings
#[derive(Clone, serde::Deserialize)]
pub struct DatabaseSettings {
    username: String,
    password: SecretString,
    host: String,
    port: u16,
    database: String,
    require_ssl: bool,
    pub max_connections: u32,
}

impl DatabaseSettings {
    /// Generate options and flags that can be used to configure a database connection
    pub fn db_options(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        PgConnectOptions::new()
            .username(&self.username)
            .password(self.password.expose_secret())
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .ssl_mode(ssl_mode)
            .log_statements(LevelFilter::Trace)
    }
}

/// Exchange-rate provider settings
#[derive(Clone, serde::Deserialize)]
pub struct RateSourceSettings {
    pub base_url: String,
    pub api_key: SecretString,
    pub base_currency: String,
    pub quote_currency: String,
    pub timeout_millis: u64,
}

impl RateSourceSettings {
    /// Build the exchange-rate client
    pub fn client(self, cross_rate: CrossRate) -> anyhow::Result<RateClient> {
        let base_url = Url::parse(&self.base_url).context("Invalid rate provider base URL")?;
        RateClient::new(
            &base_url,
            self.api_key,
            self.base_currency,
            self.quote_currency,
            cross_rate,
            time::Duration::from_millis(self.timeout_millis),
        )
    }
}

/// Email client settings
#[derive(Clone, serde::Deserialize)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub api_key: SecretString,
    pub subject: String,
    pub template_id: Option<String>,
    pub timeout_millis: u64,
}

impl EmailClientSettings {
    /// Build the email client
    pub fn client(self, alert: &AlertSettings) -> anyhow::Result<EmailClient> {
        let base_url = Url::parse(&self.base_url).context("Invalid email API base URL")?;
        let sender = EmailAddress::parse(self.sender_email).map_err(anyhow::Error::msg)?;
        let template = AlertTemplate {
            subject: self.subject,
            template_id: self.template_id.filter(|id| !id.is_empty()),
            from_currency: alert.from_currency.clone(),
            to_currency: alert.to_currency.clone(),
        };
        EmailClient::new(
            base_url,
            sender,
            self.api_key,
            template,
            time::Duration::from_millis(self.timeout_millis),
        )
    }
}

/// Alert cycle settings
#[derive(Clone, serde::Deserialize)]
pub struct AlertSettings {
    pub from_currency: String,
    pub to_currency: String,
    /// Fixed rate between the provider's base currency and `from_currency`
    pub conversion_constant: f64,
    pub formula: RateFormula,
    /// Rates strictly above this value are favorable
    pub threshold: f64,
    /// Zero is rejected when the configuration is loaded
    pub period_secs: NonZeroU64,
}

impl AlertSettings {
    pub const fn cross_rate(&self) -> CrossRate {
        CrossRate {
            constant: self.conversion_constant,
            formula: self.formula,
        }
    }

    pub const fn period(&self) -> time::Duration {
        time::Duration::from_secs(self.period_secs.get())
    }
}

/// Per-client request limit on the HTTP server
#[derive(Clone, serde::Deserialize)]
pub struct RateLimitSettings {
    pub max_requests: NonZeroU32,
    pub window_secs: NonZeroU64,
}

impl RateLimitSettings {
    /// Interval after which one more request is allowed
    pub fn replenish_interval(&self) -> time::Duration {
        time::Duration::from_secs(self.window_secs.get()) / self.max_requests.get()
    }
}

/// Available runtime environments
#[derive(Debug)]
pub enum Env {
    Development,
    Production,
}

impl Env {
    /// Represent environment as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "dev",
            Self::Production => "prd",
        }
    }
}

impl TryFrom<String> for Env {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "dev" => Ok(Self::Development),
            "prd" => Ok(Self::Production),
            other => Err(format!(
                "`{other}` is not a supported environment. Use either `dev` or `prd`"
            )),
        }
    }
}
