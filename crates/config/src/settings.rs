use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub smtp: SmtpSettings,
    pub sms: SmsSettings,
    pub notifier: NotifierSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

/// Carrier credentials are all optional: a deployment without them runs
/// email-only and SMS channels degrade to a recorded error.
#[derive(Debug, Deserialize, Clone)]
pub struct SmsSettings {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifierSettings {
    pub base_url: String,
    pub brand: String,
    pub sweep_interval_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("TRAINO"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "traino")?
            .set_default("smtp.host", "smtp.example.com")?
            .set_default("smtp.port", 587)?
            .set_default("smtp.secure", false)?
            .set_default("smtp.username", "")?
            .set_default("smtp.password", "")?
            .set_default("smtp.from_address", "Traino <no-reply@traino.io>")?
            .set_default("sms.account_sid", None::<String>)?
            .set_default("sms.auth_token", None::<String>)?
            .set_default("sms.from_number", None::<String>)?
            .set_default("notifier.base_url", "http://localhost:5173")?
            .set_default("notifier.brand", "Traino")?
            .set_default("notifier.sweep_interval_secs", 60)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::load().expect("Failed to load default settings")
    }
}
