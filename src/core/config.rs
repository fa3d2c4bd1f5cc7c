//! Application configuration loaded from environment variables.
use envconfig::Envconfig;
use humantime::Duration;
use reqwest::Url;

use crate::integration::livoltek::{Credential, Region};
use crate::services::LivoltekSettings;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Envconfig)]
pub struct Config {
    #[allow(dead_code)]
    #[envconfig(from = "APP_LOG", default = "error")]
    pub app_log: String,
    #[allow(dead_code)]
    #[envconfig(from = "APP_LOG_STYLE", default = "always")]
    pub app_log_style: String,
    #[envconfig(from = "LIVOLTEK_EMEA", default = "false")]
    pub livoltek_emea: bool,
    /// Replaces the regional endpoint when set.
    #[envconfig(from = "LIVOLTEK_URL")]
    pub livoltek_url: Option<Url>,
    #[envconfig(from = "LIVOLTEK_SECUID")]
    pub livoltek_secuid: String,
    #[envconfig(from = "LIVOLTEK_API_KEY")]
    pub livoltek_api_key: String,
    #[envconfig(from = "LIVOLTEK_USER_TOKEN")]
    pub livoltek_user_token: String,
    #[envconfig(from = "LIVOLTEK_SITE_ID")]
    pub livoltek_site_id: String,
    #[envconfig(from = "LIVOLTEK_POLL_INTERVAL", default = "5m")]
    pub livoltek_poll_interval: Duration,
    #[envconfig(from = "LIVOLTEK_DEVICE_TIMEOUT", default = "10s")]
    pub livoltek_device_timeout: Duration,
    #[envconfig(from = "LIVOLTEK_REQUEST_TIMEOUT", default = "10s")]
    pub livoltek_request_timeout: Duration,
    #[envconfig(from = "HOMEASSISTANT_URL")]
    pub homeassistant_url: Url,
    #[envconfig(from = "HOMEASSISTANT_TOKEN")]
    pub homeassistant_token: String,
}

impl Config {
    pub fn region(&self) -> Region {
        Region::from_emea_flag(self.livoltek_emea)
    }

    pub fn credential(&self) -> Credential {
        Credential {
            account_id: self.livoltek_secuid.clone(),
            secret: self.livoltek_api_key.clone(),
            region: self.region(),
        }
    }

    pub fn livoltek_settings(&self) -> LivoltekSettings {
        LivoltekSettings {
            credential: self.credential(),
            user_token: self.livoltek_user_token.clone(),
            site_id: self.livoltek_site_id.clone(),
            device_timeout: self.livoltek_device_timeout.into(),
        }
    }
}

pub fn configure_logger() {
    let env = env_logger::Env::default()
        .filter_or("APP_LOG", "info")
        .write_style_or("APP_LOG_STYLE", "always");
    env_logger::init_from_env(env);
}
