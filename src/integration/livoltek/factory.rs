//! Livoltek client factory.
//! Resolves the regional endpoint and the session token, then hands out a
//! `Client` bound to both.
use reqwest::Url;
use std::sync::Arc;
use strum_macros::{Display, EnumString};

use super::http_client::HttpClient;
use super::{Client, Error, Result, auth, token};

pub const EMEA_ENDPOINT: &str = "https://api-eu.livoltek-portal.com:8081";
pub const GLOBAL_ENDPOINT: &str = "https://api.livoltek-portal.com:8081";

/// Livoltek server region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Region {
    /// Europe, Middle-East and Africa.
    Emea,
    #[default]
    Global,
}

impl Region {
    /// Region from the EMEA flag of the account configuration.
    pub fn from_emea_flag(emea: bool) -> Self {
        if emea { Region::Emea } else { Region::Global }
    }

    /// Default endpoint of the region.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Region::Emea => EMEA_ENDPOINT,
            Region::Global => GLOBAL_ENDPOINT,
        }
    }
}

/// Account credential used to log in.
#[derive(Clone, PartialEq)]
pub struct Credential {
    pub account_id: String,
    pub secret: String,
    pub region: Region,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("account_id", &self.account_id)
            .field("secret", &"***")
            .field("region", &self.region)
            .finish()
    }
}

pub struct ClientFactory {
    http: Arc<HttpClient>,
    endpoint_override: Option<Url>,
}

impl ClientFactory {
    /// Creates a factory whose clients share `http`.
    pub fn new(http: Arc<HttpClient>) -> Self {
        ClientFactory {
            http,
            endpoint_override: None,
        }
    }

    /// Talk to `url` instead of the regional endpoint.
    pub fn with_endpoint(mut self, url: Url) -> Self {
        self.endpoint_override = Some(url);
        self
    }

    /// Endpoint used for `region`.
    pub fn resolve_endpoint(&self, region: Region) -> Result<Url> {
        match &self.endpoint_override {
            Some(url) => Ok(url.clone()),
            None => Url::parse(region.endpoint())
                .map_err(|e| Error::InvalidEndpoint(format!("{}: {e}", region.endpoint()))),
        }
    }

    /// Get a client for `credential`, reusing `cached_token` when it is still valid.
    /// Returns the client together with the token it carries so the caller can cache it.
    pub async fn get_client(
        &self,
        credential: &Credential,
        cached_token: Option<&str>,
    ) -> Result<(Client, String)> {
        let base_url = self.resolve_endpoint(credential.region)?;

        let token = match cached_token {
            Some(token) if token::is_valid_token(token) => token.to_string(),
            _ => {
                log::info!("No valid session token, logging in to {base_url}");
                auth::login(
                    &self.http,
                    &base_url,
                    &credential.secret,
                    &credential.account_id,
                )
                .await?
            }
        };

        let client = Client::new(Arc::clone(&self.http), base_url, token.clone());
        Ok((client, token))
    }
}
