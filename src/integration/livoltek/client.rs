//! Livoltek Client.
//! This client is the higher level API client for Livoltek. It is bound to
//! one endpoint and one session token; see `ClientFactory` for obtaining one.
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use super::endpoint::{self, PAGE_SIZE};
use super::http_client::HttpClient;
use super::schemas::{
    ApiResponse, DeviceDetails, DeviceSummary, GridRecord, Page, PowerFlow, Site, SiteSummary,
    SolarRecord,
};
use super::Result;

pub struct Client {
    http: Arc<HttpClient>,
    base_url: Url,
    token: String,
}

impl Client {
    /// Creates a new instance of `Client`.
    pub fn new(http: Arc<HttpClient>, base_url: Url, token: String) -> Self {
        Client {
            http,
            base_url,
            token,
        }
    }

    /// The endpoint this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The session token sent as `Authorization` header.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// List the sites the user has access to.
    pub async fn list_sites(&self, user_token: &str) -> Result<Vec<SiteSummary>> {
        let value = self
            .get_paged(endpoint::USER_SITES, user_token)
            .await?;
        Ok(Self::extract_data::<Page<SiteSummary>>(value)?.list)
    }

    /// Get the site overview.
    pub async fn get_site(&self, user_token: &str, site_id: &str) -> Result<Site> {
        let value = self
            .get(&endpoint::site_overview(site_id), user_token)
            .await?;
        Self::extract_data(value)
    }

    /// Get the current power flow of the site.
    pub async fn get_current_power_flow(
        &self,
        user_token: &str,
        site_id: &str,
    ) -> Result<PowerFlow> {
        let value = self
            .get(&endpoint::current_power_flow(site_id), user_token)
            .await?;
        Self::extract_data(value)
    }

    /// List the devices of the site (first page).
    pub async fn get_device_list(
        &self,
        user_token: &str,
        site_id: &str,
    ) -> Result<Vec<DeviceSummary>> {
        let value = self
            .get_paged(&endpoint::device_list(site_id), user_token)
            .await?;
        Ok(Self::extract_data::<Page<DeviceSummary>>(value)?.list)
    }

    /// Get the details of one device by serial number.
    pub async fn get_device_details(
        &self,
        user_token: &str,
        site_id: &str,
        serial: &str,
    ) -> Result<DeviceDetails> {
        let value = self
            .get(&endpoint::device_details(site_id, serial), user_token)
            .await?;
        Self::extract_data(value)
    }

    /// Get the recent daily grid import/export history.
    pub async fn get_recent_grid(&self, user_token: &str, site_id: &str) -> Result<Vec<GridRecord>> {
        let value = self
            .get(&endpoint::recent_grid(site_id), user_token)
            .await?;
        Self::extract_data(value)
    }

    /// Get the recent daily solar generation history.
    pub async fn get_recent_solar(
        &self,
        user_token: &str,
        site_id: &str,
    ) -> Result<Vec<SolarRecord>> {
        let value = self
            .get(&endpoint::recent_solar(site_id), user_token)
            .await?;
        Self::extract_data(value)
    }

    async fn get(&self, path: &str, user_token: &str) -> Result<Value> {
        let mut url = endpoint::url(&self.base_url, path)?;
        url.query_pairs_mut().append_pair("userToken", user_token);
        self.http.get(&url, &self.token).await
    }

    async fn get_paged(&self, path: &str, user_token: &str) -> Result<Value> {
        let mut url = endpoint::url(&self.base_url, path)?;
        url.query_pairs_mut()
            .append_pair("userToken", user_token)
            .append_pair("page", "1")
            .append_pair("size", &PAGE_SIZE.to_string());
        self.http.get(&url, &self.token).await
    }

    /// Extract the data section of a response envelope.
    fn extract_data<T: DeserializeOwned>(value: Value) -> Result<T> {
        serde_json::from_value::<ApiResponse<T>>(value)?.into_data()
    }
}
