//! Livoltek API paths.
use reqwest::Url;

use super::{Error, Result};

pub const LOGIN: &str = "/hess/api/login";
pub const USER_SITES: &str = "/hess/api/userSites/list";

/// Default page size of the list endpoints.
pub const PAGE_SIZE: u32 = 10;

pub fn site_overview(site_id: &str) -> String {
    format!("/hess/api/site/{site_id}/overview")
}

pub fn current_power_flow(site_id: &str) -> String {
    format!("/hess/api/site/{site_id}/curPowerflow")
}

pub fn device_list(site_id: &str) -> String {
    format!("/hess/api/device/{site_id}/list")
}

pub fn device_details(site_id: &str, serial: &str) -> String {
    format!("/hess/api/device/{site_id}/{serial}/details")
}

pub fn recent_grid(site_id: &str) -> String {
    format!("/hess/api/site/{site_id}/recentEnergyImportExport")
}

pub fn recent_solar(site_id: &str) -> String {
    format!("/hess/api/site/{site_id}/recentSolarGeneratedEnergy")
}

/// Join `path` onto the API base URL.
pub fn url(base_url: &Url, path: &str) -> Result<Url> {
    base_url
        .join(path)
        .map_err(|e| Error::InvalidEndpoint(format!("{base_url}{path}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url() {
        let base = Url::parse("https://api-eu.livoltek-portal.com:8081").unwrap();

        let url = url(&base, &device_details("42", "SN001")).unwrap();

        assert_eq!(
            url.as_str(),
            "https://api-eu.livoltek-portal.com:8081/hess/api/device/42/SN001/details"
        );
    }
}
