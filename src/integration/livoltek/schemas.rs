//! Livoltek API Schemas
//! The schemas module defines the data structures returned by the Livoltek API.
//! Only the documented fields are read; anything else in a payload is ignored.
use serde::{Deserialize, Serialize};

use super::{Error, Result};

/// Message of a successful response envelope.
pub const SUCCESS: &str = "SUCCESS";

/// Envelope wrapping every Livoltek response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(alias = "msg")]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Returns `true` unless the server reported a message other than `SUCCESS`.
    pub fn is_success(&self) -> bool {
        self.message
            .as_deref()
            .is_none_or(|message| message.eq_ignore_ascii_case(SUCCESS))
    }

    /// Unwrap the data section of a successful response.
    pub fn into_data(self) -> Result<T> {
        if !self.is_success() {
            return Err(Error::ApiError(self.message.unwrap_or_default()));
        }
        self.data
            .ok_or_else(|| Error::ApiError("response without data".to_string()))
    }
}

/// Login request body.
#[derive(Debug, Serialize, PartialEq)]
pub struct LoginRequest<'a> {
    pub secuid: &'a str,
    pub key: &'a str,
}

/// Data section of a login response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LoginPayload {
    Token(String),
    Nested { data: Option<String> },
}

impl LoginPayload {
    pub fn into_token(self) -> Option<String> {
        match self {
            LoginPayload::Token(token) => Some(token),
            LoginPayload::Nested { data } => data,
        }
    }
}

/// Paged list wrapper used by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
}

/// One site from the user's site list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    #[serde(alias = "siteId", alias = "site_id", deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(default, alias = "site_name", alias = "name")]
    pub site_name: Option<String>,
}

/// Site overview.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    #[serde(alias = "siteId", alias = "site_id", deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(default, alias = "site_name", alias = "name")]
    pub site_name: Option<String>,
}

/// Instantaneous power flow of a site. Power in kW, state of charge in %.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerFlow {
    #[serde(default, alias = "energy_soc", deserialize_with = "de::optional_f64")]
    pub energy_soc: Option<f64>,
    #[serde(default, alias = "power_grid_power", deserialize_with = "de::optional_f64")]
    pub power_grid_power: Option<f64>,
    #[serde(default, alias = "pv_power", deserialize_with = "de::optional_f64")]
    pub pv_power: Option<f64>,
    #[serde(default, alias = "load_power", deserialize_with = "de::optional_f64")]
    pub load_power: Option<f64>,
    #[serde(default, alias = "energy_power", deserialize_with = "de::optional_f64")]
    pub energy_power: Option<f64>,
}

/// Device list entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    #[serde(alias = "inverter_sn")]
    pub inverter_sn: String,
    #[serde(default, deserialize_with = "de::optional_string_or_number")]
    pub id: Option<String>,
}

/// Device details.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetails {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(alias = "inverter_sn")]
    pub inverter_sn: String,
    #[serde(default, alias = "device_manufacturer")]
    pub device_manufacturer: Option<String>,
    #[serde(default, alias = "product_type")]
    pub product_type: Option<String>,
    #[serde(default, alias = "firmware_version")]
    pub firmware_version: Option<String>,
}

/// A record of a daily history, stamped in milliseconds since the epoch.
pub trait DailyRecord {
    fn timestamp_millis(&self) -> i64;
}

/// Grid energy of one day in kWh. `positive` is imported, `negative` exported.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GridRecord {
    #[serde(alias = "timestamp", alias = "date", deserialize_with = "de::i64_or_string")]
    pub time: i64,
    #[serde(default, deserialize_with = "de::optional_f64")]
    pub positive: Option<f64>,
    #[serde(default, deserialize_with = "de::optional_f64")]
    pub negative: Option<f64>,
}

impl DailyRecord for GridRecord {
    fn timestamp_millis(&self) -> i64 {
        self.time
    }
}

/// Solar generation of one day in kWh.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarRecord {
    #[serde(alias = "timestamp", alias = "date", deserialize_with = "de::i64_or_string")]
    pub time: i64,
    #[serde(default, alias = "power_generation", deserialize_with = "de::optional_f64")]
    pub power_generation: Option<f64>,
}

impl DailyRecord for SolarRecord {
    fn timestamp_millis(&self) -> i64 {
        self.time
    }
}

/// Lenient field deserializers. The API is inconsistent about quoting numbers.
mod de {
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Scalar::deserialize(deserializer)? {
            Scalar::Int(value) => Ok(value.to_string()),
            Scalar::Float(value) => Ok(value.to_string()),
            Scalar::Text(value) => Ok(value),
        }
    }

    pub fn optional_string_or_number<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Scalar>::deserialize(deserializer)? {
            Some(Scalar::Int(value)) => Some(value.to_string()),
            Some(Scalar::Float(value)) => Some(value.to_string()),
            Some(Scalar::Text(value)) => Some(value),
            None => None,
        })
    }

    pub fn i64_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Scalar::deserialize(deserializer)? {
            Scalar::Int(value) => Ok(value),
            Scalar::Float(value) => Ok(value as i64),
            Scalar::Text(value) => value
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid integer: {value}"))),
        }
    }

    /// Unparseable or non-finite values become `None` rather than failing the whole payload.
    pub fn optional_f64<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        let value = match Option::<Scalar>::deserialize(deserializer)? {
            Some(Scalar::Int(value)) => Some(value as f64),
            Some(Scalar::Float(value)) => Some(value),
            Some(Scalar::Text(value)) => value.trim().parse().ok(),
            None => None,
        };
        Ok(value.filter(|v: &f64| v.is_finite()))
    }
}
