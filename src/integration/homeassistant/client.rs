//! Home Assistant Client.
//! This client is the higher level API client for Home Assistant.

use reqwest::Url;
use std::time::Duration;

use super::Result;
use super::http_client::HttpClient;
use super::schemas::{StateCreateOrUpdate, UNKNOWN_STATE};

/// A sensor state as shown in Home Assistant.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub entity_id: String,
    pub friendly_name: String,
    pub value: Option<f64>,
    /// Number of decimals of the published state.
    pub precision: usize,
    pub unit_of_measurement: Option<String>,
    pub device_class: Option<String>,
    pub state_class: Option<String>,
}

pub struct Client {
    http: HttpClient,
}

impl Client {
    /// Creates a new instance of `Client`.
    pub fn new(url: Url, token: String, timeout: Duration) -> Result<Self> {
        let http = HttpClient::new(url, token, timeout)?;
        Ok(Client { http })
    }

    /// Set the state of a sensor in Home Assistant.
    pub async fn set_sensor(&self, sensor: &Sensor) -> Result<()> {
        let state = Self::create_sensor_state(sensor);
        self.http.set_state(&sensor.entity_id, &state).await
    }

    /// Create the state body of a sensor.
    fn create_sensor_state(sensor: &Sensor) -> StateCreateOrUpdate {
        let state = match sensor.value {
            Some(value) => format!("{value:.prec$}", prec = sensor.precision),
            None => UNKNOWN_STATE.to_string(),
        };

        let mut attributes = vec![("friendly_name".to_string(), sensor.friendly_name.clone())];
        let optional = [
            ("unit_of_measurement", &sensor.unit_of_measurement),
            ("device_class", &sensor.device_class),
            ("state_class", &sensor.state_class),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                attributes.push((name.to_string(), value.clone()));
            }
        }

        StateCreateOrUpdate {
            state,
            attributes: Some(attributes.into_iter().collect()),
        }
    }
}
