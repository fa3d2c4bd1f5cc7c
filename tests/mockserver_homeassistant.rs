//! Mock server for Home Assistant API
#![allow(dead_code)]
use httpmock::{Method::POST, Mock, MockServer};
use regex::Regex;
use reqwest::Url;
use serde_json::{Value, json};

/// Wrapper around `MockServer` for Home Assistant endpoint mocks.
pub struct HomeAssistantMockServer {
    pub server: MockServer,
}

impl HomeAssistantMockServer {
    /// Start and return a running MockServer for Home Assistant.
    pub async fn start() -> Self {
        let server = MockServer::start_async().await;
        HomeAssistantMockServer { server }
    }

    /// Get the base URL to use when constructing the client.
    pub fn url(&self) -> Url {
        Url::parse(&self.server.base_url()).expect("invalid mock server URL")
    }

    /// Token to use in Authorization headers in mocks.
    pub fn token(&self) -> String {
        String::from("test_token")
    }

    fn state_response(entity_id: &str, state: &str, attributes: &Value) -> Value {
        json!({
            "entity_id": entity_id,
            "state": state,
            "attributes": attributes,
            "last_changed": "2025-06-23T06:22:32.877327+00:00",
            "last_reported": "2025-06-23T06:22:32.877327+00:00",
            "last_updated": "2025-06-23T06:22:32.877327+00:00",
            "context": {
                "id": "X7TQ47E2AGDK5CWNR3VPYDJP01",
                "parent_id": null,
                "user_id": "b7c2e6d3f124c9e5f763a9821576c30"
            }
        })
    }

    /// Mock the set state of one sensor with the exact expected body.
    pub async fn mock_set_sensor<'a>(
        &'a self,
        entity_id: &str,
        state: &str,
        attributes: Value,
    ) -> Mock<'a> {
        let response = Self::state_response(entity_id, state, &attributes);
        self.server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("/api/states/{entity_id}"))
                    .header("Authorization", format!("Bearer {}", self.token()))
                    .header("Content-Type", "application/json")
                    .json_body(json!({"state": state, "attributes": attributes}));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(response);
            })
            .await
    }

    /// Mock the set state of the PV power sensor of site 42.
    pub async fn mock_set_pv_power<'a>(&'a self, state: &str) -> Mock<'a> {
        self.mock_set_sensor(
            "sensor.livoltek_42_pv_power",
            state,
            json!({
                "friendly_name": "PV Power",
                "unit_of_measurement": "kW",
                "device_class": "power",
                "state_class": "measurement"
            }),
        )
        .await
    }

    /// Mock the set state of any Livoltek sensor.
    pub async fn mock_set_any_sensor<'a>(&'a self) -> Mock<'a> {
        self.server
            .mock_async(|when, then| {
                when.method(POST)
                    .path_matches(Regex::new(r"^/api/states/sensor\.livoltek_.+$").unwrap())
                    .header("Authorization", format!("Bearer {}", self.token()));
                then.status(200).header("content-type", "application/json");
            })
            .await
    }

    /// Mock a server error on setting any state to test retry/circuit breaker.
    pub async fn mock_error_any_sensor<'a>(&'a self) -> Mock<'a> {
        self.server
            .mock_async(|when, then| {
                when.method(POST)
                    .path_matches(Regex::new(r"^/api/states/.+$").unwrap());
                then.status(500).header("content-type", "application/json");
            })
            .await
    }
}
