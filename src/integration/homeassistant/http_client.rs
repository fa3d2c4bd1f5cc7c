//! Home Assistant HTTP client.
//! This is the lower level client for the Home Assistant REST API.

use failsafe::{
    backoff::{self, Constant},
    failure_policy::{self, ConsecutiveFailures},
    futures::CircuitBreaker,
};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use super::schemas::StateCreateOrUpdate;
use super::{Error, Result};

pub struct HttpClient {
    client: Client,
    token: String,
    base_url: Url,
    circuit_breaker: failsafe::StateMachine<ConsecutiveFailures<Constant>, ()>,
}

impl HttpClient {
    /// Creates a new instance of `HttpClient`.
    pub fn new(url: Url, token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .timeout(timeout)
            .build()?;
        Ok(HttpClient {
            client,
            token,
            base_url: url,
            circuit_breaker: Self::circuit_breaker(),
        })
    }

    /// Creates or updates the state of `entity_id`.
    pub async fn set_state(&self, entity_id: &str, state: &StateCreateOrUpdate) -> Result<()> {
        let url = self.state_url(entity_id)?;
        let body = serde_json::to_string(state)?;
        RetryIf::spawn(
            Self::retry_strategy(),
            || async {
                self.circuit_breaker
                    .call_with(
                        Self::is_recorded_error,
                        self.request_post_state(&url, entity_id, &body),
                    )
                    .await
                    .map_err(|err| match err {
                        failsafe::Error::Rejected => Error::RequestRejected,
                        failsafe::Error::Inner(e) => e,
                    })
            },
            Self::is_retryable_error,
        )
        .await
    }

    fn state_url(&self, entity_id: &str) -> Result<Url> {
        self.base_url
            .join(&format!("api/states/{entity_id}"))
            .map_err(|e| Error::InvalidUrl(format!("{entity_id}: {e}")))
    }

    async fn request_post_state(&self, url: &Url, entity_id: &str, body: &str) -> Result<()> {
        log::debug!("Sending post state request for entity '{entity_id}': {body}");
        self.client
            .post(url.clone())
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Creates a circuit breaker with a failure policy that allows up to 5 consecutive failures and will retry after 60 seconds.
    fn circuit_breaker() -> failsafe::StateMachine<ConsecutiveFailures<Constant>, ()> {
        let backoff = backoff::constant(Duration::from_secs(60));
        let policy = failure_policy::consecutive_failures(5, backoff);
        failsafe::Config::new().failure_policy(policy).build()
    }

    /// Create a retry strategy with exponential backoff starting at 10 milliseconds, with jitter, and a maximum of 3 retries.
    fn retry_strategy() -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(10).map(jitter).take(3)
    }

    /// Check if the error is a HTTP 4xx client error.
    fn is_client_error(error: &reqwest::Error) -> bool {
        error
            .status()
            .map(|status_code| StatusCode::is_client_error(&status_code))
            .unwrap_or(false)
    }

    // Predicate function for the retry strategy to determine if an error is retryable.
    fn is_retryable_error(error: &Error) -> bool {
        match error {
            Error::RequestFailed(err) => !HttpClient::is_client_error(err),
            Error::RequestRejected => false,
            Error::JsonSerializationFailed(_) => false,
            Error::InvalidUrl(_) => false,
        }
    }

    /// Predicate function for the circuit breaker to record errors that are not client errors.
    fn is_recorded_error(error: &Error) -> bool {
        match error {
            Error::RequestFailed(err) => !HttpClient::is_client_error(err),
            Error::RequestRejected => false,
            Error::JsonSerializationFailed(_) => false,
            Error::InvalidUrl(_) => false,
        }
    }
}
