//! Livoltek HTTP client.
//! This is the lower level client for the Livoltek cloud API: JSON transport
//! with retries and a circuit breaker shared by every request.

use failsafe::{
    backoff::{self, Constant},
    failure_policy::{self, ConsecutiveFailures},
    futures::CircuitBreaker,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use super::error::is_client_error;
use super::{Error, Result};

pub struct HttpClient {
    client: Client,
    circuit_breaker: failsafe::StateMachine<ConsecutiveFailures<Constant>, ()>,
}

impl HttpClient {
    /// Creates a new instance of `HttpClient` with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .timeout(timeout)
            .build()?;
        Ok(HttpClient {
            client,
            circuit_breaker: Self::circuit_breaker(),
        })
    }

    /// GET `url` with the session token and return the JSON body.
    pub async fn get(&self, url: &Url, authorization: &str) -> Result<Value> {
        self.call(|| self.request_get(url, authorization)).await
    }

    /// POST `body` as JSON to `url` and return the JSON body.
    pub async fn post<B: Serialize>(&self, url: &Url, body: &B) -> Result<Value> {
        let body = serde_json::to_string(body)?;
        self.call(|| self.request_post(url, &body)).await
    }

    /// Run one request through the circuit breaker, retrying transient failures.
    async fn call<F, Fut>(&self, request: F) -> Result<Value>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        RetryIf::spawn(
            Self::retry_strategy(),
            || async {
                self.circuit_breaker
                    .call_with(Self::is_recorded_error, request())
                    .await
                    .map_err(|err| match err {
                        failsafe::Error::Inner(e) => e,
                        failsafe::Error::Rejected => Error::RequestRejected,
                    })
            },
            Self::is_retryable_error,
        )
        .await
    }

    async fn request_get(&self, url: &Url, authorization: &str) -> Result<Value> {
        log::debug!("Sending GET request to {}", url.path());
        let response = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn request_post(&self, url: &Url, body: &str) -> Result<Value> {
        log::debug!("Sending POST request to {}", url.path());
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn read_json(response: Response) -> Result<Value> {
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }
        let text = response.error_for_status()?.text().await?;
        log::trace!("Response body: {text}");
        Ok(serde_json::from_str(&text)?)
    }

    /// Creates a circuit breaker with a failure policy that allows up to 3 consecutive failures and will retry after 60 seconds.
    fn circuit_breaker() -> failsafe::StateMachine<ConsecutiveFailures<Constant>, ()> {
        let backoff = backoff::constant(Duration::from_secs(60));
        let policy = failure_policy::consecutive_failures(3, backoff);
        failsafe::Config::new().failure_policy(policy).build()
    }

    /// Create a retry strategy with exponential backoff starting at 10 milliseconds, with jitter, and a maximum of 3 retries.
    fn retry_strategy() -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(10).map(jitter).take(3)
    }

    // Predicate function for the retry strategy to determine if an error is retryable.
    fn is_retryable_error(error: &Error) -> bool {
        match error {
            Error::ConnectionFailed(err) => !is_client_error(err),
            _ => false,
        }
    }

    /// Predicate function for the circuit breaker to record errors that are not client errors.
    fn is_recorded_error(error: &Error) -> bool {
        match error {
            Error::ConnectionFailed(err) => !is_client_error(err),
            _ => false,
        }
    }
}
