//! Livoltek login.
use reqwest::Url;

use super::http_client::HttpClient;
use super::schemas::{ApiResponse, LoginPayload, LoginRequest, SUCCESS};
use super::{Error, Result, endpoint};

/// Exchange the account credential for a session token.
pub async fn login(
    http: &HttpClient,
    base_url: &Url,
    secret: &str,
    account_id: &str,
) -> Result<String> {
    let url = endpoint::url(base_url, endpoint::LOGIN)?;
    let key = normalize_secret(secret);
    let body = LoginRequest {
        secuid: account_id,
        key: &key,
    };

    log::debug!("Sending login request for account {account_id}");
    let value = http.post(&url, &body).await.map_err(|err| match err {
        Error::Unauthorized => Error::AuthenticationFailed("credentials rejected".to_string()),
        err => err,
    })?;
    let response: ApiResponse<LoginPayload> = serde_json::from_value(value)?;

    if response.message.as_deref() != Some(SUCCESS) {
        let message = response
            .message
            .unwrap_or_else(|| "no message received".to_string());
        log::debug!("Login failed: {message}");
        return Err(Error::AuthenticationFailed(message));
    }

    let token = response
        .data
        .and_then(LoginPayload::into_token)
        .filter(|token| !token.trim().is_empty())
        .ok_or(Error::EmptyToken)?;
    log::debug!("Login successful");
    Ok(token)
}

/// Turn literal `\r` and `\n` escapes into the characters they stand for.
/// API keys are PEM-like and tend to be pasted with escaped line breaks.
pub fn normalize_secret(secret: &str) -> String {
    secret.replace("\\r", "\r").replace("\\n", "\n")
}
