//! Session token validation.
//! The Livoltek login returns a JWT. It is only decoded locally to decide
//! whether it can be reused; the signature is the server's business.
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Registered claims read from a session token.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Expiry (unix timestamp in seconds).
    pub exp: Option<i64>,
    /// Issued at (unix timestamp in seconds).
    pub iat: Option<i64>,
}

impl TokenClaims {
    /// Expiry as a date time, if the token carries one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Issuance as a date time, if the token carries one.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|iat| DateTime::from_timestamp(iat, 0))
    }
}

/// Returns `true` if `token` is a well-formed JWT that has not expired yet.
pub fn is_valid_token(token: &str) -> bool {
    is_valid_token_at(token, Utc::now())
}

/// Same as [`is_valid_token`] with an explicit current time.
pub fn is_valid_token_at(token: &str, now: DateTime<Utc>) -> bool {
    let claims = match decode_claims(token) {
        Ok(claims) => claims,
        Err(reason) => {
            log::debug!("Invalid session token: {reason}");
            return false;
        }
    };
    match claims.exp {
        Some(exp) if exp <= now.timestamp() => {
            log::debug!("Invalid session token: expired at {exp}");
            false
        }
        _ => true,
    }
}

/// Decode the claims of a JWT without verifying its signature.
pub fn decode_claims(token: &str) -> Result<TokenClaims, String> {
    let token = token.trim();
    if token.is_empty() {
        return Err("empty token".to_string());
    }

    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, _signature] = segments.as_slice() else {
        return Err(format!("expected 3 segments, got {}", segments.len()));
    };

    let header = decode_segment(header).map_err(|e| format!("header: {e}"))?;
    if !header.is_object() {
        return Err("header is not a JSON object".to_string());
    }

    let payload = decode_segment(payload).map_err(|e| format!("payload: {e}"))?;
    if !payload.is_object() {
        return Err("payload is not a JSON object".to_string());
    }
    serde_json::from_value(payload).map_err(|e| format!("claims: {e}"))
}

fn decode_segment(segment: &str) -> Result<Value, String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| e.to_string())?;
    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use rstest::rstest;
    use serde_json::json;

    fn encode(value: &Value) -> String {
        URL_SAFE_NO_PAD.encode(value.to_string())
    }

    fn token_with_payload(payload: Value) -> String {
        let header = json!({"alg": "HS256", "typ": "JWT"});
        format!("{}.{}.c2lnbmF0dXJl", encode(&header), encode(&payload))
    }

    #[test]
    fn test_valid_token_before_expiry() {
        let now = Utc::now();
        let exp = (now + TimeDelta::hours(1)).timestamp();
        let token = token_with_payload(json!({"exp": exp, "iat": now.timestamp(), "sub": "1"}));

        assert!(is_valid_token_at(&token, now));
    }

    #[test]
    fn test_token_without_expiry_is_valid() {
        let token = token_with_payload(json!({"sub": "1"}));

        assert!(is_valid_token(&token));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let now = Utc::now();
        let exp = (now - TimeDelta::seconds(1)).timestamp();
        let token = token_with_payload(json!({"exp": exp}));

        assert!(!is_valid_token_at(&token, now));
    }

    #[test]
    fn test_token_expiring_now_is_invalid() {
        let now = Utc::now();
        let token = token_with_payload(json!({"exp": now.timestamp()}));

        assert!(!is_valid_token_at(&token, now));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("not-a-token")]
    #[case("a.b")]
    #[case("a.b.c.d")]
    #[case("!!!.???.sig")]
    #[case("eyJhbGciOiJIUzI1NiJ9.bm90IGpzb24.sig")]
    #[case("eyJhbGciOiJIUzI1NiJ9.WzEsMl0.sig")]
    fn test_malformed_token_is_invalid(#[case] token: &str) {
        assert!(!is_valid_token(token));
    }

    #[test]
    fn test_padded_segments_are_accepted() {
        let header = URL_SAFE_NO_PAD.encode(json!({"alg": "HS256"}).to_string());
        let payload = URL_SAFE_NO_PAD.encode(json!({"sub": "42"}).to_string());
        let token = format!("{header}==.{payload}=.sig");

        assert!(is_valid_token(&token));
    }

    #[test]
    fn test_decode_claims() {
        let token = token_with_payload(json!({"exp": 1_700_000_000, "iat": 1_699_990_000}));

        let claims = decode_claims(&token).unwrap();

        assert_eq!(claims.exp, Some(1_700_000_000));
        assert_eq!(claims.iat, Some(1_699_990_000));
        assert_eq!(
            claims.expires_at(),
            DateTime::from_timestamp(1_700_000_000, 0)
        );
        assert_eq!(
            claims.issued_at(),
            DateTime::from_timestamp(1_699_990_000, 0)
        );
    }
}
