//! Access token wire model.
//!
//! The token service exists in two generations with different JSON field
//! names; both decode into the same [`AccessToken`]. Fields beyond the QR
//! image and expiry are informational and carry no control-flow weight.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::ApiFlavor;
use crate::error::{Result, TokenError};

/// A decoded access token for one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Temporary unique identifier of the token.
    pub id: Option<String>,
    /// Location name echoed by the service, display-only.
    pub location: Option<String>,
    /// Issued-at time, only present in the `Tokens` flavor.
    pub issued_at: Option<DateTime<Utc>>,
    /// Instant after which the token is no longer valid. Drives the
    /// refresh scheduling.
    pub expires_at: DateTime<Utc>,
    /// Remaining refresh cycles the server grants this token.
    pub valid: Option<i64>,
    /// Decoded QR code image (PNG bytes).
    pub png: Vec<u8>,
}

impl AccessToken {
    /// Decode a response body in the given wire flavor.
    ///
    /// An empty body maps to [`TokenError::EmptyResponse`] (transient); a
    /// body of the shape `{"err": ...}` maps to [`TokenError::Api`];
    /// anything else that fails to decode is a malformed response.
    pub fn parse(body: &str, flavor: ApiFlavor) -> Result<Self> {
        let body = body.trim();
        if body.is_empty() {
            return Err(TokenError::EmptyResponse);
        }

        let value: Value = serde_json::from_str(body)
            .map_err(|e| TokenError::malformed(format!("invalid JSON: {e}")))?;

        if let Some(message) = value.get("err").and_then(Value::as_str) {
            return Err(TokenError::api(message));
        }

        match flavor {
            ApiFlavor::Tokens => Self::from_tokens(&value),
            ApiFlavor::Legacy => Self::from_legacy(&value),
        }
    }

    fn from_tokens(value: &Value) -> Result<Self> {
        let qr = value
            .get("qr")
            .and_then(Value::as_str)
            .ok_or_else(|| TokenError::malformed("missing `qr` field"))?;
        let exp = value
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or_else(|| TokenError::malformed("missing `exp` field"))?;
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or_else(|| TokenError::malformed(format!("`exp` out of range: {exp}")))?;

        let issued_at = value
            .get("iat")
            .and_then(Value::as_i64)
            .and_then(|iat| Utc.timestamp_opt(iat, 0).single());

        Ok(Self {
            id: value.get("id").and_then(Value::as_str).map(String::from),
            location: value.get("loc").and_then(Value::as_str).map(String::from),
            issued_at,
            expires_at,
            valid: value.get("valid").and_then(Value::as_i64),
            png: decode_qr(qr)?,
        })
    }

    fn from_legacy(value: &Value) -> Result<Self> {
        let qr = value
            .get("Qr")
            .and_then(Value::as_str)
            .ok_or_else(|| TokenError::malformed("missing `Qr` field"))?;
        let expires = value
            .get("Expires")
            .and_then(Value::as_str)
            .ok_or_else(|| TokenError::malformed("missing `Expires` field"))?;
        let expires_at = DateTime::parse_from_rfc3339(expires)
            .map_err(|e| TokenError::malformed(format!("invalid `Expires` datetime: {e}")))?
            .with_timezone(&Utc);

        Ok(Self {
            id: value.get("Id").and_then(Value::as_str).map(String::from),
            location: value
                .get("Location")
                .and_then(Value::as_str)
                .map(String::from),
            issued_at: None,
            expires_at,
            valid: value.get("Valid").and_then(Value::as_i64),
            png: decode_qr(qr)?,
        })
    }

    /// Delay until the next fetch: time remaining until expiry, floored at
    /// `floor` so a token that already expired (fetch raced the server's
    /// rotation) still waits a small positive amount.
    pub fn refresh_delay(&self, now: DateTime<Utc>, floor: Duration) -> Duration {
        match (self.expires_at - now).to_std() {
            Ok(remaining) => remaining.max(floor),
            Err(_) => floor,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

fn decode_qr(qr: &str) -> Result<Vec<u8>> {
    let png = STANDARD
        .decode(qr)
        .map_err(|e| TokenError::malformed(format!("invalid base64 QR image: {e}")))?;
    if png.is_empty() {
        return Err(TokenError::malformed("empty QR image"));
    }
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47];

    fn qr_base64() -> String {
        STANDARD.encode(PNG_MAGIC)
    }

    #[test]
    fn parses_tokens_flavor() {
        let body = format!(
            r#"{{"id":"a1b2c3","iat":1700000000,"exp":1700000500,"valid":1,"loc":"Library","qr":"{}"}}"#,
            qr_base64()
        );
        let token = AccessToken::parse(&body, ApiFlavor::Tokens).unwrap();
        assert_eq!(token.id.as_deref(), Some("a1b2c3"));
        assert_eq!(token.location.as_deref(), Some("Library"));
        assert_eq!(token.expires_at.timestamp(), 1_700_000_500);
        assert_eq!(token.issued_at.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(token.valid, Some(1));
        assert_eq!(token.png, PNG_MAGIC);
    }

    #[test]
    fn parses_tokens_flavor_without_optional_fields() {
        let body = format!(r#"{{"exp":1700000500,"qr":"{}"}}"#, qr_base64());
        let token = AccessToken::parse(&body, ApiFlavor::Tokens).unwrap();
        assert_eq!(token.id, None);
        assert_eq!(token.location, None);
        assert_eq!(token.issued_at, None);
        assert_eq!(token.valid, None);
    }

    #[test]
    fn parses_legacy_flavor() {
        let body = format!(
            r#"{{"Id":"xyz","Location":"Cafeteria","Expires":"2023-11-14T22:21:40+00:00","Valid":2,"Qr":"{}"}}"#,
            qr_base64()
        );
        let token = AccessToken::parse(&body, ApiFlavor::Legacy).unwrap();
        assert_eq!(token.id.as_deref(), Some("xyz"));
        assert_eq!(token.location.as_deref(), Some("Cafeteria"));
        assert_eq!(token.expires_at.timestamp(), 1_700_000_500);
        assert_eq!(token.valid, Some(2));
        assert_eq!(token.png, PNG_MAGIC);
    }

    #[test]
    fn empty_body_is_transient() {
        let err = AccessToken::parse("  \n", ApiFlavor::Tokens).unwrap_err();
        assert!(matches!(err, TokenError::EmptyResponse));
        assert!(err.is_transient());
    }

    #[test]
    fn err_body_maps_to_api_error() {
        let err = AccessToken::parse(
            r#"{"err":"no valid token found for this location"}"#,
            ApiFlavor::Tokens,
        )
        .unwrap_err();
        match err {
            TokenError::Api { message } => {
                assert_eq!(message, "no valid token found for this location");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = AccessToken::parse("<html>not json</html>", ApiFlavor::Tokens).unwrap_err();
        assert!(matches!(err, TokenError::MalformedResponse { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn missing_qr_is_malformed() {
        let err = AccessToken::parse(r#"{"exp":1700000500}"#, ApiFlavor::Tokens).unwrap_err();
        assert!(matches!(err, TokenError::MalformedResponse { .. }));
    }

    #[test]
    fn invalid_base64_is_malformed() {
        let err = AccessToken::parse(
            r#"{"exp":1700000500,"qr":"not base64!!!"}"#,
            ApiFlavor::Tokens,
        )
        .unwrap_err();
        assert!(matches!(err, TokenError::MalformedResponse { .. }));
    }

    #[test]
    fn invalid_legacy_datetime_is_malformed() {
        let body = format!(r#"{{"Expires":"yesterday","Qr":"{}"}}"#, qr_base64());
        let err = AccessToken::parse(&body, ApiFlavor::Legacy).unwrap_err();
        assert!(matches!(err, TokenError::MalformedResponse { .. }));
    }

    #[test]
    fn refresh_delay_uses_time_until_expiry() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let body = format!(r#"{{"exp":1700000500,"qr":"{}"}}"#, qr_base64());
        let token = AccessToken::parse(&body, ApiFlavor::Tokens).unwrap();
        assert_eq!(
            token.refresh_delay(now, Duration::from_millis(500)),
            Duration::from_secs(500)
        );
        assert!(!token.is_expired(now));
    }

    #[test]
    fn refresh_delay_floors_expired_tokens() {
        let now = Utc.timestamp_opt(1_700_000_600, 0).unwrap();
        let body = format!(r#"{{"exp":1700000500,"qr":"{}"}}"#, qr_base64());
        let token = AccessToken::parse(&body, ApiFlavor::Tokens).unwrap();
        assert_eq!(
            token.refresh_delay(now, Duration::from_millis(500)),
            Duration::from_millis(500)
        );
        assert!(token.is_expired(now));
    }

    #[test]
    fn refresh_delay_floors_delays_below_the_minimum() {
        let now = Utc.timestamp_opt(1_700_000_500, 0).unwrap() - chrono::Duration::milliseconds(20);
        let body = format!(r#"{{"exp":1700000500,"qr":"{}"}}"#, qr_base64());
        let token = AccessToken::parse(&body, ApiFlavor::Tokens).unwrap();
        assert_eq!(
            token.refresh_delay(now, Duration::from_millis(500)),
            Duration::from_millis(500)
        );
    }
}
