//! HTTP client for the token service.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::{ApiFlavor, ClientConfig};
use crate::error::{Result, TokenError};
use crate::token::AccessToken;

/// Source of access tokens for the polling loop.
///
/// The seam between the poller and the network; tests substitute a mock or
/// scripted implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Fetch the current access token for a location.
    async fn fetch_token(&self, location: &str) -> Result<AccessToken>;
}

/// Reqwest-backed [`TokenSource`] speaking one of the two wire flavors.
#[derive(Debug, Clone)]
pub struct TokenClient {
    client: Client,
    base_url: Url,
    flavor: ApiFlavor,
}

impl TokenClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| TokenError::invalid_base_url(&config.base_url, e.to_string()))?;

        // A trailing slash keeps `Url::join` from replacing the last path
        // segment of base URLs like `https://host/qr`.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(ClientConfig::default_headers())
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            flavor: config.flavor,
        })
    }

    pub fn flavor(&self) -> ApiFlavor {
        self.flavor
    }

    fn token_url(&self, location: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(self.flavor.token_path())
            .map_err(|e| TokenError::invalid_base_url(self.base_url.as_str(), e.to_string()))?;
        url.query_pairs_mut()
            .append_pair(self.flavor.location_param(), location);
        Ok(url)
    }

    fn locations_url(&self) -> Result<Url> {
        self.base_url
            .join("loc")
            .map_err(|e| TokenError::invalid_base_url(self.base_url.as_str(), e.to_string()))
    }

    /// Fetch the set of known location names (`GET /loc`).
    pub async fn fetch_locations(&self) -> Result<Vec<String>> {
        let url = self.locations_url()?;
        debug!(url = %url, "fetching location list");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TokenError::HttpStatus {
                status,
                operation: "location listing",
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(TokenError::EmptyResponse);
        }
        serde_json::from_str(&body)
            .map_err(|e| TokenError::malformed(format!("invalid location list: {e}")))
    }
}

#[async_trait]
impl TokenSource for TokenClient {
    async fn fetch_token(&self, location: &str) -> Result<AccessToken> {
        if location.trim().is_empty() {
            return Err(TokenError::invalid_location(
                location,
                "location must not be empty",
            ));
        }

        let url = self.token_url(location)?;
        debug!(url = %url, location, "fetching access token");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TokenError::HttpStatus {
                status,
                operation: "token fetch",
            });
        }

        let body = response.text().await?;
        AccessToken::parse(&body, self.flavor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str, flavor: ApiFlavor) -> TokenClient {
        TokenClient::new(&ClientConfig::new(base).with_flavor(flavor)).unwrap()
    }

    #[test]
    fn builds_tokens_flavor_url() {
        let client = client("https://example.com", ApiFlavor::Tokens);
        let url = client.token_url("Library").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/tokens?location=Library");
    }

    #[test]
    fn builds_legacy_flavor_url() {
        let client = client("https://localhost:4443", ApiFlavor::Legacy);
        let url = client.token_url("Cafeteria").unwrap();
        assert_eq!(url.as_str(), "https://localhost:4443/newAccessTk?loc=Cafeteria");
    }

    #[test]
    fn percent_encodes_location_names() {
        let client = client("https://example.com", ApiFlavor::Tokens);
        let url = client.token_url("Lecture Hall 1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/api/tokens?location=Lecture+Hall+1"
        );
    }

    #[test]
    fn preserves_base_url_path_prefix() {
        let client = client("https://example.com/qr", ApiFlavor::Tokens);
        let url = client.token_url("Library").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/qr/api/tokens?location=Library"
        );
    }

    #[test]
    fn builds_locations_url() {
        let client = client("https://localhost:4443", ApiFlavor::Legacy);
        assert_eq!(
            client.locations_url().unwrap().as_str(),
            "https://localhost:4443/loc"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let err = TokenClient::new(&ClientConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, TokenError::InvalidBaseUrl { .. }));
    }

    #[tokio::test]
    async fn rejects_empty_location() {
        let client = client("https://example.com", ApiFlavor::Tokens);
        let err = client.fetch_token("  ").await.unwrap_err();
        assert!(matches!(err, TokenError::InvalidLocation { .. }));
    }
}
