use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Wire format spoken by the token service.
///
/// Two near-identical script variants evolved against two endpoint
/// generations; both are supported by one client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApiFlavor {
    /// `GET /api/tokens?location=<name>` with `qr`/`exp` (Unix seconds)
    /// response fields (default).
    #[default]
    Tokens,
    /// `GET /newAccessTk?loc=<name>` with `Qr`/`Expires` (RFC 3339)
    /// response fields.
    Legacy,
}

impl ApiFlavor {
    /// Path of the token endpoint, relative to the service base URL.
    pub(crate) fn token_path(self) -> &'static str {
        match self {
            Self::Tokens => "api/tokens",
            Self::Legacy => "newAccessTk",
        }
    }

    /// Name of the location query parameter.
    pub(crate) fn location_param(self) -> &'static str {
        match self {
            Self::Tokens => "location",
            Self::Legacy => "loc",
        }
    }
}

/// Configurable options for the HTTP token client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the token service, e.g. `https://host:4443/`.
    pub base_url: String,

    /// Wire format of the token endpoint.
    pub flavor: ApiFlavor,

    /// Overall timeout for one HTTP request.
    pub timeout: Duration,

    /// Connection timeout (time to establish the initial connection).
    pub connect_timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            flavor: ApiFlavor::default(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    pub fn with_flavor(mut self, flavor: ApiFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub(crate) fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );

        headers
    }
}

/// Timing and failure-handling knobs for the polling loop.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Floor applied to the refresh delay when the received expiry is
    /// already in the past. That happens when the fetch races the server's
    /// token rotation and is not an error.
    pub min_refresh_delay: Duration,

    /// Fixed delay before retrying after a transient empty response.
    pub empty_retry_delay: Duration,

    /// Number of consecutive fetch failures that triggers the retry
    /// countdown.
    pub failure_threshold: u32,

    /// Start value of the visible retry countdown, in seconds. When it
    /// reaches zero the poller resolves to [`PollOutcome::Restart`].
    ///
    /// [`PollOutcome::Restart`]: crate::poller::PollOutcome::Restart
    pub retry_countdown_secs: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            min_refresh_delay: Duration::from_millis(500),
            empty_retry_delay: Duration::from_secs(1),
            failure_threshold: 1,
            retry_countdown_secs: 10,
        }
    }
}
