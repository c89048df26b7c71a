//! The token polling loop.
//!
//! One poller instance drives one location: fetch the current token,
//! render it, sleep until the token expires, fetch again. The loop is
//! strictly sequential, so at most one request is in flight and at most
//! one refresh timer exists at any time.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::TokenSource;
use crate::config::PollerConfig;
use crate::display::TokenDisplay;
#[cfg(test)]
use crate::error::TokenError;

/// Terminal result of one polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The retry countdown elapsed. The caller is expected to tear this
    /// session down and start a fresh one from a clean slate, the
    /// equivalent of the original full page reload.
    Restart,
    /// The cancellation token fired.
    Cancelled,
}

/// Poller lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling,
    RetryCountdown,
}

/// Fetches, renders and re-schedules access tokens for one location.
pub struct TokenPoller<S, D> {
    source: S,
    display: D,
    location: String,
    config: PollerConfig,
    state: PollerState,
    failures: u32,
}

impl<S: TokenSource, D: TokenDisplay> TokenPoller<S, D> {
    pub fn new(source: S, display: D, location: impl Into<String>, config: PollerConfig) -> Self {
        Self {
            source,
            display,
            location: location.into(),
            config,
            state: PollerState::Idle,
            failures: 0,
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Run the fetch/display/re-schedule cycle until the failure threshold
    /// or cancellation ends the session.
    ///
    /// Errors never escape; they are either retried (transient) or counted
    /// toward the threshold that leads into the retry countdown.
    pub async fn run(mut self, cancel: &CancellationToken) -> PollOutcome {
        self.state = PollerState::Polling;
        info!(location = %self.location, "polling started");

        loop {
            if cancel.is_cancelled() {
                return PollOutcome::Cancelled;
            }

            match self.source.fetch_token(&self.location).await {
                Ok(token) => {
                    self.failures = 0;
                    let delay = token.refresh_delay(Utc::now(), self.config.min_refresh_delay);
                    debug!(
                        location = %self.location,
                        expires_at = %token.expires_at,
                        delay_ms = delay.as_millis() as u64,
                        "token refreshed"
                    );
                    self.display.show_token(&token);
                    if !sleep_unless_cancelled(delay, cancel).await {
                        return PollOutcome::Cancelled;
                    }
                }
                Err(e) if e.is_transient() => {
                    debug!(
                        location = %self.location,
                        delay_ms = self.config.empty_retry_delay.as_millis() as u64,
                        "empty response, server may be rotating tokens"
                    );
                    if !sleep_unless_cancelled(self.config.empty_retry_delay, cancel).await {
                        return PollOutcome::Cancelled;
                    }
                }
                Err(e) => {
                    self.failures += 1;
                    warn!(
                        location = %self.location,
                        failures = self.failures,
                        threshold = self.config.failure_threshold,
                        error = %e,
                        "token fetch failed"
                    );
                    if self.failures >= self.config.failure_threshold {
                        return self.retry_countdown(cancel).await;
                    }
                    // Brief pause before the next attempt.
                    if !sleep_unless_cancelled(self.config.empty_retry_delay, cancel).await {
                        return PollOutcome::Cancelled;
                    }
                }
            }
        }
    }

    /// Visible countdown entered after persistent failure. Ticks once per
    /// second down to zero, then hands control back for a full restart.
    async fn retry_countdown(&mut self, cancel: &CancellationToken) -> PollOutcome {
        self.state = PollerState::RetryCountdown;
        self.display.show_failure();
        info!(
            location = %self.location,
            seconds = self.config.retry_countdown_secs,
            "entering retry countdown"
        );

        for seconds_left in (1..=self.config.retry_countdown_secs).rev() {
            self.display.retry_tick(seconds_left);
            if !sleep_unless_cancelled(Duration::from_secs(1), cancel).await {
                return PollOutcome::Cancelled;
            }
        }

        PollOutcome::Restart
    }
}

/// Sleep for `delay`, racing the cancellation token. Returns false when
/// cancelled.
async fn sleep_unless_cancelled(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
