//! Tokenpoll: polling client for rotating location access tokens.
//!
//! A token service hands out short-lived access tokens rendered as QR
//! codes, one per physical location, rotating them on a fixed interval.
//! This crate implements the client side: fetch the current token for a
//! selected location, render it, and re-fetch exactly when it expires.
//!
//! ## Core Types
//!
//! - [`TokenPoller`] - The fetch/display/re-schedule loop
//! - [`TokenClient`] - HTTP client speaking both wire flavors
//! - [`TokenSource`] - Trait seam between poller and network
//! - [`TokenDisplay`] - Trait seam between poller and rendering surface
//! - [`AccessToken`] - Decoded token with QR PNG and expiry
//!
//! ## Failure handling
//!
//! Empty responses are transient (the fetch raced the server's token
//! rotation) and retried after a short fixed delay. Network errors,
//! non-success statuses and malformed bodies count toward a failure
//! threshold; reaching it puts the poller into a visible retry countdown
//! that ends in [`PollOutcome::Restart`], the caller's cue to rebuild the
//! session from a clean slate.

pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod poller;
pub mod token;

pub use client::{TokenClient, TokenSource};
pub use config::{ApiFlavor, ClientConfig, DEFAULT_USER_AGENT, PollerConfig};
pub use display::TokenDisplay;
pub use error::{Result, TokenError};
pub use poller::{PollOutcome, PollerState, TokenPoller};
pub use token::AccessToken;
