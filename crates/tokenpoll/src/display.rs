use crate::token::AccessToken;

/// Rendering surface for the poller.
///
/// The equivalent of the original page's DOM handles (QR image element,
/// success/error panels, countdown text node), owned by the poller instead
/// of living in ambient globals. Implementations must not fail outward;
/// rendering problems are theirs to log.
pub trait TokenDisplay: Send {
    /// Render a freshly fetched token and its QR image.
    fn show_token(&mut self, token: &AccessToken);

    /// Switch from the success surface to the failure surface. Called once
    /// when the poller enters the retry countdown.
    fn show_failure(&mut self);

    /// Update the retry countdown, called once per second with the number
    /// of seconds left before the restart.
    fn retry_tick(&mut self, seconds_left: u32);
}
