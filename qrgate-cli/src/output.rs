//! Terminal rendering surface for the poller.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{Local, Utc};
use colored::*;
use tokenpoll::{AccessToken, TokenDisplay};
use tracing::error;

/// Renders tokens to the terminal and writes the QR PNG to a file.
///
/// The terminal stand-in for the original page surface: the image element
/// becomes a PNG file refreshed in place, the success/error panels become
/// status lines, the countdown text node becomes a per-second line.
pub struct TerminalDisplay {
    output_path: PathBuf,
    colored: bool,
}

impl TerminalDisplay {
    pub fn new(output_path: PathBuf, colored: bool) -> Self {
        Self {
            output_path,
            colored,
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.colored {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    /// Write the PNG next to its final path, then rename it into place so
    /// a viewer watching the file never sees a half-written image.
    fn write_png(&self, png: &[u8]) -> io::Result<()> {
        let tmp = self.output_path.with_extension("png.tmp");
        fs::write(&tmp, png)?;
        fs::rename(&tmp, &self.output_path)
    }
}

impl TokenDisplay for TerminalDisplay {
    fn show_token(&mut self, token: &AccessToken) {
        if let Err(e) = self.write_png(&token.png) {
            error!(
                path = %self.output_path.display(),
                error = %e,
                "cannot write QR image"
            );
            return;
        }

        let location = token.location.as_deref().unwrap_or("unknown");
        let expires_local = token.expires_at.with_timezone(&Local);
        let remaining = (token.expires_at - Utc::now()).num_seconds().max(0);

        println!(
            "{} access QR code for {} -> {}",
            self.paint("✓", Color::Green),
            self.paint(location, Color::Cyan),
            self.output_path.display()
        );
        println!(
            "  valid until {} (refresh in {}s)",
            self.paint(&expires_local.format("%H:%M:%S").to_string(), Color::Yellow),
            remaining
        );
    }

    fn show_failure(&mut self) {
        eprintln!(
            "{} lost connection to the token service",
            self.paint("✗", Color::Red)
        );
    }

    fn retry_tick(&mut self, seconds_left: u32) {
        eprintln!(
            "  retry in {} second(s)",
            self.paint(&seconds_left.to_string(), Color::Yellow)
        );
    }
}
