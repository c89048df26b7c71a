use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tokenpoll::ApiFlavor;

#[derive(Debug, Parser)]
#[command(
    name = "qrgate",
    version,
    about = "Display the rotating access QR code for a location",
    long_about = "Polls an access-token service for the rotating QR code of a \
                  location and keeps it fresh: the next fetch is scheduled \
                  exactly when the current token expires. On persistent \
                  failure a visible countdown runs before the session is \
                  restarted from a clean slate."
)]
pub struct Args {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Poll the token service and keep the QR code of a location fresh
    Watch {
        /// Base URL of the token service, e.g. https://host:4443
        #[arg(short, long)]
        server: Option<String>,

        /// Location to display the access QR code for. Prompts
        /// interactively when omitted.
        location: Option<String>,

        /// Wire format of the token endpoint
        #[arg(long, value_enum)]
        flavor: Option<FlavorArg>,

        /// File the QR PNG is written to on every refresh
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Retry countdown length in seconds
        #[arg(long)]
        countdown: Option<u32>,

        /// HTTP request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Fetch and render the token once, then exit
        #[arg(long)]
        once: bool,
    },

    /// List the locations known to the token service
    Locations {
        /// Base URL of the token service
        #[arg(short, long)]
        server: Option<String>,
    },

    /// Show or reset the configuration file
    Config {
        /// Display the current configuration
        #[arg(long)]
        show: bool,

        /// Reset the configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlavorArg {
    /// GET /api/tokens?location=<name>
    Tokens,
    /// GET /newAccessTk?loc=<name>
    Legacy,
}

impl From<FlavorArg> for ApiFlavor {
    fn from(flavor: FlavorArg) -> Self {
        match flavor {
            FlavorArg::Tokens => ApiFlavor::Tokens,
            FlavorArg::Legacy => ApiFlavor::Legacy,
        }
    }
}
