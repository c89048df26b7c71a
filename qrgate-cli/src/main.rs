mod cli;
mod config;
mod error;
mod output;

use crate::{
    cli::{Args, Commands},
    config::AppConfig,
    error::{CliError, Result},
    output::TerminalDisplay,
};
use clap::Parser;
use colored::*;
use std::{path::PathBuf, process, time::Duration};
use tokenpoll::{
    ApiFlavor, ClientConfig, PollOutcome, PollerConfig, TokenClient, TokenDisplay, TokenPoller,
    TokenSource,
};
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("Application error: {}", e);
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    let config = AppConfig::load(args.config.as_deref())?;

    match args.command {
        Commands::Watch {
            server,
            location,
            flavor,
            output,
            countdown,
            timeout,
            once,
        } => {
            let settings = WatchSettings::resolve(
                &config, server, location, flavor, output, countdown, timeout, once,
            )?;
            watch(settings).await
        }

        Commands::Locations { server } => {
            let server = server
                .or_else(|| config.server.clone())
                .ok_or_else(no_server)?;
            let flavor = config.flavor()?.unwrap_or_default();
            list_locations(&server, flavor).await
        }

        Commands::Config { show, reset } => {
            if reset {
                AppConfig::reset(args.config.as_deref())?;
                println!("✓ Configuration reset to defaults");
            } else if show {
                println!("{}", config.show()?);
            } else {
                println!(
                    "Use --show to display current configuration or --reset to reset to defaults"
                );
            }
            Ok(())
        }
    }
}

fn no_server() -> CliError {
    CliError::config("no server configured; pass --server or set it in the config file")
}

/// Effective watch settings after merging CLI flags over the config file.
struct WatchSettings {
    server: String,
    location: Option<String>,
    flavor: ApiFlavor,
    output: PathBuf,
    countdown: u32,
    timeout: Duration,
    once: bool,
}

impl WatchSettings {
    #[allow(clippy::too_many_arguments)]
    fn resolve(
        config: &AppConfig,
        server: Option<String>,
        location: Option<String>,
        flavor: Option<crate::cli::FlavorArg>,
        output: Option<PathBuf>,
        countdown: Option<u32>,
        timeout: Option<u64>,
        once: bool,
    ) -> Result<Self> {
        let defaults = PollerConfig::default();
        Ok(Self {
            server: server
                .or_else(|| config.server.clone())
                .ok_or_else(no_server)?,
            location: location.or_else(|| config.location.clone()),
            flavor: flavor
                .map(ApiFlavor::from)
                .or(config.flavor()?)
                .unwrap_or_default(),
            output: output
                .or_else(|| config.output.clone())
                .unwrap_or_else(|| PathBuf::from("qr.png")),
            countdown: countdown
                .or(config.countdown)
                .unwrap_or(defaults.retry_countdown_secs),
            timeout: Duration::from_secs(timeout.or(config.timeout_secs).unwrap_or(30)),
            once,
        })
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.server)
            .with_flavor(self.flavor)
            .with_timeout(self.timeout)
    }
}

async fn watch(settings: WatchSettings) -> Result<()> {
    let client_config = settings.client_config();

    let location = match &settings.location {
        Some(location) => location.clone(),
        None => select_location(&TokenClient::new(&client_config)?).await?,
    };

    if settings.once {
        let client = TokenClient::new(&client_config)?;
        let token = client.fetch_token(&location).await?;
        TerminalDisplay::new(settings.output.clone(), true).show_token(&token);
        return Ok(());
    }

    let poller_config = PollerConfig {
        retry_countdown_secs: settings.countdown,
        ..PollerConfig::default()
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
                cancel.cancel();
            }
        });
    }

    loop {
        // Each session gets a fresh client and display, the clean-slate
        // equivalent of the original full page reload.
        let client = TokenClient::new(&client_config)?;
        let display = TerminalDisplay::new(settings.output.clone(), true);
        let poller = TokenPoller::new(client, display, location.clone(), poller_config.clone());

        match poller.run(&cancel).await {
            PollOutcome::Restart => {
                info!(location = %location, "restarting polling session");
            }
            PollOutcome::Cancelled => break,
        }
    }

    Ok(())
}

async fn select_location(client: &TokenClient) -> Result<String> {
    let locations = client.fetch_locations().await?;
    if locations.is_empty() {
        return Err(CliError::config("the token service reports no locations"));
    }
    Ok(inquire::Select::new("Select a location:", locations).prompt()?)
}

async fn list_locations(server: &str, flavor: ApiFlavor) -> Result<()> {
    let client = TokenClient::new(&ClientConfig::new(server).with_flavor(flavor))?;
    for location in client.fetch_locations().await? {
        println!("{location}");
    }
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_level(verbose))
        .init();
}
