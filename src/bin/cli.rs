//! 6pm Content Relay CLI
//!
//! Runs the resident poll loop, a single cycle, or configuration checks.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use content_relay::{
    config::load_config,
    error::Result,
    models::Config,
    pipeline::PollLoop,
    services::{ContentMatcher, DeliverySink, DiscordChannelSink, LogSink},
    utils::http,
};

/// content-relay - relays 6pm Content announcements to a chat channel
#[derive(Parser, Debug)]
#[command(
    name = "content-relay",
    version,
    about = "Relays 6pm Content announcements to a chat channel"
)]

struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll on the configured interval until interrupted
    Run,

    /// Run a single cycle and print its report
    Once {
        /// Log the message instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration
    Validate,

    /// Show what the announcement matcher extracts from TEXT
    Check {
        /// Post text to test
        text: String,
    },
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_sink(config: &Config, dry_run: bool) -> Result<Arc<dyn DeliverySink>> {
    if dry_run {
        return Ok(Arc::new(LogSink));
    }
    config.validate_delivery()?;
    let client = http::create_async_client(&config.http)?;
    Ok(Arc::new(DiscordChannelSink::new(client, &config.discord)?))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_logging(cli.verbose, &config.logging.level);

    if !cli.config.exists() {
        log::warn!(
            "{} not found; using defaults and environment",
            cli.config.display()
        );
    }

    match cli.command {
        Command::Run => {
            let sink = build_sink(&config, false)?;
            let poll = PollLoop::from_config(&config, sink)?;

            log::info!("content-relay starting...");
            poll.run_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            })
            .await;
        }

        Command::Once { dry_run } => {
            config.validate()?;
            let sink = build_sink(&config, dry_run)?;
            let poll = PollLoop::from_config(&config, sink)?;

            if let Some(report) = poll.poll_once().await {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration from {}...", cli.config.display());

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} mirror endpoints, primary timeline {})",
                config.mirror_endpoints().len(),
                if config.primary.timeline_url.is_some() {
                    "configured"
                } else {
                    "not configured"
                }
            );

            match config.validate_delivery() {
                Ok(()) => log::info!("✓ Delivery credentials present"),
                Err(e) => log::warn!("{} (only `once --dry-run` will work)", e),
            }
        }

        Command::Check { text } => match ContentMatcher::new().extract(&text) {
            Some(announcement) => println!("{announcement}"),
            None => log::warn!("No 6pm Content marker at the start of the text"),
        },
    }

    Ok(())
}
