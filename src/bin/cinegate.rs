//! cinegate: command-line client for the media gateway.
//!
//! Runs one gateway operation against the upstream API and prints the
//! result as JSON.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use cinegate::{Cinegate, Credential, GatewayConfig, MediaKind};

/// Cached, rate-limited TMDB client
#[derive(Parser)]
#[command(name = "cinegate")]
#[command(version = cinegate::PKG_VERSION)]
#[command(about = "Query movie and TV metadata through the cinegate gateway")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Upstream API key.
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Print compact JSON instead of pretty JSON.
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search movies, series and people
    Search {
        /// Search text
        query: String,
    },

    /// Show details for a movie or series
    Detail {
        /// Media type: "movie" or "tv"
        kind: MediaKind,
        /// Upstream id
        id: u64,
    },

    /// List the seasons of a series
    Seasons {
        /// Series id
        id: u64,
    },

    /// List the episodes of one season
    Episodes {
        /// Series id
        id: u64,
        /// Season number
        season: u32,
    },

    /// Show a person's filmography
    Person {
        /// Person id
        id: u64,
    },

    /// Validate the API key and show gateway state
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = GatewayConfig::load(args.config.as_deref())?;
    config.apply_env_overrides()?;

    let mut builder = Cinegate::builder().config(config);
    if let Some(key) = args.api_key.filter(|k| !k.trim().is_empty()) {
        builder = builder.credential(Credential::new(key));
    }
    let gateway = builder.build()?;

    match args.command {
        Command::Search { query } => print_json(&gateway.search(&query).await?, args.compact)?,
        Command::Detail { kind, id } => print_json(&gateway.detail(id, kind).await?, args.compact)?,
        Command::Seasons { id } => print_json(&gateway.seasons(id).await?, args.compact)?,
        Command::Episodes { id, season } => {
            print_json(&gateway.episodes(id, season).await?, args.compact)?
        }
        Command::Person { id } => print_json(&gateway.person_filmography(id).await?, args.compact)?,
        Command::Health => {
            let report = gateway.health().await;
            print_json(&report, args.compact)?;
            if !report.is_healthy() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> serde_json::Result<()> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{out}");
    Ok(())
}
