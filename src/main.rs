//! fragment-gifts - Scraper CLI for Telegram collectible gifts on Fragment
//!
//! Lists gifts of a collection and fetches per-gift details, with TLS
//! fingerprint emulation for reliable scraping.

use anyhow::Result;
use clap::{Parser, Subcommand};
use fragment_gifts::commands::{GiftsCommand, InfoCommand};
use fragment_gifts::config::{Config, OutputFormat};
use fragment_gifts::{GiftFilter, GiftSort, Query};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fragment-gifts",
    version,
    about = "Scrape Telegram collectible gifts from Fragment",
    long_about = "Lists gifts of a Fragment collection with filtering and sorting, and fetches gift details including ownership history."
)]
struct Cli {
    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "FRAGMENT_PROXY")]
    proxy: Option<String>,

    /// Delay between requests in milliseconds
    #[arg(long, global = true, env = "FRAGMENT_DELAY")]
    delay: Option<u64>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List gifts of a collection
    #[command(alias = "g")]
    Gifts {
        /// Collection slug (e.g. plushpepe); empty lists all collections
        #[arg(default_value = "")]
        slug: String,

        /// Listing filter: all, auction, sold, sale
        #[arg(long, default_value = "all")]
        filter: String,

        /// Sort order: price_asc, price_desc, listed, ending
        #[arg(long)]
        sort: Option<String>,

        /// Maximum number of gifts
        #[arg(short, long)]
        max: Option<usize>,

        /// Fetch full details for every listed gift
        #[arg(short, long)]
        details: bool,
    },

    /// Look up one gift by collection and number
    #[command(alias = "i")]
    Info {
        /// Collection slug
        slug: String,

        /// Gift number within the collection
        id: u64,
    },

    /// List accepted filter and sort values
    Options,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    match cli.command {
        Commands::Gifts { slug, filter, sort, max, details } => {
            // Validated before any request goes out
            let query = Query::parse(slug.trim(), &filter, sort.as_deref())?;

            let cmd = GiftsCommand::new(config);
            let output = cmd.execute(&query, max, details).await?;
            println!("{}", output);
        }

        Commands::Info { slug, id } => {
            let cmd = InfoCommand::new(config);
            let output = cmd.execute(&slug, id).await?;
            println!("{}", output);
        }

        Commands::Options => {
            println!("Filters: {}", GiftFilter::ALLOWED.join(", "));
            println!("Sorts:   {}", GiftSort::ALLOWED.join(", "));
        }
    }

    Ok(())
}
