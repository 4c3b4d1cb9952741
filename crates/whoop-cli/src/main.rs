//! whoop - command-line access to WHOOP health data.
//!
//! Fetches cycles, recovery, sleep, workouts and heart rate for the account
//! in the config file and prints them as JSON.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use whoop_core::reshape::{self, Row};
use whoop_core::{
    ClientSettings, Collection, Config, EncryptedFileStore, MemoryStore, SystemClock, TokenStore,
    WhoopClient,
};

#[derive(Parser)]
#[command(name = "whoop", version, about = "Fetch WHOOP health data as JSON")]
struct Cli {
    /// Path to the YAML config file with username and password
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Do not read or write the on-disk token cache
    #[arg(long)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Basic profile of the authenticated user
    Profile,
    /// Height, weight and max heart rate
    Body,
    /// Physiological cycles
    Cycles(RangeArgs),
    /// Recovery scores
    Recovery(RangeArgs),
    /// Sleep activities
    Sleep(RangeArgs),
    /// Workouts
    Workouts(RangeArgs),
    /// Full cycle history from the legacy endpoint, week by week
    LegacyCycles {
        /// Reshape into one row per day with sleep durations in minutes
        #[arg(long)]
        keydata: bool,
    },
    /// Full heart-rate history, week by week
    HeartRate,
    /// Forget the cached token
    Logout,
}

#[derive(Args)]
struct RangeArgs {
    /// First day (YYYY-MM-DD); defaults to a week before the end date
    #[arg(long)]
    start: Option<String>,

    /// Last day (YYYY-MM-DD); defaults to today
    #[arg(long)]
    end: Option<String>,

    /// Flatten nested fields into dotted columns
    #[arg(long)]
    flatten: bool,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

fn flatten_all(records: &[Value]) -> Vec<Row> {
    records.iter().map(reshape::flatten).collect()
}

/// Remove the on-disk token cache. Needs no credentials, only the cache
/// location from the config file when one is readable.
fn logout(cli: &Cli) -> Result<()> {
    if cli.no_cache {
        eprintln!("Token cache disabled, nothing to remove");
        return Ok(());
    }
    let cache_dir = match ClientSettings::load(&cli.config) {
        Ok(settings) => settings.cache_dir,
        Err(e) => {
            debug!(error = %e, "No usable config, using default cache location");
            None
        }
    };
    let mut store = EncryptedFileStore::locate(cache_dir.as_deref())
        .context("Failed to locate token cache")?;
    if store.has_cached_token() {
        store.invalidate();
        eprintln!("Cached token removed from {}", store.cache_path().display());
    } else {
        eprintln!("No cached token at {}", store.cache_path().display());
    }
    Ok(())
}

async fn fetch_range(
    client: &mut WhoopClient,
    collection: Collection,
    args: &RangeArgs,
) -> Result<()> {
    let records = client
        .get_collection(collection, args.start.as_deref(), args.end.as_deref())
        .await
        .with_context(|| format!("Failed to fetch {}", collection.name()))?;
    info!(count = records.len(), "Retrieved {}", collection.name());

    if args.flatten {
        print_json(&flatten_all(&records))
    } else {
        print_json(&records)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing();

    if let Command::Logout = cli.command {
        return logout(&cli);
    }

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    let mut client = if cli.no_cache {
        WhoopClient::with_store(
            config.credentials,
            config.settings,
            Box::new(MemoryStore::new()),
            Arc::new(SystemClock),
        )?
    } else {
        WhoopClient::new(config)?
    };

    client.authenticate().await.context("Authentication failed")?;
    info!(client = %client, "Authenticated");

    match &cli.command {
        Command::Profile => print_json(&client.get_profile().await?),
        Command::Body => print_json(&client.get_body_measurement().await?),
        Command::Cycles(args) => fetch_range(&mut client, Collection::Cycle, args).await,
        Command::Recovery(args) => fetch_range(&mut client, Collection::Recovery, args).await,
        Command::Sleep(args) => fetch_range(&mut client, Collection::Sleep, args).await,
        Command::Workouts(args) => fetch_range(&mut client, Collection::Workout, args).await,
        Command::LegacyCycles { keydata } => {
            let cycles = client.get_all_cycles().await.context("Failed to fetch cycle history")?;
            if *keydata {
                print_json(&reshape::process_keydata(&cycles))
            } else {
                print_json(&cycles)
            }
        }
        Command::HeartRate => {
            let values = client
                .get_all_heart_rate()
                .await
                .context("Failed to fetch heart rate history")?;
            print_json(&reshape::heart_rate_samples(&values))
        }
        Command::Logout => logout(&cli),
    }
}
