mod api;
mod cache;
mod config;
mod convert;
mod render;
mod shell;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use api::{ExchangeClient, FetchLayer};
use cache::{CurrencyCache, LocalStore, RateCache};
use config::Config;
use convert::Converter;
use render::ConsoleRenderer;
use shell::{AssetManifest, AssetRequest, BucketStore, HttpAssetFetcher, ShellWorker, WorkerState};

#[derive(Parser, Debug)]
#[command(name = "currency-cache")]
#[command(about = "A currency converter that keeps working offline")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/currency-cache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List available currencies
  Currencies,
  /// Convert an amount from one currency to another
  Convert {
    #[arg(allow_hyphen_values = true)]
    amount: String,
    from: String,
    to: String,
  },
  /// Show what the local cache holds
  Cache,
  /// Manage the offline page shell
  #[command(subcommand)]
  Shell(ShellCommand),
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
  /// Fetch and store this version's assets
  Install,
  /// Make this version live and delete older buckets
  Activate,
  /// Resolve a request the way the page would
  Fetch {
    url: String,
    /// Treat the request as a page navigation
    #[arg(long)]
    navigate: bool,
  },
  /// List stored buckets
  Buckets,
}

/// Initialize the tracing subscriber.
///
/// Logs go to a file in the data directory so they never mix with rendered
/// output. Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing() -> Option<WorkerGuard> {
  let dir = Config::data_dir().filter(|d| std::fs::create_dir_all(d).is_ok());
  match dir {
    Some(dir) => {
      let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
      let appender = tracing_appender::rolling::never(dir, "currency-cache.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);
      tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
      Some(guard)
    }
    None => {
      let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
      tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
      None
    }
  }
}

/// Build the converter service; a missing cache only downgrades it.
fn build_converter(config: &Config) -> Result<Converter<ExchangeClient>> {
  let store = config
    .cache_path()
    .and_then(|path| LocalStore::open(&path))
    .map(Arc::new);
  if store.is_none() {
    warn!("Running without a local cache");
  }

  let client = ExchangeClient::new(config)?;
  let fetch = FetchLayer::new(
    client,
    CurrencyCache::new(store.clone()),
    RateCache::new(store),
  );

  Ok(Converter::new(fetch))
}

async fn run_shell(config: &Config, command: ShellCommand) -> Result<ExitCode> {
  let manifest = AssetManifest::from_config(&config.shell)?;
  let path = config
    .shell_path()
    .ok_or_else(|| eyre!("Could not determine data directory"))?;
  let store = Arc::new(BucketStore::open(&path)?);
  let fetcher = HttpAssetFetcher::new();
  let bucket = manifest.bucket_name();

  match command {
    ShellCommand::Install => {
      let mut worker = ShellWorker::new(manifest, store, fetcher);
      let count = worker.install().await?;
      println!("Installed {} assets into {}", count, bucket);
    }
    ShellCommand::Activate => {
      let mut worker = ShellWorker::resume(manifest, store, fetcher).await?;
      if worker.state() == WorkerState::Installing {
        return Err(eyre!("{} is not installed; run `shell install` first", bucket));
      }
      let deleted = worker.activate().await?;
      println!("{} is active", bucket);
      for name in deleted {
        println!("  deleted {}", name);
      }
    }
    ShellCommand::Fetch { url, navigate } => {
      let url = Url::parse(&url)?;
      let mut worker = ShellWorker::resume(manifest, store, fetcher).await?;
      let (response, from) = worker.handle_fetch(&AssetRequest { url, navigate }).await;
      println!(
        "{} from {} ({} bytes{})",
        response.status,
        from,
        response.body.len(),
        response
          .content_type
          .as_deref()
          .map(|ct| format!(", {}", ct))
          .unwrap_or_default()
      );
      if !response.is_ok() {
        return Ok(ExitCode::FAILURE);
      }
    }
    ShellCommand::Buckets => {
      println!("origin {}", manifest.origin());
      for name in store.keys()? {
        let entries = store.entry_count(&name)?;
        let created = store
          .created_at(&name)?
          .map(|dt| format!(", created {}", dt.format("%Y-%m-%d %H:%M:%S UTC")))
          .unwrap_or_default();
        let marker = if name == bucket { " *" } else { "" };
        println!("  {} ({} entries{}){}", name, entries, created, marker);
      }
    }
  }

  Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;

  let _guard = init_tracing();
  info!(command = ?args.command, "currency-cache starting");

  let render = ConsoleRenderer::new();

  match args.command {
    Command::Currencies => {
      let converter = build_converter(&config)?;
      let listing = converter.load_currencies(&render).await;
      info!(count = listing.currencies.len(), source = %listing.source, "Currencies listed");
    }
    Command::Convert { amount, from, to } => {
      let converter = build_converter(&config)?;
      if let Err(e) = converter.convert(&amount, &from, &to, &render).await {
        // Already rendered as a status message
        info!("Conversion failed: {}", e);
        return Ok(ExitCode::FAILURE);
      }
    }
    Command::Cache => {
      let converter = build_converter(&config)?;
      let fetch = converter.fetch_layer();
      println!("currencies: {}", fetch.currencies().len().await);
      println!("rates: {}", fetch.rates().len().await);
      for record in fetch.rates().recent().await {
        println!("  {} {}", record.query, record.rate);
      }
    }
    Command::Shell(command) => return run_shell(&config, command).await,
  }

  Ok(ExitCode::SUCCESS)
}
