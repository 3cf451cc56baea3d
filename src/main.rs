mod app;
mod cache;
mod catalog;
mod config;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cats")]
#[command(about = "Browse the cat breed catalog, with offline cache and favourites")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/cats/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Print JSON instead of text
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// List breeds page by page (searches instead when --query is given)
  #[command(alias = "ls")]
  List {
    /// Zero-based page number
    #[arg(short, long, default_value_t = 0)]
    page: u32,
    /// Breeds per page (default: page_size from config)
    #[arg(short, long)]
    limit: Option<u32>,
    #[arg(short, long)]
    query: Option<String>,
  },
  /// Search breeds by name
  Search { query: String },
  /// Show a single breed
  Show { id: String },
  /// Mark a cached breed as favourite
  #[command(alias = "fav")]
  Favourite { id: String },
  /// Remove a breed from favourites
  #[command(alias = "unfav")]
  Unfavourite { id: String },
  /// Flip a breed's favourite flag
  Toggle { id: String },
  /// List favourite breeds
  Favourites,
  /// Delete every cached breed, favourites included
  ClearCache,
}

/// Log to a file so stdout stays clean, or to stderr when no log
/// directory is usable.
///
/// Filter with CATS_LOG (e.g. `CATS_LOG=cats=debug`).
fn init_tracing(config: &config::Config) -> Option<WorkerGuard> {
  let filter = EnvFilter::try_from_env("CATS_LOG").unwrap_or_else(|_| EnvFilter::new("cats=info"));
  let log_dir = config
    .log_dir()
    .filter(|dir| std::fs::create_dir_all(dir).is_ok());

  let Some(log_dir) = log_dir else {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(std::io::stderr)
      .init();
    tracing::warn!("no usable log directory, logging to stderr");
    return None;
  };

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
    &log_dir, "cats.log",
  ));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  let _guard = init_tracing(&config);

  let app = app::App::new(config, args.json)?;
  app.run(args.command).await?;

  Ok(())
}
