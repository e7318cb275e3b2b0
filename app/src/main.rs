mod cli;
mod commands;
mod config;
mod resolve;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use encore_core::services::ThemeService;
use encore_storage::SqliteThemeRepository;
use encore_storage::config::StorageConfig;

use crate::cli::CliArgs;

const LOG_ENV: &str = "ENCORE_LOG";

fn init_tracing() {
  let filter = EnvFilter::try_from_env(LOG_ENV)
    .unwrap_or_else(|_| EnvFilter::new("encore=info,encore_core=info,encore_storage=info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
    .init();
}

fn main() -> Result<()> {
  let args = CliArgs::parse();
  init_tracing();

  let storage = StorageConfig::load().context("failed to load [storage] config")?;
  let thresholds = config::load_thresholds().context("failed to load [funnel] config")?;
  debug!(db = %storage.db_path.display(), ?thresholds, "starting encore");

  let repo = SqliteThemeRepository::new_from_config(&storage)
    .with_context(|| format!("failed to open database {}", storage.db_path.display()))?;
  let service = ThemeService::new(repo, thresholds);

  let output = commands::run(&service, args.command)?;
  println!("{}", output.trim_end());
  Ok(())
}
