mod app;
mod domain;
mod infra;
mod settings;
mod util;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::settings::Settings;
use crate::util::{
    persistence::{load_settings, save_settings},
    version::{version_label, APP_NAME},
};

/// Sum the equivalent cost of raising every operator on a roster.
#[derive(Debug, Parser)]
#[command(name = "operator-cost-scanner", version)]
struct Cli {
    /// Item value table (xlsx, xls, ods or csv)
    #[arg(short, long, env = "OCS_REFERENCE")]
    reference: Option<PathBuf>,
    /// Roster JSON file (defaults to the built-in roster)
    #[arg(long)]
    roster: Option<PathBuf>,
    /// Report file (xlsx, csv or json)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Wiki page base URL
    #[arg(long)]
    base_url: Option<String>,
    /// Pages fetched in parallel
    #[arg(short, long)]
    concurrency: Option<usize>,
    /// Per-page timeout in seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,
    /// Skip the on-disk page cache
    #[arg(long)]
    no_cache: bool,
    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
    /// Store the effective settings for later runs
    #[arg(long)]
    save_settings: bool,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.reference {
            settings.reference = path.clone();
        }
        if let Some(path) = &self.roster {
            settings.roster = Some(path.clone());
        }
        if let Some(path) = &self.output {
            settings.output = path.clone();
        }
        if let Some(url) = &self.base_url {
            settings.base_url = url.clone();
        }
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(secs) = self.timeout {
            settings.timeout_secs = Some(secs);
        }
        if self.no_cache {
            settings.use_cache = false;
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    info!("{APP_NAME} {}", version_label());

    let mut settings = load_settings();
    cli.apply(&mut settings);

    if cli.save_settings {
        let path = save_settings(&settings).context("failed to save settings")?;
        info!("Settings saved to {}", path.display());
    }

    let report = app::run_pipeline(&settings)
        .await
        .context("pricing run failed")?;

    info!(
        "Total: {} over {} operators ({} skipped items, {} failed operators), written to {}",
        report.grand_total,
        report.entity_count(),
        report.skipped.len(),
        report.failures.len(),
        settings.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_saved_settings() {
        let cli = Cli::parse_from([
            "operator-cost-scanner",
            "--reference",
            "values.csv",
            "-o",
            "out.json",
            "--concurrency",
            "3",
            "--timeout",
            "0",
            "--no-cache",
        ]);
        let mut settings = Settings::default();
        cli.apply(&mut settings);

        assert_eq!(settings.reference, PathBuf::from("values.csv"));
        assert_eq!(settings.output, PathBuf::from("out.json"));
        assert_eq!(settings.concurrency, 3);
        assert_eq!(settings.timeout_secs, Some(0));
        assert!(!settings.use_cache);
        assert_eq!(settings.roster, None);
    }

    #[test]
    fn no_flags_keep_settings() {
        let cli = Cli::parse_from(["operator-cost-scanner"]);
        let mut settings = Settings::default();
        cli.apply(&mut settings);
        assert_eq!(settings, Settings::default());
    }
}
