//! directory-harvest
//!
//! Searches the member directory, scrapes every profile and writes the results to CSV.

use anyhow::Context;
use clap::Parser;
use directory_harvest::directory::{ConsoleProgress, harvest};
use directory_harvest::{BrowserSession, ConnectionOptions, HarvestConfig, LaunchOptions, export};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "directory-harvest")]
#[command(version)]
#[command(about = "Harvest member contact records into a CSV file", long_about = None)]
struct Cli {
    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// WebSocket endpoint URL of an already running browser
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// JSON file overriding the default run configuration
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// CSV destination (default: results.csv)
    #[arg(long, short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,

    /// Profiles scraped in parallel (default: 10)
    #[arg(long, short = 'j')]
    concurrency: Option<usize>,

    /// Attempts per profile (default: 3)
    #[arg(long)]
    attempts: Option<u32>,

    /// Seconds to wait between attempts (default: 5)
    #[arg(long, value_name = "SECS")]
    retry_delay_secs: Option<u64>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn harvest_config(&self) -> anyhow::Result<HarvestConfig> {
        let mut config = match &self.config {
            Some(path) => HarvestConfig::from_json_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => HarvestConfig::default(),
        };

        if let Some(output) = &self.output {
            config = config.output(output);
        }
        if let Some(limit) = self.concurrency {
            config = config.concurrency(limit);
        }
        if let Some(attempts) = self.attempts {
            config = config.max_attempts(attempts);
        }
        if let Some(secs) = self.retry_delay_secs {
            config = config.retry_delay(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    fn session(&self) -> anyhow::Result<BrowserSession> {
        if let Some(ws) = &self.ws_endpoint {
            log::info!("Connecting to browser at {}", ws);
            return Ok(BrowserSession::connect(ConnectionOptions::new(ws))?);
        }

        let mut options = LaunchOptions::new().headless(!self.headed);
        if let Some(path) = &self.chrome_path {
            options = options.chrome_path(path);
        }
        if let Some(dir) = &self.user_data_dir {
            options = options.user_data_dir(dir);
        }

        log::info!("Launching browser ({})", if options.headless { "headless" } else { "headed" });
        Ok(BrowserSession::launch(options)?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.harvest_config()?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let session = Arc::new(cli.session()?);
    let report = harvest(session.clone(), &config, ConsoleProgress).await?;

    println!("Total profiles successfully scraped: {}", report.records.len());
    if !report.failures.is_empty() {
        println!("Profiles skipped after repeated failures: {}", report.failures.len());
    }

    if report.is_empty() {
        println!("No results to save.");
    } else {
        export::write_csv(&config.output, &report.records)
            .with_context(|| format!("Failed to write {}", config.output.display()))?;
        println!("Results saved to {}", config.output.display());
    }

    if let Err(e) = session.close() {
        log::debug!("Failed to close browser tabs: {}", e);
    }

    Ok(())
}
