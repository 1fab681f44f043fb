//! # directory-harvest
//!
//! Harvests member contact records from a paginated, frame-embedded directory
//! rendered by a legacy web application, driving Chrome via the Chrome DevTools
//! Protocol (CDP), and exports them as CSV.
//!
//! ## Features
//!
//! - **Search discovery**: Opens the embedded search form, submits it and walks every results page
//! - **Bounded concurrency**: Scrapes profiles in parallel under a fixed ceiling, one tab per worker
//! - **Retries**: Each profile gets a fixed number of attempts with a pause in between
//! - **Frame-aware extraction**: Reads label/value tables from the page or its `main` frame
//!
//! ## Running
//!
//! ```bash
//! # Headless run writing results.csv
//! cargo run --bin directory-harvest
//!
//! # Visible browser, custom output
//! cargo run --bin directory-harvest -- --headed --output members.csv
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use directory_harvest::{BrowserSession, HarvestConfig, LaunchOptions};
//! use directory_harvest::directory::{harvest, ConsoleProgress};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), directory_harvest::HarvestError> {
//! let session = Arc::new(BrowserSession::launch(LaunchOptions::default())?);
//! let config = HarvestConfig::default();
//!
//! let report = harvest(session, &config, ConsoleProgress).await?;
//! if !report.is_empty() {
//!     directory_harvest::export::write_csv(&config.output, &report.records)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`browser`]: Capability traits and the `headless_chrome` implementation
//! - [`directory`]: Discovery, profile scraping and the concurrent dispatcher
//! - [`config`]: Run configuration and deployment constants
//! - [`export`]: CSV writer
//! - [`error`]: Error types and result aliases

pub mod browser;
pub mod config;
pub mod directory;
pub mod error;
pub mod export;

pub use browser::{BrowserSession, ConnectionOptions, Driver, LaunchOptions, Locator, PageHandle, ScrapeSurface};
pub use config::HarvestConfig;
pub use directory::{HarvestReport, Record, harvest};
pub use error::{BrowserError, HarvestError, Result};
