//! Member directory harvesting
//!
//! A run has two phases:
//! - discovery ([`bootstrap`], [`paginate`]): open the search, submit it and walk
//!   every results page, collecting profile references
//! - scraping ([`dispatch`], [`profile`], [`fields`]): visit each reference under a
//!   concurrency ceiling and extract its contact record
//!
//! A discovery failure ends the run with nothing to scrape; scraping failures are
//! isolated per entry.

pub mod bootstrap;
pub mod dispatch;
pub mod fields;
pub mod paginate;
pub mod profile;
pub mod record;

pub use dispatch::{ConsoleProgress, Dispatched, Dispatcher, Failure, NullProgress, Progress, ProgressCounter};
pub use profile::ProfileScraper;
pub use record::{EntryReference, FieldName, Record, ScrapeOutcome};

use crate::browser::Driver;
use crate::config::HarvestConfig;
use crate::error::HarvestError;
use std::sync::Arc;

/// Summary of one run
#[derive(Debug, Default)]
pub struct HarvestReport {
    /// Profile references found by the search
    pub discovered: usize,
    /// Exportable records, in discovery order
    pub records: Vec<Record>,
    /// Profiles that were reached but had no fields
    pub empty: usize,
    pub failures: Vec<Failure>,
}

impl HarvestReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Discover every member profile and scrape them all
pub async fn harvest<D, P>(driver: Arc<D>, config: &HarvestConfig, progress: P) -> Result<HarvestReport, HarvestError>
where
    D: Driver + 'static,
    P: Progress + 'static,
{
    config.validate()?;

    log::info!("Performing a search for all members...");
    let references = {
        let driver = driver.clone();
        let config = config.clone();
        match tokio::task::spawn_blocking(move || bootstrap::discover(&*driver, &config)).await? {
            Ok(references) => references,
            Err(e) => {
                log::error!("An error occurred during the search phase: {}", e);
                Default::default()
            }
        }
    };

    let discovered = references.len();
    log::info!("Found {} total profiles to scrape", discovered);
    if references.is_empty() {
        return Ok(HarvestReport::default());
    }

    let dispatcher = Dispatcher::new(ProfileScraper::new(config), config.concurrency);
    log::info!("Starting to scrape {} profiles with {} parallel tasks", discovered, dispatcher.limit());

    let dispatched = dispatcher.dispatch(driver, references, progress).await?;

    if !dispatched.failures.is_empty() {
        log::warn!("{} of {} profiles were skipped after failing", dispatched.failures.len(), discovered);
    }

    Ok(HarvestReport { discovered, records: dispatched.records, empty: dispatched.empty, failures: dispatched.failures })
}
