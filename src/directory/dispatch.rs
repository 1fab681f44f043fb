//! Bounded-concurrency fan-out of profile scrapes
//!
//! Each reference becomes one task. A semaphore admits at most `limit` of them at a
//! time; the scrape itself is blocking browser I/O and runs on the blocking pool.
//! The progress counter and the outcome buffer share one lock.

use crate::browser::Driver;
use crate::directory::profile::ProfileScraper;
use crate::directory::record::{EntryReference, Record, ScrapeOutcome};
use crate::error::{BrowserError, HarvestError};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

/// Receives progress as entries complete. Called under the run lock.
pub trait Progress: Send {
    /// Called once with the number of dispatched entries
    fn begin(&mut self, _total: usize) {}

    /// Called after every completed entry, successful or not
    fn advance(&mut self, _completed: usize, _total: usize) {}

    /// Called once after every entry has completed
    fn finish(&mut self) {}
}

/// A no-op progress sink
pub struct NullProgress;
impl Progress for NullProgress {}

/// Single-line `Progress: [n/total]` indicator on stderr
pub struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn advance(&mut self, completed: usize, total: usize) {
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{:50}\r  Progress: [{}/{}]", "", completed, total);
        let _ = err.flush();
    }

    fn finish(&mut self) {
        eprintln!();
    }
}

/// Count of completed entries against the known total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCounter {
    pub completed: usize,
    pub total: usize,
}

/// An entry that exhausted its attempts
#[derive(Debug)]
pub struct Failure {
    pub reference: EntryReference,
    pub attempts: u32,
    pub error: BrowserError,
}

/// What a dispatch produced
#[derive(Debug, Default)]
pub struct Dispatched {
    /// Non-empty records, in reference order
    pub records: Vec<Record>,
    /// Entries that scraped successfully but had no field at all
    pub empty: usize,
    pub failures: Vec<Failure>,
    pub progress: ProgressCounter,
}

/// State shared by all units of one run
struct RunState<P> {
    progress: ProgressCounter,
    outcomes: Vec<(usize, ScrapeOutcome)>,
    sink: P,
}

pub struct Dispatcher {
    limit: usize,
    scraper: Arc<ProfileScraper>,
}

impl Dispatcher {
    pub fn new(scraper: ProfileScraper, limit: usize) -> Self {
        Self { limit: limit.max(1), scraper: Arc::new(scraper) }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Scrape every reference and wait for all of them before aggregating
    pub async fn dispatch<D, P>(
        &self,
        driver: Arc<D>,
        references: impl IntoIterator<Item = EntryReference>,
        sink: P,
    ) -> Result<Dispatched, HarvestError>
    where
        D: Driver + 'static,
        P: Progress + 'static,
    {
        let references: Vec<EntryReference> = references.into_iter().collect();
        let total = references.len();

        let mut sink = sink;
        sink.begin(total);
        let state = Arc::new(Mutex::new(RunState {
            progress: ProgressCounter { completed: 0, total },
            outcomes: Vec::with_capacity(total),
            sink,
        }));

        let semaphore = Arc::new(Semaphore::new(self.limit));
        let mut units = JoinSet::new();

        for (index, reference) in references.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let scraper = self.scraper.clone();
            let driver = driver.clone();
            let state = state.clone();

            units.spawn(async move {
                let _permit = semaphore.acquire_owned().await?;
                let outcome = scrape_isolated(scraper, driver, reference).await;

                let mut run = state.lock().await;
                run.progress.completed += 1;
                let ProgressCounter { completed, total } = run.progress;
                run.sink.advance(completed, total);
                run.outcomes.push((index, outcome));
                Ok::<_, HarvestError>(())
            });
        }

        // Every unit is awaited, even after one of them errors
        let mut first_error = None;
        while let Some(joined) = units.join_next().await {
            let result = joined.map_err(HarvestError::from).and_then(|unit| unit);
            if let Err(e) = result {
                log::error!("Dispatch unit failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let mut run = state.lock().await;
        run.sink.finish();
        let progress = run.progress;
        let mut outcomes = std::mem::take(&mut run.outcomes);
        drop(run);

        outcomes.sort_by_key(|(index, _)| *index);
        Ok(aggregate(outcomes.into_iter().map(|(_, outcome)| outcome), progress))
    }
}

/// Run one scrape on the blocking pool. A panic inside it ends only this entry,
/// which is reported as a definitive failure.
async fn scrape_isolated<D>(scraper: Arc<ProfileScraper>, driver: Arc<D>, reference: EntryReference) -> ScrapeOutcome
where
    D: Driver + 'static,
{
    let target = reference.clone();
    match tokio::task::spawn_blocking(move || scraper.scrape(&*driver, &target)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Scrape of {} aborted: {}. Skipping.", reference, e);
            ScrapeOutcome::DefinitiveFailure {
                reference,
                attempts: 1,
                last_error: BrowserError::TabOperationFailed(format!("Scrape aborted: {}", e)),
            }
        }
    }
}

/// Keep non-empty records; set failures and empty records aside
fn aggregate(outcomes: impl Iterator<Item = ScrapeOutcome>, progress: ProgressCounter) -> Dispatched {
    let mut dispatched = Dispatched { progress, ..Default::default() };

    for outcome in outcomes {
        match outcome {
            ScrapeOutcome::Scraped(record) if record.is_empty() => dispatched.empty += 1,
            ScrapeOutcome::Scraped(record) => dispatched.records.push(record),
            ScrapeOutcome::DefinitiveFailure { reference, attempts, last_error } => {
                dispatched.failures.push(Failure { reference, attempts, error: last_error })
            }
        }
    }

    dispatched
}
