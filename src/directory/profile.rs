//! Profile scraping with bounded retries

use crate::browser::{Driver, PageHandle, ScrapeSurface};
use crate::config::HarvestConfig;
use crate::directory::fields;
use crate::directory::record::{EntryReference, Record, ScrapeOutcome};
use crate::error::{BrowserError, Result};
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

/// Name of the frame some profile pages wrap their content in
pub const MAIN_FRAME: &str = "main";

/// Sleeps between attempts. Replaceable so tests can observe backoff without waiting.
pub type Pause = Arc<dyn Fn(Duration) + Send + Sync>;

/// The surface a profile is read from, chosen once per attempt
pub enum ProfileSurface<S> {
    /// Content wrapped in the `main` frame
    Frame(S),
    /// Content directly in the page
    Page(S),
}

impl<S: ScrapeSurface> ProfileSurface<S> {
    /// Prefer the `main` frame once it has loaded, otherwise use the page itself
    pub fn select<P>(page: &P, frame_timeout: Duration) -> Result<Self>
    where
        P: PageHandle<Surface = S> + ?Sized,
    {
        match page.frame(MAIN_FRAME)? {
            Some(frame) => {
                frame.wait_for_content_loaded(frame_timeout)?;
                Ok(Self::Frame(frame))
            }
            None => Ok(Self::Page(page.document())),
        }
    }

    pub fn surface(&self) -> &S {
        match self {
            Self::Frame(s) | Self::Page(s) => s,
        }
    }

    pub fn is_frame(&self) -> bool {
        matches!(self, Self::Frame(_))
    }
}

/// Closes the page when dropped, whichever way the attempt ends
struct PageGuard<P: PageHandle>(P);

impl<P: PageHandle> Deref for PageGuard<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.0
    }
}

impl<P: PageHandle> Drop for PageGuard<P> {
    fn drop(&mut self) {
        if !self.0.is_closed() {
            if let Err(e) = self.0.close() {
                log::debug!("Failed to close page: {}", e);
            }
        }
    }
}

/// Retry state of one entry
enum Attempt {
    Attempting(u32),
    Succeeded(Record),
    Exhausted { attempts: u32, last_error: BrowserError },
}

/// Scrapes single profiles, retrying transient failures a fixed number of times
#[derive(Clone)]
pub struct ProfileScraper {
    max_attempts: u32,
    retry_delay: Duration,
    navigation_timeout: Duration,
    frame_timeout: Duration,
    pause: Pause,
}

impl ProfileScraper {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay_duration(),
            navigation_timeout: config.timeouts.profile_navigation(),
            frame_timeout: config.timeouts.frame_load(),
            pause: Arc::new(std::thread::sleep),
        }
    }

    /// Builder method: replace how the retry delay is waited out
    pub fn with_pause(mut self, pause: Pause) -> Self {
        self.pause = pause;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Scrape `reference`, returning a record or a definitive failure once attempts run out
    pub fn scrape<D: Driver + ?Sized>(&self, driver: &D, reference: &EntryReference) -> ScrapeOutcome {
        let mut state = Attempt::Attempting(1);

        loop {
            state = match state {
                Attempt::Attempting(n) => match self.attempt(driver, reference) {
                    Ok(record) => Attempt::Succeeded(record),
                    Err(e) => {
                        log::warn!("Attempt {}/{} failed for {}: {}", n, self.max_attempts, reference, e);
                        if n < self.max_attempts {
                            (self.pause)(self.retry_delay);
                            Attempt::Attempting(n + 1)
                        } else {
                            Attempt::Exhausted { attempts: n, last_error: e }
                        }
                    }
                },
                Attempt::Succeeded(record) => return ScrapeOutcome::Scraped(record),
                Attempt::Exhausted { attempts, last_error } => {
                    log::error!("All {} attempts failed for {}: {}. Skipping.", attempts, reference, last_error);
                    return ScrapeOutcome::DefinitiveFailure { reference: reference.clone(), attempts, last_error };
                }
            };
        }
    }

    /// One attempt on a fresh page; the page is closed before this returns
    fn attempt<D: Driver + ?Sized>(&self, driver: &D, reference: &EntryReference) -> Result<Record> {
        let page = PageGuard(driver.open_page()?);
        page.goto(reference.as_str(), self.navigation_timeout)?;

        let surface = ProfileSurface::select(&*page, self.frame_timeout)?;
        log::debug!("Scraping {} from its {}", reference, if surface.is_frame() { "main frame" } else { "page" });

        let record = fields::extract_record(surface.surface())?;
        if record.name.is_empty() {
            log::warn!("Could not find 'Name' for profile on page {}", reference);
        }

        Ok(record)
    }
}
