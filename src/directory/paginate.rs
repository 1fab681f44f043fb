//! Walks the search results frame page by page
//!
//! The loop ends successfully in two ways: no result row shows up within the wait
//! timeout, or a page has no "Next" control.

use crate::browser::{Locator, ScrapeSurface, WaitState};
use crate::config::Timeouts;
use crate::directory::record::EntryReference;
use crate::error::Result;
use indexmap::IndexSet;
use std::time::Duration;
use url::Url;

/// Result rows alternate between these two classes
pub const RESULT_ROWS: &str = "tr.trResultsRow, tr.trResultsRowAlt";

/// Links to office aggregates rather than individual members
pub const EXCLUDED_LINK: &str = "offices_profile.cfm";

/// First link of the first cell of each result row
pub fn row_link_locator() -> Locator {
    Locator::xpath(
        "//tr[contains(concat(' ', normalize-space(@class), ' '), ' trResultsRow ') \
         or contains(concat(' ', normalize-space(@class), ' '), ' trResultsRowAlt ')]\
         /td[1]/descendant::a[1]",
    )
}

/// Pagination link whose text is exactly "Next"
pub fn next_locator() -> Locator {
    Locator::xpath(r#"//a[normalize-space(text())="Next"]"#)
}

pub struct Paginator {
    base: Url,
    row_timeout: Duration,
    load_timeout: Duration,
    settle: Duration,
}

impl Paginator {
    pub fn new(base: Url, timeouts: &Timeouts) -> Self {
        Self {
            base,
            row_timeout: timeouts.element_wait(),
            load_timeout: timeouts.frame_load(),
            settle: timeouts.page_settle(),
        }
    }

    /// Collect every member reference across all result pages, in discovery order
    pub fn collect_entry_references<S: ScrapeSurface + ?Sized>(&self, results: &S) -> Result<IndexSet<EntryReference>> {
        let rows = Locator::css(RESULT_ROWS);
        let links = row_link_locator();
        let next = next_locator();
        let mut references = IndexSet::new();
        let mut page = 1;

        loop {
            if let Err(e) = results.wait_for(&rows, WaitState::Attached, self.row_timeout) {
                if e.is_timeout() {
                    log::debug!("No result rows on page {}; results exhausted", page);
                    break;
                }
                return Err(e);
            }

            let before = references.len();
            for index in 0..results.count(&links)? {
                let href = results.attribute(&links, index, "href")?.unwrap_or_default();
                if let Some(reference) = self.accept(&href) {
                    references.insert(reference);
                }
            }
            log::info!("Results page {}: {} new profiles ({} total)", page, references.len() - before, references.len());

            if results.count(&next)? == 0 {
                break;
            }

            results.click(&next, 0)?;
            results.wait_for_content_loaded(self.load_timeout)?;
            if !self.settle.is_zero() {
                std::thread::sleep(self.settle);
            }
            page += 1;
        }

        Ok(references)
    }

    /// Resolve a row link to a profile reference, skipping empty and office links
    fn accept(&self, href: &str) -> Option<EntryReference> {
        let href = href.trim();
        if href.is_empty() || href.contains(EXCLUDED_LINK) {
            return None;
        }
        EntryReference::resolve(&self.base, href)
    }
}
