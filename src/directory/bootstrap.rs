use crate::browser::{Driver, Locator, PageHandle, ScrapeSurface, WaitState};
use crate::config::HarvestConfig;
use crate::directory::paginate::Paginator;
use crate::directory::record::EntryReference;
use crate::error::{BrowserError, HarvestError, Result};
use indexmap::IndexSet;

/// Iframe on the host page that embeds the search form
pub const SEARCH_IFRAME: &str = "iframe#idxc_iframe";

/// Last-name input; visible once the real form (not a placeholder) has loaded
pub const SEARCH_FORM_INPUT: &str = r#"input[name="LastName"]"#;

pub const SEARCH_SUBMIT: &str = r#"input[type="submit"], button[type="submit"]"#;

/// Open the search, submit it with empty criteria and collect every result reference.
///
/// Any failure aborts the phase; the bootstrap page is closed either way.
pub fn discover<D: Driver + ?Sized>(driver: &D, config: &HarvestConfig) -> Result<IndexSet<EntryReference>, HarvestError> {
    let paginator = Paginator::new(config.base()?, &config.timeouts);
    let page = driver.open_page().map_err(HarvestError::Bootstrap)?;

    let result = search(&page, config).and_then(|results| paginator.collect_entry_references(&results));

    if let Err(e) = page.close() {
        log::debug!("Failed to close search page: {}", e);
    }

    result.map_err(HarvestError::Bootstrap)
}

/// Drive the host page to a submitted search and return the results frame
fn search<P: PageHandle + ?Sized>(page: &P, config: &HarvestConfig) -> Result<P::Surface> {
    let timeouts = &config.timeouts;
    let iframe = Locator::css(SEARCH_IFRAME);

    page.goto(&config.host_url, timeouts.host_navigation())?;

    let host = page.document();
    host.wait_for(&iframe, WaitState::Attached, timeouts.element_wait())?;
    host.set_property(&iframe, "src", &config.search_url)?;

    let frame = page
        .content_frame(&iframe)?
        .ok_or_else(|| BrowserError::FrameNotFound("Could not find iframe content".to_string()))?;

    frame.wait_for(&Locator::css(SEARCH_FORM_INPUT), WaitState::Visible, timeouts.element_wait())?;
    frame.click(&Locator::css(SEARCH_SUBMIT), 0)?;
    log::info!("Submitted member search");

    Ok(frame)
}
