//! In-memory browser used by unit tests

use crate::browser::{Driver, Locator, PageHandle, ScrapeSurface, WaitState};
use crate::directory::fields::label_value_locator;
use crate::error::{BrowserError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub text: Option<String>,
    pub attributes: HashMap<String, String>,
    pub hidden: bool,
    /// Clicking moves the owning surface to its next page
    pub advances: bool,
}

impl FakeElement {
    pub fn text(text: &str) -> Self {
        Self { text: Some(text.to_string()), ..Default::default() }
    }

    pub fn link(href: &str) -> Self {
        Self::default().attr("href", href)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn advancing(mut self) -> Self {
        self.advances = true;
        self
    }
}

#[derive(Debug, Default)]
struct Doc {
    pages: Vec<HashMap<Locator, Vec<FakeElement>>>,
    current: usize,
    failing: bool,
    clicks: Vec<Locator>,
    properties: Vec<(Locator, String, String)>,
}

impl Doc {
    fn matches(&self, locator: &Locator) -> Vec<FakeElement> {
        self.pages.get(self.current).and_then(|page| page.get(locator)).cloned().unwrap_or_default()
    }

    fn check(&self) -> Result<()> {
        if self.failing { Err(BrowserError::EvaluationFailed("element is detached".to_string())) } else { Ok(()) }
    }
}

/// A document whose content is a map from locator to matches. Clones share state.
#[derive(Debug, Clone)]
pub struct FakeSurface {
    doc: Arc<Mutex<Doc>>,
}

impl Default for FakeSurface {
    fn default() -> Self {
        let doc = Doc { pages: vec![HashMap::new()], ..Default::default() };
        Self { doc: Arc::new(Mutex::new(doc)) }
    }
}

impl FakeSurface {
    /// A profile document with `(label, value)` cells
    pub fn profile(fields: &[(&str, &str)]) -> Self {
        fields
            .iter()
            .fold(Self::default(), |surface, (label, value)| surface.with(label_value_locator(label), FakeElement::text(value)))
    }

    /// A surface where every operation fails
    pub fn failing() -> Self {
        let surface = Self::default();
        surface.doc.lock().unwrap().failing = true;
        surface
    }

    /// Add a match for `locator` on the last page
    pub fn with(self, locator: Locator, element: FakeElement) -> Self {
        {
            let mut doc = self.doc.lock().unwrap();
            let page = doc.pages.last_mut().unwrap();
            page.entry(locator).or_default().push(element);
        }
        self
    }

    /// Start a new page; later `with` calls populate it
    pub fn next_page(self) -> Self {
        self.doc.lock().unwrap().pages.push(HashMap::new());
        self
    }

    pub fn current_page(&self) -> usize {
        self.doc.lock().unwrap().current
    }

    pub fn clicks(&self) -> Vec<Locator> {
        self.doc.lock().unwrap().clicks.clone()
    }

    pub fn properties(&self) -> Vec<(Locator, String, String)> {
        self.doc.lock().unwrap().properties.clone()
    }
}

impl ScrapeSurface for FakeSurface {
    fn count(&self, locator: &Locator) -> Result<usize> {
        let doc = self.doc.lock().unwrap();
        doc.check()?;
        Ok(doc.matches(locator).len())
    }

    fn text_content(&self, locator: &Locator, index: usize) -> Result<Option<String>> {
        let doc = self.doc.lock().unwrap();
        doc.check()?;
        Ok(doc.matches(locator).get(index).map(|e| e.text.clone().unwrap_or_default()))
    }

    fn attribute(&self, locator: &Locator, index: usize, name: &str) -> Result<Option<String>> {
        let doc = self.doc.lock().unwrap();
        doc.check()?;
        Ok(doc.matches(locator).get(index).and_then(|e| e.attributes.get(name).cloned()))
    }

    fn click(&self, locator: &Locator, index: usize) -> Result<()> {
        let mut doc = self.doc.lock().unwrap();
        doc.check()?;
        let element = doc
            .matches(locator)
            .get(index)
            .cloned()
            .ok_or_else(|| BrowserError::ElementNotFound(locator.to_string()))?;

        doc.clicks.push(locator.clone());
        if element.advances {
            doc.current += 1;
        }
        Ok(())
    }

    fn set_property(&self, locator: &Locator, name: &str, value: &str) -> Result<()> {
        let mut doc = self.doc.lock().unwrap();
        doc.check()?;
        if doc.matches(locator).is_empty() {
            return Err(BrowserError::ElementNotFound(locator.to_string()));
        }
        doc.properties.push((locator.clone(), name.to_string(), value.to_string()));
        Ok(())
    }

    fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> Result<()> {
        let doc = self.doc.lock().unwrap();
        doc.check()?;
        let ready = doc.matches(locator).iter().any(|e| state == WaitState::Attached || !e.hidden);
        if ready { Ok(()) } else { Err(BrowserError::timeout(locator.to_string(), timeout)) }
    }

    fn wait_for_content_loaded(&self, _timeout: Duration) -> Result<()> {
        self.doc.lock().unwrap().check()
    }
}

/// How navigation to a site behaves
#[derive(Debug, Clone, Copy, Default)]
pub enum Failures {
    #[default]
    Never,
    /// The first `n` navigations fail
    First(u32),
    Always,
}

/// Everything reachable at one URL
#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pub document: FakeSurface,
    pub frames: HashMap<String, FakeSurface>,
    pub iframes: HashMap<Locator, FakeSurface>,
    pub failures: Failures,
}

impl FakeSite {
    pub fn page(document: FakeSurface) -> Self {
        Self { document, ..Default::default() }
    }

    pub fn with_frame(mut self, name: &str, frame: FakeSurface) -> Self {
        self.frames.insert(name.to_string(), frame);
        self
    }

    pub fn with_iframe(mut self, locator: Locator, frame: FakeSurface) -> Self {
        self.iframes.insert(locator, frame);
        self
    }

    pub fn failing(failures: Failures) -> Self {
        Self { failures, ..Default::default() }
    }
}

#[derive(Debug, Default)]
pub struct FakeStats {
    pub open: AtomicUsize,
    pub max_open: AtomicUsize,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub navigations: Mutex<HashMap<String, u32>>,
}

impl FakeStats {
    pub fn navigations_to(&self, url: &str) -> u32 {
        self.navigations.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

pub struct FakeDriver {
    sites: Arc<HashMap<String, FakeSite>>,
    pub stats: Arc<FakeStats>,
    latency: Duration,
}

impl FakeDriver {
    pub fn new(sites: impl IntoIterator<Item = (String, FakeSite)>) -> Self {
        Self { sites: Arc::new(sites.into_iter().collect()), stats: Arc::default(), latency: Duration::ZERO }
    }

    /// Make every navigation take `latency`
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl Driver for FakeDriver {
    type Page = FakePage;

    fn open_page(&self) -> Result<FakePage> {
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let open = self.stats.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_open.fetch_max(open, Ordering::SeqCst);

        Ok(FakePage {
            sites: self.sites.clone(),
            stats: self.stats.clone(),
            latency: self.latency,
            current: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }
}

pub struct FakePage {
    sites: Arc<HashMap<String, FakeSite>>,
    stats: Arc<FakeStats>,
    latency: Duration,
    current: Mutex<Option<FakeSite>>,
    closed: AtomicBool,
}

impl PageHandle for FakePage {
    type Surface = FakeSurface;

    fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        if self.is_closed() {
            return Err(BrowserError::PageClosed);
        }
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        let attempt = {
            let mut navigations = self.stats.navigations.lock().unwrap();
            let count = navigations.entry(url.to_string()).or_default();
            *count += 1;
            *count
        };

        let site = self
            .sites
            .get(url)
            .ok_or_else(|| BrowserError::NavigationFailed(format!("Failed to navigate to {}: not found", url)))?;

        match site.failures {
            Failures::Always => return Err(BrowserError::NavigationFailed(format!("Failed to navigate to {}", url))),
            Failures::First(n) if attempt <= n => return Err(BrowserError::timeout(url, timeout)),
            _ => {}
        }

        *self.current.lock().unwrap() = Some(site.clone());
        Ok(())
    }

    fn document(&self) -> FakeSurface {
        self.current.lock().unwrap().as_ref().map(|site| site.document.clone()).unwrap_or_default()
    }

    fn frame(&self, name: &str) -> Result<Option<FakeSurface>> {
        Ok(self.current.lock().unwrap().as_ref().and_then(|site| site.frames.get(name).cloned()))
    }

    fn content_frame(&self, iframe: &Locator) -> Result<Option<FakeSurface>> {
        Ok(self.current.lock().unwrap().as_ref().and_then(|site| site.iframes.get(iframe).cloned()))
    }

    fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.stats.open.fetch_sub(1, Ordering::SeqCst);
            self.stats.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
