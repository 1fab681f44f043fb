use crate::browser::{Locator, PageHandle, ScrapeSurface, WaitState};
use crate::error::{BrowserError, Result};
use headless_chrome::Tab;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Interval between checks while waiting on an element or load state
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Which document of a tab a surface reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentRoot {
    /// The tab's own document
    Page,
    /// `window.frames[name]`
    NamedFrame(String),
    /// `contentDocument` of the first iframe element matching the locator
    FrameElement(Locator),
}

/// A Chrome tab owned by one worker
pub struct ChromePage {
    tab: Arc<Tab>,
    closed: AtomicBool,
}

impl ChromePage {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self { tab, closed: AtomicBool::new(false) }
    }

    /// Get the underlying tab
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() { Err(BrowserError::PageClosed) } else { Ok(()) }
    }

    fn probe(&self, script: &str) -> Result<bool> {
        let result = self.tab.evaluate(script, false).map_err(|e| BrowserError::EvaluationFailed(e.to_string()))?;
        Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
    }
}

impl PageHandle for ChromePage {
    type Surface = ChromeSurface;

    fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        self.ensure_open()?;
        self.tab.set_default_timeout(timeout);

        self.tab
            .navigate_to(url)
            .map_err(|e| BrowserError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| BrowserError::NavigationFailed(format!("Navigation to {} did not complete: {}", url, e)))?;

        Ok(())
    }

    fn document(&self) -> ChromeSurface {
        ChromeSurface::new(self.tab.clone(), DocumentRoot::Page)
    }

    fn frame(&self, name: &str) -> Result<Option<ChromeSurface>> {
        self.ensure_open()?;
        let result = self
            .tab
            .evaluate(&frame_access_expr(name), false)
            .map_err(|e| BrowserError::EvaluationFailed(e.to_string()))?;

        match FrameAccess::from_reply(result.value.as_ref().and_then(Value::as_str)) {
            FrameAccess::Reachable => {
                Ok(Some(ChromeSurface::new(self.tab.clone(), DocumentRoot::NamedFrame(name.to_string()))))
            }
            FrameAccess::Blocked => {
                log::warn!("Frame '{}' exists but its document is not reachable, reading the page instead", name);
                Ok(None)
            }
            FrameAccess::Absent => Ok(None),
        }
    }

    fn content_frame(&self, iframe: &Locator) -> Result<Option<ChromeSurface>> {
        self.ensure_open()?;
        let root = DocumentRoot::FrameElement(iframe.clone());
        let script = format!("(function() {{ return !!({}); }})()", document_expr(&root));

        Ok(self.probe(&script)?.then(|| ChromeSurface::new(self.tab.clone(), root)))
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.tab
            .close(true)
            .map_err(|e| BrowserError::TabOperationFailed(format!("Failed to close tab: {}", e)))?;

        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// A document inside a Chrome tab, addressed through JavaScript.
///
/// Every query re-resolves the document, so a surface stays valid across
/// in-frame navigations such as result pagination.
#[derive(Clone)]
pub struct ChromeSurface {
    tab: Arc<Tab>,
    root: DocumentRoot,
}

/// Envelope returned by every surface script
#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    detached: bool,
    #[serde(default)]
    value: Value,
}

impl ChromeSurface {
    pub fn new(tab: Arc<Tab>, root: DocumentRoot) -> Self {
        Self { tab, root }
    }

    pub fn root(&self) -> &DocumentRoot {
        &self.root
    }

    /// Run `body` with `doc` and `nodes` (matches of `locator`) in scope and return its value
    fn run(&self, locator: &Locator, body: &str) -> Result<Value> {
        let script = format!(
            r#"(function() {{
                const doc = {doc};
                if (!doc) {{ return JSON.stringify({{ detached: true }}); }}
                const nodes = {nodes};
                const value = (function() {{ {body} }})();
                return JSON.stringify({{ value: value === undefined ? null : value }});
            }})()"#,
            doc = document_expr(&self.root),
            nodes = nodes_expr(locator),
            body = body,
        );

        let result = self
            .tab
            .evaluate(&script, false)
            .map_err(|e| BrowserError::EvaluationFailed(format!("{} on {}: {}", locator, self.describe(), e)))?;

        let raw = result
            .value
            .ok_or_else(|| BrowserError::EvaluationFailed("No value returned from surface script".to_string()))?;

        let json: String = serde_json::from_value(raw)
            .map_err(|e| BrowserError::EvaluationFailed(format!("Failed to get JSON string: {}", e)))?;

        let reply: Reply = serde_json::from_str(&json)
            .map_err(|e| BrowserError::EvaluationFailed(format!("Failed to parse surface reply: {}", e)))?;

        if reply.detached {
            return Err(BrowserError::FrameNotFound(self.describe()));
        }

        Ok(reply.value)
    }

    fn describe(&self) -> String {
        match &self.root {
            DocumentRoot::Page => "page".to_string(),
            DocumentRoot::NamedFrame(name) => format!("frame '{}'", name),
            DocumentRoot::FrameElement(locator) => format!("iframe {}", locator),
        }
    }

    fn string_at(&self, locator: &Locator, body: &str) -> Result<Option<String>> {
        match self.run(locator, body)? {
            Value::String(s) => Ok(Some(s)),
            _ => Ok(None),
        }
    }
}

impl ScrapeSurface for ChromeSurface {
    fn count(&self, locator: &Locator) -> Result<usize> {
        let value = self.run(locator, "return nodes.length;")?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    fn text_content(&self, locator: &Locator, index: usize) -> Result<Option<String>> {
        let body = format!("const n = nodes[{}]; return n ? (n.textContent || '') : null;", index);
        self.string_at(locator, &body)
    }

    fn attribute(&self, locator: &Locator, index: usize, name: &str) -> Result<Option<String>> {
        let body = format!("const n = nodes[{}]; return n ? n.getAttribute({}) : null;", index, js_string(name));
        self.string_at(locator, &body)
    }

    fn click(&self, locator: &Locator, index: usize) -> Result<()> {
        let body = format!("const n = nodes[{}]; if (!n) {{ return false; }} n.click(); return true;", index);

        match self.run(locator, &body)? {
            Value::Bool(true) => Ok(()),
            _ => Err(BrowserError::ElementNotFound(format!("{} (index {}) in {}", locator, index, self.describe()))),
        }
    }

    fn set_property(&self, locator: &Locator, name: &str, value: &str) -> Result<()> {
        let body = format!(
            "const n = nodes[0]; if (!n) {{ return false; }} n[{}] = {}; return true;",
            js_string(name),
            js_string(value)
        );

        match self.run(locator, &body)? {
            Value::Bool(true) => Ok(()),
            _ => Err(BrowserError::ElementNotFound(format!("{} in {}", locator, self.describe()))),
        }
    }

    fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> Result<()> {
        let body = match state {
            WaitState::Attached => "return nodes.length > 0;",
            WaitState::Visible => {
                "return nodes.some(n => !!(n.offsetWidth || n.offsetHeight || n.getClientRects().length));"
            }
        };

        poll_until(timeout, &locator.to_string(), || Ok(self.run(locator, body)?.as_bool().unwrap_or(false)))
    }

    fn wait_for_content_loaded(&self, timeout: Duration) -> Result<()> {
        let any = Locator::css(":root");
        let what = format!("{} to load", self.describe());

        poll_until(timeout, &what, || {
            Ok(self.run(&any, "return doc.readyState !== 'loading';")?.as_bool().unwrap_or(false))
        })
    }
}

/// Poll `check` until it reports true. Errors from a single check are treated as
/// "not ready yet" because frames are briefly detached while they navigate.
fn poll_until(timeout: Duration, what: &str, mut check: impl FnMut() -> Result<bool>) -> Result<()> {
    let deadline = Instant::now() + timeout;

    loop {
        match check() {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => log::debug!("Waiting for {}: {}", what, e),
        }

        if Instant::now() >= deadline {
            return Err(BrowserError::timeout(what, timeout));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// JavaScript expression resolving to the surface's document, or null
fn document_expr(root: &DocumentRoot) -> String {
    match root {
        DocumentRoot::Page => "document".to_string(),
        DocumentRoot::NamedFrame(name) => format!(
            "(function() {{ try {{ const w = window.frames[{}]; return w ? w.document : null; }} catch (e) {{ return null; }} }})()",
            js_string(name)
        ),
        DocumentRoot::FrameElement(locator) => format!(
            "(function() {{ const doc = document; const el = {}[0]; try {{ return el ? el.contentDocument : null; }} catch (e) {{ return null; }} }})()",
            nodes_expr(locator)
        ),
    }
}

/// What a named-frame lookup found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameAccess {
    Absent,
    /// The frame exists but its document throws or is null (cross-origin without relaxed isolation)
    Blocked,
    Reachable,
}

impl FrameAccess {
    fn from_reply(reply: Option<&str>) -> Self {
        match reply {
            Some("reachable") => Self::Reachable,
            Some("blocked") => Self::Blocked,
            _ => Self::Absent,
        }
    }
}

/// JavaScript expression classifying `window.frames[name]` as absent, blocked or reachable
fn frame_access_expr(name: &str) -> String {
    format!(
        "(function() {{ const w = window.frames[{}]; if (!w) return 'absent'; \
         try {{ return w.document ? 'reachable' : 'blocked'; }} catch (e) {{ return 'blocked'; }} }})()",
        js_string(name)
    )
}

/// JavaScript expression resolving to the array of matches of `locator` within `doc`
fn nodes_expr(locator: &Locator) -> String {
    match locator {
        Locator::Css(selector) => format!("Array.from(doc.querySelectorAll({}))", js_string(selector)),
        Locator::XPath(expression) => format!(
            "(function() {{ const r = doc.evaluate({}, doc, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
             const out = []; for (let i = 0; i < r.snapshotLength; i++) {{ out.push(r.snapshotItem(i)); }} return out; }})()",
            js_string(expression)
        ),
    }
}

/// Quote a Rust string as a JavaScript string literal
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
