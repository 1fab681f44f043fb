//! Browser capability layer
//!
//! The directory logic never talks to Chrome directly. It is written against three
//! small capability traits:
//! - [`Driver`]: one shared browser that can open fresh pages
//! - [`PageHandle`]: a single tab, owned by one worker for one attempt
//! - [`ScrapeSurface`]: a document to query, either a page or a frame inside it
//!
//! [`BrowserSession`] implements them on top of `headless_chrome`.

pub mod config;
#[cfg(test)]
pub(crate) mod fake;
pub mod page;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use page::{ChromePage, ChromeSurface, DocumentRoot};
pub use session::BrowserSession;

use crate::error::Result;
use std::fmt;
use std::time::Duration;

/// How an element is located on a surface
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// CSS selector
    Css(String),
    /// XPath expression, evaluated against the surface's document
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(selector) => write!(f, "css={}", selector),
            Self::XPath(expression) => write!(f, "xpath={}", expression),
        }
    }
}

/// Condition an element wait is satisfied by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// Present in the document
    Attached,
    /// Present and rendered with a non-empty box
    Visible,
}

/// A rendered document that elements can be read from and acted on.
///
/// Indices address matches in document order. Missing elements are reported as
/// `None`/`0` by the read operations; only `click` treats absence as an error.
pub trait ScrapeSurface {
    /// Number of elements matching `locator`
    fn count(&self, locator: &Locator) -> Result<usize>;

    /// Text content of the `index`-th match
    fn text_content(&self, locator: &Locator, index: usize) -> Result<Option<String>>;

    /// Attribute `name` of the `index`-th match
    fn attribute(&self, locator: &Locator, index: usize, name: &str) -> Result<Option<String>>;

    /// Click the `index`-th match
    fn click(&self, locator: &Locator, index: usize) -> Result<()>;

    /// Assign a DOM property on the first match (e.g. an iframe's `src`)
    fn set_property(&self, locator: &Locator, name: &str, value: &str) -> Result<()>;

    /// Block until a match reaches `state`, failing with a timeout error otherwise
    fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> Result<()>;

    /// Block until the document has finished parsing
    fn wait_for_content_loaded(&self, timeout: Duration) -> Result<()>;
}

/// A navigable page (tab)
pub trait PageHandle {
    type Surface: ScrapeSurface;

    /// Navigate and wait for the load to complete
    fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// The top-level document
    fn document(&self) -> Self::Surface;

    /// A frame of this page by its `name`, if the page has one
    fn frame(&self, name: &str) -> Result<Option<Self::Surface>>;

    /// The content document of the iframe element at `iframe`
    fn content_frame(&self, iframe: &Locator) -> Result<Option<Self::Surface>>;

    fn close(&self) -> Result<()>;

    fn is_closed(&self) -> bool;
}

/// A browser shared by every worker of a run
pub trait Driver: Send + Sync {
    type Page: PageHandle;

    /// Open a fresh page owned by the caller
    fn open_page(&self) -> Result<Self::Page>;
}
