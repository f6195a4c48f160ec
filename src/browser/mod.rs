//! Browser seam for page loading
//!
//! A harvest run shares one [`BrowserSession`] across every site. Each site
//! crawl opens its own [`BrowsingContext`] (separate cookies and storage), and
//! every fetch attempt opens and closes its own [`BrowserTab`].
//!
//! Two engines implement the seam:
//! - [`ChromeSession`]: headless Chrome driven over the DevTools protocol
//! - [`HttpSession`]: plain HTTP GETs, for hosts without a Chrome install

mod chrome;
mod http;
#[cfg(test)]
pub(crate) mod mock;
pub mod setup;

pub use chrome::ChromeSession;
pub use http::HttpSession;
pub use setup::{environment, init_environment, BrowserEnvironment};

use crate::config::{BrowserEngine, BrowserSettings};
use crate::BrowserResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A running browser shared by all site crawls of a run
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Opens an isolated browsing context for one site
    async fn new_context(&self) -> BrowserResult<Box<dyn BrowsingContext>>;

    /// Shuts the browser down; later calls are no-ops
    async fn close(&self) -> BrowserResult<()>;
}

/// An isolated set of cookies and storage owned by one site crawl
#[async_trait]
pub trait BrowsingContext: Send + Sync {
    /// Opens a blank tab inside this context
    async fn open_tab(&self) -> BrowserResult<Box<dyn BrowserTab>>;

    /// Disposes the context and any tab still open in it
    async fn close(&self) -> BrowserResult<()>;
}

/// Where a navigation ended up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    /// HTTP status of the main document, if known
    pub status: Option<u16>,

    /// URL of the loaded document after redirects, if known
    pub final_url: Option<String>,
}

/// A single tab, used for exactly one fetch attempt
#[async_trait]
pub trait BrowserTab: Send {
    /// Navigates to `url` and returns once the document is ready
    async fn navigate(&mut self, url: &str) -> BrowserResult<Navigation>;

    /// Returns the current rendered markup
    async fn content(&mut self) -> BrowserResult<String>;

    /// Closes the tab
    async fn close(self: Box<Self>) -> BrowserResult<()>;
}

/// Starts the configured browser engine
///
/// This performs the process-wide environment setup first (idempotent), then
/// launches one browser for the run. Failure here is fatal for the run: no
/// page can be fetched without a browser.
pub async fn launch_session(
    settings: &BrowserSettings,
    page_timeout: Duration,
) -> BrowserResult<Arc<dyn BrowserSession>> {
    let env = init_environment(settings);

    match settings.engine {
        BrowserEngine::Chrome => {
            let session = ChromeSession::launch(settings, env, page_timeout).await?;
            Ok(Arc::new(session))
        }
        BrowserEngine::Http => Ok(Arc::new(HttpSession::new(settings, page_timeout))),
    }
}
