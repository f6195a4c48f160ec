//! Headless Chrome engine over the DevTools protocol

use crate::browser::{BrowserEnvironment, BrowserSession, BrowserTab, BrowsingContext, Navigation};
use crate::config::BrowserSettings;
use crate::{BrowserError, BrowserResult};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, ResourceType,
};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::{FutureExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// How often `document.readyState` is polled while a page is parsing
const DOM_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One Chrome process shared by every site crawl of a run
pub struct ChromeSession {
    browser: Arc<RwLock<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    user_agent: String,
    closed: AtomicBool,
}

impl ChromeSession {
    /// Launches Chrome and spawns the task that drives its CDP event stream
    pub async fn launch(
        settings: &BrowserSettings,
        env: &BrowserEnvironment,
        page_timeout: Duration,
    ) -> BrowserResult<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(page_timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");

        if !settings.headless {
            builder = builder.with_head();
        }

        if let Some(path) = &env.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(BrowserError::Launch)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::info!("Chrome launched");

        Ok(Self {
            browser: Arc::new(RwLock::new(browser)),
            handler: Mutex::new(Some(handler_task)),
            user_agent: settings.user_agent.clone(),
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn new_context(&self) -> BrowserResult<Box<dyn BrowsingContext>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrowserError::Closed);
        }

        let response = self
            .browser
            .read()
            .await
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| BrowserError::Context(e.to_string()))?;

        Ok(Box::new(ChromeContext {
            browser: Arc::clone(&self.browser),
            context_id: response.result.browser_context_id.clone(),
            user_agent: self.user_agent.clone(),
        }))
    }

    async fn close(&self) -> BrowserResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        {
            let mut browser = self.browser.write().await;
            if let Err(e) = browser.close().await {
                tracing::warn!("Failed to close Chrome cleanly: {}", e);
            }
            if let Err(e) = browser.wait().await {
                tracing::warn!("Failed to wait for Chrome exit: {}", e);
            }
        }

        if let Some(task) = self.handler.lock().await.take() {
            task.abort();
        }

        tracing::info!("Chrome closed");
        Ok(())
    }
}

/// A Chrome browser context: its own cookies, cache and storage
struct ChromeContext {
    browser: Arc<RwLock<Browser>>,
    context_id: BrowserContextId,
    user_agent: String,
}

#[async_trait]
impl BrowsingContext for ChromeContext {
    async fn open_tab(&self) -> BrowserResult<Box<dyn BrowserTab>> {
        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(self.context_id.clone())
            .build()
            .map_err(BrowserError::Tab)?;

        let page = self
            .browser
            .read()
            .await
            .new_page(params)
            .await
            .map_err(|e| BrowserError::Tab(e.to_string()))?;

        if let Err(e) = page.set_user_agent(self.user_agent.as_str()).await {
            tracing::debug!("Failed to set user agent: {}", e);
        }
        if let Err(e) = page.execute(EnableParams::default()).await {
            tracing::debug!("Failed to enable network events: {}", e);
        }

        Ok(Box::new(ChromeTab { page }))
    }

    async fn close(&self) -> BrowserResult<()> {
        self.browser
            .read()
            .await
            .execute(DisposeBrowserContextParams::new(self.context_id.clone()))
            .await
            .map_err(|e| BrowserError::Context(e.to_string()))?;
        Ok(())
    }
}

struct ChromeTab {
    page: Page,
}

impl ChromeTab {
    /// Waits until the document has been parsed (DOMContentLoaded)
    async fn wait_for_dom_ready(&self) -> BrowserResult<()> {
        loop {
            let state: String = self
                .page
                .evaluate("document.readyState")
                .await
                .map_err(map_navigation_error)?
                .into_value()
                .map_err(|e| BrowserError::Content(e.to_string()))?;

            if state != "loading" {
                return Ok(());
            }
            tokio::time::sleep(DOM_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl BrowserTab for ChromeTab {
    async fn navigate(&mut self, url: &str) -> BrowserResult<Navigation> {
        let mut responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(map_navigation_error)?;

        // Page.navigate returns once the new document is committed, before
        // subresources load
        let committed = self
            .page
            .execute(NavigateParams::new(url))
            .await
            .map_err(map_navigation_error)?;
        if let Some(error) = committed.result.error_text.clone() {
            return Err(BrowserError::Navigation(error));
        }

        self.wait_for_dom_ready().await?;

        // Redirect hops do not emit responseReceived, so the first document
        // response is the final one
        let mut navigation = Navigation::default();
        while let Some(Some(event)) = responses.next().now_or_never() {
            if event.r#type == ResourceType::Document {
                navigation.status = u16::try_from(event.response.status).ok();
                navigation.final_url = Some(event.response.url.clone());
                break;
            }
        }
        if navigation.final_url.is_none() {
            navigation.final_url = self.page.url().await.ok().flatten();
        }

        Ok(navigation)
    }

    async fn content(&mut self) -> BrowserResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Content(e.to_string()))
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        self.page
            .close()
            .await
            .map_err(|e| BrowserError::Tab(e.to_string()))
    }
}

fn map_navigation_error(error: CdpError) -> BrowserError {
    match error {
        CdpError::Timeout => BrowserError::Timeout,
        other => BrowserError::Navigation(other.to_string()),
    }
}
