//! Plain HTTP engine
//!
//! Loads pages with a single GET and no script execution. Each browsing
//! context owns its own client and cookie jar, so sites stay isolated just
//! as they do with Chrome contexts.

use crate::browser::{BrowserSession, BrowserTab, BrowsingContext, Navigation};
use crate::config::BrowserSettings;
use crate::{BrowserError, BrowserResult};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// HTTP-only stand-in for a browser
pub struct HttpSession {
    user_agent: String,
    request_timeout: Duration,
    closed: AtomicBool,
}

impl HttpSession {
    pub fn new(settings: &BrowserSettings, request_timeout: Duration) -> Self {
        Self {
            user_agent: settings.user_agent.clone(),
            request_timeout,
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn new_context(&self) -> BrowserResult<Box<dyn BrowsingContext>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrowserError::Closed);
        }

        let client = Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Box::new(HttpContext { client }))
    }

    async fn close(&self) -> BrowserResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct HttpContext {
    client: Client,
}

#[async_trait]
impl BrowsingContext for HttpContext {
    async fn open_tab(&self) -> BrowserResult<Box<dyn BrowserTab>> {
        Ok(Box::new(HttpTab {
            client: self.client.clone(),
            body: None,
        }))
    }

    async fn close(&self) -> BrowserResult<()> {
        Ok(())
    }
}

struct HttpTab {
    client: Client,
    body: Option<String>,
}

#[async_trait]
impl BrowserTab for HttpTab {
    async fn navigate(&mut self, url: &str) -> BrowserResult<Navigation> {
        let response = self.client.get(url).send().await.map_err(map_request_error)?;
        let navigation = Navigation {
            status: Some(response.status().as_u16()),
            final_url: Some(response.url().to_string()),
        };
        let body = response.text().await.map_err(map_request_error)?;
        self.body = Some(body);
        Ok(navigation)
    }

    async fn content(&mut self) -> BrowserResult<String> {
        self.body
            .clone()
            .ok_or_else(|| BrowserError::Content("no page loaded in this tab".to_string()))
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        Ok(())
    }
}

fn map_request_error(error: reqwest::Error) -> BrowserError {
    if error.is_timeout() {
        BrowserError::Timeout
    } else {
        BrowserError::Http(error)
    }
}
