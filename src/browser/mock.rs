//! Scripted in-memory browser for unit tests

use crate::browser::{BrowserSession, BrowserTab, BrowsingContext, Navigation};
use crate::{BrowserError, BrowserResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a scripted URL answers on one navigation
#[derive(Debug, Clone)]
pub(crate) enum MockPage {
    /// HTTP 200 with this markup
    Html(String),
    /// Given status with this markup
    Status(u16, String),
    /// Navigation timeout
    Timeout,
    /// Any other navigation failure
    Error(String),
    /// Redirect to another scripted URL
    Redirect(String),
}

#[derive(Default)]
pub(crate) struct MockState {
    /// Answers per URL; attempt n uses entry n, the last entry repeats
    pages: HashMap<String, Vec<MockPage>>,
    navigations: Mutex<HashMap<String, u32>>,
    pub contexts_opened: AtomicUsize,
    pub contexts_closed: AtomicUsize,
    pub tabs_opened: AtomicUsize,
    pub tabs_closed: AtomicUsize,
    open_tabs: AtomicUsize,
    pub max_open_tabs: AtomicUsize,
    pub session_closes: AtomicUsize,
    closed: AtomicBool,
    delay: Duration,
}

impl MockState {
    /// Number of navigations made to `url`
    pub fn navigations(&self, url: &str) -> u32 {
        self.navigations
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_navigations(&self) -> u32 {
        self.navigations.lock().unwrap().values().sum()
    }

    fn next_page(&self, url: &str) -> MockPage {
        let attempt = {
            let mut navigations = self.navigations.lock().unwrap();
            let count = navigations.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count as usize
        };

        match self.pages.get(url) {
            Some(script) if !script.is_empty() => {
                script[(attempt - 1).min(script.len() - 1)].clone()
            }
            _ => MockPage::Status(404, "<html><body>Not found</body></html>".to_string()),
        }
    }
}

/// Builder and handle for a scripted session
#[derive(Default)]
pub(crate) struct MockBrowser {
    pages: HashMap<String, Vec<MockPage>>,
    delay: Duration,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every navigation to `url` with `page`
    pub fn page(mut self, url: &str, page: MockPage) -> Self {
        self.pages.insert(url.to_string(), vec![page]);
        self
    }

    /// Answers successive navigations to `url` with `script`
    pub fn script(mut self, url: &str, script: Vec<MockPage>) -> Self {
        self.pages.insert(url.to_string(), script);
        self
    }

    /// Makes every navigation take `delay`, so fetches overlap
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn build(self) -> (Arc<MockSession>, Arc<MockState>) {
        let state = Arc::new(MockState {
            pages: self.pages,
            delay: self.delay,
            ..MockState::default()
        });
        let session = Arc::new(MockSession {
            state: Arc::clone(&state),
        });
        (session, state)
    }
}

pub(crate) struct MockSession {
    state: Arc<MockState>,
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn new_context(&self) -> BrowserResult<Box<dyn BrowsingContext>> {
        if self.state.closed.load(Ordering::SeqCst) {
            return Err(BrowserError::Closed);
        }
        self.state.contexts_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockContext {
            state: Arc::clone(&self.state),
        }))
    }

    async fn close(&self) -> BrowserResult<()> {
        self.state.closed.store(true, Ordering::SeqCst);
        self.state.session_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockContext {
    state: Arc<MockState>,
}

#[async_trait]
impl BrowsingContext for MockContext {
    async fn open_tab(&self) -> BrowserResult<Box<dyn BrowserTab>> {
        self.state.tabs_opened.fetch_add(1, Ordering::SeqCst);
        let open = self.state.open_tabs.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_open_tabs.fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(MockTab {
            state: Arc::clone(&self.state),
            markup: None,
        }))
    }

    async fn close(&self) -> BrowserResult<()> {
        self.state.contexts_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockTab {
    state: Arc<MockState>,
    markup: Option<String>,
}

#[async_trait]
impl BrowserTab for MockTab {
    async fn navigate(&mut self, url: &str) -> BrowserResult<Navigation> {
        if !self.state.delay.is_zero() {
            tokio::time::sleep(self.state.delay).await;
        }

        let mut current = url.to_string();
        loop {
            let (status, markup) = match self.state.next_page(&current) {
                MockPage::Html(markup) => (200, markup),
                MockPage::Status(status, markup) => (status, markup),
                MockPage::Timeout => return Err(BrowserError::Timeout),
                MockPage::Error(message) => return Err(BrowserError::Navigation(message)),
                MockPage::Redirect(target) => {
                    current = target;
                    continue;
                }
            };
            self.markup = Some(markup);
            return Ok(Navigation {
                status: Some(status),
                final_url: Some(current),
            });
        }
    }

    async fn content(&mut self) -> BrowserResult<String> {
        self.markup
            .clone()
            .ok_or_else(|| BrowserError::Content("nothing loaded".to_string()))
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        self.state.open_tabs.fetch_sub(1, Ordering::SeqCst);
        self.state.tabs_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Builds a page with `words` words of body text and the given links
pub(crate) fn page_html(words: usize, links: &[&str]) -> String {
    let text: Vec<String> = (0..words).map(|i| format!("word{}", i)).collect();
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!(
        "<html><head><title>Test</title></head><body><p>{}</p>{}</body></html>",
        text.join(" "),
        anchors
    )
}
