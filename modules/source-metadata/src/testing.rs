// Test double for the PageFetcher boundary.
//
// MockFetcher: HashMap-based URL → response, counts calls per URL, and can
// hold every fetch open until the test releases it.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::{MetadataError, Result};
use crate::fetcher::PageFetcher;

#[derive(Debug, Clone)]
pub enum MockResponse {
    Html(String),
    Status(u16),
    Unreachable,
    /// The fetch itself panics, as a buggy fetcher would.
    Panic,
}

/// Unregistered URLs behave like an unreachable host.
/// Builder pattern: `.on_html()`, `.on_status()`, `.on_unreachable()`, `.on_panic()`, `.held()`.
pub struct MockFetcher {
    responses: HashMap<String, MockResponse>,
    calls: Mutex<HashMap<String, usize>>,
    gate: watch::Sender<bool>,
}

impl MockFetcher {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            responses: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
            gate,
        }
    }

    pub fn on_html(mut self, url: &str, html: &str) -> Self {
        self.responses
            .insert(url.to_string(), MockResponse::Html(html.to_string()));
        self
    }

    pub fn on_status(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), MockResponse::Status(status));
        self
    }

    pub fn on_unreachable(mut self, url: &str) -> Self {
        self.responses
            .insert(url.to_string(), MockResponse::Unreachable);
        self
    }

    pub fn on_panic(mut self, url: &str) -> Self {
        self.responses.insert(url.to_string(), MockResponse::Panic);
        self
    }

    /// Block every fetch until [`MockFetcher::open`] is called.
    pub fn held(self) -> Self {
        self.gate.send_replace(false);
        self
    }

    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.lock_calls().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.lock_calls().values().sum()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, HashMap<String, usize>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        *self.lock_calls().entry(url.to_string()).or_insert(0) += 1;

        let mut gate = self.gate.subscribe();
        while !*gate.borrow_and_update() {
            if gate.changed().await.is_err() {
                break;
            }
        }

        match self.responses.get(url) {
            Some(MockResponse::Html(html)) => Ok(html.clone()),
            Some(MockResponse::Status(status)) => Err(MetadataError::Status {
                status: *status,
                url: url.to_string(),
            }),
            Some(MockResponse::Panic) => panic!("MockFetcher: fetch panicked for {url}"),
            Some(MockResponse::Unreachable) | None => Err(MetadataError::Transport(format!(
                "MockFetcher: connection refused for {url}"
            ))),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
