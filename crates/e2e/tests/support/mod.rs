//! Shared helpers for integration tests: an in-memory `Page` and a mock-backed client
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use shopbot_e2e::page::{Cookie, Page, WaitState};
use shopbot_e2e::{ApiClient, E2eError, E2eResult, HarnessConfig, MockBackend};

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub visible: bool,
    pub text: Option<String>,
    pub checked: bool,
    pub attributes: HashMap<String, String>,
    pub count: usize,
}

impl FakeElement {
    pub fn new() -> Self {
        Self {
            visible: true,
            text: None,
            checked: false,
            attributes: HashMap::new(),
            count: 1,
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

/// DOM, storage and cookies held in memory; clicks toggle `checked`
#[derive(Default)]
pub struct FakePage {
    pub elements: Mutex<HashMap<String, FakeElement>>,
    pub storage: Mutex<BTreeMap<String, String>>,
    pub cookies: Mutex<Vec<Cookie>>,
    pub visits: Mutex<Vec<String>>,
    pub clicks: Mutex<Vec<String>>,
    pub fills: Mutex<Vec<(String, String)>>,
    pub evaluate_result: Mutex<Value>,
    pub clears: Mutex<usize>,
}

impl FakePage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, selector: &str, element: FakeElement) {
        self.elements.lock().insert(selector.to_string(), element);
    }

    fn element(&self, selector: &str) -> Option<FakeElement> {
        self.elements.lock().get(selector).cloned()
    }

    fn missing(selector: &str) -> E2eError {
        E2eError::Timeout(format!("selector {}", selector))
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.visits.lock().push(url.to_string());
        Ok(())
    }

    async fn click(&self, selector: &str) -> E2eResult<()> {
        let mut elements = self.elements.lock();
        let element = elements
            .get_mut(selector)
            .filter(|e| e.visible)
            .ok_or_else(|| Self::missing(selector))?;
        element.checked = !element.checked;
        self.clicks.lock().push(selector.to_string());
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> E2eResult<()> {
        self.element(selector).ok_or_else(|| Self::missing(selector))?;
        self.fills.lock().push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn wait_for(&self, selector: &str, state: WaitState, _timeout: Duration) -> E2eResult<()> {
        let element = self.element(selector);
        let satisfied = match state {
            WaitState::Visible => element.map(|e| e.visible).unwrap_or(false),
            WaitState::Hidden => element.map(|e| !e.visible).unwrap_or(true),
            WaitState::Attached => element.is_some(),
            WaitState::Detached => element.is_none(),
        };
        if satisfied {
            Ok(())
        } else {
            Err(Self::missing(selector))
        }
    }

    async fn text_content(&self, selector: &str) -> E2eResult<Option<String>> {
        Ok(self.element(selector).ok_or_else(|| Self::missing(selector))?.text)
    }

    async fn get_attribute(&self, selector: &str, name: &str) -> E2eResult<Option<String>> {
        Ok(self
            .element(selector)
            .ok_or_else(|| Self::missing(selector))?
            .attributes
            .get(name)
            .cloned())
    }

    async fn is_checked(&self, selector: &str) -> E2eResult<bool> {
        Ok(self.element(selector).ok_or_else(|| Self::missing(selector))?.checked)
    }

    async fn count(&self, selector: &str) -> E2eResult<usize> {
        Ok(self.element(selector).map(|e| e.count).unwrap_or(0))
    }

    async fn evaluate(&self, _expression: &str) -> E2eResult<Value> {
        Ok(self.evaluate_result.lock().clone())
    }

    async fn local_storage_get(&self, key: &str) -> E2eResult<Option<String>> {
        Ok(self.storage.lock().get(key).cloned())
    }

    async fn local_storage_set(&self, key: &str, value: &str) -> E2eResult<()> {
        self.storage.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear_storage(&self) -> E2eResult<()> {
        self.storage.lock().clear();
        self.cookies.lock().clear();
        *self.clears.lock() += 1;
        Ok(())
    }

    async fn add_cookie(&self, cookie: &Cookie) -> E2eResult<()> {
        self.cookies.lock().push(cookie.clone());
        Ok(())
    }

    async fn url(&self) -> E2eResult<String> {
        self.visits
            .lock()
            .last()
            .cloned()
            .ok_or_else(|| E2eError::Playwright("no page loaded".to_string()))
    }
}

pub fn config_for(mock: &MockBackend) -> HarnessConfig {
    HarnessConfig {
        api_url: mock.url(),
        health_timeout: Duration::from_millis(500),
        request_timeout: Duration::from_secs(5),
        ..HarnessConfig::default()
    }
}

pub fn client_for(mock: &MockBackend) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(config_for(mock)).unwrap())
}

/// A loopback URL nothing listens on
pub fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
