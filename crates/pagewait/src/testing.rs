//! Scripted in-memory [`WebDriver`] for tests.
//!
//! A [`FakeDriver`] holds a template page (elements keyed by selector). Each
//! `navigate` installs a fresh copy of the template and invalidates every
//! handle issued before it. Elements can be made absent, hidden or stale for
//! a number of calls, and click hooks can rewrite the page.

use crate::driver::{ElementHandle, Selector, WebDriver};
use crate::ready::READY_STATE_JS;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// One element of the fake page.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub text: String,
    pub value: String,
    absent_for: u32,
    hidden_for: u32,
    stale_for: u32,
}

impl FakeElement {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// An empty form field.
    pub fn input() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// `find_element` reports `ElementNotFound` for the next `polls` lookups.
    pub fn absent_for(mut self, polls: u32) -> Self {
        self.absent_for = polls;
        self
    }

    /// `is_displayed` reports `false` for the next `polls` checks.
    pub fn hidden_for(mut self, polls: u32) -> Self {
        self.hidden_for = polls;
        self
    }

    /// `is_displayed` reports `StaleReference` for the next `polls` checks.
    pub fn stale_for(mut self, polls: u32) -> Self {
        self.stale_for = polls;
        self
    }
}

/// Live state of the fake page, visible to click hooks.
#[derive(Debug, Default)]
pub struct FakePage {
    elements: HashMap<Selector, FakeElement>,
    handles: HashMap<String, Selector>,
    next_handle: u64,
    loading_left: u32,
    url: Option<String>,
    navigations: Vec<String>,
    clicks: Vec<Selector>,
    script_calls: usize,
}

impl FakePage {
    pub fn element(&self, selector: &Selector) -> Option<&FakeElement> {
        self.elements.get(selector)
    }

    pub fn element_mut(&mut self, selector: &Selector) -> Option<&mut FakeElement> {
        self.elements.get_mut(selector)
    }

    /// Current value of a form field, empty if missing.
    pub fn value(&self, selector: &Selector) -> String {
        self.elements
            .get(selector)
            .map(|e| e.value.clone())
            .unwrap_or_default()
    }

    /// Insert or replace an element and invalidate its handles.
    pub fn render(&mut self, selector: Selector, element: FakeElement) {
        self.handles.retain(|_, s| s != &selector);
        self.elements.insert(selector, element);
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn issue(&mut self, selector: &Selector) -> ElementHandle {
        self.next_handle += 1;
        let id = format!("h{}", self.next_handle);
        self.handles.insert(id.clone(), selector.clone());
        ElementHandle::new(id, selector.clone())
    }

    fn live(&mut self, handle: &ElementHandle) -> Result<&mut FakeElement> {
        let selector = self
            .handles
            .get(handle.id())
            .cloned()
            .ok_or_else(|| Error::StaleReference(handle.to_string()))?;
        self.elements
            .get_mut(&selector)
            .ok_or_else(|| Error::StaleReference(handle.to_string()))
    }
}

type ClickHook = Box<dyn Fn(&mut FakePage) + Send + Sync>;

/// In-memory driver with a scripted page.
#[derive(Default)]
pub struct FakeDriver {
    template: HashMap<Selector, FakeElement>,
    loading_polls: u32,
    hooks: HashMap<Selector, ClickHook>,
    page: Mutex<FakePage>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element to the page installed on every navigation.
    pub fn with_element(mut self, selector: Selector, element: FakeElement) -> Self {
        self.template.insert(selector, element);
        self
    }

    /// Report `document.readyState == "loading"` for the first `polls` checks
    /// after each navigation.
    pub fn loading_for(mut self, polls: u32) -> Self {
        self.loading_polls = polls;
        self
    }

    /// Run `hook` against the live page whenever `selector` is clicked.
    pub fn on_click<F>(mut self, selector: Selector, hook: F) -> Self
    where
        F: Fn(&mut FakePage) + Send + Sync + 'static,
    {
        self.hooks.insert(selector, Box::new(hook));
        self
    }

    /// URLs navigated to, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.page().navigations.clone()
    }

    /// Selectors clicked, in order.
    pub fn clicks(&self) -> Vec<Selector> {
        self.page().clicks.clone()
    }

    pub fn script_calls(&self) -> usize {
        self.page().script_calls
    }

    /// Inspect the live page.
    pub fn with_page<R>(&self, f: impl FnOnce(&mut FakePage) -> R) -> R {
        f(&mut self.page())
    }

    fn page(&self) -> MutexGuard<'_, FakePage> {
        self.page.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl WebDriver for FakeDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut page = self.page();
        page.elements = self.template.clone();
        page.handles.clear();
        page.loading_left = self.loading_polls;
        page.url = Some(url.to_string());
        page.navigations.push(url.to_string());
        Ok(())
    }

    async fn find_element(&self, selector: &Selector) -> Result<ElementHandle> {
        let mut page = self.page();
        let element = page
            .elements
            .get_mut(selector)
            .ok_or_else(|| Error::ElementNotFound(selector.to_string()))?;
        if element.absent_for > 0 {
            element.absent_for -= 1;
            return Err(Error::ElementNotFound(selector.to_string()));
        }
        Ok(page.issue(selector))
    }

    async fn find_elements(&self, selector: &Selector) -> Result<Vec<ElementHandle>> {
        match self.find_element(selector).await {
            Ok(handle) => Ok(vec![handle]),
            Err(Error::ElementNotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        let mut page = self.page();
        page.live(element)?;
        page.clicks.push(element.selector().clone());
        if let Some(hook) = self.hooks.get(element.selector()) {
            hook(&mut page);
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<()> {
        self.page().live(element)?.value.clear();
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<()> {
        self.page().live(element)?.value.push_str(text);
        Ok(())
    }

    async fn text(&self, element: &ElementHandle) -> Result<String> {
        Ok(self.page().live(element)?.text.clone())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool> {
        let mut page = self.page();
        let live = page.live(element)?;
        if live.stale_for > 0 {
            live.stale_for -= 1;
            return Err(Error::StaleReference(element.to_string()));
        }
        if live.hidden_for > 0 {
            live.hidden_for -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    async fn execute_script(&self, js: &str) -> Result<serde_json::Value> {
        let mut page = self.page();
        page.script_calls += 1;
        if js != READY_STATE_JS {
            return Ok(serde_json::Value::Null);
        }
        if page.url.is_none() {
            return Err(Error::Script("no document loaded".into()));
        }
        if page.loading_left > 0 {
            page.loading_left -= 1;
            return Ok("loading".into());
        }
        Ok("complete".into())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_navigation_invalidates_handles() {
        let sel = Selector::id("lipsum");
        let driver = FakeDriver::new().with_element(sel.clone(), FakeElement::text("a b"));
        driver.navigate("about:blank").await.unwrap();
        let handle = driver.find_element(&sel).await.unwrap();
        assert_eq!(driver.text(&handle).await.unwrap(), "a b");

        driver.navigate("about:blank").await.unwrap();
        let err = driver.text(&handle).await.unwrap_err();
        assert!(matches!(err, Error::StaleReference(_)));
    }

    #[tokio::test]
    async fn test_click_hook_rewrites_page() {
        let button = Selector::xpath("//input[@id='generate']");
        let out = Selector::id("lipsum");
        let hook_out = out.clone();
        let driver = FakeDriver::new()
            .with_element(button.clone(), FakeElement::text(""))
            .with_element(out.clone(), FakeElement::text("old"))
            .on_click(button.clone(), move |page| {
                page.render(hook_out.clone(), FakeElement::text("new"));
            });
        driver.navigate("about:blank").await.unwrap();

        let old = driver.find_element(&out).await.unwrap();
        let btn = driver.find_element(&button).await.unwrap();
        driver.click(&btn).await.unwrap();

        assert!(driver.text(&old).await.is_err());
        let fresh = driver.find_element(&out).await.unwrap();
        assert_eq!(driver.text(&fresh).await.unwrap(), "new");
        assert_eq!(driver.clicks(), vec![button]);
    }

    #[tokio::test]
    async fn test_inputs_clear_and_type() {
        let field = Selector::xpath("//input[@type='text']");
        let driver =
            FakeDriver::new().with_element(field.clone(), FakeElement::input().with_value("5"));
        driver.navigate("about:blank").await.unwrap();
        let handle = driver.find_element(&field).await.unwrap();
        driver.clear(&handle).await.unwrap();
        driver.send_keys(&handle, "20").await.unwrap();
        assert_eq!(driver.with_page(|p| p.value(&field)), "20");
    }

    #[tokio::test]
    async fn test_find_elements_empty_when_missing() {
        let driver = FakeDriver::new();
        driver.navigate("about:blank").await.unwrap();
        let found = driver.find_elements(&Selector::css("p")).await.unwrap();
        assert!(found.is_empty());
    }
}
