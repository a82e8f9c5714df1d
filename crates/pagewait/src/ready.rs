//! Page and element readiness built on [`wait_until`].

use crate::driver::{ElementHandle, Selector, WebDriver};
use crate::locator::LocatorRegistry;
use crate::poll::{wait_until, WaitSpec};
use crate::{Error, ErrorKind, Result};
use std::sync::Mutex;
use tracing::debug;

/// Script whose value is the document's ready state.
pub const READY_STATE_JS: &str = "document.readyState";

/// Waits for the page or a specific element to become usable.
pub struct ReadinessWaiter<'a, D: WebDriver + ?Sized> {
    driver: &'a D,
}

impl<'a, D: WebDriver + ?Sized> ReadinessWaiter<'a, D> {
    pub fn new(driver: &'a D) -> Self {
        Self { driver }
    }

    /// Wait until `document.readyState` reports `"complete"`.
    ///
    /// Fails with `ConditionTimeout` if it does not within `spec.timeout`.
    pub async fn wait_for_page_load_complete(&self, spec: &WaitSpec) -> Result<()> {
        let driver = self.driver;
        let outcome = wait_until(
            move || async move {
                let state = driver.execute_script(READY_STATE_JS).await?;
                Ok(state.as_str() == Some("complete"))
            },
            spec,
        )
        .await?;
        debug!(
            attempts = outcome.attempts(),
            elapsed = ?outcome.elapsed(),
            "page load wait finished"
        );
        outcome.into_result("document.readyState == \"complete\"", spec)
    }

    /// Wait until the element located by `selector` is displayed.
    ///
    /// Missing and stale elements are retried regardless of `spec.ignored`.
    /// Returns the handle that was seen visible, or `ElementNotReady` on
    /// timeout.
    pub async fn wait_for_element_visible(
        &self,
        selector: &Selector,
        spec: &WaitSpec,
    ) -> Result<ElementHandle> {
        let spec = spec
            .clone()
            .ignoring(ErrorKind::ElementNotFound)
            .ignoring(ErrorKind::StaleReference);
        let driver = self.driver;
        let visible: Mutex<Option<ElementHandle>> = Mutex::new(None);
        let slot = &visible;

        let outcome = wait_until(
            move || async move {
                let element = driver.find_element(selector).await?;
                if driver.is_displayed(&element).await? {
                    *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(element);
                    Ok(true)
                } else {
                    Ok(false)
                }
            },
            &spec,
        )
        .await?;

        debug!(
            %selector,
            attempts = outcome.attempts(),
            elapsed = ?outcome.elapsed(),
            "visibility wait finished"
        );

        match visible.into_inner().unwrap_or_else(|e| e.into_inner()) {
            Some(element) if outcome.is_satisfied() => Ok(element),
            _ => Err(Error::ElementNotReady {
                selector: selector.to_string(),
                timeout: spec.timeout,
            }),
        }
    }

    /// [`wait_for_element_visible`](Self::wait_for_element_visible) for a registry name.
    pub async fn wait_for_named_visible(
        &self,
        registry: &LocatorRegistry,
        name: &str,
        spec: &WaitSpec,
    ) -> Result<ElementHandle> {
        let selector = registry.selector(name)?;
        self.wait_for_element_visible(selector, spec).await
    }
}
