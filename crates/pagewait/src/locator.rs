//! Named selectors resolved on demand.

use crate::driver::{ElementHandle, Selector, WebDriver};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::trace;

/// Maps symbolic element names to selectors.
///
/// Nothing is looked up until [`resolve`](Self::resolve) is called, and every
/// call performs a fresh lookup, so handles never outlive a navigation by
/// accident. Two names may share one selector.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct LocatorRegistry {
    selectors: BTreeMap<String, Selector>,
}

impl LocatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `selector` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, selector: Selector) {
        self.selectors.insert(name.into(), selector);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, selector: Selector) -> Self {
        self.register(name, selector);
        self
    }

    pub fn selector(&self, name: &str) -> Result<&Selector> {
        self.selectors
            .get(name)
            .ok_or_else(|| Error::UnknownLocator(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.selectors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.selectors.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Look up the element registered as `name` on the current page.
    pub async fn resolve<D: WebDriver + ?Sized>(
        &self,
        driver: &D,
        name: &str,
    ) -> Result<ElementHandle> {
        let selector = self.selector(name)?;
        trace!(name, %selector, "resolving locator");
        driver.find_element(selector).await
    }

    /// Look up every element matching `name`.
    pub async fn resolve_all<D: WebDriver + ?Sized>(
        &self,
        driver: &D,
        name: &str,
    ) -> Result<Vec<ElementHandle>> {
        let selector = self.selector(name)?;
        driver.find_elements(selector).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDriver, FakeElement};
    use crate::ErrorKind;

    fn lipsum_registry() -> LocatorRegistry {
        LocatorRegistry::new()
            .with("generate_button", Selector::xpath("//input[@id='generate']"))
            .with("number_of_words", Selector::id("lipsum"))
            .with("lipsum", Selector::id("lipsum"))
    }

    #[test]
    fn test_duplicate_selectors_allowed() {
        let registry = lipsum_registry();
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.selector("number_of_words").unwrap(),
            registry.selector("lipsum").unwrap()
        );
    }

    #[test]
    fn test_unknown_name() {
        let err = lipsum_registry().selector("missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownLocator);
        assert_eq!(err.to_string(), "unknown locator: missing");
    }

    #[test]
    fn test_deserialize_from_map() {
        let registry: LocatorRegistry = serde_json::from_str(
            r##"{
                "russian_button": {"xpath": "//a[@class='ru']"},
                "first_paragraph": {"css": "#lipsum > p:nth-child(1)"}
            }"##,
        )
        .unwrap();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["first_paragraph", "russian_button"]
        );
    }

    #[tokio::test]
    async fn test_resolve_is_fresh_each_time() {
        let registry = lipsum_registry();
        let driver = FakeDriver::new().with_element(Selector::id("lipsum"), FakeElement::text("x"));
        driver.navigate("about:blank").await.unwrap();

        let first = registry.resolve(&driver, "lipsum").await.unwrap();
        let second = registry.resolve(&driver, "number_of_words").await.unwrap();
        assert_ne!(first.id(), second.id());

        let err = registry
            .resolve(&driver, "generate_button")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ElementNotFound);

        let all = registry.resolve_all(&driver, "lipsum").await.unwrap();
        assert_eq!(all.len(), 1);
    }
}
