//! The browser seam: selectors, element handles and the [`WebDriver`] trait.

use crate::Result;
use async_trait::async_trait;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// How a [`Selector`] expression is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Xpath,
    Css,
    Id,
}

impl Strategy {
    /// Name used in config files and page scripts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xpath => "xpath",
            Self::Css => "css",
            Self::Id => "id",
        }
    }
}

/// A rule for locating an element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    pub strategy: Strategy,
    pub expression: String,
}

impl Selector {
    pub fn new(strategy: Strategy, expression: impl Into<String>) -> Self {
        Self {
            strategy,
            expression: expression.into(),
        }
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::new(Strategy::Xpath, expression)
    }

    pub fn css(expression: impl Into<String>) -> Self {
        Self::new(Strategy::Css, expression)
    }

    pub fn id(expression: impl Into<String>) -> Self {
        Self::new(Strategy::Id, expression)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.strategy.as_str(), self.expression)
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(SelectorVisitor)
    }
}

struct SelectorVisitor;

impl<'de> Visitor<'de> for SelectorVisitor {
    type Value = Selector;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a selector map with single key (xpath, css or id)")
    }

    fn visit_map<M>(self, mut map: M) -> std::result::Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let key: String = map
            .next_key()?
            .ok_or_else(|| de::Error::custom("expected selector strategy key"))?;

        let strategy = match key.as_str() {
            "xpath" => Strategy::Xpath,
            "css" => Strategy::Css,
            "id" => Strategy::Id,
            other => return Err(de::Error::unknown_variant(other, &["xpath", "css", "id"])),
        };
        let expression: String = map.next_value()?;
        if expression.is_empty() {
            return Err(de::Error::custom("selector expression must not be empty"));
        }
        if map.next_key::<String>()?.is_some() {
            return Err(de::Error::custom("selector takes exactly one strategy key"));
        }
        Ok(Selector::new(strategy, expression))
    }
}

/// Opaque reference to a live element.
///
/// Valid only for the document it was found in. After a navigation or a
/// re-render the driver reports [`crate::Error::StaleReference`] for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    id: String,
    selector: Selector,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>, selector: Selector) -> Self {
        Self {
            id: id.into(),
            selector,
        }
    }

    /// Driver-specific id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The selector this handle was resolved from.
    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.selector)
    }
}

/// The operations the harness needs from a browser session.
///
/// `find_element` fails with `ElementNotFound` when nothing matches; element
/// operations fail with `StaleReference` once the handle's node is gone.
#[async_trait]
pub trait WebDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn find_element(&self, selector: &Selector) -> Result<ElementHandle>;

    async fn find_elements(&self, selector: &Selector) -> Result<Vec<ElementHandle>>;

    async fn click(&self, element: &ElementHandle) -> Result<()>;

    async fn clear(&self, element: &ElementHandle) -> Result<()>;

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<()>;

    /// Rendered text of the element.
    async fn text(&self, element: &ElementHandle) -> Result<String>;

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool>;

    /// Evaluate a script expression in the page and return its value.
    async fn execute_script(&self, js: &str) -> Result<serde_json::Value>;

    /// PNG screenshot of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>>;
}
