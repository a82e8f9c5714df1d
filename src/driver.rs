//! [`WebDriver`] over an `eoka` page.
//!
//! Element lookups run in the page and park matched nodes in a per-document
//! registry (`window.__lipsum_check`). A handle is the node's key there. When
//! the node is detached, or the document is replaced by a navigation, the
//! key no longer resolves and the handle reports `StaleReference`.

use async_trait::async_trait;
use eoka::{Browser, Page};
use pagewait::{ElementHandle, Selector, WebDriver};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, trace};

/// Locate nodes and register them. Placeholders: strategy, expression, all.
const FIND_JS: &str = r#"(() => {
    const strategy = __STRATEGY__;
    const expr = __EXPR__;
    let nodes = [];
    if (strategy === 'xpath') {
        const snap = document.evaluate(expr, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
        for (let i = 0; i < snap.snapshotLength; i++) nodes.push(snap.snapshotItem(i));
    } else if (strategy === 'id') {
        const el = document.getElementById(expr);
        if (el) nodes.push(el);
    } else {
        nodes = Array.from(document.querySelectorAll(expr));
    }
    nodes = nodes.filter(n => n.nodeType === Node.ELEMENT_NODE);
    if (!__ALL__) nodes = nodes.slice(0, 1);
    const reg = window.__lipsum_check
        || (window.__lipsum_check = { next: 0, nodes: new Map(), keys: new WeakMap() });
    for (const [key, node] of reg.nodes) {
        if (!node.isConnected) reg.nodes.delete(key);
    }
    return nodes.map(n => {
        let key = reg.keys.get(n);
        if (key === undefined) {
            key = 'h' + (++reg.next);
            reg.keys.set(n, key);
        }
        reg.nodes.set(key, n);
        return key;
    });
})()"#;

/// Run `__BODY__` against a registered node, reporting staleness.
const ON_ELEMENT_JS: &str = r#"(() => {
    const reg = window.__lipsum_check;
    const el = reg ? reg.nodes.get(__KEY__) : undefined;
    if (!el || !el.isConnected) return { stale: true, value: null };
    const value = (() => { __BODY__ })();
    return { stale: false, value: value === undefined ? null : value };
})()"#;

const CLICK_BODY: &str = "el.scrollIntoView({ block: 'center' }); el.click(); return true;";

const CLEAR_BODY: &str = r#"
    if ('value' in el) {
        el.value = '';
        el.dispatchEvent(new Event('input', { bubbles: true }));
        el.dispatchEvent(new Event('change', { bubbles: true }));
    }
    return true;"#;

const FOCUS_BODY: &str = "el.focus(); return true;";

const TEXT_BODY: &str = "return el.innerText ?? el.textContent ?? '';";

const DISPLAYED_BODY: &str = r#"
    const rect = el.getBoundingClientRect();
    const style = getComputedStyle(el);
    return rect.width > 0 && rect.height > 0
        && style.display !== 'none'
        && style.visibility !== 'hidden'
        && parseFloat(style.opacity) > 0;"#;

const SETTLE_IDLE_MS: u64 = 200;
const SETTLE_TIMEOUT_MS: u64 = 2000;
const SETTLE_DOM_MS: u64 = 50;

#[derive(Deserialize)]
struct HandleReply<T> {
    stale: bool,
    value: Option<T>,
}

/// Quote `s` as a JavaScript string literal.
fn js_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

fn find_script(selector: &Selector, all: bool) -> String {
    FIND_JS
        .replace("__STRATEGY__", &js_string(selector.strategy.as_str()))
        .replace("__EXPR__", &js_string(&selector.expression))
        .replace("__ALL__", if all { "true" } else { "false" })
}

fn element_script(element: &ElementHandle, body: &str) -> String {
    ON_ELEMENT_JS
        .replace("__KEY__", &js_string(element.id()))
        .replace("__BODY__", body)
}

/// CDP messages raised when a script runs while its document is being replaced.
const CONTEXT_LOST: &[&str] = &[
    "Execution context was destroyed",
    "Cannot find context with specified id",
    "Inspected target navigated or closed",
];

fn driver_error(e: eoka::Error) -> pagewait::Error {
    match e {
        eoka::Error::ElementNotFound(msg) => pagewait::Error::ElementNotFound(msg),
        eoka::Error::Cdp { ref message, .. } | eoka::Error::CdpSimple(ref message)
            if CONTEXT_LOST.iter().any(|m| message.contains(m)) =>
        {
            pagewait::Error::StaleReference(e.to_string())
        }
        other => pagewait::Error::Driver(other.to_string()),
    }
}

/// One browser with one page.
pub struct EokaDriver {
    browser: Browser,
    page: Page,
}

impl EokaDriver {
    pub fn new(browser: Browser, page: Page) -> Self {
        Self { browser, page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Give a navigation or re-render started by an action time to land.
    ///
    /// Network idle is best effort; some pages never stop polling.
    async fn settle(&self) {
        if let Err(e) = self
            .page
            .wait_for_network_idle(SETTLE_IDLE_MS, SETTLE_TIMEOUT_MS)
            .await
        {
            trace!("network not idle after click: {}", e);
        }
        self.page.wait(SETTLE_DOM_MS).await;
    }

    /// Close the page's browser.
    pub async fn close(self) -> crate::Result<()> {
        let Self { browser, page } = self;
        drop(page);
        browser.close().await?;
        Ok(())
    }

    async fn lookup(&self, selector: &Selector, all: bool) -> pagewait::Result<Vec<ElementHandle>> {
        let keys: Vec<String> = self
            .page
            .evaluate(&find_script(selector, all))
            .await
            .map_err(driver_error)?;
        trace!(%selector, found = keys.len(), "lookup");
        Ok(keys
            .into_iter()
            .map(|key| ElementHandle::new(key, selector.clone()))
            .collect())
    }

    async fn on_element<T: DeserializeOwned>(
        &self,
        element: &ElementHandle,
        body: &str,
    ) -> pagewait::Result<T> {
        let reply: HandleReply<T> = self
            .page
            .evaluate(&element_script(element, body))
            .await
            .map_err(driver_error)?;
        if reply.stale {
            return Err(pagewait::Error::StaleReference(element.to_string()));
        }
        reply
            .value
            .ok_or_else(|| pagewait::Error::Script(format!("no value returned for {}", element)))
    }
}

#[async_trait]
impl WebDriver for EokaDriver {
    async fn navigate(&self, url: &str) -> pagewait::Result<()> {
        debug!("navigate: {}", url);
        self.page.goto(url).await.map_err(driver_error)
    }

    async fn find_element(&self, selector: &Selector) -> pagewait::Result<ElementHandle> {
        self.lookup(selector, false)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| pagewait::Error::ElementNotFound(selector.to_string()))
    }

    async fn find_elements(&self, selector: &Selector) -> pagewait::Result<Vec<ElementHandle>> {
        self.lookup(selector, true).await
    }

    async fn click(&self, element: &ElementHandle) -> pagewait::Result<()> {
        debug!("click: {}", element);
        self.on_element::<bool>(element, CLICK_BODY).await?;
        self.settle().await;
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> pagewait::Result<()> {
        debug!("clear: {}", element);
        self.on_element::<bool>(element, CLEAR_BODY).await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> pagewait::Result<()> {
        debug!("send_keys: {} = '{}'", element, text);
        self.on_element::<bool>(element, FOCUS_BODY).await?;
        self.page.type_text(text).await.map_err(driver_error)
    }

    async fn text(&self, element: &ElementHandle) -> pagewait::Result<String> {
        self.on_element(element, TEXT_BODY).await
    }

    async fn is_displayed(&self, element: &ElementHandle) -> pagewait::Result<bool> {
        self.on_element(element, DISPLAYED_BODY).await
    }

    async fn execute_script(&self, js: &str) -> pagewait::Result<serde_json::Value> {
        self.page
            .evaluate::<serde_json::Value>(js)
            .await
            .map_err(driver_error)
    }

    async fn screenshot(&self) -> pagewait::Result<Vec<u8>> {
        self.page.screenshot().await.map_err(driver_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_script_quotes_expression() {
        let js = find_script(&Selector::xpath("//a[@class='ru']"), false);
        assert!(js.contains(r#"const strategy = "xpath";"#));
        assert!(js.contains(r#"const expr = "//a[@class='ru']";"#));
        assert!(js.contains("if (!false)"));
        for placeholder in ["__STRATEGY__", "__EXPR__", "__ALL__"] {
            assert!(!js.contains(placeholder), "unreplaced {} in {}", placeholder, js);
        }
    }

    #[test]
    fn test_find_script_escapes_quotes() {
        let js = find_script(&Selector::css(r#"input[name="q"]"#), true);
        assert!(js.contains(r#"const expr = "input[name=\"q\"]";"#));
        assert!(js.contains("if (!true)"));
    }

    #[test]
    fn test_element_script() {
        let handle = ElementHandle::new("h7", Selector::id("lipsum"));
        let js = element_script(&handle, TEXT_BODY);
        assert!(js.contains(r#"reg.nodes.get("h7")"#));
        assert!(js.contains("innerText"));
    }

    #[test]
    fn test_find_script_reuses_keys() {
        let js = find_script(&Selector::id("lipsum"), false);
        assert!(js.contains("reg.keys.get(n)"));
        assert!(js.contains("if (!node.isConnected) reg.nodes.delete(key)"));
    }

    #[test]
    fn test_lost_context_is_stale() {
        let err = driver_error(eoka::Error::Cdp {
            method: "Runtime.evaluate".into(),
            code: -32000,
            message: "Execution context was destroyed.".into(),
        });
        assert_eq!(err.kind(), pagewait::ErrorKind::StaleReference);

        let err = driver_error(eoka::Error::CdpSimple(
            "Cannot find context with specified id".into(),
        ));
        assert_eq!(err.kind(), pagewait::ErrorKind::StaleReference);
    }

    #[test]
    fn test_other_errors_map_to_driver() {
        let err = driver_error(eoka::Error::ElementNotFound("#x".into()));
        assert_eq!(err, pagewait::Error::ElementNotFound("#x".into()));

        let err = driver_error(eoka::Error::Timeout("goto".into()));
        assert_eq!(err.kind(), pagewait::ErrorKind::Driver);
    }

    #[test]
    fn test_handle_reply_parsing() {
        let reply: HandleReply<bool> =
            serde_json::from_str(r#"{"stale": false, "value": true}"#).unwrap();
        assert!(!reply.stale);
        assert_eq!(reply.value, Some(true));

        let reply: HandleReply<String> =
            serde_json::from_str(r#"{"stale": true, "value": null}"#).unwrap();
        assert!(reply.stale);
        assert!(reply.value.is_none());
    }
}
