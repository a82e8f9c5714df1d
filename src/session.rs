//! Browser session acquisition.

use crate::config::BrowserConfig;
use crate::driver::EokaDriver;
use crate::Result;
use async_trait::async_trait;
use eoka::Browser;
use pagewait::WebDriver;
use tracing::debug;

/// Hands out browser sessions and takes them back.
///
/// The runner calls `release` on every path once a scenario is done with a
/// session, so implementations can free external processes there.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Driver: WebDriver;

    async fn acquire(&self) -> Result<Self::Driver>;

    async fn release(&self, driver: Self::Driver) -> Result<()>;
}

/// Launches one Chrome per session through `eoka`.
pub struct EokaSessions {
    config: BrowserConfig,
}

impl EokaSessions {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for EokaSessions {
    type Driver = EokaDriver;

    async fn acquire(&self) -> Result<EokaDriver> {
        let config = &self.config;
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;
        Ok(EokaDriver::new(browser, page))
    }

    async fn release(&self, driver: EokaDriver) -> Result<()> {
        debug!("Closing browser");
        driver.close().await
    }
}
