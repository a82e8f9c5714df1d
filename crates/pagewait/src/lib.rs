//! # pagewait
//!
//! Wait-and-verify primitives for browser-driven acceptance tests.
//!
//! The browser itself sits behind the [`WebDriver`] trait. On top of it this
//! crate provides bounded polling ([`wait_until`]), page and element readiness
//! ([`ReadinessWaiter`]), named selectors ([`LocatorRegistry`]), text counting
//! ([`text`]) and assertion helpers ([`verify`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagewait::{ReadinessWaiter, Selector, WaitSpec, WebDriver};
//!
//! # async fn demo<D: WebDriver>(driver: &D) -> pagewait::Result<()> {
//! driver.navigate("https://lipsum.com/").await?;
//! let waiter = ReadinessWaiter::new(driver);
//! waiter.wait_for_page_load_complete(&WaitSpec::page_load()).await?;
//!
//! let lipsum = Selector::id("lipsum");
//! let element = waiter
//!     .wait_for_element_visible(&lipsum, &WaitSpec::element())
//!     .await?;
//! let text = pagewait::text::read_text(driver, &element).await?;
//! println!("{} words", pagewait::text::count_words(&text));
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod locator;
pub mod poll;
pub mod ready;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod text;
pub mod verify;

pub use driver::{ElementHandle, Selector, Strategy, WebDriver};
pub use locator::LocatorRegistry;
pub use poll::{wait_until, WaitOutcome, WaitSpec};
pub use ready::ReadinessWaiter;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Result type for pagewait operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of [`Error`] values.
///
/// A [`WaitSpec`] lists the kinds that count as "not ready yet" while polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ElementNotFound,
    StaleReference,
    ElementNotReady,
    ConditionTimeout,
    AssertionFailed,
    UnknownLocator,
    Script,
    Driver,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ElementNotFound => "element_not_found",
            Self::StaleReference => "stale_reference",
            Self::ElementNotReady => "element_not_ready",
            Self::ConditionTimeout => "condition_timeout",
            Self::AssertionFailed => "assertion_failed",
            Self::UnknownLocator => "unknown_locator",
            Self::Script => "script",
            Self::Driver => "driver",
        };
        f.write_str(name)
    }
}

/// Errors raised by drivers, waits and verifications.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("stale element reference: {0}")]
    StaleReference(String),

    #[error("element {selector} not visible after {}ms", .timeout.as_millis())]
    ElementNotReady { selector: String, timeout: Duration },

    #[error("timed out after {}ms waiting for {condition}", .timeout.as_millis())]
    ConditionTimeout { condition: String, timeout: Duration },

    #[error("assertion failed: {message} (expected {expected}, actual {actual})")]
    AssertionFailed {
        expected: String,
        actual: String,
        message: String,
    },

    #[error("unknown locator: {0}")]
    UnknownLocator(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("driver error: {0}")]
    Driver(String),
}

impl Error {
    /// The kind of this error, used for ignore lists.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ElementNotFound(_) => ErrorKind::ElementNotFound,
            Self::StaleReference(_) => ErrorKind::StaleReference,
            Self::ElementNotReady { .. } => ErrorKind::ElementNotReady,
            Self::ConditionTimeout { .. } => ErrorKind::ConditionTimeout,
            Self::AssertionFailed { .. } => ErrorKind::AssertionFailed,
            Self::UnknownLocator(_) => ErrorKind::UnknownLocator,
            Self::Script(_) => ErrorKind::Script,
            Self::Driver(_) => ErrorKind::Driver,
        }
    }
}
