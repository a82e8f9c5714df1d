//! # lipsum-check
//!
//! Acceptance checks for a lorem-ipsum generator page. A YAML suite names the
//! page's elements, the actions to perform and what the rendered text must
//! satisfy. Each scenario navigates, acts, waits for readiness, extracts and
//! verifies; the outcome lands in a [`SuiteReport`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lipsum_check::{EokaSessions, Runner, Suite};
//!
//! # #[tokio::main]
//! # async fn main() -> lipsum_check::Result<()> {
//! let suite = Suite::load("configs/lipsum.yaml")?;
//! let runner = Runner::new(EokaSessions::new(suite.browser.clone()));
//! let report = runner.run(&suite).await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

mod config;
mod driver;
mod report;
mod runner;
mod session;

pub use config::{
    BrowserConfig, Expectation, Extract, OnFailure, ParamDef, Params, Readiness, Scenario,
    SessionMode, Step, Suite, TargetUrl, Viewport, Waits,
};
pub use driver::EokaDriver;
pub use report::{ScenarioResult, SuiteReport};
pub use runner::{Phase, Runner};
pub use session::{EokaSessions, SessionFactory};

/// Result type for lipsum-check operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during suite loading or execution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error(transparent)]
    Page(#[from] pagewait::Error),
}
