mod executor;

use crate::config::{Scenario, SessionMode, Suite};
use crate::report::{ScenarioResult, SuiteReport};
use crate::session::SessionFactory;
use crate::{Error, Result};
use pagewait::WebDriver;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Progress of a scenario through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    Navigated,
    ActionPerformed,
    Waited,
    Extracted,
    Verified,
    Passed,
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Navigated => "navigated",
            Self::ActionPerformed => "action_performed",
            Self::Waited => "waited",
            Self::Extracted => "extracted",
            Self::Verified => "verified",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs suites, one scenario at a time, on sessions from a [`SessionFactory`].
pub struct Runner<F: SessionFactory> {
    sessions: F,
}

impl<F: SessionFactory> Runner<F> {
    pub fn new(sessions: F) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &F {
        &self.sessions
    }

    /// Run every scenario of the suite.
    pub async fn run(&self, suite: &Suite) -> Result<SuiteReport> {
        self.run_filtered(suite, None).await
    }

    /// Run scenarios whose name contains `filter`.
    ///
    /// A failing scenario is recorded in the report and the run moves on.
    /// Only a session that cannot be started for a shared suite aborts it.
    pub async fn run_filtered(&self, suite: &Suite, filter: Option<&str>) -> Result<SuiteReport> {
        let start = Instant::now();
        let selected: Vec<&Scenario> = suite.select(filter).collect();
        if selected.is_empty() {
            return Err(Error::Config(format!(
                "no scenario matches '{}'",
                filter.unwrap_or_default()
            )));
        }

        info!("Running {} scenario(s) from '{}'", selected.len(), suite.name);
        let mut report = SuiteReport::new(&suite.name);

        match suite.session {
            SessionMode::PerScenario => {
                for scenario in selected {
                    report.results.push(self.run_isolated(suite, scenario).await);
                }
            }
            SessionMode::Shared => {
                let driver = self.sessions.acquire().await?;
                for scenario in selected {
                    let started = Instant::now();
                    let result = match short_circuit(scenario) {
                        Some(result) => result,
                        None => run_on(&driver, suite, scenario).await,
                    };
                    report.results.push(result.with_duration(elapsed_ms(started)));
                }
                if let Err(e) = self.sessions.release(driver).await {
                    warn!("Failed to release browser session: {}", e);
                }
            }
        }

        report.duration_ms = elapsed_ms(start);
        info!(
            "Suite '{}' finished: {} passed, {} failed",
            suite.name,
            report.passed(),
            report.failed()
        );
        Ok(report)
    }

    async fn run_isolated(&self, suite: &Suite, scenario: &Scenario) -> ScenarioResult {
        let started = Instant::now();
        if let Some(result) = short_circuit(scenario) {
            return result.with_duration(elapsed_ms(started));
        }

        let driver = match self.sessions.acquire().await {
            Ok(driver) => driver,
            Err(e) => {
                warn!("✗ {}: could not start a browser session: {}", scenario.name, e);
                return failure(scenario, Phase::Init, e).with_duration(elapsed_ms(started));
            }
        };

        let result = run_on(&driver, suite, scenario).await;
        if let Err(e) = self.sessions.release(driver).await {
            warn!("Failed to release browser session: {}", e);
        }
        result.with_duration(elapsed_ms(started))
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

/// Cases below the threshold pass as `input == input` without a browser.
fn short_circuit(scenario: &Scenario) -> Option<ScenarioResult> {
    if !scenario.short_circuits() {
        return None;
    }
    let input = scenario.input?;
    info!("✓ {} (short-circuit)", scenario.name);
    let mut result = ScenarioResult::pass(
        &scenario.name,
        input.to_string(),
        input.to_string(),
        Phase::Passed,
    );
    result.short_circuited = true;
    Some(result)
}

async fn run_on<D: WebDriver + ?Sized>(
    driver: &D,
    suite: &Suite,
    scenario: &Scenario,
) -> ScenarioResult {
    info!("Scenario: {}", scenario.name);
    let mut phase = Phase::Init;
    match executor::execute(driver, suite, scenario, &mut phase).await {
        Ok(verdict) => {
            info!("✓ {}", scenario.name);
            ScenarioResult::pass(&scenario.name, verdict.expected, verdict.actual, Phase::Passed)
        }
        Err(e) => {
            warn!("✗ {} (after {}): {}", scenario.name, phase, e);
            capture_failure(driver, suite, scenario).await;
            failure(scenario, phase, e)
        }
    }
}

fn failure(scenario: &Scenario, phase: Phase, error: Error) -> ScenarioResult {
    match error {
        Error::Page(pagewait::Error::AssertionFailed {
            expected,
            actual,
            message,
        }) => ScenarioResult::fail(&scenario.name, expected, actual, message, phase),
        other => ScenarioResult::fail(
            &scenario.name,
            scenario.expect.describe(scenario.input),
            String::new(),
            other.to_string(),
            phase,
        ),
    }
}

async fn capture_failure<D: WebDriver + ?Sized>(driver: &D, suite: &Suite, scenario: &Scenario) {
    let Some(template) = suite.on_failure.as_ref().and_then(|f| f.screenshot.as_ref()) else {
        return;
    };
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    let path = screenshot_path(template, &scenario.name, &timestamp);
    info!("Saving failure screenshot to: {}", path);

    let data = match driver.screenshot().await {
        Ok(data) => data,
        Err(e) => {
            warn!("Failed to take screenshot: {}", e);
            return;
        }
    };
    if let Some(parent) = Path::new(&path).parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("Failed to create {}: {}", parent.display(), e);
            return;
        }
    }
    match std::fs::write(&path, data) {
        Ok(()) => debug!("Screenshot written"),
        Err(e) => warn!("Failed to save screenshot: {}", e),
    }
}

fn screenshot_path(template: &str, scenario: &str, timestamp: &str) -> String {
    let safe: String = scenario
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    template
        .replace("{scenario}", &safe)
        .replace("{timestamp}", timestamp)
}
