use super::Phase;
use crate::config::{Expectation, Extract, Readiness, Scenario, Step, Suite};
use crate::{Error, Result};
use pagewait::{text, verify, ReadinessWaiter, WebDriver};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Expected and actual values of a passed check.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Verdict {
    pub expected: String,
    pub actual: String,
}

/// What one extraction produced.
#[derive(Debug, Clone, PartialEq)]
enum Reading {
    Text(String),
    Count(usize),
}

impl Reading {
    fn count(&self) -> Result<i64> {
        match self {
            Self::Count(n) => Ok(*n as i64),
            Self::Text(_) => Err(Error::Config("expected a numeric extraction".into())),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(t) => write!(f, "{:?}", t),
            Self::Count(n) => write!(f, "{}", n),
        }
    }
}

fn advance(phase: &mut Phase, next: Phase, scenario: &Scenario) {
    *phase = next;
    debug!("{}: {}", scenario.name, next);
}

/// Run every pass of `scenario` and verify the result.
///
/// `phase` tracks the last phase completed so a failure can be located.
pub(crate) async fn execute<D: WebDriver + ?Sized>(
    driver: &D,
    suite: &Suite,
    scenario: &Scenario,
    phase: &mut Phase,
) -> Result<Verdict> {
    let passes = scenario.repeat.max(1);
    let mut samples = Vec::with_capacity(passes as usize);
    let mut last = None;

    for pass in 1..=passes {
        if passes > 1 {
            debug!("{}: pass {}/{}", scenario.name, pass, passes);
        }
        advance(phase, Phase::Init, scenario);

        driver.navigate(&suite.target.url).await?;
        advance(phase, Phase::Navigated, scenario);

        for (i, step) in scenario.steps.iter().enumerate() {
            debug!("Executing step {}: {}", i + 1, step.name());
            run_step(driver, suite, step).await?;
        }
        advance(phase, Phase::ActionPerformed, scenario);

        await_readiness(driver, suite, &scenario.wait).await?;
        advance(phase, Phase::Waited, scenario);

        let reading = extract(driver, suite, &scenario.extract).await?;
        debug!("{}: {} = {}", scenario.name, scenario.extract, reading);
        advance(phase, Phase::Extracted, scenario);

        match &scenario.expect {
            Expectation::AverageInRange(_) => samples.push(reading.count()?),
            expect => last = Some(check(scenario, expect, &reading)?),
        }
    }

    let verdict = match &scenario.expect {
        Expectation::AverageInRange([low, high]) => {
            let what = scenario.extract.to_string();
            let average = verify::average_in_range(&what, &samples, *low, *high)?;
            Verdict {
                expected: scenario.expect.describe(scenario.input),
                actual: average.to_string(),
            }
        }
        _ => last.ok_or_else(|| Error::Config(format!("{}: no passes ran", scenario.name)))?,
    };
    advance(phase, Phase::Verified, scenario);
    Ok(verdict)
}

fn check(scenario: &Scenario, expect: &Expectation, reading: &Reading) -> Result<Verdict> {
    let what = scenario.extract.to_string();
    let expected = expect.describe(scenario.input);

    match (expect, reading) {
        (Expectation::Contains(needle), Reading::Text(t)) => {
            verify::expect_contains(&what, t, needle)?;
        }
        (Expectation::StartsWith(prefix), Reading::Text(t)) => {
            verify::expect_starts_with(&what, t.trim_start(), prefix)?;
        }
        (Expectation::Equals(n), Reading::Count(_)) => {
            verify::expect_equal(&what, *n, reading.count()?)?;
        }
        (Expectation::EqualsInput, Reading::Count(_)) => {
            let input = scenario
                .input
                .ok_or_else(|| Error::Config("'equals_input' needs cases".into()))?;
            verify::expect_equal(&what, input, reading.count()?)?;
        }
        (expect, reading) => {
            return Err(Error::Config(format!(
                "cannot check '{}' against {}",
                expect.name(),
                reading
            )));
        }
    }

    let actual = match reading {
        Reading::Text(t) => t.clone(),
        Reading::Count(n) => n.to_string(),
    };
    Ok(Verdict { expected, actual })
}

async fn run_step<D: WebDriver + ?Sized>(driver: &D, suite: &Suite, step: &Step) -> Result<()> {
    let locators = &suite.locators;
    match step {
        Step::Navigate => {
            driver.navigate(&suite.target.url).await?;
        }
        Step::Click(name) => {
            debug!("click: {}", name);
            let element = locators.resolve(driver, name).await?;
            driver.click(&element).await?;
        }
        Step::Clear(name) => {
            debug!("clear: {}", name);
            let element = locators.resolve(driver, name).await?;
            driver.clear(&element).await?;
        }
        Step::Type(t) => {
            debug!("type: {} = '{}'", t.locator, t.value);
            let element = locators.resolve(driver, &t.locator).await?;
            driver.send_keys(&element, &t.value).await?;
        }
        Step::Fill(t) => {
            debug!("fill: {} = '{}'", t.locator, t.value);
            let element = locators.resolve(driver, &t.locator).await?;
            driver.clear(&element).await?;
            driver.send_keys(&element, &t.value).await?;
        }
        Step::WaitForPageLoad => {
            ReadinessWaiter::new(driver)
                .wait_for_page_load_complete(&suite.waits.page_load)
                .await?;
        }
        Step::WaitForVisible(name) => {
            ReadinessWaiter::new(driver)
                .wait_for_named_visible(locators, name, &suite.waits.element)
                .await?;
        }
        Step::Pause(p) => {
            debug!("pause: {}ms", p.ms);
            tokio::time::sleep(Duration::from_millis(p.ms)).await;
        }
        Step::Execute(e) => {
            debug!("execute: {}...", e.js.chars().take(50).collect::<String>());
            driver.execute_script(&e.js).await?;
        }
        Step::Log(l) => {
            info!("[log] {}", l.message);
        }
    }
    Ok(())
}

async fn await_readiness<D: WebDriver + ?Sized>(
    driver: &D,
    suite: &Suite,
    readiness: &Readiness,
) -> Result<()> {
    let waiter = ReadinessWaiter::new(driver);
    match readiness {
        Readiness::None => {}
        Readiness::PageLoad => {
            waiter
                .wait_for_page_load_complete(&suite.waits.page_load)
                .await?;
        }
        Readiness::Visible(name) => {
            waiter
                .wait_for_named_visible(&suite.locators, name, &suite.waits.element)
                .await?;
        }
    }
    Ok(())
}

async fn extract<D: WebDriver + ?Sized>(
    driver: &D,
    suite: &Suite,
    extract: &Extract,
) -> Result<Reading> {
    let element = suite.locators.resolve(driver, extract.locator()).await?;
    let raw = text::read_text(driver, &element).await?;
    Ok(match extract {
        Extract::Text(_) => Reading::Text(raw),
        Extract::Words(_) => Reading::Count(text::count_words(&raw)),
        Extract::Bytes(_) => Reading::Count(text::count_bytes(&raw)),
        Extract::Occurrences { term, .. } => Reading::Count(text::count_occurrences(&raw, term)),
    })
}
