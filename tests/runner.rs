//! Runner tests against a scripted in-memory page.

use async_trait::async_trait;
use lipsum_check::{Phase, Runner, SessionFactory, Suite};
use pagewait::testing::{FakeDriver, FakeElement};
use pagewait::Selector;
use std::sync::atomic::{AtomicUsize, Ordering};

const SUITE: &str = r#"
name: "fake lipsum"
target:
  url: "https://lipsum.test/"
locators:
  words:
    xpath: "//label[@for='words']"
  bytes:
    xpath: "//label[@for='bytes']"
  number_field:
    xpath: "//input[@type='text']"
  generate_button:
    xpath: "//input[@id='generate']"
  lipsum:
    id: lipsum
scenarios:
  - name: "generated words"
    cases: [20, -1, 0, 5]
    short_circuit_below: 1
    steps:
      - click: words
      - fill:
          locator: number_field
          value: "${value}"
      - click: generate_button
    wait:
      visible: lipsum
    extract:
      words: lipsum
    expect: equals_input
  - name: "generated bytes"
    cases: [1, 2, 5]
    short_circuit_below: 3
    steps:
      - click: bytes
      - fill:
          locator: number_field
          value: "${value}"
      - click: generate_button
    wait:
      visible: lipsum
    extract:
      bytes: lipsum
    expect: equals_input
  - name: "first paragraph"
    steps:
      - click: generate_button
    wait: page_load
    extract:
      text: lipsum
    expect:
      starts_with: "Lorem ipsum"
  - name: "lorem frequency"
    repeat: 4
    steps:
      - click: generate_button
    wait:
      visible: lipsum
    extract:
      occurrences:
        locator: lipsum
        term: lorem
    expect:
      average_in_range: [2, 3]
"#;

fn lipsum() -> Selector {
    Selector::id("lipsum")
}

fn number_field() -> Selector {
    Selector::xpath("//input[@type='text']")
}

fn generate_button() -> Selector {
    Selector::xpath("//input[@id='generate']")
}

fn bytes_label() -> Selector {
    Selector::xpath("//label[@for='bytes']")
}

const WORDS: [&str; 5] = ["Lorem", "ipsum", "lorem", "dolor", "sit"];

/// Renders `n` words (or `n` characters once "bytes" is picked) for a
/// requested `n`, off by `skew`, visible after a short delay. The document
/// reports "loading" for the first `loading` ready-state checks.
fn generator(skew: i64, loading: u32) -> FakeDriver {
    FakeDriver::new()
        .loading_for(loading)
        .with_element(Selector::xpath("//label[@for='words']"), FakeElement::text("words"))
        .with_element(bytes_label(), FakeElement::text("bytes"))
        .with_element(number_field(), FakeElement::input().with_value("5"))
        .with_element(generate_button(), FakeElement::text("Generate Lorem Ipsum"))
        .on_click(bytes_label(), |page| {
            if let Some(label) = page.element_mut(&bytes_label()) {
                label.value = "checked".into();
            }
        })
        .on_click(generate_button(), move |page| {
            let requested: i64 = page.value(&number_field()).parse().unwrap_or(5);
            let n = (requested + skew).max(0) as usize;
            let text = if page.value(&bytes_label()) == "checked" {
                WORDS.join(" ").chars().cycle().take(n).collect()
            } else {
                let words: Vec<&str> = WORDS.iter().cycle().take(n).copied().collect();
                format!("{}.", words.join(" "))
            };
            page.render(lipsum(), FakeElement::text(text).hidden_for(2));
        })
}

struct FakeSessions {
    skew: i64,
    loading: u32,
    acquired: AtomicUsize,
    released: AtomicUsize,
    navigations: AtomicUsize,
    script_calls: AtomicUsize,
}

impl FakeSessions {
    fn new(skew: i64) -> Self {
        Self {
            skew,
            loading: 0,
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            navigations: AtomicUsize::new(0),
            script_calls: AtomicUsize::new(0),
        }
    }

    fn loading_for(mut self, polls: u32) -> Self {
        self.loading = polls;
        self
    }

    fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Navigations across released sessions.
    fn navigations(&self) -> usize {
        self.navigations.load(Ordering::SeqCst)
    }

    /// Script evaluations across released sessions.
    fn script_calls(&self) -> usize {
        self.script_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FakeSessions {
    type Driver = FakeDriver;

    async fn acquire(&self) -> lipsum_check::Result<FakeDriver> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(generator(self.skew, self.loading))
    }

    async fn release(&self, driver: FakeDriver) -> lipsum_check::Result<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        self.navigations
            .fetch_add(driver.navigations().len(), Ordering::SeqCst);
        self.script_calls
            .fetch_add(driver.script_calls(), Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_word_counts_pass() {
    let suite = Suite::parse(SUITE).unwrap();
    let runner = Runner::new(FakeSessions::new(0));
    let report = runner
        .run_filtered(&suite, Some("generated words"))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 4);
    assert!(report.success(), "{}", report);
    for r in &report.results {
        assert_eq!(r.expected, r.actual, "{}", r.name);
        assert_eq!(r.phase, Phase::Passed);
    }
}

#[tokio::test(start_paused = true)]
async fn test_short_circuit_never_acquires_a_session() {
    let suite = Suite::parse(SUITE).unwrap();
    let runner = Runner::new(FakeSessions::new(0));
    let report = runner
        .run_filtered(&suite, Some("generated words"))
        .await
        .unwrap();

    let short: Vec<&str> = report
        .results
        .iter()
        .filter(|r| r.short_circuited)
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(short, ["generated words(-1)", "generated words(0)"]);
    assert_eq!(runner.sessions().acquired(), 2);
    assert_eq!(runner.sessions().released(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_count_fails_and_releases() {
    let suite = Suite::parse(SUITE).unwrap();
    let runner = Runner::new(FakeSessions::new(1));
    let report = runner
        .run_filtered(&suite, Some("generated words(5)"))
        .await
        .unwrap();

    assert!(!report.success());
    let r = &report.results[0];
    assert!(!r.passed);
    assert_eq!(r.phase, Phase::Extracted);
    assert_eq!((r.expected.as_str(), r.actual.as_str()), ("5", "6"));
    assert_eq!(runner.sessions().released(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_average_over_repeated_passes() {
    let suite = Suite::parse(SUITE).unwrap();
    let runner = Runner::new(FakeSessions::new(0));
    let report = runner
        .run_filtered(&suite, Some("lorem frequency"))
        .await
        .unwrap();

    // Five words per pass: "Lorem ipsum lorem dolor sit." has two "lorem".
    let r = &report.results[0];
    assert!(r.passed, "{}", report);
    assert_eq!(r.actual, "2");
    assert_eq!(r.expected, "average in [2, 3]");
    assert_eq!(runner.sessions().acquired(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shared_session_is_acquired_once() {
    let yaml = SUITE.replace("scenarios:", "session: shared\nscenarios:");
    let suite = Suite::parse(&yaml).unwrap();
    let runner = Runner::new(FakeSessions::new(0));
    let report = runner.run(&suite).await.unwrap();

    assert_eq!(report.results.len(), 9);
    assert!(report.success(), "{}", report);
    assert_eq!(runner.sessions().acquired(), 1);
    assert_eq!(runner.sessions().released(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_byte_counts_short_circuit_below_three() {
    let suite = Suite::parse(SUITE).unwrap();
    let runner = Runner::new(FakeSessions::new(0));
    let report = runner
        .run_filtered(&suite, Some("generated bytes"))
        .await
        .unwrap();

    assert!(report.success(), "{}", report);
    let short: Vec<&str> = report
        .results
        .iter()
        .filter(|r| r.short_circuited)
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(short, ["generated bytes(1)", "generated bytes(2)"]);

    let counted = &report.results[2];
    assert_eq!(counted.name, "generated bytes(5)");
    assert!(!counted.short_circuited);
    assert_eq!(counted.actual, "5");
    assert_eq!(runner.sessions().acquired(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_page_load_wait_polls_ready_state() {
    let suite = Suite::parse(SUITE).unwrap();
    let runner = Runner::new(FakeSessions::new(0).loading_for(2));
    let report = runner
        .run_filtered(&suite, Some("first paragraph"))
        .await
        .unwrap();

    let r = &report.results[0];
    assert!(r.passed, "{}", report);
    assert!(r.actual.starts_with("Lorem ipsum lorem dolor sit"));
    // "loading", "loading", "complete"
    assert_eq!(runner.sessions().script_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_page_load_timeout_fails_after_actions() {
    let yaml = SUITE.replace(
        "scenarios:",
        "waits:\n  page_load:\n    timeout_ms: 300\nscenarios:",
    );
    let suite = Suite::parse(&yaml).unwrap();
    let runner = Runner::new(FakeSessions::new(0).loading_for(1000));
    let report = runner
        .run_filtered(&suite, Some("first paragraph"))
        .await
        .unwrap();

    let r = &report.results[0];
    assert!(!r.passed);
    assert_eq!(r.phase, Phase::ActionPerformed);
    assert!(r.message.contains("timed out"), "{}", r.message);
    assert_eq!(runner.sessions().released(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shared_session_recovers_after_failure() {
    let yaml = r#"
name: "shared"
target:
  url: "https://lipsum.test/"
session: shared
locators:
  generate_button:
    xpath: "//input[@id='generate']"
  lipsum:
    id: lipsum
scenarios:
  - name: "wrong count"
    steps:
      - click: generate_button
    wait:
      visible: lipsum
    extract:
      words: lipsum
    expect:
      equals: 99
  - name: "right count"
    steps:
      - click: generate_button
    wait:
      visible: lipsum
    extract:
      words: lipsum
    expect:
      equals: 5
"#;
    let suite = Suite::parse(yaml).unwrap();
    let runner = Runner::new(FakeSessions::new(0));
    let report = runner.run(&suite).await.unwrap();

    assert!(!report.results[0].passed);
    assert_eq!(report.results[0].actual, "5");
    assert!(report.results[1].passed, "{}", report);
    assert_eq!(runner.sessions().acquired(), 1);
    assert_eq!(runner.sessions().released(), 1);
    // Each scenario starts from a fresh navigation on the same session.
    assert_eq!(runner.sessions().navigations(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_missing_element_fails_at_action() {
    let yaml = SUITE.replace("//input[@id='generate']", "//input[@id='missing']");
    let suite = Suite::parse(&yaml).unwrap();
    let runner = Runner::new(FakeSessions::new(0));
    let report = runner
        .run_filtered(&suite, Some("generated words(5)"))
        .await
        .unwrap();

    let r = &report.results[0];
    assert!(!r.passed);
    assert_eq!(r.phase, Phase::Navigated);
    assert!(r.actual.is_empty());
    assert!(r.message.contains("missing"), "{}", r.message);
    assert_eq!(runner.sessions().released(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unmatched_filter_is_an_error() {
    let suite = Suite::parse(SUITE).unwrap();
    let runner = Runner::new(FakeSessions::new(0));
    assert!(runner.run_filtered(&suite, Some("nothing")).await.is_err());
    assert_eq!(runner.sessions().acquired(), 0);
}
