//! Tests against a real Chrome.
//!
//! Run with: cargo test --test live -- --ignored

use lipsum_check::{BrowserConfig, EokaSessions, Phase, Runner, SessionFactory, Suite};
use pagewait::{ReadinessWaiter, Selector, WaitSpec, WebDriver};
use std::time::Duration;

/// Check if Chrome is available
fn chrome_available() -> bool {
    eoka::stealth::patcher::find_chrome().is_ok()
}

fn headless() -> EokaSessions {
    EokaSessions::new(BrowserConfig {
        headless: true,
        ..Default::default()
    })
}

const PAGE_SUITE: &str = r##"
name: "local page"
target:
  url: "data:text/html,<div id='lipsum'><p>Lorem ipsum dolor sit amet.</p></div>"
locators:
  lipsum:
    id: lipsum
scenarios:
  - name: "words"
    wait: page_load
    extract:
      words: lipsum
    expect:
      equals: 5
"##;

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_element_handles_go_stale_after_navigation() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let sessions = headless();
    let driver = sessions.acquire().await.expect("Failed to launch browser");
    driver
        .navigate("data:text/html,<p id='a'>one two</p>")
        .await
        .expect("Failed to navigate");

    let waiter = ReadinessWaiter::new(&driver);
    waiter
        .wait_for_page_load_complete(&WaitSpec::page_load())
        .await
        .expect("page never loaded");
    let handle = waiter
        .wait_for_element_visible(&Selector::id("a"), &WaitSpec::with_timeout(Duration::from_secs(2)))
        .await
        .expect("element never visible");
    assert_eq!(driver.text(&handle).await.expect("text"), "one two");

    driver
        .navigate("data:text/html,<p id='a'>three</p>")
        .await
        .expect("Failed to navigate");
    let err = driver.text(&handle).await.unwrap_err();
    assert_eq!(err.kind(), pagewait::ErrorKind::StaleReference);

    sessions.release(driver).await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_runs_suite_on_local_page() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let mut suite = Suite::parse(PAGE_SUITE).expect("suite");
    suite.browser.headless = true;
    let runner = Runner::new(EokaSessions::new(suite.browser.clone()));
    let report = runner.run(&suite).await.expect("run");

    assert!(report.success(), "{}", report);
    assert_eq!(report.results[0].phase, Phase::Passed);
    assert_eq!(report.results[0].actual, "5");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_click_waits_for_the_page_to_settle() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let sessions = headless();
    let driver = sessions.acquire().await.expect("Failed to launch browser");
    driver
        .navigate(
            "data:text/html,<button id='go' onclick=\"setTimeout(() => \
             document.getElementById('out').innerText = 'rendered', 20)\">go</button>\
             <p id='out'>initial</p>",
        )
        .await
        .expect("Failed to navigate");

    let button = driver.find_element(&Selector::id("go")).await.expect("button");
    driver.click(&button).await.expect("click");

    let out = driver.find_element(&Selector::id("out")).await.expect("out");
    assert_eq!(driver.text(&out).await.expect("text"), "rendered");

    sessions.release(driver).await.expect("Failed to close browser");
}
