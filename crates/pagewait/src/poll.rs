//! Bounded polling.
//!
//! Every wait in the harness reduces to [`wait_until`]: evaluate a predicate,
//! sleep `poll_interval`, repeat until it holds or `timeout` has elapsed.

use crate::{Error, ErrorKind, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

/// Default cadence between predicate evaluations.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default budget for "document.readyState == complete".
pub const DEFAULT_PAGE_LOAD_TIMEOUT: Duration = Duration::from_millis(3000);

/// Default budget for an element to become visible.
pub const DEFAULT_ELEMENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Floor applied to the poll interval so a wait never spins.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Timing and error policy for one wait.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawWaitSpec")]
pub struct WaitSpec {
    /// Total time budget.
    pub timeout: Duration,
    /// Pause between attempts.
    pub poll_interval: Duration,
    /// Error kinds treated as "not ready yet".
    pub ignored: HashSet<ErrorKind>,
}

impl WaitSpec {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
            ignored: HashSet::new(),
        }
    }

    /// Spec with the default poll interval.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(timeout, DEFAULT_POLL_INTERVAL)
    }

    /// Default page-load spec (3s).
    pub fn page_load() -> Self {
        Self::with_timeout(DEFAULT_PAGE_LOAD_TIMEOUT)
    }

    /// Default element-visibility spec (10s), ignoring missing and stale elements.
    pub fn element() -> Self {
        Self::with_timeout(DEFAULT_ELEMENT_TIMEOUT)
            .ignoring(ErrorKind::ElementNotFound)
            .ignoring(ErrorKind::StaleReference)
    }

    /// Add an ignored error kind.
    pub fn ignoring(mut self, kind: ErrorKind) -> Self {
        self.ignored.insert(kind);
        self
    }

    /// Whether errors of `kind` are retried.
    pub fn ignores(&self, kind: ErrorKind) -> bool {
        self.ignored.contains(&kind)
    }
}

impl Default for WaitSpec {
    fn default() -> Self {
        Self::element()
    }
}

#[derive(Deserialize)]
struct RawWaitSpec {
    timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,
    #[serde(default)]
    ignore: Vec<ErrorKind>,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

impl TryFrom<RawWaitSpec> for WaitSpec {
    type Error = String;

    fn try_from(raw: RawWaitSpec) -> std::result::Result<Self, Self::Error> {
        if raw.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".into());
        }
        Ok(Self {
            timeout: Duration::from_millis(raw.timeout_ms),
            poll_interval: Duration::from_millis(raw.poll_interval_ms),
            ignored: raw.ignore.into_iter().collect(),
        })
    }
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Satisfied { attempts: u32, elapsed: Duration },
    TimedOut { attempts: u32, elapsed: Duration },
}

impl WaitOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Satisfied { attempts, .. } | Self::TimedOut { attempts, .. } => *attempts,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Satisfied { elapsed, .. } | Self::TimedOut { elapsed, .. } => *elapsed,
        }
    }

    /// Treat a timeout as fatal.
    pub fn into_result(self, condition: &str, spec: &WaitSpec) -> Result<()> {
        match self {
            Self::Satisfied { .. } => Ok(()),
            Self::TimedOut { .. } => Err(Error::ConditionTimeout {
                condition: condition.to_string(),
                timeout: spec.timeout,
            }),
        }
    }
}

/// Poll `predicate` until it returns `Ok(true)` or `spec.timeout` elapses.
///
/// The predicate runs once immediately and then every `poll_interval`.
/// Errors whose kind is in `spec.ignored` count as `false`; any other error
/// is returned at once. A timeout is reported as [`WaitOutcome::TimedOut`],
/// not as an error.
pub async fn wait_until<F, Fut>(mut predicate: F, spec: &WaitSpec) -> Result<WaitOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();
    let interval = spec.poll_interval.max(MIN_POLL_INTERVAL);
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match predicate().await {
            Ok(true) => {
                let elapsed = start.elapsed();
                trace!(attempts, ?elapsed, "condition satisfied");
                return Ok(WaitOutcome::Satisfied { attempts, elapsed });
            }
            Ok(false) => {}
            Err(e) if spec.ignores(e.kind()) => {
                debug!(attempts, error = %e, "ignoring error while polling");
            }
            Err(e) => return Err(e),
        }

        let elapsed = start.elapsed();
        if elapsed >= spec.timeout {
            debug!(attempts, ?elapsed, "condition timed out");
            return Ok(WaitOutcome::TimedOut { attempts, elapsed });
        }

        sleep(interval).await;
    }
}
