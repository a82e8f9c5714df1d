//! Scenario verdicts and the suite report.

use crate::runner::Phase;
use crate::Result;
use serde::Serialize;
use std::fmt;

/// Longest actual value kept in a report line.
const MAX_ACTUAL_CHARS: usize = 160;

/// Verdict of one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub actual: String,
    pub expected: String,
    pub message: String,
    /// Last phase reached.
    pub phase: Phase,
    /// Decided without touching the page.
    pub short_circuited: bool,
    pub duration_ms: u64,
}

impl ScenarioResult {
    pub fn pass(name: &str, expected: String, actual: String, phase: Phase) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            actual: clip(actual),
            expected,
            message: String::new(),
            phase,
            short_circuited: false,
            duration_ms: 0,
        }
    }

    pub fn fail(name: &str, expected: String, actual: String, message: String, phase: Phase) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            actual: clip(actual),
            expected,
            message,
            phase,
            short_circuited: false,
            duration_ms: 0,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

fn clip(actual: String) -> String {
    match actual.char_indices().nth(MAX_ACTUAL_CHARS) {
        Some((cut, _)) => format!("{}…", &actual[..cut]),
        None => actual,
    }
}

/// Results of one suite run.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub suite: String,
    /// RFC 3339 start time.
    pub started_at: String,
    pub results: Vec<ScenarioResult>,
    pub duration_ms: u64,
}

impl SuiteReport {
    pub fn new(suite: &str) -> Self {
        Self {
            suite: suite.to_string(),
            started_at: chrono::Local::now().to_rfc3339(),
            results: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    /// True when every scenario passed.
    pub fn success(&self) -> bool {
        self.failed() == 0
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Suite: {}", self.suite)?;
        for r in &self.results {
            if r.passed {
                let note = if r.short_circuited { " (short-circuit)" } else { "" };
                writeln!(f, "  ✓ {}{} [{}ms]", r.name, note, r.duration_ms)?;
            } else {
                writeln!(f, "  ✗ {} [failed at {}]", r.name, r.phase)?;
                writeln!(f, "      expected: {}", r.expected)?;
                writeln!(f, "      actual:   {}", r.actual)?;
                if !r.message.is_empty() {
                    writeln!(f, "      {}", r.message)?;
                }
            }
        }
        write!(
            f,
            "{} passed, {} failed ({}ms)",
            self.passed(),
            self.failed(),
            self.duration_ms
        )
    }
}
