//! Assertion primitives that fail with [`Error::AssertionFailed`].

use crate::{Error, Result};
use std::fmt::Display;

/// Fail unless `actual == expected`.
pub fn expect_equal<T>(what: &str, expected: T, actual: T) -> Result<()>
where
    T: PartialEq + Display,
{
    if expected == actual {
        return Ok(());
    }
    Err(Error::AssertionFailed {
        expected: expected.to_string(),
        actual: actual.to_string(),
        message: what.to_string(),
    })
}

/// Fail with `message` unless `condition` holds.
pub fn expect_true(condition: bool, message: &str) -> Result<()> {
    if condition {
        return Ok(());
    }
    Err(Error::AssertionFailed {
        expected: "true".into(),
        actual: "false".into(),
        message: message.to_string(),
    })
}

/// Fail unless `haystack` contains `needle`.
pub fn expect_contains(what: &str, haystack: &str, needle: &str) -> Result<()> {
    if haystack.contains(needle) {
        return Ok(());
    }
    Err(Error::AssertionFailed {
        expected: format!("text containing {:?}", needle),
        actual: format!("{:?}", haystack),
        message: what.to_string(),
    })
}

/// Fail unless `haystack` starts with `prefix`.
pub fn expect_starts_with(what: &str, haystack: &str, prefix: &str) -> Result<()> {
    if haystack.starts_with(prefix) {
        return Ok(());
    }
    Err(Error::AssertionFailed {
        expected: format!("text starting with {:?}", prefix),
        actual: format!("{:?}", haystack),
        message: what.to_string(),
    })
}

/// Integer average of `samples` (sum divided by count, truncating).
pub fn integer_average(samples: &[i64]) -> Option<i64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<i64>() / samples.len() as i64)
}

/// Fail unless the integer average of `samples` lies in `[low, high]`.
///
/// Returns the average on success.
pub fn average_in_range(what: &str, samples: &[i64], low: i64, high: i64) -> Result<i64> {
    let expected = format!("average in [{}, {}]", low, high);
    let Some(average) = integer_average(samples) else {
        return Err(Error::AssertionFailed {
            expected,
            actual: "no samples".into(),
            message: what.to_string(),
        });
    };
    if (low..=high).contains(&average) {
        return Ok(average);
    }
    Err(Error::AssertionFailed {
        expected,
        actual: format!("{} (sum {} over {})", average, samples.iter().sum::<i64>(), samples.len()),
        message: what.to_string(),
    })
}
