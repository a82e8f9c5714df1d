//! Turning rendered text into countable units.
//!
//! Everything here except [`read_text`] is a pure function of its input.

use crate::driver::{ElementHandle, WebDriver};
use crate::Result;

/// Characters that separate tokens for occurrence counting.
pub const TOKEN_SEPARATORS: [char; 7] = ['.', '?', '!', ' ', ';', ':', ','];

/// Characters trimmed from both ends before counting words.
const WORD_TRIM: [char; 2] = [',', '.'];

/// Ordered, non-empty tokens of a text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedTokens(Vec<String>);

impl ExtractedTokens {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive count of tokens equal to `term`.
    pub fn occurrences(&self, term: &str) -> usize {
        let term = term.to_lowercase();
        self.0.iter().filter(|t| t.to_lowercase() == term).count()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Split `raw` on [`TOKEN_SEPARATORS`], dropping empty tokens.
pub fn tokens(raw: &str) -> ExtractedTokens {
    ExtractedTokens(
        raw.split(&TOKEN_SEPARATORS[..])
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Number of words: trim `,` and `.` at both ends, split on single spaces,
/// count the non-empty pieces.
pub fn count_words(raw: &str) -> usize {
    raw.trim_matches(&WORD_TRIM[..])
        .split(' ')
        .filter(|w| !w.is_empty())
        .count()
}

/// Length of `raw` in UTF-16 code units, as the page reports it.
pub fn count_bytes(raw: &str) -> usize {
    raw.encode_utf16().count()
}

/// Case-insensitive number of tokens of `raw` equal to `term`.
pub fn count_occurrences(raw: &str, term: &str) -> usize {
    tokens(raw).occurrences(term)
}

/// Read the rendered text of a located element.
pub async fn read_text<D: WebDriver + ?Sized>(driver: &D, element: &ElementHandle) -> Result<String> {
    driver.text(element).await
}
