//! Helpers for the crate's compiled regular expressions.

use regex::Regex;

/// Compiles a pattern written as a string literal in this crate.
#[expect(
    clippy::expect_used,
    reason = "patterns are crate literals exercised by unit tests"
)]
pub(crate) fn literal_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("literal regex should compile")
}
