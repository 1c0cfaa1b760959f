//! Error types for theorem extraction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest message, in characters, carried by an [`ExtractError`].
///
/// Longer messages are cut at this length and suffixed with `...`.
pub const MAX_MESSAGE_CHARS: usize = 256;

/// Stable classification of extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The run exceeded its wall-clock budget.
    Timeout,
    /// The paper source could not be obtained or has no usable main file.
    Download,
    /// The caller supplied an invalid combination of inputs.
    Syntax,
    /// The LaTeX parser or an earlier discovery stage failed.
    #[serde(rename = "PARSE")]
    ParseFailure,
    /// Validation rejected the extracted theorems.
    Validation,
    /// Anything else, including a worker that died without reporting.
    Unknown,
}

impl ErrorKind {
    /// Returns the stable, machine-readable tag for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "TIMEOUT",
            Self::Download => "DOWNLOAD",
            Self::Syntax => "SYNTAX",
            Self::ParseFailure => "PARSE",
            Self::Validation => "VALIDATION",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the extraction pipeline.
///
/// Every variant renders as `[<KIND> ERROR] <message>`. Build values through
/// [`ExtractError::new`] or the per-kind constructors so the message is
/// bounded by [`MAX_MESSAGE_CHARS`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// The run exceeded its wall-clock budget.
    #[error("[TIMEOUT ERROR] {0}")]
    Timeout(String),
    /// The paper source could not be obtained or has no usable main file.
    #[error("[DOWNLOAD ERROR] {0}")]
    Download(String),
    /// The caller supplied an invalid combination of inputs.
    #[error("[SYNTAX ERROR] {0}")]
    Syntax(String),
    /// The LaTeX parser or an earlier discovery stage failed.
    #[error("[PARSE ERROR] {0}")]
    ParseFailure(String),
    /// Validation rejected the extracted theorems.
    #[error("[VALIDATION ERROR] {0}")]
    Validation(String),
    /// Any other failure.
    #[error("[UNKNOWN ERROR] {0}")]
    Unknown(String),
}

impl ExtractError {
    /// Builds an error of `kind`, truncating `message` to
    /// [`MAX_MESSAGE_CHARS`] characters.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let text = truncate_message(message.into());
        match kind {
            ErrorKind::Timeout => Self::Timeout(text),
            ErrorKind::Download => Self::Download(text),
            ErrorKind::Syntax => Self::Syntax(text),
            ErrorKind::ParseFailure => Self::ParseFailure(text),
            ErrorKind::Validation => Self::Validation(text),
            ErrorKind::Unknown => Self::Unknown(text),
        }
    }

    /// Builds a [`ExtractError::Timeout`].
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Builds a [`ExtractError::Download`].
    #[must_use]
    pub fn download(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Download, message)
    }

    /// Builds a [`ExtractError::Syntax`].
    #[must_use]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    /// Builds a [`ExtractError::ParseFailure`].
    #[must_use]
    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailure, message)
    }

    /// Builds a [`ExtractError::Validation`].
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Builds a [`ExtractError::Unknown`].
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Returns the stable kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Download(_) => ErrorKind::Download,
            Self::Syntax(_) => ErrorKind::Syntax,
            Self::ParseFailure(_) => ErrorKind::ParseFailure,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Returns the message without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Timeout(message)
            | Self::Download(message)
            | Self::Syntax(message)
            | Self::ParseFailure(message)
            | Self::Validation(message)
            | Self::Unknown(message) => message,
        }
    }
}

fn truncate_message(message: String) -> String {
    if message.chars().count() <= MAX_MESSAGE_CHARS {
        return message;
    }
    let mut truncated: String = message.chars().take(MAX_MESSAGE_CHARS).collect();
    truncated.push_str("...");
    truncated
}
