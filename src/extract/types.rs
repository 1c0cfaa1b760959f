//! Core value types produced by extraction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ExtractError;

/// Closed set of theorem-like result kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TheoremKind {
    /// A theorem.
    Theorem,
    /// A lemma.
    Lemma,
    /// A corollary.
    Corollary,
    /// A proposition.
    Proposition,
}

impl TheoremKind {
    /// Every kind, in classification order.
    pub const ALL: [Self; 4] = [
        Self::Theorem,
        Self::Lemma,
        Self::Corollary,
        Self::Proposition,
    ];

    /// Returns the lower-case canonical name used in output and
    /// classification.
    #[must_use]
    pub const fn canonical_name(self) -> &'static str {
        match self {
            Self::Theorem => "theorem",
            Self::Lemma => "lemma",
            Self::Corollary => "corollary",
            Self::Proposition => "proposition",
        }
    }

    /// Returns the built-in environment aliases that map to this kind.
    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Theorem => &["theo", "thm", "teo"],
            Self::Lemma => &["lem"],
            Self::Corollary => &["cor"],
            Self::Proposition => &["prop"],
        }
    }

    /// Returns the capitalized name used in human-readable messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Theorem => "Theorem",
            Self::Lemma => "Lemma",
            Self::Corollary => "Corollary",
            Self::Proposition => "Proposition",
        }
    }
}

impl fmt::Display for TheoremKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One extracted theorem-like result with its optional proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theorem {
    /// Kind of the result.
    #[serde(rename = "type")]
    pub kind: TheoremKind,
    /// Displayed numbering, such as `2.1` or `A.3`.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Optional bracketed title, such as `Key bound`.
    pub note: Option<String>,
    /// Optional cross-reference key from `\label{...}`.
    pub label: Option<String>,
    /// Statement text with the label removed.
    pub body: String,
    /// Proof text, when one was associated.
    pub proof: Option<String>,
}

impl Theorem {
    /// Returns the human-readable name, e.g. `Lemma 2.1 (Key bound)`.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.note {
            Some(note) => format!("{} {} ({note})", self.kind, self.reference),
            None => format!("{} {}", self.kind, self.reference),
        }
    }

    /// Returns the identity that must be unique within one paper.
    #[must_use]
    pub fn identity(&self) -> (TheoremKind, &str, Option<&str>) {
        (self.kind, &self.reference, self.note.as_deref())
    }
}

/// Strictness applied to extracted theorems.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Drop invalid theorems; fail only when none survive.
    Theorem,
    /// Fail the whole paper on any invalid theorem or duplicate.
    #[default]
    Paper,
}

impl ValidationLevel {
    /// Returns the lower-case name accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Theorem => "theorem",
            Self::Paper => "paper",
        }
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationLevel {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "theorem" => Ok(Self::Theorem),
            "paper" => Ok(Self::Paper),
            other => Err(ExtractError::syntax(format!(
                "unknown validation level '{other}', expected 'theorem' or 'paper'"
            ))),
        }
    }
}

/// Serializes theorems as JSON Lines, one newline-terminated object each.
///
/// # Errors
///
/// Returns the underlying [`serde_json::Error`] if a theorem cannot be
/// serialized.
pub fn to_json_lines(theorems: &[Theorem]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for theorem in theorems {
        out.push_str(&serde_json::to_string(theorem)?);
        out.push('\n');
    }
    Ok(out)
}
