//! Plausibility checks on extracted theorems.
//!
//! Text checks run on the trimmed, lower-cased body and proof, in table
//! order, and the first failing rule is reported.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use super::error::ExtractError;
use super::types::{Theorem, ValidationLevel};

/// The text field a rule was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    /// The theorem statement.
    Body,
    /// The associated proof.
    Proof,
}

impl TextField {
    /// Returns the field's lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Proof => "proof",
        }
    }
}

/// A text plausibility rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRule {
    /// The text is empty.
    Empty,
    /// The text holds an odd number of `$`.
    UnbalancedMath,
    /// The text has fewer than eight characters.
    TooShort,
    /// Short text with no sentence end and no math.
    LikelyTruncated,
    /// The text stops on a connective or an opening delimiter.
    DanglingEnding,
}

impl TextRule {
    /// Returns a short description of the violation.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Empty => "is empty",
            Self::UnbalancedMath => "has unbalanced math delimiters",
            Self::TooShort => "is too short",
            Self::LikelyTruncated => "looks truncated",
            Self::DanglingEnding => "ends mid-sentence",
        }
    }
}

/// Why a theorem, or a set of theorems, failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    /// The theorem has no reference.
    MissingRef,
    /// A text rule failed on one field.
    Text {
        /// The field checked.
        field: TextField,
        /// The rule that failed.
        rule: TextRule,
    },
    /// Another theorem has the same kind, reference and note.
    Duplicate,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRef => f.write_str("has no ref"),
            Self::Text { field, rule } => write!(f, "{} {}", field.as_str(), rule.describe()),
            Self::Duplicate => f.write_str("is duplicated"),
        }
    }
}

/// A validation verdict against one named theorem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{theorem} {failure}")]
pub struct ValidationError {
    /// Display name of the offending theorem, e.g. `Lemma 2.1 (Key bound)`.
    pub theorem: String,
    /// The failed check.
    pub failure: ValidationFailure,
}

impl ValidationError {
    fn new(theorem: &Theorem, failure: ValidationFailure) -> Self {
        Self {
            theorem: theorem.display_name(),
            failure,
        }
    }
}

struct TextProbe<'a> {
    text: &'a str,
    chars: usize,
    dollars: usize,
}

struct TextCheck {
    rule: TextRule,
    fails: fn(&TextProbe<'_>) -> bool,
}

const DANGLING_ENDINGS: &[&str] = &[
    " and", " or", "such that", " where", " let", " then", "for all", "(", "[", "{", ",", ":",
    ";", "=", "<", "%",
];

const TEXT_CHECKS: &[TextCheck] = &[
    TextCheck {
        rule: TextRule::Empty,
        fails: is_empty,
    },
    TextCheck {
        rule: TextRule::UnbalancedMath,
        fails: has_odd_dollars,
    },
    TextCheck {
        rule: TextRule::TooShort,
        fails: is_too_short,
    },
    TextCheck {
        rule: TextRule::LikelyTruncated,
        fails: looks_truncated,
    },
    TextCheck {
        rule: TextRule::DanglingEnding,
        fails: has_dangling_ending,
    },
];

fn is_empty(probe: &TextProbe<'_>) -> bool {
    probe.text.is_empty()
}

fn has_odd_dollars(probe: &TextProbe<'_>) -> bool {
    probe.dollars & 1 == 1
}

fn is_too_short(probe: &TextProbe<'_>) -> bool {
    probe.chars < 8
}

fn looks_truncated(probe: &TextProbe<'_>) -> bool {
    probe.chars < 32 && !probe.text.ends_with('.') && probe.dollars == 0
}

fn has_dangling_ending(probe: &TextProbe<'_>) -> bool {
    DANGLING_ENDINGS
        .iter()
        .any(|ending| probe.text.ends_with(ending))
}

fn check_text(field: TextField, raw: &str) -> Result<(), ValidationFailure> {
    let lowered = raw.trim().to_lowercase();
    let probe = TextProbe {
        text: &lowered,
        chars: lowered.chars().count(),
        dollars: lowered.matches('$').count(),
    };
    match TEXT_CHECKS.iter().find(|check| (check.fails)(&probe)) {
        Some(check) => Err(ValidationFailure::Text {
            field,
            rule: check.rule,
        }),
        None => Ok(()),
    }
}

/// Checks one theorem in isolation.
///
/// # Errors
///
/// Returns the first failed check: a missing reference, then the body
/// rules, then the proof rules when a proof is present.
pub fn validate_one(theorem: &Theorem) -> Result<(), ValidationError> {
    if theorem.reference.is_empty() {
        return Err(ValidationError::new(theorem, ValidationFailure::MissingRef));
    }
    check_text(TextField::Body, &theorem.body)
        .and_then(|()| {
            theorem
                .proof
                .as_deref()
                .map_or(Ok(()), |proof| check_text(TextField::Proof, proof))
        })
        .map_err(|failure| ValidationError::new(theorem, failure))
}

/// Checks every theorem, then that `(kind, ref, note)` is unique.
///
/// # Errors
///
/// Returns the first failing theorem's error, or a
/// [`ValidationFailure::Duplicate`] against the second occurrence.
pub fn validate_all(theorems: &[Theorem]) -> Result<(), ValidationError> {
    theorems.iter().try_for_each(validate_one)?;
    let mut seen = HashSet::with_capacity(theorems.len());
    for theorem in theorems {
        if !seen.insert(theorem.identity()) {
            return Err(ValidationError::new(theorem, ValidationFailure::Duplicate));
        }
    }
    Ok(())
}

/// Applies `level` to the extracted theorems.
///
/// [`ValidationLevel::Theorem`] drops invalid theorems and fails only when
/// none survive; [`ValidationLevel::Paper`] fails on the first violation.
///
/// # Errors
///
/// Returns [`ExtractError::Validation`] as described above.
pub fn apply_validation_level(
    theorems: Vec<Theorem>,
    level: ValidationLevel,
) -> Result<Vec<Theorem>, ExtractError> {
    let extracted = theorems.len();
    match level {
        ValidationLevel::Theorem => {
            let kept: Vec<Theorem> = theorems
                .into_iter()
                .filter(|theorem| match validate_one(theorem) {
                    Ok(()) => true,
                    Err(error) => {
                        debug!(%error, "dropping invalid theorem");
                        false
                    }
                })
                .collect();
            debug!(extracted, kept = kept.len(), "applied theorem-level validation");
            if kept.is_empty() {
                return Err(ExtractError::validation("all theorems are invalid"));
            }
            Ok(kept)
        }
        ValidationLevel::Paper => {
            validate_all(&theorems).map_err(|error| ExtractError::validation(error.to_string()))?;
            debug!(extracted, "applied paper-level validation");
            Ok(theorems)
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::extract::TheoremKind;

    fn theorem(kind: TheoremKind, reference: &str, body: &str) -> Theorem {
        Theorem {
            kind,
            reference: reference.to_owned(),
            note: None,
            label: None,
            body: body.to_owned(),
            proof: None,
        }
    }

    fn valid(reference: &str) -> Theorem {
        theorem(TheoremKind::Theorem, reference, "Let $x$ be real.")
    }

    fn body_failure(body: &str) -> Option<TextRule> {
        match validate_one(&theorem(TheoremKind::Lemma, "1", body)) {
            Ok(()) => None,
            Err(ValidationError {
                failure: ValidationFailure::Text { rule, .. },
                ..
            }) => Some(rule),
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }

    #[rstest]
    #[case::valid("Let $x$ be real.", None)]
    #[case::empty("   ", Some(TextRule::Empty))]
    #[case::odd_dollars("let $x", Some(TextRule::UnbalancedMath))]
    #[case::short("Trivial", Some(TextRule::TooShort))]
    #[case::short_with_math("$x$", Some(TextRule::TooShort))]
    #[case::truncated("The map is injective", Some(TextRule::LikelyTruncated))]
    #[case::short_sentence("The map is injective.", None)]
    #[case::short_with_balanced_math("Then $f$ is injective", None)]
    #[case::dangling_and("If $f$ is continuous and", Some(TextRule::DanglingEnding))]
    #[case::dangling_such_that("There is an $x$ such that", Some(TextRule::DanglingEnding))]
    #[case::dangling_open_paren("Then $f$ is given by the formula g(", Some(TextRule::DanglingEnding))]
    #[case::dangling_open_bracket("Consider $x$ in the closed interval [", Some(TextRule::DanglingEnding))]
    #[case::dangling_equals("Hence the value of $f(0)$ is =", Some(TextRule::DanglingEnding))]
    #[case::dangling_percent("The bound for $x$ follows from %", Some(TextRule::DanglingEnding))]
    #[case::closing_math("We have $x = f(y)$", None)]
    #[case::dangling_colon("The following are equivalent for $x$:", Some(TextRule::DanglingEnding))]
    #[case::upper_case_connective("FOR EVERY $x$ THE MAP IS INJECTIVE AND", Some(TextRule::DanglingEnding))]
    fn body_rules_apply_in_order(#[case] body: &str, #[case] expected: Option<TextRule>) {
        assert_eq!(body_failure(body), expected);
    }

    #[rstest]
    fn bodies_under_eight_characters_fail_for_every_kind(
        #[values(
            TheoremKind::Theorem,
            TheoremKind::Lemma,
            TheoremKind::Corollary,
            TheoremKind::Proposition
        )]
        kind: TheoremKind,
    ) {
        let error = validate_one(&theorem(kind, "1", "$x=1$.")).expect_err("too short");
        assert_eq!(
            error.failure,
            ValidationFailure::Text {
                field: TextField::Body,
                rule: TextRule::TooShort
            }
        );
    }

    #[test]
    fn character_counts_use_unicode_scalars() {
        assert_eq!(body_failure("ééééééé"), Some(TextRule::TooShort));
        assert_eq!(body_failure("éééééééé."), None);
    }

    #[test]
    fn missing_reference_is_reported_first() {
        let error = validate_one(&theorem(TheoremKind::Theorem, "", "")).expect_err("no ref");
        assert_eq!(error.failure, ValidationFailure::MissingRef);
    }

    #[test]
    fn proofs_are_checked_after_bodies() {
        let mut candidate = valid("1");
        candidate.proof = Some("Clear".to_owned());
        let error = validate_one(&candidate).expect_err("short proof");
        assert_eq!(
            error.failure,
            ValidationFailure::Text {
                field: TextField::Proof,
                rule: TextRule::TooShort
            }
        );
        assert_eq!(error.to_string(), "Theorem 1 proof is too short");
    }

    #[test]
    fn identical_identities_fail_regardless_of_bodies() {
        let first = valid("1.1");
        let second = theorem(TheoremKind::Theorem, "1.1", "A different but valid statement.");
        let error = validate_all(&[first, second]).expect_err("duplicate");
        assert_eq!(error.failure, ValidationFailure::Duplicate);
        assert_eq!(error.theorem, "Theorem 1.1");
    }

    #[test]
    fn differing_notes_are_distinct_identities() {
        let first = valid("1.1");
        let mut second = valid("1.1");
        second.note = Some("Converse".to_owned());
        assert_eq!(validate_all(&[first, second]), Ok(()));
    }

    #[test]
    fn theorem_level_drops_invalid_entries() {
        let kept = apply_validation_level(
            vec![valid("1"), theorem(TheoremKind::Lemma, "2", "oops"), valid("3")],
            ValidationLevel::Theorem,
        )
        .expect("some survive");
        let refs: Vec<&str> = kept.iter().map(|t| t.reference.as_str()).collect();
        assert_eq!(refs, ["1", "3"]);
    }

    #[test]
    fn theorem_level_fails_when_nothing_survives() {
        let error = apply_validation_level(
            vec![theorem(TheoremKind::Lemma, "2", "oops")],
            ValidationLevel::Theorem,
        )
        .expect_err("none survive");
        assert_eq!(error, ExtractError::validation("all theorems are invalid"));
    }

    #[test]
    fn paper_level_fails_on_any_violation() {
        let error = apply_validation_level(
            vec![valid("1"), theorem(TheoremKind::Lemma, "2", "oops")],
            ValidationLevel::Paper,
        )
        .expect_err("one invalid");
        assert_eq!(
            error.to_string(),
            "[VALIDATION ERROR] Lemma 2 body is too short"
        );
    }

    #[test]
    fn paper_level_accepts_an_empty_paper() {
        assert_eq!(apply_validation_level(Vec::new(), ValidationLevel::Paper), Ok(Vec::new()));
    }
}
