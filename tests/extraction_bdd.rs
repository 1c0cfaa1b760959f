//! Behavioural tests for theorem extraction using `rstest-bdd`.

mod common;

use common::{paper_fixture, pipeline_lock};
use rstest_bdd_macros::{given, scenario, then};
use theoremx::extract::{
    ErrorKind, ExtractError, Theorem, TheoremKind, ValidationLevel, extract_from_directory,
};
use theoremx::latex::StructuralParser;

/// Extracts a fixture paper at the given validation level.
fn extract(fixture: &str, level: ValidationLevel) -> Result<Vec<Theorem>, ExtractError> {
    let _guard = pipeline_lock();
    extract_from_directory(&paper_fixture(fixture), level, &StructuralParser::new())
}

/// Finds the theorem with `reference`, failing the step if it is absent.
fn theorem_with_ref<'a>(theorems: &'a [Theorem], reference: &str) -> &'a Theorem {
    theorems
        .iter()
        .find(|theorem| theorem.reference == reference)
        .unwrap_or_else(|| panic!("expected a theorem numbered {reference}, got: {theorems:?}"))
}

#[given("the simple paper fixture")]
fn given_simple_paper_fixture() {}

#[then("the main theorem carries its adjacent proof")]
fn then_main_theorem_carries_adjacent_proof() {
    let theorems = extract("simple", ValidationLevel::Paper)
        .unwrap_or_else(|e| panic!("simple paper extracts: {e}"));
    let theorem = theorem_with_ref(&theorems, "1.2");
    assert_eq!(theorem.kind, TheoremKind::Theorem);
    assert_eq!(theorem.label.as_deref(), Some("thm:main"));
    assert_eq!(
        theorem.proof.as_deref(),
        Some("Take the supremum of the sequence and use monotonicity.")
    );
}

#[then("the key lemma carries the proof that names it")]
fn then_key_lemma_carries_named_proof() {
    let theorems = extract("simple", ValidationLevel::Paper)
        .unwrap_or_else(|e| panic!("simple paper extracts: {e}"));
    let lemma = theorem_with_ref(&theorems, "1.1");
    assert_eq!(lemma.display_name(), "Lemma 1.1 (Key bound)");
    assert_eq!(
        lemma.proof.as_deref(),
        Some("Multiply both sides of $n \\geq 1$ by $n$.")
    );
}

#[given("the multi-file paper fixture")]
fn given_multi_file_paper_fixture() {}

#[then("the proposition declared in a package is extracted")]
fn then_package_proposition_is_extracted() {
    let theorems = extract("multi_file", ValidationLevel::Paper)
        .unwrap_or_else(|e| panic!("multi-file paper extracts: {e}"));
    let proposition = theorem_with_ref(&theorems, "2.1");
    assert_eq!(proposition.kind, TheoremKind::Proposition);
    assert_eq!(proposition.note.as_deref(), Some("Closed subsets"));
}

#[given("the truncated paper fixture")]
fn given_truncated_paper_fixture() {}

#[then("paper-level validation fails on the truncated lemma")]
fn then_paper_level_validation_fails() {
    let Err(error) = extract("truncated", ValidationLevel::Paper) else {
        panic!("truncated paper fails");
    };
    assert_eq!(error.kind(), ErrorKind::Validation);
    assert!(
        error.to_string().starts_with("[VALIDATION ERROR] Lemma 1 "),
        "unexpected error: {error}"
    );
}

#[then("theorem-level validation keeps only the complete lemma")]
fn then_theorem_level_keeps_complete_lemma() {
    let theorems = extract("truncated", ValidationLevel::Theorem)
        .unwrap_or_else(|e| panic!("lenient extraction: {e}"));
    let references: Vec<&str> = theorems
        .iter()
        .map(|theorem| theorem.reference.as_str())
        .collect();
    assert_eq!(references, ["2"]);
}

#[given("a paper fixture without candidate main files")]
fn given_paper_fixture_without_candidates() {}

#[then("extraction fails with a download error before parsing")]
fn then_extraction_fails_with_download_error() {
    let Err(error) = extract("no_candidates", ValidationLevel::Paper) else {
        panic!("no main file");
    };
    assert_eq!(
        error,
        ExtractError::download("paper directory has no potential main files")
    );
}

#[scenario(
    path = "tests/features/extraction.feature",
    name = "A theorem is paired with the proof that follows it"
)]
fn theorem_is_paired_with_following_proof() {}

#[scenario(
    path = "tests/features/extraction.feature",
    name = "A proof titled with a reference is bound by label"
)]
fn proof_titled_with_reference_is_bound_by_label() {}

#[scenario(
    path = "tests/features/extraction.feature",
    name = "Inputs and local packages are followed"
)]
fn inputs_and_local_packages_are_followed() {}

#[scenario(
    path = "tests/features/extraction.feature",
    name = "Truncated statements reject the whole paper"
)]
fn truncated_statements_reject_the_whole_paper() {}

#[scenario(
    path = "tests/features/extraction.feature",
    name = "Truncated statements are dropped at theorem level"
)]
fn truncated_statements_are_dropped_at_theorem_level() {}

#[scenario(
    path = "tests/features/extraction.feature",
    name = "A directory without main file candidates is rejected"
)]
fn directory_without_candidates_is_rejected() {}
