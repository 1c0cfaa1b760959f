//! Integration tests for extracting theorems from on-disk fixture papers.

mod common;

use common::{paper_fixture, pipeline_lock};
use rstest::rstest;
use theoremx::extract::{
    ErrorKind, ExtractError, ExtractRequest, PaperSource, TheoremKind, ValidationLevel,
    extract_from_directory, extract_paper,
};
use theoremx::latex::StructuralParser;

fn extract(fixture: &str, level: ValidationLevel) -> Result<Vec<theoremx::extract::Theorem>, ExtractError> {
    let _guard = pipeline_lock();
    extract_from_directory(&paper_fixture(fixture), level, &StructuralParser::new())
}

// ── Given well-formed papers, every theorem is extracted ────────────

#[rstest]
#[case::single_file("simple", &[
    (TheoremKind::Corollary, "1"),
    (TheoremKind::Lemma, "1.1"),
    (TheoremKind::Theorem, "1.2"),
])]
#[case::inputs_and_packages("multi_file", &[
    (TheoremKind::Proposition, "2.1"),
    (TheoremKind::Theorem, "2.2"),
])]
fn given_a_fixture_paper_when_extracted_then_kinds_and_refs_match(
    #[case] fixture: &str,
    #[case] expected: &[(TheoremKind, &str)],
) {
    let theorems = extract(fixture, ValidationLevel::Paper)
        .unwrap_or_else(|e| panic!("expected {fixture} to extract, got: {e}"));
    let actual: Vec<(TheoremKind, &str)> = theorems
        .iter()
        .map(|theorem| (theorem.kind, theorem.reference.as_str()))
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn given_a_proof_titled_with_a_reference_then_it_binds_by_label() {
    let theorems = extract("simple", ValidationLevel::Paper).expect("extract");
    let lemma = theorems
        .iter()
        .find(|theorem| theorem.label.as_deref() == Some("lem:key"))
        .expect("key lemma");
    assert_eq!(lemma.note.as_deref(), Some("Key bound"));
    assert_eq!(
        lemma.proof.as_deref(),
        Some("Multiply both sides of $n \\geq 1$ by $n$.")
    );
}

#[test]
fn given_a_theorem_without_a_nearby_proof_then_proof_is_absent() {
    let theorems = extract("simple", ValidationLevel::Paper).expect("extract");
    let corollary = theorems
        .iter()
        .find(|theorem| theorem.kind == TheoremKind::Corollary)
        .expect("corollary");
    assert_eq!(corollary.proof, None);
}

// ── Given defective papers, extraction fails or filters ─────────────

#[test]
fn given_a_truncated_statement_when_paper_level_then_validation_fails() {
    let error = extract("truncated", ValidationLevel::Paper).expect_err("truncated lemma");
    assert_eq!(error.kind(), ErrorKind::Validation);
    assert!(
        error.message().starts_with("Lemma 1 "),
        "message should name the theorem, got: {error}"
    );
}

#[test]
fn given_a_truncated_statement_when_theorem_level_then_it_is_dropped() {
    let theorems = extract("truncated", ValidationLevel::Theorem).expect("extract");
    assert_eq!(theorems.len(), 1);
    assert_eq!(theorems[0].reference, "2");
    assert_eq!(
        theorems[0].proof.as_deref(),
        Some("Induct on the number of elements.")
    );
}

#[rstest]
#[case::paper_level(ValidationLevel::Paper)]
#[case::theorem_level(ValidationLevel::Theorem)]
fn given_no_candidate_main_files_then_download_error(#[case] level: ValidationLevel) {
    let error = extract("no_candidates", level).expect_err("no main file");
    assert_eq!(
        error.to_string(),
        "[DOWNLOAD ERROR] paper directory has no potential main files"
    );
}

#[test]
fn given_a_missing_path_then_source_is_not_found() {
    let request = ExtractRequest::new(PaperSource::Path {
        path: paper_fixture("simple").join("absent"),
    });
    let error = extract_paper(&request).expect_err("missing path");
    assert_eq!(error.to_string(), "[DOWNLOAD ERROR] paper source not found");
}

#[test]
fn given_a_single_source_file_then_it_is_extracted_like_its_directory() {
    let request = ExtractRequest::new(PaperSource::Path {
        path: paper_fixture("simple").join("main.tex"),
    });
    let from_file = {
        let _guard = pipeline_lock();
        extract_paper(&request).expect("extract from file")
    };
    let from_dir = extract("simple", ValidationLevel::Paper).expect("extract from directory");
    assert_eq!(from_file, from_dir);
}
