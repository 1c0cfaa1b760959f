//! Tree traversal and proof association.
//!
//! Proofs are bound to theorems in two passes. The first harvests proofs
//! whose note names a label (`Proof of Theorem~\ref{thm:main}`) and detaches
//! them. The second walks every cataloged environment, takes a harvested
//! proof by label when one exists, and otherwise looks a few blocks ahead of
//! the theorem for the nearest unclaimed proof.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::catalog::EnvironmentCatalog;
use super::label::separate_body_and_label;
use super::node::DocumentTree;
use super::types::{Theorem, TheoremKind};
use crate::patterns::literal_regex;

/// Siblings after a theorem's container that are searched for its proof.
pub const PROOF_LOOKAHEAD: usize = 3;

const PROOF_TAG: &str = "proof";

static PROOF_NOTE_REF: LazyLock<Regex> = LazyLock::new(|| {
    literal_regex(r"(?i)\b(?:proof|proving)\b[^\n\\]*?\\(?:c|auto)?ref\s*\{\s*([^}]+?)\s*\}")
});

/// Extracts every cataloged theorem from `tree`, sorted by reference.
///
/// Proof nodes that are claimed are detached from the tree, so each proof is
/// used at most once. References sort as plain strings: `10.1` comes before
/// `2.1`.
pub fn extract_theorems<T: DocumentTree>(
    tree: &mut T,
    catalog: &EnvironmentCatalog,
) -> Vec<Theorem> {
    let mut proofs = harvest_labelled_proofs(tree);
    let root = tree.root();
    let mut theorems = Vec::new();

    for (environment, kind) in catalog.iter() {
        for node in tree.elements_by_tag(root, environment) {
            theorems.push(read_theorem(tree, catalog, &mut proofs, node, kind));
        }
    }

    debug!(
        theorems = theorems.len(),
        unclaimed_proofs = proofs.len(),
        "extracted theorems"
    );
    theorems.sort_by(|left, right| left.reference.cmp(&right.reference));
    theorems
}

fn harvest_labelled_proofs<T: DocumentTree>(tree: &mut T) -> HashMap<String, String> {
    let mut proofs = HashMap::new();
    let root = tree.root();
    for proof in tree.elements_by_tag(root, PROOF_TAG) {
        let Some(label) = note_of(tree, proof).and_then(|note| referenced_label(&note)) else {
            continue;
        };
        let body = node_body(tree, proof);
        proofs.entry(label).or_insert(body);
        tree.detach(proof);
    }
    proofs
}

fn referenced_label(note: &str) -> Option<String> {
    PROOF_NOTE_REF
        .captures(note)
        .and_then(|captures| captures.get(1))
        .map(|key| key.as_str().to_owned())
}

fn read_theorem<T: DocumentTree>(
    tree: &mut T,
    catalog: &EnvironmentCatalog,
    proofs: &mut HashMap<String, String>,
    node: T::Node,
    kind: TheoremKind,
) -> Theorem {
    let reference = tree
        .counter_ref(node)
        .and_then(|counter| tree.source(counter))
        .map(strip_nul)
        .unwrap_or_default();
    let note = note_of(tree, node).map(|note| strip_nul(&note));
    let (body, label) = separate_body_and_label(&strip_nul(&content_of(tree, node)));

    let proof = label
        .as_ref()
        .and_then(|key| proofs.remove(key))
        .or_else(|| nearby_proof(tree, catalog, node))
        .filter(|text| !text.is_empty());

    Theorem {
        kind,
        reference,
        note,
        label,
        body,
        proof,
    }
}

/// Claims the first proof within [`PROOF_LOOKAHEAD`] siblings of the
/// theorem's container, stopping at the next theorem.
fn nearby_proof<T: DocumentTree>(
    tree: &mut T,
    catalog: &EnvironmentCatalog,
    node: T::Node,
) -> Option<String> {
    let container = tree.parent(node)?;
    let mut sibling = tree.next_sibling(container);
    for _ in 0..PROOF_LOOKAHEAD {
        let current = sibling?;
        if is_theorem_boundary(tree, catalog, current) {
            return None;
        }
        if let Some(proof) = tree.elements_by_tag(current, PROOF_TAG).first().copied() {
            let body = node_body(tree, proof);
            tree.detach(proof);
            return Some(body);
        }
        sibling = tree.next_sibling(current);
    }
    None
}

fn is_theorem_boundary<T: DocumentTree>(
    tree: &T,
    catalog: &EnvironmentCatalog,
    node: T::Node,
) -> bool {
    catalog.contains(tree.tag(node))
        || tree
            .children(node)
            .iter()
            .any(|child| catalog.contains(tree.tag(*child)))
}

fn note_of<T: DocumentTree>(tree: &T, node: T::Node) -> Option<String> {
    tree.title(node)
        .or_else(|| tree.caption(node))
        .map(|attribute| tree.serialized(attribute).trim().to_owned())
        .filter(|note| !note.is_empty())
}

fn content_of<T: DocumentTree>(tree: &T, node: T::Node) -> String {
    tree.children(node)
        .iter()
        .map(|child| tree.serialized(*child))
        .collect()
}

/// Node content with NUL bytes and the first `\label` removed.
fn node_body<T: DocumentTree>(tree: &T, node: T::Node) -> String {
    separate_body_and_label(&strip_nul(&content_of(tree, node))).0
}

fn strip_nul(text: &str) -> String {
    text.replace('\0', "")
}

#[cfg(test)]
#[path = "associate_tests.rs"]
mod tests;
