//! `theoremx` extracts theorem and proof records from the LaTeX
//! sources of academic papers.
//!
//! Given an arXiv identifier or a local source directory, the crate picks the
//! main `.tex` file, learns which environments declare theorem-like results,
//! parses the document into a tree, pairs each theorem with its proof, and
//! validates the resulting records before they are written as JSON Lines.

/// Retrieval and unpacking of arXiv paper sources.
pub mod arxiv;
/// Extraction pipeline: discovery, association, validation and isolation.
pub mod extract;
/// Structural LaTeX parser producing the document tree used by extraction.
pub mod latex;

mod patterns;
