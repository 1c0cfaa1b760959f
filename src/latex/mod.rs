//! Structural LaTeX adapter for the extraction pipeline.
//!
//! [`StructuralParser`] implements [`TreeParser`](crate::extract::TreeParser)
//! and produces a [`LatexDocument`], which implements
//! [`DocumentTree`](crate::extract::DocumentTree).

mod error;
mod includes;
mod numbering;
mod parser;
mod tree;

pub use error::LatexError;
pub use parser::{DEFAULT_INCLUDE_DEPTH, StructuralParser};
pub use tree::{LatexDocument, NodeId};
