//! Theorem extraction from paper source directories.
//!
//! The pipeline runs in a fixed order: select the main file of a
//! [`SourceTree`], build the [`EnvironmentCatalog`] of theorem-like
//! environments, parse the main file into a [`DocumentTree`] with a
//! [`TreeParser`], associate theorems with proofs, and filter the result
//! through the requested [`ValidationLevel`]. [`extract_paper_bounded`] runs
//! the same pipeline in a worker process under a wall-clock budget.

mod associate;
mod bounded;
mod catalog;
mod comments;
mod error;
mod label;
mod main_file;
mod node;
mod pipeline;
mod scope;
mod source_tree;
mod types;
mod validate;

pub use associate::{PROOF_LOOKAHEAD, extract_theorems};
pub use bounded::{WORKER_SUBCOMMAND, WorkerReport, extract_paper_bounded, run_bounded, write_report};
pub use catalog::{
    DECLARATION_EXTENSIONS, Declaration, EnvironmentCatalog, classify_title, scan_declarations,
};
pub use comments::{strip_comments, strip_line_comment};
pub use error::{ErrorKind, ExtractError, MAX_MESSAGE_CHARS};
pub use label::separate_body_and_label;
pub use main_file::{MAIN_FILE_EXTENSIONS, score_line, score_text, select_main_file};
pub use node::{DocumentTree, TreeParser};
pub use pipeline::{
    DEFAULT_ARXIV_SRC_URL, ExtractRequest, PaperSource, extract_from_directory, extract_paper,
    extract_paper_with,
};
pub use scope::{INCLUDE_PATH_VAR, IncludePathScope, quietly};
#[cfg(test)]
pub(crate) use scope::environment_lock;
pub use source_tree::SourceTree;
pub use types::{Theorem, TheoremKind, ValidationLevel, to_json_lines};
pub use validate::{
    TextField, TextRule, ValidationError, ValidationFailure, apply_validation_level, validate_all,
    validate_one,
};
