//! Error types for the structural LaTeX parser.

use std::io;
use std::path::PathBuf;

/// Errors raised while reading and expanding a LaTeX document.
#[derive(Debug, thiserror::Error)]
pub enum LatexError {
    /// A source file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// Inclusions nest deeper than the parser allows, usually a cycle.
    #[error("inclusion of '{name}' exceeds the nesting limit of {limit}")]
    IncludeDepth {
        /// Name as written in the `\input`-like command.
        name: String,
        /// Configured nesting limit.
        limit: usize,
    },
}
