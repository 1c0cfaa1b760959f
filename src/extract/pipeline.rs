//! End-to-end extraction for one paper.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::associate::extract_theorems;
use super::catalog::EnvironmentCatalog;
use super::error::ExtractError;
use super::main_file::select_main_file;
use super::node::TreeParser;
use super::scope::{IncludePathScope, quietly};
use super::source_tree::SourceTree;
use super::types::{Theorem, ValidationLevel};
use super::validate::apply_validation_level;
use crate::arxiv::{ArxivSource, SourceProvider};
use crate::latex::StructuralParser;

/// Endpoint serving arXiv source payloads.
pub const DEFAULT_ARXIV_SRC_URL: &str = "https://arxiv.org/src";

/// Where a paper's sources come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PaperSource {
    /// An arXiv identifier, fetched through a [`SourceProvider`].
    Arxiv {
        /// Identifier such as `2101.00001` or `math/0601001`.
        id: String,
    },
    /// A local source directory or single source file.
    Path {
        /// Location on disk.
        path: PathBuf,
    },
}

impl PaperSource {
    /// Builds a source from the two mutually exclusive caller options.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Syntax`] unless exactly one option is given.
    pub fn from_options(
        arxiv_id: Option<String>,
        paper_path: Option<PathBuf>,
    ) -> Result<Self, ExtractError> {
        match (arxiv_id, paper_path) {
            (Some(id), None) => Ok(Self::Arxiv { id }),
            (None, Some(path)) => Ok(Self::Path { path }),
            (None, None) => Err(ExtractError::syntax(
                "either an arXiv identifier or a paper path is required",
            )),
            (Some(_), Some(_)) => Err(ExtractError::syntax(
                "an arXiv identifier and a paper path are mutually exclusive",
            )),
        }
    }
}

fn default_arxiv_src_url() -> String {
    DEFAULT_ARXIV_SRC_URL.to_owned()
}

/// One extraction job.
///
/// Serializable so it can be handed to a worker process unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractRequest {
    /// Where the sources come from.
    pub source: PaperSource,
    /// Strictness applied to the extracted theorems.
    #[serde(default)]
    pub level: ValidationLevel,
    /// Endpoint used for [`PaperSource::Arxiv`].
    #[serde(default = "default_arxiv_src_url")]
    pub arxiv_src_url: String,
}

impl ExtractRequest {
    /// Builds a request with paper-level validation and the public endpoint.
    #[must_use]
    pub fn new(source: PaperSource) -> Self {
        Self {
            source,
            level: ValidationLevel::default(),
            arxiv_src_url: default_arxiv_src_url(),
        }
    }

    /// Sets the validation level.
    #[must_use]
    pub const fn with_level(mut self, level: ValidationLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the arXiv source endpoint.
    #[must_use]
    pub fn with_arxiv_src_url(mut self, url: impl Into<String>) -> Self {
        self.arxiv_src_url = url.into();
        self
    }
}

/// Runs `request` with the arXiv provider and the structural LaTeX parser.
///
/// # Errors
///
/// See [`extract_paper_with`].
pub fn extract_paper(request: &ExtractRequest) -> Result<Vec<Theorem>, ExtractError> {
    let provider = ArxivSource::new(&request.arxiv_src_url)?;
    extract_paper_with(request, &provider, &StructuralParser::new())
}

/// Runs `request` with the given collaborators.
///
/// Fetched papers and single source files are staged in a temporary
/// directory that is removed when the call returns.
///
/// # Errors
///
/// Returns [`ExtractError::Download`] when the source cannot be obtained or
/// does not exist, and any error of [`extract_from_directory`].
pub fn extract_paper_with(
    request: &ExtractRequest,
    provider: &impl SourceProvider,
    parser: &impl TreeParser,
) -> Result<Vec<Theorem>, ExtractError> {
    match &request.source {
        PaperSource::Arxiv { id } => {
            let staging = staging_dir()?;
            let paper_dir = provider.fetch(id, staging.path())?;
            extract_from_directory(&paper_dir, request.level, parser)
        }
        PaperSource::Path { path } if path.is_dir() => {
            extract_from_directory(path, request.level, parser)
        }
        PaperSource::Path { path } if path.is_file() => {
            let staging = staging_dir()?;
            let file_name = path
                .file_name()
                .ok_or_else(|| ExtractError::download("paper source not found"))?;
            fs::copy(path, staging.path().join(file_name)).map_err(|error| {
                ExtractError::download(format!("cannot stage {}: {error}", path.display()))
            })?;
            extract_from_directory(staging.path(), request.level, parser)
        }
        PaperSource::Path { path } => {
            debug!(path = %path.display(), "paper source missing");
            Err(ExtractError::download("paper source not found"))
        }
    }
}

fn staging_dir() -> Result<tempfile::TempDir, ExtractError> {
    tempfile::Builder::new()
        .prefix("theoremx-")
        .tempdir()
        .map_err(|error| ExtractError::download(format!("cannot create staging directory: {error}")))
}

/// Extracts and validates the theorems of the paper in `paper_dir`.
///
/// The main file is chosen before anything is parsed, so a directory
/// without candidates fails without touching the parser. The parse call
/// runs with the paper directory on the TeX include path and with its
/// diagnostics silenced.
///
/// # Errors
///
/// Returns [`ExtractError::Download`] when the directory cannot be read or
/// has no main file candidate, [`ExtractError::ParseFailure`] when parsing
/// fails, and [`ExtractError::Validation`] as described by
/// [`apply_validation_level`].
pub fn extract_from_directory(
    paper_dir: &Path,
    level: ValidationLevel,
    parser: &impl TreeParser,
) -> Result<Vec<Theorem>, ExtractError> {
    let root = paper_dir.canonicalize().map_err(|error| {
        ExtractError::download(format!("cannot open {}: {error}", paper_dir.display()))
    })?;
    let utf8_root = Utf8Path::from_path(&root).ok_or_else(|| {
        ExtractError::download(format!("paper directory {} is not UTF-8", root.display()))
    })?;
    let tree = SourceTree::open(utf8_root)
        .map_err(|error| ExtractError::download(format!("cannot read {utf8_root}: {error}")))?;

    let main_file = select_main_file(&tree)?;
    info!(main_file = %main_file, "selected main file");
    let catalog = EnvironmentCatalog::build(&tree);
    debug!(environments = catalog.len(), "built environment catalog");

    let started = Instant::now();
    let parsed = {
        let _scope = IncludePathScope::enter(&root);
        quietly(|| parser.parse(main_file.as_std_path(), std::slice::from_ref(&root)))
    };
    let mut document =
        parsed.map_err(|error| ExtractError::parse_failure(format!("{main_file}: {error}")))?;
    debug!(elapsed = ?started.elapsed(), "parsed main file");

    let theorems = extract_theorems(&mut document, &catalog);
    info!(extracted = theorems.len(), "extracted theorems");
    let validated = apply_validation_level(theorems, level)?;
    info!(kept = validated.len(), %level, "validated theorems");
    Ok(validated)
}
