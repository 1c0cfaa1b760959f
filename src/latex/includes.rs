//! Resolution and textual expansion of `\input`-like commands.

use std::cell::OnceCell;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;
use tracing::debug;

use super::error::LatexError;
use crate::extract::{INCLUDE_PATH_VAR, SourceTree, strip_comments};
use crate::patterns::literal_regex;

static INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| literal_regex(r"\\(?:input|include|subfile)\s*\{\s*([^}]+?)\s*\}"));

static PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    literal_regex(
        r"\\(?P<command>usepackage|RequirePackage|documentclass)\s*(?:\[[^\]]*\])?\s*\{(?P<names>[^}]+)\}",
    )
});

#[derive(Debug)]
struct SearchDir {
    path: PathBuf,
    recursive: bool,
    tree: OnceCell<Option<SourceTree>>,
}

impl SearchDir {
    fn new(path: PathBuf, recursive: bool) -> Self {
        Self {
            path,
            recursive,
            tree: OnceCell::new(),
        }
    }

    fn find(&self, candidate: &str) -> Option<PathBuf> {
        if !self.recursive {
            let path = self.path.join(candidate);
            return path.is_file().then_some(path);
        }
        let tree = self
            .tree
            .get_or_init(|| {
                let root = Utf8Path::from_path(&self.path)?;
                SourceTree::open(root).ok()
            })
            .as_ref()?;
        tree.files()
            .iter()
            .find(|file| file.ends_with(candidate))
            .map(|file| tree.absolute(file).into_std_path_buf())
    }
}

/// Ordered search path for included files.
///
/// The main file's directory comes first, then the caller's include
/// directories, then the entries of the TeX include path variable. Entries
/// ending in `//` are searched recursively, walked at most once.
#[derive(Debug)]
pub(crate) struct IncludeResolver {
    search: Vec<SearchDir>,
}

impl IncludeResolver {
    pub(crate) fn new(main_dir: &Path, include_dirs: &[PathBuf]) -> Self {
        let mut search = vec![SearchDir::new(main_dir.to_path_buf(), false)];
        search.extend(
            include_dirs
                .iter()
                .map(|dir| SearchDir::new(dir.clone(), false)),
        );
        if let Some(value) = env::var_os(INCLUDE_PATH_VAR) {
            for entry in env::split_paths(&value) {
                if entry.as_os_str().is_empty() {
                    continue;
                }
                let recursive = entry.to_str().is_some_and(|text| text.ends_with("//"));
                search.push(SearchDir::new(entry, recursive));
            }
        }
        Self { search }
    }

    /// Finds `name`, trying it as written and then with `.{extension}`.
    pub(crate) fn resolve(&self, name: &str, extension: &str) -> Option<PathBuf> {
        let mut candidates = Vec::with_capacity(2);
        if Path::new(name).extension().is_some() {
            candidates.push(name.to_owned());
        }
        candidates.push(format!("{name}.{extension}"));
        self.search.iter().find_map(|dir| {
            candidates
                .iter()
                .find_map(|candidate| dir.find(candidate))
        })
    }
}

/// Reads a source file lossily with comments removed.
pub(crate) fn read_source(path: &Path) -> Result<String, LatexError> {
    let bytes = fs::read(path).map_err(|source| LatexError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(strip_comments(&String::from_utf8_lossy(&bytes)))
}

/// Splices included files into `text`, recursively.
///
/// Files that cannot be found are left out with a debug event.
pub(crate) fn expand_includes(
    resolver: &IncludeResolver,
    text: &str,
    depth: usize,
    limit: usize,
) -> Result<String, LatexError> {
    let mut expanded = String::with_capacity(text.len());
    let mut cursor = 0;
    for captures in INCLUDE.captures_iter(text) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        expanded.push_str(text.get(cursor..whole.start()).unwrap_or_default());
        cursor = whole.end();

        let Some(path) = resolver.resolve(name.as_str(), "tex") else {
            debug!(include = name.as_str(), "included file not found");
            continue;
        };
        if depth >= limit {
            return Err(LatexError::IncludeDepth {
                name: name.as_str().to_owned(),
                limit,
            });
        }
        let included = expand_includes(resolver, &read_source(&path)?, depth + 1, limit)?;
        // End of file reads as one line end, which the caller's text supplies.
        expanded.push_str(included.strip_suffix('\n').unwrap_or(&included));
    }
    expanded.push_str(text.get(cursor..).unwrap_or_default());
    Ok(expanded)
}

/// Reads local packages and classes named in `text`, for their declarations.
///
/// Names that do not resolve, typically system packages, are skipped.
pub(crate) fn local_packages(
    resolver: &IncludeResolver,
    text: &str,
) -> Result<Vec<String>, LatexError> {
    let mut sources = Vec::new();
    for captures in PACKAGE.captures_iter(text) {
        let (Some(command), Some(names)) = (captures.name("command"), captures.name("names"))
        else {
            continue;
        };
        let extension = if command.as_str() == "documentclass" {
            "cls"
        } else {
            "sty"
        };
        for name in names.as_str().split(',').map(str::trim) {
            if name.is_empty() {
                continue;
            }
            if let Some(path) = resolver.resolve(name, extension) {
                sources.push(read_source(&path)?);
            }
        }
    }
    Ok(sources)
}
