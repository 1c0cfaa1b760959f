//! Discovery of theorem-like environments declared with `\newtheorem`.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, warn};

use super::comments::strip_comments;
use super::source_tree::SourceTree;
use super::types::TheoremKind;
use crate::patterns::literal_regex;

/// Extensions of files scanned for declarations.
pub const DECLARATION_EXTENSIONS: &[&str] = &["tex", "latex", "ltx", "sty", "cls"];

static NEWTHEOREM: LazyLock<Regex> = LazyLock::new(|| {
    literal_regex(
        r"(?x)
        \\newtheorem(?P<star>\*?)\s*
        \{(?P<env>[^}]+)\}
        (?:\[(?P<shared>[^\]]*)\])?\s*
        \{(?P<title>[^}]+)\}
        (?:\s*\[(?P<within>[^\]]*)\])?
        ",
    )
});

/// One `\newtheorem` declaration as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Environment name, trimmed, with any `*` removed.
    pub environment: String,
    /// Printed title, trimmed, original case.
    pub title: String,
    /// Whether the environment is numbered (no `*` after `\newtheorem`).
    pub numbered: bool,
    /// Counter shared with another environment, from `{env}[shared]{Title}`.
    pub shared_counter: Option<String>,
    /// Counter this one is reset by, from `{env}{Title}[within]`.
    pub within: Option<String>,
}

/// Finds every `\newtheorem` declaration in `tex`, in source order.
pub fn scan_declarations(tex: &str) -> impl Iterator<Item = Declaration> + '_ {
    NEWTHEOREM.captures_iter(tex).filter_map(|captures| {
        let environment = captures.name("env")?.as_str().trim().replace('*', "");
        let title = captures.name("title")?.as_str().trim().to_owned();
        let optional = |name: &str| {
            captures
                .name(name)
                .map(|m| m.as_str().trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        Some(Declaration {
            environment,
            title,
            numbered: captures.name("star").is_none_or(|star| star.as_str().is_empty()),
            shared_counter: optional("shared"),
            within: optional("within"),
        })
    })
}

/// Maps a declared title to a kind.
///
/// The lower-cased title matches a kind when it is a substring of the
/// canonical name, contains it, or starts with one of the kind's aliases.
/// Kinds are tried in [`TheoremKind::ALL`] order. Blank titles never match.
#[must_use]
pub fn classify_title(title: &str) -> Option<TheoremKind> {
    let normalized = title.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    TheoremKind::ALL.into_iter().find(|kind| {
        let name = kind.canonical_name();
        name.contains(normalized.as_str())
            || normalized.contains(name)
            || kind
                .aliases()
                .iter()
                .any(|alias| normalized.starts_with(alias))
    })
}

/// Environment names known to typeset theorem-like results.
///
/// Seeded with the built-in aliases, then extended by declarations in scan
/// order. Re-declaring a name updates its kind without moving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentCatalog {
    environments: IndexMap<String, TheoremKind>,
}

impl EnvironmentCatalog {
    /// Builds a catalog holding only the built-in aliases.
    #[must_use]
    pub fn with_default_aliases() -> Self {
        let environments = TheoremKind::ALL
            .into_iter()
            .flat_map(|kind| kind.aliases().iter().map(move |alias| ((*alias).to_owned(), kind)))
            .collect();
        Self { environments }
    }

    /// Builds the catalog for a paper by scanning every declaration file.
    ///
    /// Files that cannot be read are skipped with a warning.
    #[must_use]
    pub fn build(tree: &SourceTree) -> Self {
        let mut catalog = Self::with_default_aliases();
        for file in tree.files_with_extensions(DECLARATION_EXTENSIONS) {
            match tree.read_lossy(file) {
                Ok(text) => catalog.absorb(&text),
                Err(error) => warn!(%file, %error, "skipping unreadable declaration file"),
            }
        }
        debug!(environments = catalog.len(), "built environment catalog");
        catalog
    }

    /// Builds a catalog from in-memory sources, in order.
    #[must_use]
    pub fn from_sources<'a>(sources: impl IntoIterator<Item = &'a str>) -> Self {
        let mut catalog = Self::with_default_aliases();
        for text in sources {
            catalog.absorb(text);
        }
        catalog
    }

    fn absorb(&mut self, tex: &str) {
        for declaration in scan_declarations(&strip_comments(tex)) {
            if declaration.environment.is_empty()
                || !declaration
                    .environment
                    .chars()
                    .all(|ch| ch.is_ascii_alphabetic())
            {
                continue;
            }
            if let Some(kind) = classify_title(&declaration.title) {
                self.environments.insert(declaration.environment, kind);
            }
        }
    }

    /// Returns the kind for an environment name.
    #[must_use]
    pub fn get(&self, environment: &str) -> Option<TheoremKind> {
        self.environments.get(environment).copied()
    }

    /// Returns whether `environment` is cataloged.
    #[must_use]
    pub fn contains(&self, environment: &str) -> bool {
        self.environments.contains_key(environment)
    }

    /// Iterates names and kinds in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TheoremKind)> {
        self.environments
            .iter()
            .map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Returns the number of cataloged environments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.environments.len()
    }

    /// Returns whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }
}
