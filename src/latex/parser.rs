//! Structural LaTeX parser.
//!
//! The parser does not typeset anything. It splices inclusions, learns the
//! theorem declarations, and nests `\begin`/`\end` pairs into a
//! [`LatexDocument`] whose node sources are exact slices of the expanded
//! text. Sectional commands only advance counters.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Instant;

use regex::Regex;
use tracing::debug;

use super::error::LatexError;
use super::includes::{IncludeResolver, expand_includes, local_packages, read_source};
use super::numbering::Numbering;
use super::tree::{LatexDocument, NodeId};
use crate::extract::{DocumentTree, TreeParser, scan_declarations, strip_comments};
use crate::patterns::literal_regex;

/// Default limit on nested `\input`-like commands.
pub const DEFAULT_INCLUDE_DEPTH: usize = 16;

const PROOF_ENVIRONMENT: &str = "proof";

/// Environments whose content is never parsed.
const VERBATIM_ENVIRONMENTS: &[&str] = &[
    "verbatim",
    "verbatim*",
    "Verbatim",
    "lstlisting",
    "minted",
    "comment",
];

static EVENT: LazyLock<Regex> = LazyLock::new(|| {
    literal_regex(
        r"\\(?:(?P<marker>begin|end)\s*\{(?P<name>[^}]*)\}|(?P<sectional>chapter|section|subsection|subsubsection)\b(?P<star>\*?)|(?P<appendix>appendix)\b)",
    )
});

static NUMBER_WITHIN: LazyLock<Regex> = LazyLock::new(|| {
    literal_regex(r"\\numberwithin\s*\{\s*([^}]+?)\s*\}\s*\{\s*([^}]+?)\s*\}")
});

static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| literal_regex(r"\n[ \t]*\n\s*"));

/// Parser producing [`LatexDocument`] trees from LaTeX sources.
#[derive(Debug, Clone, Copy)]
pub struct StructuralParser {
    include_depth: usize,
}

impl StructuralParser {
    /// Creates a parser with [`DEFAULT_INCLUDE_DEPTH`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            include_depth: DEFAULT_INCLUDE_DEPTH,
        }
    }

    /// Sets the limit on nested inclusions.
    #[must_use]
    pub const fn with_include_depth(mut self, depth: usize) -> Self {
        self.include_depth = depth;
        self
    }

    /// Parses LaTeX `text` as if it were a main file in `main_dir`.
    ///
    /// Comments are stripped before anything else.
    ///
    /// # Errors
    ///
    /// Returns [`LatexError`] when an included file cannot be read or
    /// inclusions nest too deeply.
    pub fn parse_source(
        &self,
        text: &str,
        main_dir: &Path,
        include_dirs: &[PathBuf],
    ) -> Result<LatexDocument, LatexError> {
        let started = Instant::now();
        let resolver = IncludeResolver::new(main_dir, include_dirs);
        let expanded = expand_includes(&resolver, &strip_comments(text), 0, self.include_depth)?;

        let mut numbering = Numbering::new();
        for package in local_packages(&resolver, &expanded)? {
            for declaration in scan_declarations(&package) {
                numbering.declare(&declaration);
            }
        }
        for declaration in scan_declarations(&expanded) {
            numbering.declare(&declaration);
        }
        for captures in NUMBER_WITHIN.captures_iter(&expanded) {
            if let (Some(counter), Some(parent)) = (captures.get(1), captures.get(2)) {
                numbering.number_within(counter.as_str(), parent.as_str());
            }
        }

        let document = Builder::new(&expanded, numbering).build();
        debug!(elapsed = ?started.elapsed(), "parsed LaTeX document");
        Ok(document)
    }
}

impl Default for StructuralParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeParser for StructuralParser {
    type Tree = LatexDocument;
    type Error = LatexError;

    fn parse(&self, main_file: &Path, include_dirs: &[PathBuf]) -> Result<LatexDocument, LatexError> {
        let text = read_source(main_file)?;
        let main_dir = main_file.parent().unwrap_or_else(|| Path::new("."));
        self.parse_source(&text, main_dir, include_dirs)
    }
}

// ── Events ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum EventKind {
    Begin(String),
    End(String),
    Sectional { level: String, numbered: bool },
    Appendix,
}

#[derive(Debug, Clone)]
struct Event {
    kind: EventKind,
    start: usize,
    end: usize,
}

fn scan_events(text: &str) -> Vec<Event> {
    EVENT
        .captures_iter(text)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let kind = if let Some(marker) = captures.name("marker") {
                let name = captures.name("name")?.as_str().trim().to_owned();
                if marker.as_str() == "begin" {
                    EventKind::Begin(name)
                } else {
                    EventKind::End(name)
                }
            } else if let Some(level) = captures.name("sectional") {
                EventKind::Sectional {
                    level: level.as_str().to_owned(),
                    numbered: captures.name("star").is_none_or(|star| star.as_str().is_empty()),
                }
            } else {
                EventKind::Appendix
            };
            Some(Event {
                kind,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

// ── Tree building ───────────────────────────────────────────────────

/// How text runs are laid out under a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// Blank-line separated `par` blocks; each environment in its own `par`.
    Blocks,
    /// Raw `#text` leaves and environments side by side.
    Inline,
}

struct Builder<'t> {
    text: &'t str,
    events: Vec<Event>,
    next: usize,
    open: Vec<String>,
    numbering: Numbering,
    document: LatexDocument,
}

impl<'t> Builder<'t> {
    fn new(text: &'t str, numbering: Numbering) -> Self {
        Self {
            text,
            events: scan_events(text),
            next: 0,
            open: Vec::new(),
            numbering,
            document: LatexDocument::new(),
        }
    }

    fn build(mut self) -> LatexDocument {
        let root = self.document.root();
        self.fill(root, 0, Layout::Blocks);
        self.document
    }

    /// Adds children to `parent` from `from` until the innermost open
    /// environment ends, or until the text ends.
    ///
    /// Returns the offset just past the consumed `\end`, or where an
    /// implicitly closed environment stops.
    fn fill(&mut self, parent: NodeId, from: usize, layout: Layout) -> usize {
        let mut cursor = from;
        while let Some(event) = self.events.get(self.next).cloned() {
            match event.kind {
                EventKind::Begin(name) => {
                    self.next += 1;
                    self.push_text(parent, cursor, event.start, layout);
                    cursor = self.environment(parent, &name, event.start, event.end, layout);
                }
                EventKind::End(name) => {
                    if self.open.last() == Some(&name) {
                        self.next += 1;
                        self.push_text(parent, cursor, event.start, layout);
                        return event.end;
                    }
                    if self.open.contains(&name) {
                        // An enclosing environment ends here; this one closes
                        // implicitly and leaves the event to its owner.
                        self.push_text(parent, cursor, event.start, layout);
                        return event.start;
                    }
                    self.next += 1;
                }
                EventKind::Sectional { level, numbered } => {
                    self.next += 1;
                    if numbered {
                        self.numbering.step_sectional(&level);
                    }
                }
                EventKind::Appendix => {
                    self.next += 1;
                    self.numbering.start_appendix();
                }
            }
        }
        let end = self.text.len();
        self.push_text(parent, cursor, end, layout);
        end
    }

    /// Builds one environment opened at `begin_start..begin_end` and returns
    /// the offset just past it.
    fn environment(
        &mut self,
        parent: NodeId,
        name: &str,
        begin_start: usize,
        begin_end: usize,
        layout: Layout,
    ) -> usize {
        let container = match layout {
            Layout::Blocks => self
                .document
                .append(parent, LatexDocument::PARAGRAPH_TAG, None),
            Layout::Inline => parent,
        };
        let node = self.document.append(container, name, None);

        let outer_end = if VERBATIM_ENVIRONMENTS.contains(&name) {
            self.verbatim(node, name, begin_end)
        } else {
            self.structured(node, name, begin_end)
        };

        let source = self.slice(begin_start, outer_end).to_owned();
        if layout == Layout::Blocks {
            self.document.set_source(container, source.clone());
        }
        self.document.set_source(node, source);
        outer_end
    }

    fn structured(&mut self, node: NodeId, name: &str, begin_end: usize) -> usize {
        let titled = name == PROOF_ENVIRONMENT || self.numbering.is_declared(name);
        let mut inner_start = begin_end;
        if titled {
            if let Some((title, after)) = optional_argument(self.text, begin_end) {
                let title_node = self
                    .document
                    .create_detached(LatexDocument::TITLE_TAG, title);
                self.document.set_title(node, title_node);
                inner_start = after;
                self.skip_events_before(after);
            }
        }
        if let Some(reference) = self.numbering.step_environment(name) {
            let reference_node = self
                .document
                .create_detached(LatexDocument::REF_TAG, reference);
            self.document.set_reference(node, reference_node);
        }

        let layout = if titled { Layout::Inline } else { Layout::Blocks };
        self.open.push(name.to_owned());
        let outer_end = self.fill(node, inner_start, layout);
        self.open.pop();
        outer_end
    }

    fn verbatim(&mut self, node: NodeId, name: &str, begin_end: usize) -> usize {
        let closing = self
            .events
            .iter()
            .enumerate()
            .skip(self.next)
            .find(|(_, event)| matches!(&event.kind, EventKind::End(end) if end == name))
            .map(|(index, event)| (index, event.start, event.end));
        let (inner_end, outer_end) = match closing {
            Some((index, start, end)) => {
                self.next = index + 1;
                (start, end)
            }
            None => {
                self.next = self.events.len();
                (self.text.len(), self.text.len())
            }
        };
        let body = self.slice(begin_end, inner_end).to_owned();
        if !body.is_empty() {
            self.document.append_text(node, body);
        }
        outer_end
    }

    fn skip_events_before(&mut self, offset: usize) {
        while self
            .events
            .get(self.next)
            .is_some_and(|event| event.start < offset)
        {
            self.next += 1;
        }
    }

    fn push_text(&mut self, parent: NodeId, from: usize, to: usize, layout: Layout) {
        if from >= to {
            return;
        }
        let run = self.slice(from, to);
        match layout {
            Layout::Inline => {
                self.document.append_text(parent, run);
            }
            Layout::Blocks => {
                for chunk in paragraphs(run) {
                    let par = self.document.append(
                        parent,
                        LatexDocument::PARAGRAPH_TAG,
                        Some(chunk.to_owned()),
                    );
                    self.document.append_text(par, chunk);
                }
            }
        }
    }

    fn slice(&self, from: usize, to: usize) -> &'t str {
        self.text.get(from..to).unwrap_or_default()
    }
}

/// Splits a text run after each blank-line separator, dropping chunks that
/// hold only whitespace.
fn paragraphs(run: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for separator in BLANK_LINE.find_iter(run) {
        chunks.push(run.get(start..separator.end()).unwrap_or_default());
        start = separator.end();
    }
    chunks.push(run.get(start..).unwrap_or_default());
    chunks.retain(|chunk| !chunk.trim().is_empty());
    chunks
}

/// Reads a balanced `[...]` argument starting at `from`, allowing leading
/// whitespace with at most one line break.
///
/// Returns the trimmed argument and the offset just past `]`.
fn optional_argument(text: &str, from: usize) -> Option<(&str, usize)> {
    let rest = text.get(from..)?;
    let argument = rest.trim_start();
    let skipped = rest.len() - argument.len();
    if rest.get(..skipped)?.matches('\n').count() > 1 || !argument.starts_with('[') {
        return None;
    }
    let mut brackets = 0usize;
    let mut braces = 0usize;
    for (index, ch) in argument.char_indices() {
        match ch {
            '{' => braces += 1,
            '}' => braces = braces.saturating_sub(1),
            '[' if braces == 0 => brackets += 1,
            ']' if braces == 0 => {
                brackets = brackets.saturating_sub(1);
                if brackets == 0 {
                    let title = argument.get(1..index)?.trim();
                    return Some((title, from + skipped + index + 1));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
