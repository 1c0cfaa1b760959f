//! Capability surface the extractor needs from a parsed document.

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

/// A parsed document tree addressed by copyable node handles.
///
/// Environment nodes are tagged with their environment name, so a
/// `\begin{lem}` block has tag `lem`. Attribute nodes (titles, captions and
/// counter references) hang off their owner rather than its children.
pub trait DocumentTree {
    /// Handle identifying one node of this tree.
    type Node: Copy + Eq + fmt::Debug;

    /// Returns the root node.
    fn root(&self) -> Self::Node;

    /// Returns the node's tag.
    fn tag(&self, node: Self::Node) -> &str;

    /// Returns the node's children in document order.
    fn children(&self, node: Self::Node) -> &[Self::Node];

    /// Returns the source text the node was parsed from, if recorded.
    fn source(&self, node: Self::Node) -> Option<&str>;

    /// Returns the node's text content.
    fn text_content(&self, node: Self::Node) -> String;

    /// Returns the node holding the bracketed title, if any.
    fn title(&self, node: Self::Node) -> Option<Self::Node>;

    /// Returns the node holding the caption, if any.
    fn caption(&self, node: Self::Node) -> Option<Self::Node>;

    /// Returns the node holding the displayed counter value, if any.
    fn counter_ref(&self, node: Self::Node) -> Option<Self::Node>;

    /// Returns the node's parent; the root and detached nodes have none.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Returns the sibling after this node, if any.
    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Removes `child` from `parent`, returning whether it was attached there.
    fn remove_child(&mut self, parent: Self::Node, child: Self::Node) -> bool;

    /// Returns every descendant of `scope` tagged `tag`, in document order.
    ///
    /// `scope` itself is not included.
    fn elements_by_tag(&self, scope: Self::Node, tag: &str) -> Vec<Self::Node> {
        let mut found = Vec::new();
        let mut pending: Vec<Self::Node> = self.children(scope).iter().rev().copied().collect();
        while let Some(node) = pending.pop() {
            if self.tag(node) == tag {
                found.push(node);
            }
            pending.extend(self.children(node).iter().rev().copied());
        }
        found
    }

    /// Returns the node's source, falling back to its text content.
    fn serialized(&self, node: Self::Node) -> String {
        self.source(node)
            .map_or_else(|| self.text_content(node), ToOwned::to_owned)
    }

    /// Detaches `node` from its parent, returning whether it was attached.
    fn detach(&mut self, node: Self::Node) -> bool {
        self.parent(node)
            .is_some_and(|parent| self.remove_child(parent, node))
    }
}

/// Parses a main file into a [`DocumentTree`].
pub trait TreeParser {
    /// Tree type produced by this parser.
    type Tree: DocumentTree;
    /// Failure type reported by this parser.
    type Error: Error;

    /// Parses `main_file`, resolving inclusions against `include_dirs`.
    ///
    /// # Errors
    ///
    /// Returns the parser's error when the document cannot be read or
    /// understood.
    fn parse(&self, main_file: &Path, include_dirs: &[PathBuf]) -> Result<Self::Tree, Self::Error>;
}
