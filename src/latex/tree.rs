//! Arena-backed document tree.

use crate::extract::DocumentTree;

/// Handle to one node of a [`LatexDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    source: Option<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    title: Option<NodeId>,
    caption: Option<NodeId>,
    reference: Option<NodeId>,
}

/// A LaTeX document parsed into nested environments.
///
/// Nodes live in an arena and are never freed; removing a child only
/// unlinks it. Text runs are `#text` leaves whose source is the run itself.
#[derive(Debug, Clone)]
pub struct LatexDocument {
    nodes: Vec<NodeData>,
}

impl LatexDocument {
    /// Tag of the root node.
    pub const ROOT_TAG: &'static str = "#document";
    /// Tag of text leaves.
    pub const TEXT_TAG: &'static str = "#text";
    /// Tag of paragraph blocks inside container environments.
    pub const PARAGRAPH_TAG: &'static str = "par";
    /// Tag of title attribute nodes.
    pub const TITLE_TAG: &'static str = "title";
    /// Tag of counter reference attribute nodes.
    pub const REF_TAG: &'static str = "ref";

    /// Creates a document holding only the root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                tag: Self::ROOT_TAG.to_owned(),
                ..NodeData::default()
            }],
        }
    }

    /// Appends a new node tagged `tag` under `parent`.
    pub fn append(&mut self, parent: NodeId, tag: impl Into<String>, source: Option<String>) -> NodeId {
        let id = self.push(NodeData {
            tag: tag.into(),
            source,
            parent: Some(parent),
            ..NodeData::default()
        });
        if let Some(data) = self.nodes.get_mut(parent.0) {
            data.children.push(id);
        }
        id
    }

    /// Appends a `#text` leaf under `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append(parent, Self::TEXT_TAG, Some(text.into()))
    }

    /// Creates a node outside the tree, for use as an attribute.
    pub fn create_detached(&mut self, tag: impl Into<String>, source: impl Into<String>) -> NodeId {
        self.push(NodeData {
            tag: tag.into(),
            source: Some(source.into()),
            ..NodeData::default()
        })
    }

    /// Records the source text of `node`.
    pub fn set_source(&mut self, node: NodeId, source: impl Into<String>) {
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.source = Some(source.into());
        }
    }

    /// Attaches a title node to `node`.
    pub fn set_title(&mut self, node: NodeId, title: NodeId) {
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.title = Some(title);
        }
    }

    /// Attaches a caption node to `node`.
    pub fn set_caption(&mut self, node: NodeId, caption: NodeId) {
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.caption = Some(caption);
        }
    }

    /// Attaches a counter reference node to `node`.
    pub fn set_reference(&mut self, node: NodeId, reference: NodeId) {
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.reference = Some(reference);
        }
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        id
    }

    fn data(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0)
    }
}

impl Default for LatexDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree for LatexDocument {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn tag(&self, node: NodeId) -> &str {
        self.data(node).map_or("", |data| data.tag.as_str())
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.data(node).map_or(&[], |data| data.children.as_slice())
    }

    fn source(&self, node: NodeId) -> Option<&str> {
        self.data(node).and_then(|data| data.source.as_deref())
    }

    fn text_content(&self, node: NodeId) -> String {
        let Some(data) = self.data(node) else {
            return String::new();
        };
        if data.children.is_empty() {
            return data.source.clone().unwrap_or_default();
        }
        data.children
            .iter()
            .map(|child| self.text_content(*child))
            .collect()
    }

    fn title(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).and_then(|data| data.title)
    }

    fn caption(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).and_then(|data| data.caption)
    }

    fn counter_ref(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).and_then(|data| data.reference)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).and_then(|data| data.parent)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(node)?);
        let position = siblings.iter().position(|sibling| *sibling == node)?;
        siblings.get(position + 1).copied()
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(data) = self.nodes.get_mut(parent.0) else {
            return false;
        };
        let Some(position) = data.children.iter().position(|node| *node == child) else {
            return false;
        };
        data.children.remove(position);
        if let Some(detached) = self.nodes.get_mut(child.0) {
            detached.parent = None;
        }
        true
    }
}
