use std::fmt::Display;

use crate::mutation::{MutationKind, MutationRecord};

use super::TreeError;

// -----------------------------------------------------------------------------
// NodeId
// -----------------------------------------------------------------------------
/// Index of a node inside a [`Document`] arena.
///
/// Ids are never reused; nodes are not removed from the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl Display for NodeId {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// -----------------------------------------------------------------------------
// ElementData
// NodeKind
// Node
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
        }
    }

    /// Value of the attribute `name`, if set.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

// -----------------------------------------------------------------------------
// Document
// -----------------------------------------------------------------------------
/// An arena-backed content tree with a mutation journal.
///
/// # Overview
/// The document holds element and text nodes addressed by [`NodeId`]. While
/// the journal is connected, structural insertions and text replacements are
/// recorded in arrival order and can be drained in batches, mirroring how a
/// subtree observer delivers its records. Disconnecting the journal lets a
/// caller insert nodes without observing its own insertions.
///
/// ```
/// use pxdom::tree::Document;
///
/// let mut doc = Document::new();
/// let div = doc.create_element("div");
/// let text = doc.create_text("R$ 12,34");
/// doc.append_child(doc.root(), div).unwrap();
/// doc.append_child(div, text).unwrap();
/// assert_eq!(doc.text_content(doc.root()), "R$ 12,34");
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    journal: Vec<MutationRecord>,
    connected: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

//
// ctors
//
impl Document {
    /// Create an empty document holding only the root element.
    ///
    /// The journal starts disconnected; call [`Document::connect`] before
    /// mutations should be recorded.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            journal: Vec::new(),
            connected: false,
        };
        doc.push(NodeKind::Element(ElementData::new("#document")));
        doc
    }
}

//
// accessors
//
impl Document {
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Element data of `id`, or [None] for a text node.
    #[inline]
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id).kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    /// Content of the text node `id`, or [None] for an element.
    #[inline]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element(_) => None,
            NodeKind::Text(content) => Some(content),
        }
    }

    /// Mutable element data of `id`, or [None] for a text node.
    ///
    /// Attribute and class edits are not journaled; only structural inserts
    /// and text replacements are observable.
    #[inline]
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    /// First element whose id attribute equals `id`, in creation order.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.nodes.iter().enumerate().find_map(|(idx, node)| {
            matches!(&node.kind, NodeKind::Element(data) if data.id.as_deref() == Some(id))
                .then_some(NodeId(idx))
        })
    }

    /// Concatenated text of every text node under `id`, in document order.
    ///
    /// Unlike the matching walker this includes script/style subtrees, the
    /// way a full text-content read does.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text(content) => out.push_str(content),
            NodeKind::Element(_) => {
                for &child in &self.node(id).children {
                    self.collect_text(child, out);
                }
            }
        }
    }
}

//
// construction of nodes
//
impl Document {
    /// Create a detached element node.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(NodeKind::Element(ElementData::new(tag)))
    }

    /// Create a detached element node carrying an id attribute.
    pub fn create_element_with_id(
        &mut self,
        tag: impl Into<String>,
        id: impl Into<String>,
    ) -> NodeId {
        let mut data = ElementData::new(tag);
        data.id = Some(id.into());
        self.push(NodeKind::Element(data))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(content.into()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }
}

//
// mutation of the tree
//
impl Document {
    /// Append `child` as the last child of `parent`.
    ///
    /// Records a child-list mutation on `parent` while connected.
    ///
    /// # Errors
    /// - [`TreeError::NotAnElement`]: `parent` is a text node.
    /// - [`TreeError::AlreadyAttached`]: `child` already has a parent.
    /// - [`TreeError::SelfInsertion`]: `parent` and `child` are the same node.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.attach(parent, child, None)
    }

    /// Insert `child` as the first child of `parent`.
    ///
    /// Same recording and error behavior as [`Document::append_child`].
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.attach(parent, child, Some(0))
    }

    fn attach(
        &mut self,
        parent: NodeId,
        child: NodeId,
        position: Option<usize>,
    ) -> Result<(), TreeError> {
        if parent == child {
            return Err(TreeError::SelfInsertion { node: child });
        }
        if self.element(parent).is_none() {
            return Err(TreeError::NotAnElement { node: parent });
        }
        if self.node(child).parent.is_some() {
            return Err(TreeError::AlreadyAttached { node: child });
        }
        match position {
            Some(pos) => self.nodes[parent.0].children.insert(pos, child),
            None => self.nodes[parent.0].children.push(child),
        }
        self.nodes[child.0].parent = Some(parent);
        self.record(MutationKind::ChildList, parent);
        Ok(())
    }

    /// Replace the content of the text node `id`.
    ///
    /// Records a character-data mutation on `id` while connected.
    ///
    /// # Errors
    /// - [`TreeError::NotAText`]: `id` is an element.
    pub fn set_text(&mut self, id: NodeId, content: impl Into<String>) -> Result<(), TreeError> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(_) => Err(TreeError::NotAText { node: id }),
            NodeKind::Text(current) => {
                *current = content.into();
                self.record(MutationKind::CharacterData, id);
                Ok(())
            }
        }
    }
}

//
// text-node walking
//
impl Document {
    /// Text nodes under `root` whose content satisfies `pred`.
    ///
    /// Text nodes whose parent element is a `script` or `style` element are
    /// skipped; the walk itself still descends through every element so the
    /// skip applies to the immediate parent only, like a walker that rejects
    /// single nodes rather than whole branches.
    pub fn matching_text_nodes<F>(&self, root: NodeId, pred: F) -> Vec<NodeId>
    where
        F: Fn(&str) -> bool,
    {
        let mut found = Vec::new();
        self.walk_text(root, &pred, &mut found);
        found
    }

    fn walk_text<F>(&self, id: NodeId, pred: &F, found: &mut Vec<NodeId>)
    where
        F: Fn(&str) -> bool,
    {
        match &self.node(id).kind {
            NodeKind::Text(content) => {
                let skipped = self
                    .node(id)
                    .parent
                    .and_then(|p| self.element(p))
                    .is_some_and(|el| el.tag.eq_ignore_ascii_case("script")
                        || el.tag.eq_ignore_ascii_case("style"));
                if !skipped && pred(content) {
                    found.push(id);
                }
            }
            NodeKind::Element(_) => {
                for &child in &self.node(id).children {
                    self.walk_text(child, pred, found);
                }
            }
        }
    }
}

//
// mutation journal
//
impl Document {
    /// Start recording mutations.
    #[inline]
    pub fn connect(&mut self) {
        self.connected = true;
    }

    /// Stop recording mutations. Already queued records are kept.
    #[inline]
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Drain all queued mutation records in arrival order.
    #[inline]
    pub fn take_batch(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.journal)
    }

    /// Run `f` with the journal disconnected, restoring the previous state
    /// afterwards. Insertions made inside `f` are not observed.
    pub fn with_journal_paused<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let was_connected = self.connected;
        self.connected = false;
        let out = f(self);
        self.connected = was_connected;
        out
    }

    fn record(&mut self, kind: MutationKind, target: NodeId) {
        if self.connected {
            self.journal.push(MutationRecord { kind, target });
        }
    }
}
