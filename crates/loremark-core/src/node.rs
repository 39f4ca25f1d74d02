use std::collections::BTreeMap;

use serde_json::Value;

use crate::lookup::Lookup;

/// Index of a node in its [`Tree`] arena.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub u32);

/// Closed set of node kinds, with a passthrough variant for nodes the
/// command table may introduce in the future.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    Document,
    Paragraph,
    Text,
    Strong,
    Em,
    Link,
    Image,
    Div,
    Span,
    Heading(u8),
    List,
    Item,
    Aside,
    /// Placeholder produced by the command table; its content is a `%`
    /// template expanded during evaluation.
    Command,
    Other(String),
}

impl NodeKind {
    /// The type tag used at the serialization boundary.
    pub fn tag(&self) -> &str {
        match self {
            NodeKind::Document => "div",
            NodeKind::Paragraph => "p",
            NodeKind::Text => "text",
            NodeKind::Strong => "strong",
            NodeKind::Em => "em",
            NodeKind::Link => "a",
            NodeKind::Image => "img",
            NodeKind::Div => "div",
            NodeKind::Span => "span",
            NodeKind::Heading(level) => heading_tag(*level),
            NodeKind::List => "ul",
            NodeKind::Item => "li",
            NodeKind::Aside => "aside",
            NodeKind::Command => "span",
            NodeKind::Other(tag) => tag,
        }
    }

    /// Attributes the kind is expected to carry, beyond `class`, `id`
    /// and `data-*` markers, which every kind accepts.
    pub fn standard_attrs(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Link => &["href", "target"],
            NodeKind::Image => &["src", "alt", "title", "height", "width"],
            NodeKind::Command => &["expand"],
            _ => &[],
        }
    }

    pub fn permits_attr(&self, key: &str) -> bool {
        key == "class"
            || key == "id"
            || key.starts_with("data-")
            || self.standard_attrs().contains(&key)
            || matches!(self, NodeKind::Other(_))
    }
}

fn heading_tag(level: u8) -> &'static str {
    match level {
        1 => "h1",
        2 => "h2",
        3 => "h3",
        4 => "h4",
        5 => "h5",
        _ => "h6",
    }
}

/// Attribute value. Before evaluation an attribute may be a deferred
/// descriptor; evaluation materializes everything to literals.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Literal(Value),
    Lookup(Lookup),
    GalleryUrl(Lookup),
}

impl AttrValue {
    pub fn str(value: impl Into<String>) -> Self {
        AttrValue::Literal(Value::String(value.into()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Literal(Value::String(text)) => Some(text),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub content: String,
    pub attrs: BTreeMap<String, AttrValue>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Original text this node was parsed from.
    pub source: String,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            content: String::new(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
            source: String::new(),
        }
    }
}

/// Arena-backed node tree. Children and the parent back-reference are
/// stored as indices, so upward navigation needs no shared ownership.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    /// Creates a detached node.
    pub fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind));
        id
    }

    /// Creates a node and appends it to `parent`'s children.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.push(kind);
        self.attach(parent, id);
        id
    }

    /// Appends an existing node to `parent`'s children.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.append(parent, NodeKind::Text);
        let node = self.node_mut(id);
        node.content = text.to_string();
        node.source = text.to_string();
        id
    }

    pub fn set_attr(&mut self, id: NodeId, key: &str, value: AttrValue) {
        debug_assert!(
            self.node(id).kind.permits_attr(key),
            "attribute {key} not permitted on {:?}",
            self.node(id).kind
        );
        self.node_mut(id).attrs.insert(key.to_string(), value);
    }

    /// A node's flattened text: its own content followed by the
    /// concatenation of its children's flattened text, in order.
    pub fn flatten_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.flatten_into(id, &mut out);
        out
    }

    fn flatten_into(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        out.push_str(&node.content);
        for &child in &node.children {
            self.flatten_into(child, out);
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
