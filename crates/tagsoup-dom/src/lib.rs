//! # Tagsoup DOM
//!
//! The document tree produced by the tagsoup scanner.
//!
//! ## Design
//!
//! Nodes live in a single arena owned by the [`Document`] and refer to each
//! other by [`NodeId`]. The scanner's open-element stack holds the same
//! indices, so there are no reference cycles and no shared mutable borrows.
//! The document implements [`TreeSink`] directly.

pub mod serialize;

use std::collections::HashSet;
use std::path::Path;
use tagsoup_common::html;
use tagsoup_html::{
    CharsetCallback, NoCharsetCallback, ParseError, ScannerConfig, TreeSink,
};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur in DOM operations.
#[derive(Error, Debug)]
pub enum DomError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for DOM operations.
pub type DomResult<T> = Result<T, DomError>;

/// Index of a node in its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The document node itself is always at index 0.
    pub const ROOT: NodeId = NodeId(0);

    /// Get the raw arena index.
    pub fn raw(&self) -> usize {
        self.0
    }
}

/// Element name and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Tag name as first written in the source.
    pub tag_name: String,
    /// Attributes in the order they were first set.
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    /// Look up an attribute, ignoring ASCII case in the name.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is(&self, tag_name: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag_name)
    }
}

/// Type of DOM node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
    CData(String),
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub node_type: NodeType,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Get the tag name for element nodes.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.node_type {
            NodeType::Element(data) => Some(&data.tag_name),
            _ => None,
        }
    }

    pub fn element(&self) -> Option<&ElementData> {
        match &self.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Text, comment or CDATA content.
    pub fn data(&self) -> Option<&str> {
        match &self.node_type {
            NodeType::Text(s) | NodeType::Comment(s) | NodeType::CData(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.node_type, NodeType::Element(_))
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.node_type, NodeType::Comment(_))
    }

    pub fn is_cdata(&self) -> bool {
        matches!(self.node_type, NodeType::CData(_))
    }

    /// True for text nodes made up only of HTML whitespace.
    pub fn is_whitespace_text(&self) -> bool {
        matches!(&self.node_type, NodeType::Text(t) if html::is_all_whitespace(t))
    }
}

/// A complete document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    doctype: Option<String>,
    /// Void elements of the configuration the document was parsed with,
    /// when it differs from the default table.
    void_elements: Option<HashSet<String>>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeType::Document)],
            doctype: None,
            void_elements: None,
        }
    }

    /// Parse HTML and create a document.
    pub fn parse_html(html: &str) -> DomResult<Self> {
        Self::parse_html_with(html, ScannerConfig::default(), NoCharsetCallback)
    }

    /// Parse HTML, reporting `<meta>` charset hints to `charset_callback`.
    pub fn parse_html_with_charset<C: CharsetCallback>(
        html: &str,
        charset_callback: C,
    ) -> DomResult<Self> {
        Self::parse_html_with(html, ScannerConfig::default(), charset_callback)
    }

    pub fn parse_html_with<C: CharsetCallback>(
        html: &str,
        config: ScannerConfig,
        charset_callback: C,
    ) -> DomResult<Self> {
        let is_default_void_set = config.void_elements.len() == html::VOID_ELEMENTS.len()
            && html::VOID_ELEMENTS
                .iter()
                .all(|name| config.void_elements.contains(*name));
        let mut doc = Document::new();
        if !is_default_void_set {
            doc.void_elements = Some(config.void_elements.clone());
        }

        let doc = tagsoup_html::parse_with_config(html, doc, config, charset_callback)?;
        debug!(node_count = doc.node_count(), "HTML parsed");
        Ok(doc)
    }

    /// Read a UTF-8 file and parse it.
    pub fn parse_file(path: impl AsRef<Path>) -> DomResult<Self> {
        let html = std::fs::read_to_string(path)?;
        Self::parse_html(&html)
    }

    /// Number of nodes in the arena, the document node and detached nodes
    /// included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True when the document node has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes[NodeId::ROOT.0].children.is_empty()
    }

    /// Whether `tag_name` is a void element under the configuration this
    /// document was parsed with. Matched ignoring ASCII case.
    pub fn is_void(&self, tag_name: &str) -> bool {
        match &self.void_elements {
            Some(custom) => custom.contains(&tag_name.to_ascii_lowercase()),
            None => html::is_void_element(tag_name),
        }
    }

    /// Get the document node.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// The DOCTYPE name, if the document had one.
    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Like [`node`](Self::node) but reporting a missing node as an error.
    pub fn try_node(&self, id: NodeId) -> DomResult<&Node> {
        self.node(id).ok_or(DomError::NodeNotFound(id))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Element children only, in document order.
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.nodes[c.0].is_element())
            .collect()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.node(id)?.tag_name()
    }

    /// Get an attribute value; the name is matched ignoring ASCII case.
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)?.element()?.get_attribute(name)
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.node(id)
            .and_then(Node::element)
            .map(|e| e.attrs.as_slice())
            .unwrap_or(&[])
    }

    /// Concatenated text and CDATA content of a node and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, &mut result);
        result
    }

    fn collect_text(&self, id: NodeId, result: &mut String) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            match &node.node_type {
                NodeType::Text(text) | NodeType::CData(text) => result.push_str(text),
                NodeType::Comment(_) => {}
                _ => stack.extend(node.children.iter().rev().copied()),
            }
        }
    }

    /// The first element at the top level of the document.
    pub fn document_element(&self) -> Option<NodeId> {
        self.child_elements(NodeId::ROOT).first().copied()
    }

    /// Get the <head> element.
    pub fn head(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.find_child_element(html, "head")
    }

    /// Get the <body> element.
    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.find_child_element(html, "body")
    }

    /// Get the title of the document.
    pub fn title(&self) -> Option<String> {
        let title = self.find_element_by_tag_name(self.head()?, "title")?;
        Some(html::trim(&self.text_content(title)).to_string())
    }

    fn find_child_element(&self, parent: NodeId, tag_name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].element().is_some_and(|e| e.is(tag_name)))
    }

    /// First descendant of `scope` (not `scope` itself) with the given tag
    /// name, in document order. The name is matched ignoring ASCII case.
    pub fn find_element_by_tag_name(&self, scope: NodeId, tag_name: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.element().is_some_and(|e| e.is(tag_name)) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Get elements by tag name, in document order.
    pub fn get_elements_by_tag_name(&self, tag_name: &str) -> Vec<NodeId> {
        self.collect_elements(|e| e.is(tag_name))
    }

    /// Get element by ID.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.collect_elements(|e| e.get_attribute("id") == Some(id))
            .first()
            .copied()
    }

    /// Get elements by class name.
    pub fn get_elements_by_class_name(&self, class_name: &str) -> Vec<NodeId> {
        self.collect_elements(|e| {
            e.get_attribute("class")
                .is_some_and(|c| c.split_whitespace().any(|cls| cls == class_name))
        })
    }

    fn collect_elements<F>(&self, mut predicate: F) -> Vec<NodeId>
    where
        F: FnMut(&ElementData) -> bool,
    {
        let mut found = Vec::new();
        self.traverse(|id, node| {
            if node.element().is_some_and(&mut predicate) {
                found.push(id);
            }
        });
        found
    }

    /// Traverse all nodes depth-first, in document order.
    ///
    /// The walk keeps its own stack, so arbitrarily deep trees are fine.
    pub fn traverse<F>(&self, mut callback: F)
    where
        F: FnMut(NodeId, &Node),
    {
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            callback(id, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    fn push(&mut self, node_type: NodeType) -> NodeId {
        self.nodes.push(Node::new(node_type));
        NodeId(self.nodes.len() - 1)
    }

    /// Append a detached node to `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.try_node(child)?;
        if self.try_node(parent)?.data().is_some() {
            return Err(DomError::InvalidOperation(format!(
                "{:?} cannot have children",
                parent
            )));
        }
        if child == NodeId::ROOT || self.nodes[child.0].parent.is_some() {
            return Err(DomError::InvalidOperation(format!(
                "{:?} is already in the tree",
                child
            )));
        }
        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == child {
                return Err(DomError::InvalidOperation(format!(
                    "{:?} cannot be appended to its own descendant {:?}",
                    child, parent
                )));
            }
            ancestor = self.nodes[id.0].parent;
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeSink for Document {
    type Handle = NodeId;

    fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeType::Element(ElementData {
            tag_name: name.to_string(),
            attrs: Vec::new(),
        }))
    }

    fn create_text(&mut self, content: &str) -> NodeId {
        self.push(NodeType::Text(content.to_string()))
    }

    fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(NodeType::Comment(content.to_string()))
    }

    fn create_cdata(&mut self, content: &str) -> NodeId {
        self.push(NodeType::CData(content.to_string()))
    }

    fn append_child(&mut self, parent: Option<&NodeId>, child: NodeId) {
        let parent = parent.copied().unwrap_or(NodeId::ROOT);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn set_attribute(&mut self, element: &NodeId, name: &str, value: &str) {
        if let NodeType::Element(data) = &mut self.nodes[element.0].node_type {
            match data.attrs.iter_mut().find(|(k, _)| k == name) {
                Some(existing) => existing.1 = value.to_string(),
                None => data.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn tag_name(&self, element: &NodeId) -> Option<&str> {
        self.nodes.get(element.0)?.tag_name()
    }

    fn set_doctype(&mut self, name: &str) {
        self.doctype = Some(name.to_string());
    }
}

/// Query selector support (basic).
pub struct QuerySelector;

impl QuerySelector {
    /// Select elements matching a simple selector.
    /// Supports: tag, #id, .class
    pub fn select(doc: &Document, selector: &str) -> Vec<NodeId> {
        let selector = selector.trim();

        if let Some(id) = selector.strip_prefix('#') {
            doc.get_element_by_id(id).into_iter().collect()
        } else if let Some(class) = selector.strip_prefix('.') {
            doc.get_elements_by_class_name(class)
        } else {
            doc.get_elements_by_tag_name(selector)
        }
    }
}
