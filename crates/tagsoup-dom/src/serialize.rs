//! Serialization back to markup, and a debugging outline.
//!
//! The scanner keeps character references undecoded, so text and attribute
//! values are written back verbatim. Serializing a parsed document and
//! parsing the output again, with the same void elements, gives the same
//! tree.
//!
//! Both walks keep an explicit stack so nesting depth is bounded only by
//! memory.

use crate::{Document, NodeId, NodeType};
use std::fmt::Write;

enum Step<'a> {
    Open(NodeId),
    Close(&'a str),
}

/// Options for [`Document::to_html_with`].
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Emit `<!DOCTYPE name>` before the document's children.
    pub include_doctype: bool,
    /// Put each top-level node on its own line.
    pub newline_between_top_level: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            include_doctype: true,
            newline_between_top_level: true,
        }
    }
}

impl Document {
    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        self.to_html_with(&SerializeOptions::default())
    }

    pub fn to_html_with(&self, options: &SerializeOptions) -> String {
        let mut out = String::new();
        if options.include_doctype {
            match self.doctype() {
                Some("") => out.push_str("<!DOCTYPE>"),
                Some(name) => {
                    let _ = write!(out, "<!DOCTYPE {}>", name);
                }
                None => {}
            }
            if self.doctype().is_some() && options.newline_between_top_level {
                out.push('\n');
            }
        }
        for (i, &child) in self.children(self.root()).iter().enumerate() {
            if i > 0 && options.newline_between_top_level {
                out.push('\n');
            }
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialize one node and its descendants (its "outer HTML").
    pub fn node_to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialize the children of a node (its "inner HTML").
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let mut stack = vec![Step::Open(id)];
        while let Some(step) = stack.pop() {
            let id = match step {
                Step::Open(id) => id,
                Step::Close(tag_name) => {
                    let _ = write!(out, "</{}>", tag_name);
                    continue;
                }
            };
            let Some(node) = self.node(id) else {
                continue;
            };
            match &node.node_type {
                NodeType::Document => {}
                NodeType::Element(element) => {
                    out.push('<');
                    out.push_str(&element.tag_name);
                    for (name, value) in &element.attrs {
                        let quote = if value.contains('"') { '\'' } else { '"' };
                        let _ = write!(out, " {}={}{}{}", name, quote, value, quote);
                    }
                    out.push('>');
                    if node.children.is_empty() && self.is_void(&element.tag_name) {
                        continue;
                    }
                    stack.push(Step::Close(&element.tag_name));
                }
                NodeType::Text(text) => out.push_str(text),
                NodeType::Comment(text) => {
                    let _ = write!(out, "<!--{}-->", text);
                }
                NodeType::CData(text) => {
                    let _ = write!(out, "<![CDATA[{}]]>", text);
                }
            }
            stack.extend(node.children.iter().rev().map(|&child| Step::Open(child)));
        }
    }

    /// An indented outline of the tree, one node per line, for debugging and
    /// for the dump tool.
    ///
    /// ```text
    /// #document doctype="html"
    ///   <html>
    ///     <p id="a">
    ///       "text"
    /// ```
    pub fn to_outline(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root(), 0)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            let indent = "  ".repeat(depth);
            let _ = match &node.node_type {
                NodeType::Document => match self.doctype() {
                    Some(doctype) => writeln!(out, "{}#document doctype={:?}", indent, doctype),
                    None => writeln!(out, "{}#document", indent),
                },
                NodeType::Element(element) => {
                    let mut line = format!("{}<{}", indent, element.tag_name);
                    for (name, value) in &element.attrs {
                        let _ = write!(line, " {}={:?}", name, value);
                    }
                    writeln!(out, "{}>", line)
                }
                NodeType::Text(text) => writeln!(out, "{}{:?}", indent, text),
                NodeType::Comment(text) => writeln!(out, "{}<!--{:?}-->", indent, text),
                NodeType::CData(text) => writeln!(out, "{}<![CDATA[{:?}]]>", indent, text),
            };
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
        out
    }
}
