//! Reading input and rendering a parsed document in the requested format.

use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tagsoup_dom::{Document, DomError, Node, NodeId, NodeType};
use tagsoup_html::ScannerConfig;
use tracing::info;

/// How to print the parsed document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Serialized HTML with every implied end tag written out.
    #[default]
    Html,
    /// Indented outline, one node per line.
    Tree,
    /// The node arena as JSON, one entry per node in document order.
    Json,
}

/// Error type for dump operations.
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("{0}")]
    Parse(#[from] tagsoup_html::ParseError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Dom(DomError),
}

impl From<DomError> for DumpError {
    fn from(err: DomError) -> Self {
        match err {
            DomError::Parse(err) => DumpError::Parse(err),
            other => DumpError::Dom(other),
        }
    }
}

/// Read a file, or stdin when `path` is `None`, decoding UTF-8 lossily.
pub fn read_input(path: Option<&Path>) -> Result<String, DumpError> {
    let mut bytes = Vec::new();
    let result = match path {
        Some(path) => std::fs::File::open(path).and_then(|mut f| f.read_to_end(&mut bytes)),
        None => std::io::stdin().lock().read_to_end(&mut bytes),
    };
    result.map_err(|source| DumpError::Read {
        path: path.map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string()),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Result of parsing one input.
#[derive(Debug)]
pub struct Dump {
    pub document: Document,
    /// The last charset named by a `<meta>` tag, if any.
    pub charset: Option<String>,
}

/// Parse `source`, recording any charset hint.
pub fn parse(source: &str, keep_whitespace: bool) -> Result<Dump, DumpError> {
    let config = ScannerConfig::default().keep_top_level_whitespace(keep_whitespace);
    let mut charset = None;
    let document = Document::parse_html_with(source, config, |name: &str| {
        info!(charset = %name, "charset hint");
        charset = Some(name.to_string());
    })?;
    Ok(Dump { document, charset })
}

/// Render a document in the given format.
pub fn render(document: &Document, format: OutputFormat) -> Result<String, DumpError> {
    let output = match format {
        OutputFormat::Html => {
            let mut html = document.to_html();
            html.push('\n');
            html
        }
        OutputFormat::Tree => document.to_outline(),
        OutputFormat::Json => {
            document.try_node(document.root())?;
            let mut json = serde_json::to_string_pretty(&JsonDocument::build(document))?;
            json.push('\n');
            json
        }
    };
    Ok(output)
}

#[derive(Debug, Serialize)]
struct JsonAttribute<'a> {
    name: &'a str,
    value: &'a str,
}

/// Flat form of the tree: nodes refer to each other by arena index, so
/// encoding does not recurse however deep the document is.
#[derive(Debug, Serialize)]
struct JsonDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    doctype: Option<&'a str>,
    nodes: Vec<JsonNode<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonNode<'a> {
    id: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<usize>,
    #[serde(flatten)]
    kind: JsonKind<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<usize>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum JsonKind<'a> {
    Document,
    Element {
        name: &'a str,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: Vec<JsonAttribute<'a>>,
    },
    Text {
        data: &'a str,
    },
    Comment {
        data: &'a str,
    },
    Cdata {
        data: &'a str,
    },
}

impl<'a> JsonDocument<'a> {
    fn build(document: &'a Document) -> Self {
        let mut ids = Vec::new();
        document.traverse(|id, _| ids.push(id));
        let nodes = ids
            .into_iter()
            .filter_map(|id| document.node(id).map(|node| JsonNode::build(id, node)))
            .collect();
        JsonDocument {
            doctype: document.doctype(),
            nodes,
        }
    }
}

impl<'a> JsonNode<'a> {
    fn build(id: NodeId, node: &'a Node) -> Self {
        let kind = match &node.node_type {
            NodeType::Document => JsonKind::Document,
            NodeType::Element(element) => JsonKind::Element {
                name: &element.tag_name,
                attributes: element
                    .attrs
                    .iter()
                    .map(|(name, value)| JsonAttribute { name, value })
                    .collect(),
            },
            NodeType::Text(data) => JsonKind::Text { data },
            NodeType::Comment(data) => JsonKind::Comment { data },
            NodeType::CData(data) => JsonKind::Cdata { data },
        };
        JsonNode {
            id: id.raw(),
            parent: node.parent.map(|parent| parent.raw()),
            kind,
            children: node.children.iter().map(NodeId::raw).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tagsoup_dom::NodeId;
    use tempfile::NamedTempFile;

    const PAGE: &str = "<!DOCTYPE html>\n<html><head>\
                        <meta http-equiv=\"Content-Type\" content=\"text/html; charset=ISO-8859-1\">\
                        </head><body><ul><li>a<li>b</ul><!--c--></body></html>\n";

    #[test]
    fn test_read_input_decodes_lossily() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"<p>caf\xe9</p>").unwrap();
        let source = read_input(Some(file.path())).unwrap();
        assert_eq!(source, "<p>caf\u{FFFD}</p>");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.html");
        let err = read_input(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, DumpError::Read { .. }));
        assert!(err.to_string().starts_with("Failed to read "));
    }

    #[test]
    fn test_charset_hint_recorded() {
        let dump = parse(PAGE, false).unwrap();
        assert_eq!(dump.charset.as_deref(), Some("ISO-8859-1"));
        assert!(parse("<p>x</p>", false).unwrap().charset.is_none());
    }

    #[test]
    fn test_render_html() {
        let dump = parse(PAGE, false).unwrap();
        let html = render(&dump.document, OutputFormat::Html).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>\n<html>"));
        assert!(html.contains("<ul><li>a</li><li>b</li></ul><!--c-->"));
        assert!(html.ends_with("</html>\n"));
    }

    #[test]
    fn test_render_tree() {
        let dump = parse("<ul><li>a</ul>", false).unwrap();
        let tree = render(&dump.document, OutputFormat::Tree).unwrap();
        assert_eq!(tree, "#document\n  <ul>\n    <li>\n      \"a\"\n");
    }

    #[test]
    fn test_render_json() {
        let dump = parse("<!DOCTYPE html><p id=x>hi<!--c--><![CDATA[d]]></p>", false).unwrap();
        let json = render(&dump.document, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["doctype"], "html");

        let nodes = value["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes[0]["type"], "document");
        assert_eq!(nodes[0]["id"], 0);
        assert!(nodes[0].get("parent").is_none());
        assert_eq!(nodes[0]["children"], serde_json::json!([1]));

        let p = &nodes[1];
        assert_eq!(p["type"], "element");
        assert_eq!(p["name"], "p");
        assert_eq!(p["parent"], 0);
        assert_eq!(p["attributes"][0]["name"], "id");
        assert_eq!(p["attributes"][0]["value"], "x");
        assert_eq!(p["children"], serde_json::json!([2, 3, 4]));

        assert_eq!(nodes[2]["type"], "text");
        assert_eq!(nodes[2]["data"], "hi");
        assert_eq!(nodes[2]["parent"], 1);
        assert!(nodes[2].get("children").is_none());
        assert_eq!(nodes[3]["type"], "comment");
        assert_eq!(nodes[4]["type"], "cdata");
        assert_eq!(nodes[4]["data"], "d");
    }

    #[test]
    fn test_render_deeply_nested_json() {
        let depth = 100_000;
        let dump = parse(&"<div>".repeat(depth), false).unwrap();
        let json = render(&dump.document, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let nodes = value["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), depth + 1);
        let deepest = &nodes[depth];
        assert_eq!(deepest["name"], "div");
        assert_eq!(deepest["parent"], depth - 1);
        assert!(deepest.get("children").is_none());
    }

    #[test]
    fn test_keep_whitespace() {
        let source = "<!--a-->\n<html></html>\n";
        assert_eq!(parse(source, false).unwrap().document.children(NodeId::ROOT).len(), 2);
        assert_eq!(parse(source, true).unwrap().document.children(NodeId::ROOT).len(), 4);
    }

    #[test]
    fn test_parse_error_message() {
        let err = parse("<html><div></span></html>", false).unwrap_err();
        assert!(matches!(err, DumpError::Parse(_)));
        assert_eq!(err.to_string(), "Tag not closed - div at line 1, column 17");
    }
}
