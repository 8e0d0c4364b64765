//! Whole-document tests against the fixture pages.

use tagsoup_common::html;
use tagsoup_dom::{Document, DomError, NodeId};
use tagsoup_html::{ParseErrorKind, ScannerConfig};

fn parse(source: &str) -> Document {
    Document::parse_html(source).unwrap()
}

fn element_children(doc: &Document, id: NodeId) -> Vec<NodeId> {
    doc.child_elements(id)
}

fn find(doc: &Document, tag_name: &str) -> NodeId {
    doc.find_element_by_tag_name(doc.root(), tag_name)
        .unwrap_or_else(|| panic!("no <{}> in document", tag_name))
}

fn is_comment(doc: &Document, id: NodeId, content: &str) -> bool {
    let node = doc.node(id).unwrap();
    node.is_comment() && node.data() == Some(content)
}

fn is_all_whitespace(doc: &Document, id: NodeId) -> bool {
    doc.node(id).unwrap().is_whitespace_text()
}

#[test]
fn test_simple_html() {
    let doc = parse(include_str!("fixtures/simple_html.html"));
    assert_eq!(doc.doctype(), Some("html"));
    let html = doc.document_element().unwrap();
    assert_eq!(doc.tag_name(html), Some("html"));
    let title = doc.find_element_by_tag_name(html, "title").unwrap();
    assert_eq!(doc.text_content(title), "simple");
    let p = doc.find_element_by_tag_name(html, "p").unwrap();
    assert_eq!(doc.text_content(p), "text");
    assert_eq!(doc.title().as_deref(), Some("simple"));
}

#[test]
fn test_simple_html_with_no_doctype() {
    let doc = parse(include_str!("fixtures/simple_html_with_no_doctype.html"));
    assert_eq!(doc.doctype(), None);
    let html = doc.document_element().unwrap();
    assert_eq!(doc.tag_name(html), Some("html"));
    assert_eq!(doc.text_content(find(&doc, "title")), "simple");
    assert_eq!(doc.text_content(find(&doc, "p")), "text");
}

#[test]
fn test_simple_html_with_attributes() {
    let doc = parse(include_str!("fixtures/simple_html_with_attrs.html"));
    let p = find(&doc, "p");
    assert_eq!(doc.get_attribute(p, "id"), Some("123"));
    assert_eq!(doc.get_attribute(p, "class"), Some("class1"));
    assert_eq!(doc.get_element_by_id("123"), Some(p));
}

#[test]
fn test_element_without_children() {
    let doc = parse(include_str!("fixtures/html_with_element_without_children.html"));
    let body = doc.body().unwrap();
    let children = element_children(&doc, body);
    assert_eq!(children.len(), 2);
    assert_eq!(doc.tag_name(children[0]), Some("p"));
    assert_eq!(doc.tag_name(children[1]), Some("br"));
    assert!(doc.children(children[1]).is_empty());
}

#[test]
fn test_comments_in_head() {
    let doc = parse(include_str!("fixtures/html_with_comments.html"));
    let head = doc.head().unwrap();
    let children = doc.children(head);
    assert_eq!(children.len(), 5);
    assert!(is_all_whitespace(&doc, children[0]));
    assert!(is_comment(&doc, children[1], " comment "));
    assert!(is_all_whitespace(&doc, children[2]));
    assert_eq!(doc.tag_name(children[3]), Some("title"));
    assert!(is_all_whitespace(&doc, children[4]));
}

#[test]
fn test_comment_including_hyphen() {
    let doc = parse(include_str!("fixtures/html_with_comment_including_hyphen.html"));
    let head = doc.head().unwrap();
    let children = doc.children(head);
    assert_eq!(children.len(), 5);
    assert!(is_comment(&doc, children[1], " comment - including hyphen "));
}

#[test]
fn test_comments_before_and_after_document_element() {
    let doc = parse(include_str!("fixtures/html_with_multiple_comments.html"));
    let children = doc.children(doc.root());
    assert_eq!(children.len(), 3);
    assert!(is_comment(&doc, children[0], " comment before start "));
    assert_eq!(Some(children[1]), doc.document_element());
    assert!(is_comment(&doc, children[2], " comment after end "));
}

#[test]
fn test_top_level_whitespace_kept_when_configured() {
    let config = ScannerConfig::default().keep_top_level_whitespace(true);
    let doc = Document::parse_html_with(
        include_str!("fixtures/html_with_multiple_comments.html"),
        config,
        tagsoup_html::NoCharsetCallback,
    )
    .unwrap();
    let children = doc.children(doc.root());
    // comment, html and comment, each preceded and the last followed by a newline
    assert_eq!(children.len(), 7);
    let whitespace = children
        .iter()
        .filter(|&&c| is_all_whitespace(&doc, c))
        .count();
    assert_eq!(whitespace, 4);
    assert!(is_comment(&doc, children[1], " comment before start "));
    assert_eq!(doc.tag_name(children[3]), Some("html"));
}

#[test]
fn test_meta_tag_charset() {
    let mut charset = None;
    let doc = Document::parse_html_with_charset(
        include_str!("fixtures/html_with_meta_tag.html"),
        |name: &str| charset = Some(name.to_string()),
    )
    .unwrap();
    let meta = find(&doc, "META");
    assert_eq!(doc.tag_name(meta), Some("META"));
    assert_eq!(doc.get_attribute(meta, "http-equiv"), Some("Content-Type"));
    assert_eq!(
        doc.get_attribute(meta, "content"),
        Some("text/html; charset=UTF-8")
    );
    assert_eq!(charset.as_deref(), Some("UTF-8"));
}

#[test]
fn test_no_value_attribute() {
    let doc = parse(include_str!("fixtures/html_with_no_value_attribute.html"));
    let select = find(&doc, "select");
    let options = element_children(&doc, select);
    assert_eq!(options.len(), 2);
    assert_eq!(doc.get_attribute(options[0], "selected"), Some("selected"));
    assert_eq!(doc.get_attribute(options[1], "selected"), None);
}

#[test]
fn test_missing_end_tags() {
    let doc = parse(include_str!("fixtures/html_with_missing_end_tags.html"));

    let select = find(&doc, "select");
    let options = element_children(&doc, select);
    assert_eq!(options.len(), 2);
    assert_eq!(doc.get_attribute(options[0], "selected"), Some("selected"));
    assert_eq!(html::trim(&doc.text_content(options[0])), "A");
    assert_eq!(html::trim(&doc.text_content(options[1])), "B");

    let p = find(&doc, "p");
    assert_eq!(doc.children(p).len(), 1);
    assert_eq!(html::trim(&doc.text_content(p)), "para");

    let table = find(&doc, "table");
    let sections = element_children(&doc, table);
    assert_eq!(sections.len(), 2);
    assert_eq!(doc.tag_name(sections[0]), Some("thead"));
    assert_eq!(doc.tag_name(sections[1]), Some("tbody"));

    let rows = element_children(&doc, sections[1]);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|&r| doc.tag_name(r) == Some("tr")));

    let cells = element_children(&doc, rows[1]);
    assert_eq!(cells.len(), 2);
    assert_eq!(doc.tag_name(cells[0]), Some("td"));
    assert_eq!(html::trim(&doc.text_content(cells[0])), "R2D1");
    assert_eq!(doc.tag_name(cells[1]), Some("td"));
    assert_eq!(html::trim(&doc.text_content(cells[1])), "R2D2");

    // <body> closed the unterminated <head>
    let html_element = doc.document_element().unwrap();
    let top = element_children(&doc, html_element);
    assert_eq!(top.len(), 2);
    assert_eq!(doc.tag_name(top[0]), Some("head"));
    assert_eq!(doc.tag_name(top[1]), Some("body"));
}

fn cdata_children(doc: &Document, id: NodeId) -> Vec<String> {
    doc.children(id)
        .iter()
        .map(|&c| doc.node(c).unwrap())
        .filter(|node| node.is_cdata())
        .filter_map(|node| node.data().map(str::to_string))
        .collect()
}

#[test]
fn test_cdata() {
    let doc = parse(include_str!("fixtures/html_with_cdata.html"));
    let body = doc.body().unwrap();
    assert_eq!(cdata_children(&doc, body), vec!["abc".to_string()]);
}

#[test]
fn test_complex_cdata() {
    let doc = parse(include_str!("fixtures/html_with_complex_cdata.html"));
    let body = doc.body().unwrap();
    assert_eq!(
        cdata_children(&doc, body),
        vec!["[[X]]".to_string(), "<QQQ/>[[X]] ] ]] ".to_string()]
    );
}

#[test]
fn test_top_level_cdata() {
    let doc = parse("<![CDATA[x]]><p></p>");
    let children = doc.children(doc.root());
    assert_eq!(children.len(), 2);
    assert_eq!(cdata_children(&doc, doc.root()), vec!["x".to_string()]);
    assert_eq!(doc.tag_name(children[1]), Some("p"));
    assert_eq!(doc.to_html(), "<![CDATA[x]]>\n<p></p>");
}

#[test]
fn test_script_and_style() {
    let doc = parse(include_str!("fixtures/html_with_script.html"));
    assert_eq!(doc.text_content(find(&doc, "script")), "Script <html>");
    assert_eq!(doc.text_content(find(&doc, "style")), "Style <html>");
}

#[test]
fn test_fixtures_survive_serialization() {
    let fixtures = [
        include_str!("fixtures/simple_html.html"),
        include_str!("fixtures/html_with_comments.html"),
        include_str!("fixtures/html_with_meta_tag.html"),
        include_str!("fixtures/html_with_missing_end_tags.html"),
        include_str!("fixtures/html_with_complex_cdata.html"),
        include_str!("fixtures/html_with_script.html"),
    ];
    for source in fixtures {
        let doc = parse(source);
        let serialized = doc.to_html();
        let reparsed = parse(&serialized);
        assert_eq!(reparsed.to_html(), serialized);
        assert_eq!(reparsed.node_count(), doc.node_count());
    }
}

#[test]
fn test_deeply_nested_document() {
    let depth = 100_000;
    let doc = parse(&"<div>".repeat(depth));
    assert!(doc.find_element_by_tag_name(doc.root(), "span").is_none());
    assert_eq!(doc.text_content(doc.root()), "");

    let mut visited = 0;
    doc.traverse(|_, _| visited += 1);
    assert_eq!(visited, depth + 1);

    let serialized = doc.to_html();
    assert_eq!(parse(&serialized).node_count(), doc.node_count());
}

#[test]
fn test_parse_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.html");
    std::fs::write(&path, include_str!("fixtures/simple_html.html")).unwrap();
    let doc = Document::parse_file(&path).unwrap();
    assert_eq!(doc.title().as_deref(), Some("simple"));

    let missing = Document::parse_file(dir.path().join("missing.html"));
    assert!(matches!(missing, Err(DomError::Io(_))));
}

#[test]
fn test_parse_error_reports_position() {
    let err = Document::parse_html("<html>\n<body>\n<%").unwrap_err();
    let DomError::Parse(err) = err else {
        panic!("expected a parse error, got {:?}", err);
    };
    assert_eq!(err.kind(), ParseErrorKind::Structural);
    assert_eq!((err.line(), err.column()), (3, 1));
    assert_eq!(
        err.to_string(),
        "Illegal character following < at line 3, column 1"
    );
}

#[test]
fn test_parse_with_debug_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();

    let mut hints = Vec::new();
    let doc = Document::parse_html_with_charset(
        r#"<html><head><meta charset="utf-8"></head><body>ok</body></html>"#,
        |name: &str| hints.push(name.to_string()),
    )
    .unwrap();
    assert_eq!(hints, vec!["utf-8".to_string()]);
    assert_eq!(doc.text_content(doc.body().unwrap()), "ok");
}
