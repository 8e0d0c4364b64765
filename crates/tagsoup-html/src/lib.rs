//! # Tagsoup HTML
//!
//! A forgiving, single-pass HTML scanner.
//!
//! The [`Scanner`] is fed one code point at a time and builds a tree through
//! a [`TreeSink`]. It tolerates the loosely-closed markup found on real web
//! pages (`<li>` without `</li>`, `<td>` without `</td>`, `<p>` closed by a
//! following block) but it is not an HTML5-conformant parser. Anything it
//! cannot make sense of is reported as a [`ParseError`] carrying the line and
//! column where scanning stopped.

pub mod config;
pub mod scanner;
pub mod tables;

pub use config::ScannerConfig;
pub use scanner::{Scanner, State};

use std::fmt;
use thiserror::Error;
use tracing::debug;

/// A location in the input: 1-based line, 0-based column.
///
/// The column counts code points at or above U+0020 since the last line feed,
/// so tabs and carriage returns do not move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const START: Position = Position { line: 1, column: 0 };
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors that stop a parse.
///
/// Every error is fatal: the scanner that raised it stays in
/// [`State::Error`] and ignores further input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A character that is not allowed where it appeared.
    #[error("{message} at {position}")]
    Structural { message: String, position: Position },

    /// `<!X ...>` where `X` is not `DOCTYPE`.
    #[error("Unrecognised directive - {directive} at {position}")]
    UnrecognizedDirective { directive: String, position: Position },

    /// A second `<!DOCTYPE ...>`.
    #[error("Duplicate DOCTYPE at {position}")]
    DuplicateDoctype { position: Position },

    /// A closing tag whose opener could not be reached by implicitly closing
    /// the elements above it.
    #[error("Tag not closed - {tag} at {position}")]
    UnterminatedTag { tag: String, position: Position },

    /// End of input in the middle of a tag, comment, CDATA section or
    /// raw-text element.
    #[error("Document incomplete at {position}")]
    IncompleteDocument { position: Position },
}

/// Discriminant of a [`ParseError`], handy for matching in tests and tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    Structural,
    UnrecognizedDirective,
    DuplicateDoctype,
    UnterminatedTag,
    IncompleteDocument,
}

impl ParseError {
    pub(crate) fn structural(message: impl Into<String>, position: Position) -> Self {
        Self::Structural {
            message: message.into(),
            position,
        }
    }

    /// Where the scanner was when the error was raised.
    pub fn position(&self) -> Position {
        match self {
            ParseError::Structural { position, .. }
            | ParseError::UnrecognizedDirective { position, .. }
            | ParseError::DuplicateDoctype { position }
            | ParseError::UnterminatedTag { position, .. }
            | ParseError::IncompleteDocument { position } => *position,
        }
    }

    pub fn line(&self) -> usize {
        self.position().line
    }

    pub fn column(&self) -> usize {
        self.position().column
    }

    /// The message without the position suffix.
    pub fn message(&self) -> String {
        match self {
            ParseError::Structural { message, .. } => message.clone(),
            ParseError::UnrecognizedDirective { directive, .. } => {
                format!("Unrecognised directive - {}", directive)
            }
            ParseError::DuplicateDoctype { .. } => "Duplicate DOCTYPE".to_string(),
            ParseError::UnterminatedTag { tag, .. } => format!("Tag not closed - {}", tag),
            ParseError::IncompleteDocument { .. } => "Document incomplete".to_string(),
        }
    }

    pub fn kind(&self) -> ParseErrorKind {
        match self {
            ParseError::Structural { .. } => ParseErrorKind::Structural,
            ParseError::UnrecognizedDirective { .. } => ParseErrorKind::UnrecognizedDirective,
            ParseError::DuplicateDoctype { .. } => ParseErrorKind::DuplicateDoctype,
            ParseError::UnterminatedTag { .. } => ParseErrorKind::UnterminatedTag,
            ParseError::IncompleteDocument { .. } => ParseErrorKind::IncompleteDocument,
        }
    }
}

/// Result type for HTML parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Trait for receiving nodes from the scanner and building a tree.
///
/// The scanner never holds on to tree nodes itself beyond the handles on its
/// open-element stack, so implementations are free to use an arena and hand
/// out indices.
pub trait TreeSink {
    /// The type used to identify nodes in the tree.
    type Handle: Clone;

    /// Create an element with the tag name exactly as written in the source.
    /// The element is not attached anywhere yet.
    fn create_element(&mut self, name: &str) -> Self::Handle;

    /// Create a detached text node.
    fn create_text(&mut self, content: &str) -> Self::Handle;

    /// Create a detached comment node.
    fn create_comment(&mut self, content: &str) -> Self::Handle;

    /// Create a detached CDATA section.
    fn create_cdata(&mut self, content: &str) -> Self::Handle;

    /// Append `child` as the last child of `parent`, or of the document
    /// itself when `parent` is `None`.
    fn append_child(&mut self, parent: Option<&Self::Handle>, child: Self::Handle);

    /// Set an attribute on an element. A repeated name replaces the earlier
    /// value.
    fn set_attribute(&mut self, element: &Self::Handle, name: &str, value: &str);

    /// The tag name of an element, in the case it was stored.
    fn tag_name(&self, element: &Self::Handle) -> Option<&str>;

    /// Record the document type name from `<!DOCTYPE name>`.
    fn set_doctype(&mut self, name: &str);
}

/// Receiver for charset hints found in `<meta>` tags.
///
/// Called synchronously while the `<meta>` tag is being closed, so a caller
/// that decodes bytes can switch charsets before the next code point arrives.
pub trait CharsetCallback {
    fn charset(&mut self, name: &str);
}

impl<F> CharsetCallback for F
where
    F: FnMut(&str),
{
    fn charset(&mut self, name: &str) {
        self(name)
    }
}

/// A [`CharsetCallback`] that ignores every hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCharsetCallback;

impl CharsetCallback for NoCharsetCallback {
    fn charset(&mut self, _name: &str) {}
}

/// Parse a complete HTML string into the provided sink.
pub fn parse<S: TreeSink>(html: &str, sink: S) -> ParseResult<S> {
    parse_with_config(html, sink, ScannerConfig::default(), NoCharsetCallback)
}

/// Parse a complete HTML string with an explicit configuration and charset
/// callback.
pub fn parse_with_config<S, C>(
    html: &str,
    sink: S,
    config: ScannerConfig,
    charset_callback: C,
) -> ParseResult<S>
where
    S: TreeSink,
    C: CharsetCallback,
{
    debug!(len = html.len(), "Parsing HTML");
    let mut scanner = Scanner::with_config(sink, config, charset_callback);
    scanner.accept_str(html)?;
    scanner.close()?;
    Ok(scanner.into_result())
}
