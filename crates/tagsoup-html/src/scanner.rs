//! HTML scanner.
//!
//! A push-driven state machine: every code point goes through [`Scanner::accept`]
//! exactly once, and the scanner builds the tree through its [`TreeSink`] as it
//! goes. A code point can be re-dispatched against a new state without being
//! consumed, for example when the character that ends a tag name also has to
//! be read as the start of the tag's attribute list.

use crate::config::ScannerConfig;
use crate::tables;
use crate::{CharsetCallback, NoCharsetCallback, ParseError, ParseResult, Position, TreeSink};
use tracing::{debug, trace, warn};

/// Upper bound on how many states a single code point can pass through.
const MAX_REDISPATCH: usize = 4;

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Between tags.
    Text,
    /// After `<`.
    AngleBracketSeen,
    /// After `<!`.
    ExclamationMarkSeen,
    /// After `<!` and a name.
    Directive,
    /// Inside `<!DOCTYPE ...>`, collecting the name.
    Doctype,
    /// After `<!-`.
    Comment1,
    /// Inside a comment.
    Comment2,
    /// Inside a comment after one `-`.
    Comment3,
    /// Inside a comment after `--`.
    Comment4,
    /// After `<![` and a name.
    Cdata1,
    /// Inside a CDATA section.
    Cdata2,
    /// Inside `script` or `style`.
    Script,
    /// After `<` and a tag name.
    Element,
    /// Inside a start tag, between attributes.
    Element1,
    /// After the `/` of a self-closing tag.
    Element2,
    /// After a quoted attribute value.
    Element3,
    /// After an attribute name.
    Attribute,
    /// After `=`.
    Attribute1,
    QuotedAttribute,
    UnquotedAttribute,
    /// After `</` and a tag name.
    EndElement,
    /// Collecting a tag, attribute or directive name.
    Word,
    /// A parse error was raised; all further input is ignored.
    Error,
}

/// Whether the code point was used up by the state it was dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    Consumed,
    Reprocess,
}

/// Incremental HTML scanner.
pub struct Scanner<S: TreeSink, C: CharsetCallback = NoCharsetCallback> {
    sink: S,
    charset_callback: C,
    config: ScannerConfig,
    state: State,
    /// State to re-dispatch to once the current word ends.
    after_word: State,
    word: String,
    text: String,
    close_quote: char,
    /// Lower-cased tag name and handle of each open element, outermost first.
    open_elements: Vec<(String, S::Handle)>,
    /// Attributes of the start tag being scanned, for `<meta>` sniffing.
    current_attrs: Vec<(String, String)>,
    doc_type: Option<String>,
    position: Position,
    closed: bool,
}

impl<S: TreeSink> Scanner<S, NoCharsetCallback> {
    /// Create a scanner with the default configuration and no charset
    /// callback.
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, ScannerConfig::default(), NoCharsetCallback)
    }
}

impl<S: TreeSink, C: CharsetCallback> Scanner<S, C> {
    /// Create a scanner that reports `<meta>` charset hints to `charset_callback`.
    pub fn with_charset_callback(sink: S, charset_callback: C) -> Self {
        Self::with_config(sink, ScannerConfig::default(), charset_callback)
    }

    pub fn with_config(sink: S, config: ScannerConfig, charset_callback: C) -> Self {
        Self {
            sink,
            charset_callback,
            config,
            state: State::Text,
            after_word: State::Error,
            word: String::new(),
            text: String::new(),
            close_quote: '"',
            open_elements: Vec::new(),
            current_attrs: Vec::new(),
            doc_type: None,
            position: Position::START,
            closed: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Position of the next code point to be accepted.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The DOCTYPE name: `None` if no DOCTYPE was seen, `Some("")` for a bare
    /// `<!DOCTYPE>`.
    pub fn doc_type(&self) -> Option<&str> {
        self.doc_type.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.state == State::Error
    }

    /// Number of elements currently open.
    pub fn depth(&self) -> usize {
        self.open_elements.len()
    }

    /// The tree built so far. Only complete after a successful [`close`](Self::close).
    pub fn result(&self) -> &S {
        &self.sink
    }

    pub fn into_result(self) -> S {
        self.sink
    }

    /// Feed every character of `input`.
    pub fn accept_str(&mut self, input: &str) -> ParseResult<()> {
        for ch in input.chars() {
            self.accept(ch)?;
        }
        Ok(())
    }

    /// Feed one code point.
    pub fn accept(&mut self, ch: char) -> ParseResult<()> {
        if self.closed {
            warn!(?ch, "code point after close ignored");
            return Ok(());
        }
        if self.state == State::Error {
            return Ok(());
        }

        let mut passes = 0;
        while self.dispatch(ch)? == Dispatch::Reprocess {
            passes += 1;
            if passes >= MAX_REDISPATCH {
                return Err(self.structural("Scanner stalled"));
            }
        }

        match ch {
            '\n' => {
                self.position.line += 1;
                self.position.column = 0;
            }
            c if c >= ' ' => self.position.column += 1,
            _ => {}
        }
        Ok(())
    }

    /// Signal end of input.
    ///
    /// Text pending inside an open element is flushed to it. Elements still
    /// open are left as they are; ending inside a tag, comment, CDATA section
    /// or raw-text element is an error.
    pub fn close(&mut self) -> ParseResult<()> {
        if self.closed {
            return Ok(());
        }
        if self.state != State::Text {
            let position = self.position;
            return Err(self.fail(ParseError::IncompleteDocument { position }));
        }
        self.flush_text();
        self.closed = true;
        debug!(
            open_elements = self.open_elements.len(),
            doc_type = ?self.doc_type,
            "scan complete"
        );
        Ok(())
    }

    fn dispatch(&mut self, ch: char) -> ParseResult<Dispatch> {
        match self.state {
            State::Text => {
                if ch == '<' {
                    self.flush_text();
                    self.state = State::AngleBracketSeen;
                } else if !self.open_elements.is_empty() {
                    self.text.push(ch);
                } else if self.is_whitespace(ch) {
                    if self.config.keep_top_level_whitespace {
                        self.text.push(ch);
                    }
                } else {
                    return Err(self.structural("Text outside elements"));
                }
            }
            State::AngleBracketSeen => match ch {
                '!' => self.state = State::ExclamationMarkSeen,
                '/' => self.expect_word(None, State::EndElement),
                c if c.is_ascii_alphabetic() => self.expect_word(Some(c), State::Element),
                _ => return Err(self.structural("Illegal character following <")),
            },
            State::ExclamationMarkSeen => match ch {
                c if c.is_ascii_alphabetic() => self.expect_word(Some(c), State::Directive),
                '-' => self.state = State::Comment1,
                '[' => self.expect_word(None, State::Cdata1),
                _ => return Err(self.structural("Illegal character following <!")),
            },
            State::Directive => {
                if !self.word.eq_ignore_ascii_case("DOCTYPE") {
                    let error = ParseError::UnrecognizedDirective {
                        directive: self.word.clone(),
                        position: self.position,
                    };
                    return Err(self.fail(error));
                }
                if self.doc_type.is_some() {
                    let position = self.position;
                    return Err(self.fail(ParseError::DuplicateDoctype { position }));
                }
                self.text.clear();
                if self.is_whitespace(ch) {
                    self.state = State::Doctype;
                } else if ch == '>' {
                    self.record_doc_type(String::new());
                    self.state = State::Text;
                } else {
                    return Err(self.structural("Illegal character in DOCTYPE"));
                }
            }
            State::Doctype => {
                if ch == '>' {
                    let name = self.text.trim_matches(self.config.whitespace).to_string();
                    self.record_doc_type(name);
                    self.expect_text();
                } else {
                    self.text.push(ch);
                }
            }
            State::Comment1 => {
                if ch != '-' {
                    return Err(self.structural("Illegal comment"));
                }
                self.text.clear();
                self.state = State::Comment2;
            }
            State::Comment2 => {
                if ch == '-' {
                    self.state = State::Comment3;
                } else {
                    self.text.push(ch);
                }
            }
            State::Comment3 => {
                if ch == '-' {
                    self.state = State::Comment4;
                } else {
                    self.text.push('-');
                    self.text.push(ch);
                    self.state = State::Comment2;
                }
            }
            State::Comment4 => match ch {
                '>' => {
                    let comment = self.sink.create_comment(&self.text);
                    self.append_to_current(comment);
                    self.expect_text();
                }
                // `--->`: the first dash belongs to the comment
                '-' => self.text.push('-'),
                _ => {
                    self.text.push_str("--");
                    self.text.push(ch);
                    self.state = State::Comment2;
                }
            },
            State::Cdata1 => {
                if self.word != "CDATA" || ch != '[' {
                    return Err(self.structural("Illegal directive"));
                }
                self.text.clear();
                self.state = State::Cdata2;
            }
            State::Cdata2 => {
                if ch == '>' && self.text.ends_with("]]") {
                    self.text.truncate(self.text.len() - 2);
                    let cdata = self.sink.create_cdata(&self.text);
                    self.append_to_current(cdata);
                    self.expect_text();
                } else {
                    self.text.push(ch);
                }
            }
            State::Script => {
                if ch == '>' && self.strip_raw_text_end_tag() {
                    self.flush_text();
                    self.pop_element();
                    self.state = State::Text;
                } else {
                    self.text.push(ch);
                }
            }
            State::Element => {
                self.open_element();
                self.state = State::Element1;
                return Ok(Dispatch::Reprocess);
            }
            State::Element1 => {
                if !self.is_whitespace(ch) {
                    match ch {
                        c if c.is_ascii_alphabetic() => {
                            self.expect_word(Some(c), State::Attribute)
                        }
                        '>' => self.start_tag_complete(),
                        '/' => self.state = State::Element2,
                        _ => return Err(self.structural("Illegal character in element")),
                    }
                }
            }
            State::Element2 => {
                if ch != '>' {
                    return Err(self.structural("Illegal character in element"));
                }
                self.pop_element();
                self.expect_text();
            }
            State::Element3 => match ch {
                c if self.is_whitespace(c) => self.state = State::Element1,
                '>' => self.start_tag_complete(),
                '/' => self.state = State::Element2,
                _ => return Err(self.structural("Illegal character following attribute")),
            },
            State::Attribute => {
                if !self.is_whitespace(ch) {
                    if ch == '=' {
                        self.state = State::Attribute1;
                    } else {
                        // `<option selected>`: the name doubles as the value
                        let name = self.word.clone();
                        self.set_attribute(name.clone(), name);
                        self.state = State::Element1;
                        return Ok(Dispatch::Reprocess);
                    }
                }
            }
            State::Attribute1 => {
                if !self.is_whitespace(ch) {
                    self.text.clear();
                    if ch == '"' || ch == '\'' {
                        self.close_quote = ch;
                        self.state = State::QuotedAttribute;
                    } else {
                        self.state = State::UnquotedAttribute;
                        return Ok(Dispatch::Reprocess);
                    }
                }
            }
            State::QuotedAttribute => {
                if ch == self.close_quote {
                    let (name, value) = (self.word.clone(), std::mem::take(&mut self.text));
                    self.set_attribute(name, value);
                    self.state = State::Element3;
                } else {
                    self.text.push(ch);
                }
            }
            State::UnquotedAttribute => {
                if self.is_whitespace(ch) || ch == '>' || ch == '/' {
                    let (name, value) = (self.word.clone(), std::mem::take(&mut self.text));
                    self.set_attribute(name, value);
                    self.state = State::Element3;
                    return Ok(Dispatch::Reprocess);
                }
                self.text.push(ch);
            }
            State::EndElement => {
                if ch != '>' || self.word.is_empty() {
                    return Err(self.structural("Closing tag error"));
                }
                self.close_element()?;
                self.expect_text();
            }
            State::Word => {
                if ch.is_ascii_alphanumeric() || ch == '-' {
                    self.word.push(ch);
                } else {
                    self.state = self.after_word;
                    return Ok(Dispatch::Reprocess);
                }
            }
            State::Error => {}
        }
        Ok(Dispatch::Consumed)
    }

    fn is_whitespace(&self, ch: char) -> bool {
        (self.config.whitespace)(ch)
    }

    fn expect_word(&mut self, first: Option<char>, after_word: State) {
        self.word.clear();
        self.word.extend(first);
        self.after_word = after_word;
        self.state = State::Word;
    }

    fn expect_text(&mut self) {
        self.text.clear();
        self.state = State::Text;
    }

    fn record_doc_type(&mut self, name: String) {
        debug!(doc_type = %name, "DOCTYPE");
        self.sink.set_doctype(&name);
        self.doc_type = Some(name);
    }

    fn append_to_current(&mut self, node: S::Handle) {
        let parent = self.open_elements.last().map(|(_, handle)| handle);
        self.sink.append_child(parent, node);
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let node = self.sink.create_text(&self.text);
            self.append_to_current(node);
            self.text.clear();
        }
    }

    fn top_name(&self) -> Option<&str> {
        self.open_elements.last().map(|(name, _)| name.as_str())
    }

    fn pop_element(&mut self) -> Option<(String, S::Handle)> {
        let popped = self.open_elements.pop();
        if let Some((name, _)) = &popped {
            trace!(tag = %name, depth = self.open_elements.len(), "pop");
        }
        popped
    }

    /// Create the element named by the current word, after closing whatever
    /// it implicitly ends, and make it the current node.
    fn open_element(&mut self) {
        let name = std::mem::take(&mut self.word);
        let lower = name.to_ascii_lowercase();
        self.close_implicitly(&lower);

        let element = self.sink.create_element(&name);
        self.append_to_current(element.clone());
        trace!(tag = %name, depth = self.open_elements.len(), "push");
        self.open_elements.push((lower, element));
        self.current_attrs.clear();
    }

    fn close_implicitly(&mut self, lower_name: &str) {
        if self.top_name() == Some("p") && tables::closes_p(lower_name) {
            trace!(by = lower_name, "implicitly closing p");
            self.pop_element();
            return;
        }
        for step in tables::implicit_close_steps(lower_name) {
            if self.top_name().is_some_and(|top| step.contains(&top)) {
                trace!(by = lower_name, "implicitly closing {:?}", self.top_name());
                self.pop_element();
            }
        }
    }

    fn set_attribute(&mut self, name: String, value: String) {
        if let Some((_, element)) = self.open_elements.last() {
            self.sink.set_attribute(element, &name, &value);
        }
        match self.current_attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.current_attrs.push((name, value)),
        }
    }

    fn current_attr(&self, name: &str) -> Option<&str> {
        self.current_attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `>` of a start tag: sniff `<meta>` charsets, then either enter raw
    /// text mode or go back to text, closing void elements straight away.
    fn start_tag_complete(&mut self) {
        let Some(lower) = self.top_name().map(str::to_string) else {
            self.expect_text();
            return;
        };
        if lower == "meta" {
            self.sniff_charset();
        }
        self.text.clear();
        if tables::is_raw_text(&lower) {
            self.state = State::Script;
        } else {
            if self.config.is_void(&lower) {
                self.pop_element();
            }
            self.state = State::Text;
        }
    }

    fn sniff_charset(&mut self) {
        if let Some(charset) = self.current_attr("charset") {
            let charset = charset.to_string();
            debug!(%charset, "charset from <meta charset>");
            self.charset_callback.charset(&charset);
            return;
        }

        let is_content_type = self
            .current_attr("http-equiv")
            .is_some_and(|v| v.eq_ignore_ascii_case("content-type"));
        if !is_content_type {
            return;
        }
        let Some(content) = self.current_attr("content").map(str::to_string) else {
            return;
        };
        let trim = self.config.whitespace;
        for part in content.split(';') {
            if let Some((key, value)) = part.split_once('=') {
                if key.trim_matches(trim).eq_ignore_ascii_case("charset") {
                    let charset = value.trim_matches(trim);
                    debug!(%charset, "charset from <meta http-equiv>");
                    self.charset_callback.charset(charset);
                }
            }
        }
    }

    /// If the raw text ends with `</name` (the element's name exactly as
    /// written in its start tag), remove it and return true.
    fn strip_raw_text_end_tag(&mut self) -> bool {
        let Some((_, element)) = self.open_elements.last() else {
            return false;
        };
        let Some(name) = self.sink.tag_name(element) else {
            return false;
        };
        let end_tag = format!("</{}", name);
        if self.text.ends_with(&end_tag) {
            self.text.truncate(self.text.len() - end_tag.len());
            true
        } else {
            false
        }
    }

    /// Pop up to and including the element named by the current word. Every
    /// element popped on the way must be one that may be left open.
    fn close_element(&mut self) -> ParseResult<()> {
        let target = self.word.to_ascii_lowercase();
        while let Some((lower, element)) = self.pop_element() {
            if lower == target {
                return Ok(());
            }
            if !tables::may_be_left_open(&lower) {
                let tag = self
                    .sink
                    .tag_name(&element)
                    .map(str::to_string)
                    .unwrap_or(lower);
                let position = self.position;
                return Err(self.fail(ParseError::UnterminatedTag { tag, position }));
            }
        }
        Ok(())
    }

    fn structural(&mut self, message: &str) -> ParseError {
        let error = ParseError::structural(message, self.position);
        self.fail(error)
    }

    fn fail(&mut self, error: ParseError) -> ParseError {
        debug!(%error, state = ?self.state, "scan failed");
        self.state = State::Error;
        error
    }
}
