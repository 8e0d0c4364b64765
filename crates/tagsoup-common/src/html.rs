//! HTML vocabulary.
//!
//! Character classes and element tables that the scanner and the document
//! model agree on.

use lazy_static::lazy_static;
use std::collections::HashSet;

/// Elements that never have children and never take a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

lazy_static! {
    static ref VOID_ELEMENT_SET: HashSet<&'static str> = VOID_ELEMENTS.iter().copied().collect();
}

/// HTML whitespace: space, tab, line feed, carriage return and form feed.
pub fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

/// Strip leading and trailing HTML whitespace.
///
/// Unlike [`str::trim`] this leaves non-HTML whitespace such as U+00A0
/// (no-break space) in place.
pub fn trim(s: &str) -> &str {
    s.trim_matches(is_whitespace)
}

/// True when the string is empty or made up only of HTML whitespace.
pub fn is_all_whitespace(s: &str) -> bool {
    s.chars().all(is_whitespace)
}

/// Case-insensitive membership test against [`VOID_ELEMENTS`].
pub fn is_void_element(tag_name: &str) -> bool {
    VOID_ELEMENT_SET.contains(tag_name.to_ascii_lowercase().as_str())
}
