//! Element tables for implicit closing.
//!
//! These encode a convenient approximation of the HTML5 tree construction
//! rules, enough to rebuild list, table and select structure from tag soup.
//! Names are lower-case.

use lazy_static::lazy_static;
use std::collections::HashSet;

/// Elements whose start tag closes an open `p`.
pub const P_CLOSING_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hgroup", "hr", "main", "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Elements that may be left open when an ancestor's end tag arrives.
pub const IMPLICITLY_CLOSED_ELEMENTS: &[&str] = &[
    "td", "th", "tr", "thead", "tbody", "tfoot", "li", "dt", "dd", "p", "option", "optgroup",
];

/// Elements whose content is raw text up to their own end tag.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

lazy_static! {
    static ref P_CLOSING_SET: HashSet<&'static str> = P_CLOSING_ELEMENTS.iter().copied().collect();
    static ref IMPLICITLY_CLOSED_SET: HashSet<&'static str> =
        IMPLICITLY_CLOSED_ELEMENTS.iter().copied().collect();
}

pub fn closes_p(lower_name: &str) -> bool {
    P_CLOSING_SET.contains(lower_name)
}

pub fn may_be_left_open(lower_name: &str) -> bool {
    IMPLICITLY_CLOSED_SET.contains(lower_name)
}

pub fn is_raw_text(lower_name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&lower_name)
}

/// Which open elements a new start tag closes, in the order they must be
/// checked against the top of the stack.
///
/// Each step is a set of names; if the current top matches any of them it is
/// popped and the next step is checked against the new top. A step that does
/// not match is skipped and checking continues with the next one.
pub fn implicit_close_steps(lower_name: &str) -> &'static [&'static [&'static str]] {
    const CELLS: &[&str] = &["td", "th"];
    const ROW: &[&str] = &["tr"];
    const SECTIONS: &[&str] = &["tbody", "thead", "tfoot"];
    const DEFINITIONS: &[&str] = &["dt", "dd"];

    match lower_name {
        "body" => &[&["head"]],
        "li" => &[&["li"]],
        "dt" | "dd" => &[DEFINITIONS],
        "option" => &[&["option"]],
        "optgroup" => &[&["option"], &["optgroup"]],
        "td" | "th" => &[CELLS],
        "tr" => &[CELLS, ROW],
        "tbody" | "thead" | "tfoot" => &[CELLS, ROW, SECTIONS],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_p_closers() {
        assert!(closes_p("div"));
        assert!(closes_p("h6"));
        assert!(closes_p("p"));
        assert!(!closes_p("span"));
        assert!(!closes_p("li"));
    }

    #[test]
    fn test_may_be_left_open() {
        for name in ["td", "tbody", "li", "p", "optgroup"] {
            assert!(may_be_left_open(name));
        }
        assert!(!may_be_left_open("div"));
        assert!(!may_be_left_open("table"));
    }

    #[test]
    fn test_table_section_steps() {
        let steps = implicit_close_steps("tbody");
        assert_eq!(steps.len(), 3);
        assert!(steps[0].contains(&"th"));
        assert_eq!(steps[1], &["tr"]);
        assert!(steps[2].contains(&"tfoot"));
        assert!(implicit_close_steps("span").is_empty());
    }
}
