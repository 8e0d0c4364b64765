//! Scanner configuration.

use std::collections::HashSet;
use std::fmt;
use tagsoup_common::html;

/// Knobs for a [`Scanner`](crate::Scanner).
///
/// The defaults take the void element table and the whitespace predicate
/// from [`tagsoup_common::html`].
#[derive(Clone)]
pub struct ScannerConfig {
    /// Lower-case names of elements that are closed as soon as their start
    /// tag ends.
    pub void_elements: HashSet<String>,
    /// Whitespace classification for text outside elements, inside tags and
    /// around the DOCTYPE name.
    pub whitespace: fn(char) -> bool,
    /// Append whitespace found outside the root element to the document as
    /// text nodes instead of dropping it.
    pub keep_top_level_whitespace: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            void_elements: html::VOID_ELEMENTS.iter().map(|s| s.to_string()).collect(),
            whitespace: html::is_whitespace,
            keep_top_level_whitespace: false,
        }
    }
}

impl fmt::Debug for ScannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut void_elements: Vec<_> = self.void_elements.iter().collect();
        void_elements.sort();
        f.debug_struct("ScannerConfig")
            .field("void_elements", &void_elements)
            .field("keep_top_level_whitespace", &self.keep_top_level_whitespace)
            .finish_non_exhaustive()
    }
}

impl ScannerConfig {
    /// Replace the void element table. Names are lower-cased on the way in.
    pub fn with_void_elements<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.void_elements = names
            .into_iter()
            .map(|n| n.as_ref().to_ascii_lowercase())
            .collect();
        self
    }

    /// Replace the whitespace predicate.
    pub fn with_whitespace(mut self, whitespace: fn(char) -> bool) -> Self {
        self.whitespace = whitespace;
        self
    }

    pub fn keep_top_level_whitespace(mut self, keep: bool) -> Self {
        self.keep_top_level_whitespace = keep;
        self
    }

    pub(crate) fn is_void(&self, lower_name: &str) -> bool {
        self.void_elements.contains(lower_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_void_elements() {
        let config = ScannerConfig::default();
        assert!(config.is_void("br"));
        assert!(config.is_void("meta"));
        assert!(!config.is_void("p"));
        assert!(!config.keep_top_level_whitespace);
    }

    #[test]
    fn test_custom_void_elements_are_lowercased() {
        let config = ScannerConfig::default().with_void_elements(["BR", "Spacer"]);
        assert!(config.is_void("spacer"));
        assert!(config.is_void("br"));
        assert!(!config.is_void("img"));
    }

    #[test]
    fn test_custom_whitespace() {
        let config = ScannerConfig::default().with_whitespace(|c| c == ' ');
        assert!((config.whitespace)(' '));
        assert!(!(config.whitespace)('\n'));
    }
}
